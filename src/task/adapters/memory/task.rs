//! In-memory repository for task lifecycle tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{Pendency, PendencyId, Task, TaskId},
    ports::{PendencyRepository, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory repository for tasks and their pendencies.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    children_index: HashMap<TaskId, Vec<TaskId>>,
    pendencies: HashMap<PendencyId, Pendency>,
    pendency_index: HashMap<TaskId, Vec<PendencyId>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn index_child(state: &mut InMemoryTaskState, task: &Task) {
    if let Some(parent_id) = task.parent_id() {
        state
            .children_index
            .entry(parent_id)
            .or_default()
            .push(task.id());
    }
}

/// Removes an ID from a keyed index, cleaning up the entry if empty.
fn remove_from_index<K, V>(index: &mut HashMap<K, Vec<V>>, key: &K, value: &V)
where
    K: Eq + std::hash::Hash,
    V: PartialEq,
{
    if let Some(values) = index.get_mut(key) {
        values.retain(|existing| existing != value);
        if values.is_empty() {
            index.remove(key);
        }
    }
}

fn oldest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) -> Vec<T> {
    items.sort_by_key(|item| created_at(item));
    items
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }

        index_child(&mut state, task);
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let old_parent = state
            .tasks
            .get(&task.id())
            .ok_or(TaskRepositoryError::NotFound(task.id()))?
            .parent_id();

        if old_parent != task.parent_id() {
            if let Some(old_parent_id) = old_parent {
                remove_from_index(&mut state.children_index, &old_parent_id, &task.id());
            }
            index_child(&mut state, task);
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let removed = state
            .tasks
            .remove(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;

        if let Some(parent_id) = removed.parent_id() {
            remove_from_index(&mut state.children_index, &parent_id, &id);
        }
        state.children_index.remove(&id);
        for pendency_id in state.pendency_index.remove(&id).unwrap_or_default() {
            state.pendencies.remove(&pendency_id);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_children(&self, parent_id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let children = state
            .children_index
            .get(&parent_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.tasks.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(oldest_first(children, Task::created_at))
    }

    async fn ancestor_ids(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>> {
        let state = self.read()?;
        let mut current = state
            .tasks
            .get(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?
            .parent_id();

        let mut visited = HashSet::from([id]);
        let mut ancestors = Vec::new();
        while let Some(ancestor_id) = current {
            if !visited.insert(ancestor_id) {
                return Err(TaskRepositoryError::CycleDetected(id));
            }
            ancestors.push(ancestor_id);
            current = state
                .tasks
                .get(&ancestor_id)
                .and_then(Task::parent_id);
        }
        Ok(ancestors)
    }
}

#[async_trait]
impl PendencyRepository for InMemoryTaskRepository {
    async fn store_pendency(&self, pendency: &Pendency) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.pendencies.contains_key(&pendency.id()) {
            return Err(TaskRepositoryError::DuplicatePendency(pendency.id()));
        }
        if !state.tasks.contains_key(&pendency.task_id()) {
            return Err(TaskRepositoryError::NotFound(pendency.task_id()));
        }

        state
            .pendency_index
            .entry(pendency.task_id())
            .or_default()
            .push(pendency.id());
        state.pendencies.insert(pendency.id(), pendency.clone());
        Ok(())
    }

    async fn update_pendency(&self, pendency: &Pendency) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let stored = state
            .pendencies
            .get_mut(&pendency.id())
            .ok_or(TaskRepositoryError::PendencyNotFound(pendency.id()))?;
        *stored = pendency.clone();
        Ok(())
    }

    async fn find_pendency_by_id(&self, id: PendencyId) -> TaskRepositoryResult<Option<Pendency>> {
        let state = self.read()?;
        Ok(state.pendencies.get(&id).cloned())
    }

    async fn find_pendencies_by_task(
        &self,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Vec<Pendency>> {
        let state = self.read()?;
        let pendencies = state
            .pendency_index
            .get(&task_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.pendencies.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(oldest_first(pendencies, Pendency::created_at))
    }
}
