//! Per-tree mutual exclusion for task mutations.
//!
//! Every task belongs to exactly one tree, identified by its top-most
//! ancestor. Mutations that can trigger a cascade hold the lock of every
//! tree they touch for the whole read-modify-write sequence, so two
//! siblings finishing at the same time cannot both miss the parent update.

use crate::task::domain::TaskId;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of async locks keyed by tree root.
#[derive(Debug, Default)]
pub struct SubtreeLocks {
    roots: Mutex<HashMap<TaskId, Arc<AsyncMutex<()>>>>,
}

/// Holds the locks of one or more trees until dropped.
#[derive(Debug)]
#[must_use = "the trees are unlocked as soon as the guard is dropped"]
pub struct SubtreeGuard {
    roots: Vec<TaskId>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl SubtreeGuard {
    /// Returns the locked roots in acquisition order.
    #[must_use]
    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }
}

impl SubtreeLocks {
    /// Creates an empty lock registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks every root in ascending identifier order.
    ///
    /// Acquiring in a global order keeps two callers that need overlapping
    /// root sets from deadlocking.
    pub async fn lock(&self, roots: &BTreeSet<TaskId>) -> SubtreeGuard {
        let mut guards = Vec::with_capacity(roots.len());
        for root in roots {
            guards.push(self.handle(*root).lock_owned().await);
        }
        SubtreeGuard {
            roots: roots.iter().copied().collect(),
            _guards: guards,
        }
    }

    /// Returns the number of roots with a live lock entry.
    #[must_use]
    pub fn tracked_roots(&self) -> usize {
        self.roots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn handle(&self, root: TaskId) -> Arc<AsyncMutex<()>> {
        let mut roots = self.roots.lock().unwrap_or_else(PoisonError::into_inner);
        // Entries nobody holds or waits on are only referenced by the map.
        roots.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(roots.entry(root).or_default())
    }
}
