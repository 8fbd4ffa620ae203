//! `PostgreSQL` repository implementation for task and pendency storage.

use super::{
    models::{AncestorRow, PendencyRow, TaskRow, TaskWriteRow},
    schema::{pendencies, tasks},
};
use crate::status::domain::StatusId;
use crate::task::{
    domain::{
        Pendency, PendencyDescription, PendencyId, PersistedPendencyData, PersistedTaskData, Task,
        TaskId, TaskLevel, TaskTitle, UserId,
    },
    ports::{PendencyRepository, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// Walks the parent chain upwards, flagging the step that closes a cycle.
const ANCESTOR_QUERY: &str = concat!(
    "WITH RECURSIVE chain (id, parent_id, depth, path, cycle) AS (",
    " SELECT t.id, t.parent_id, 0, ARRAY[t.id], FALSE FROM tasks t WHERE t.id = $1",
    " UNION ALL",
    " SELECT p.id, p.parent_id, c.depth + 1, c.path || p.id, p.id = ANY(c.path)",
    " FROM chain c JOIN tasks p ON p.id = c.parent_id",
    " WHERE NOT c.cycle",
    ") SELECT id, depth, cycle FROM chain ORDER BY depth",
);

/// `PostgreSQL`-backed task and pendency repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = to_write_row(task);

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        missing_reference(&row)
                    }
                    other => TaskRepositoryError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = to_write_row(task);

        self.run_blocking(move |connection| {
            let updated = diesel::update(tasks::table.find(task_id.into_inner()))
                .set(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        missing_reference(&row)
                    }
                    other => TaskRepositoryError::persistence(other),
                })?;
            if updated == 0 {
                return Err(TaskRepositoryError::NotFound(task_id));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                diesel::delete(pendencies::table.filter(pendencies::task_id.eq(id.into_inner())))
                    .execute(tx)?;
                let deleted = diesel::delete(tasks::table.find(id.into_inner())).execute(tx)?;
                if deleted == 0 {
                    return Err(TaskRepositoryError::NotFound(id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_children(&self, parent_id: TaskId) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            tasks::table
                .filter(tasks::parent_id.eq(parent_id.into_inner()))
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }

    async fn ancestor_ids(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>> {
        self.run_blocking(move |connection| {
            let rows = diesel::sql_query(ANCESTOR_QUERY)
                .bind::<diesel::sql_types::Uuid, _>(id.into_inner())
                .load::<AncestorRow>(connection)?;
            chain_to_ancestors(id, rows)
        })
        .await
    }
}

#[async_trait]
impl PendencyRepository for PostgresTaskRepository {
    async fn store_pendency(&self, pendency: &Pendency) -> TaskRepositoryResult<()> {
        let pendency_id = pendency.id();
        let task_id = pendency.task_id();
        let row = to_pendency_row(pendency);

        self.run_blocking(move |connection| {
            diesel::insert_into(pendencies::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicatePendency(pendency_id)
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        TaskRepositoryError::NotFound(task_id)
                    }
                    other => TaskRepositoryError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn update_pendency(&self, pendency: &Pendency) -> TaskRepositoryResult<()> {
        let pendency_id = pendency.id();
        let row = to_pendency_row(pendency);

        self.run_blocking(move |connection| {
            let updated = diesel::update(pendencies::table.find(pendency_id.into_inner()))
                .set(&row)
                .execute(connection)?;
            if updated == 0 {
                return Err(TaskRepositoryError::PendencyNotFound(pendency_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_pendency_by_id(&self, id: PendencyId) -> TaskRepositoryResult<Option<Pendency>> {
        self.run_blocking(move |connection| {
            let row = pendencies::table
                .find(id.into_inner())
                .select(PendencyRow::as_select())
                .first::<PendencyRow>(connection)
                .optional()?;
            row.map(row_to_pendency).transpose()
        })
        .await
    }

    async fn find_pendencies_by_task(
        &self,
        task_id: TaskId,
    ) -> TaskRepositoryResult<Vec<Pendency>> {
        self.run_blocking(move |connection| {
            pendencies::table
                .filter(pendencies::task_id.eq(task_id.into_inner()))
                .order((pendencies::created_at.asc(), pendencies::id.asc()))
                .select(PendencyRow::as_select())
                .load::<PendencyRow>(connection)?
                .into_iter()
                .map(row_to_pendency)
                .collect()
        })
        .await
    }
}

/// Reports a foreign-key failure on a task write as the missing parent.
///
/// Status references are validated by the service before any write, so the
/// parent is the only reference a caller can get wrong.
fn missing_reference(row: &TaskWriteRow) -> TaskRepositoryError {
    row.parent_id.map_or_else(
        || TaskRepositoryError::persistence(DieselError::NotFound),
        |parent_id| TaskRepositoryError::NotFound(TaskId::from_uuid(parent_id)),
    )
}

fn chain_to_ancestors(id: TaskId, rows: Vec<AncestorRow>) -> TaskRepositoryResult<Vec<TaskId>> {
    if rows.is_empty() {
        return Err(TaskRepositoryError::NotFound(id));
    }
    if rows.iter().any(|row| row.cycle) {
        return Err(TaskRepositoryError::CycleDetected(id));
    }
    Ok(rows
        .into_iter()
        .filter(|row| row.depth > 0)
        .map(|row| TaskId::from_uuid(row.id))
        .collect())
}

fn to_write_row(task: &Task) -> TaskWriteRow {
    TaskWriteRow {
        id: task.id().into_inner(),
        title: task.title().as_str().to_owned(),
        level: task.level().as_str().to_owned(),
        description: task.description().to_owned(),
        observation: task.observation().to_owned(),
        parent_id: task.parent_id().map(TaskId::into_inner),
        status_id: task.status_id().map(StatusId::into_inner),
        responsible_id: task.responsible().map(UserId::into_inner),
        created_by: task.created_by().map(UserId::into_inner),
        start_date: task.start_date(),
        due_date: task.due_date(),
        closure_date: task.closure_date(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        title,
        level,
        description,
        observation,
        parent_id,
        status_id,
        responsible_id,
        created_by,
        start_date,
        due_date,
        closure_date,
        created_at,
        updated_at,
    } = row;

    let data = PersistedTaskData {
        id: TaskId::from_uuid(id),
        title: TaskTitle::new(title).map_err(TaskRepositoryError::persistence)?,
        level: TaskLevel::try_from(level.as_str()).map_err(TaskRepositoryError::persistence)?,
        description,
        observation,
        parent_id: parent_id.map(TaskId::from_uuid),
        status_id: status_id.map(StatusId::from_uuid),
        responsible: responsible_id.map(UserId::from_uuid),
        created_by: created_by.map(UserId::from_uuid),
        start_date,
        due_date,
        closure_date,
        created_at,
        updated_at,
    };
    Ok(Task::from_persisted(data))
}

fn to_pendency_row(pendency: &Pendency) -> PendencyRow {
    PendencyRow {
        id: pendency.id().into_inner(),
        task_id: pendency.task_id().into_inner(),
        description: pendency.description().as_str().to_owned(),
        created_by: pendency.created_by().map(UserId::into_inner),
        created_at: pendency.created_at(),
        resolved: pendency.is_resolved(),
        resolved_at: pendency.resolved_at(),
    }
}

fn row_to_pendency(row: PendencyRow) -> TaskRepositoryResult<Pendency> {
    let PendencyRow {
        id,
        task_id,
        description,
        created_by,
        created_at,
        resolved,
        resolved_at,
    } = row;

    Ok(Pendency::from_persisted(PersistedPendencyData {
        id: PendencyId::from_uuid(id),
        task_id: TaskId::from_uuid(task_id),
        description: PendencyDescription::new(description)
            .map_err(TaskRepositoryError::persistence)?,
        created_by: created_by.map(UserId::from_uuid),
        created_at,
        resolved,
        resolved_at,
    }))
}
