//! `PostgreSQL` repository implementation for the status registry.
//!
//! Role flags live in one boolean column per role, each guarded by a partial
//! unique index so the database itself refuses a second holder. Role
//! assignment clears and sets the flag inside one transaction that holds a
//! table lock, serialising role writes across processes.

use super::{
    models::{NewStatusRow, StatusRow, TransitionRow},
    schema::{status_transitions, statuses},
};
use crate::status::{
    domain::{PersistedStatusData, Status, StatusColor, StatusId, StatusName, StatusRole},
    ports::{StatusRepository, StatusRepositoryError, StatusRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::{BTreeMap, BTreeSet};

/// `PostgreSQL` connection pool type used by the status adapter.
pub type StatusPgPool = Pool<ConnectionManager<PgConnection>>;

/// Runs `$body` with `$column` bound to the flag column of `$role`.
macro_rules! with_role_column {
    ($role:expr, $column:ident => $body:expr) => {
        match $role {
            StatusRole::Default => {
                let $column = statuses::is_default;
                $body
            }
            StatusRole::Pending => {
                let $column = statuses::is_pending;
                $body
            }
            StatusRole::Executing => {
                let $column = statuses::is_executing;
                $body
            }
            StatusRole::Final => {
                let $column = statuses::is_final;
                $body
            }
        }
    };
}

/// `PostgreSQL`-backed status repository.
#[derive(Debug, Clone)]
pub struct PostgresStatusRepository {
    pool: StatusPgPool,
}

impl PostgresStatusRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: StatusPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> StatusRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StatusRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StatusRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(StatusRepositoryError::persistence)?
    }
}

impl From<DieselError> for StatusRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl StatusRepository for PostgresStatusRepository {
    async fn store(&self, status: &Status) -> StatusRepositoryResult<()> {
        let status_id = status.id();
        let new_row = to_new_row(status);
        let edges = to_transition_rows(status);

        self.run_blocking(move |connection| {
            connection.transaction::<_, StatusRepositoryError, _>(|tx| {
                diesel::insert_into(statuses::table)
                    .values(&new_row)
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            StatusRepositoryError::DuplicateStatus(status_id)
                        }
                        other => StatusRepositoryError::persistence(other),
                    })?;
                replace_transitions(tx, status_id, &edges)
            })
        })
        .await
    }

    async fn update(&self, status: &Status) -> StatusRepositoryResult<()> {
        let status_id = status.id();
        let name = status.name().as_str().to_owned();
        let color = status.color().as_str().to_owned();
        let updated_at = status.updated_at();
        let edges = to_transition_rows(status);

        self.run_blocking(move |connection| {
            connection.transaction::<_, StatusRepositoryError, _>(|tx| {
                let updated = diesel::update(statuses::table.find(status_id.into_inner()))
                    .set((
                        statuses::name.eq(&name),
                        statuses::color.eq(&color),
                        statuses::updated_at.eq(updated_at),
                    ))
                    .execute(tx)?;
                if updated == 0 {
                    return Err(StatusRepositoryError::NotFound(status_id));
                }
                replace_transitions(tx, status_id, &edges)
            })
        })
        .await
    }

    async fn find_by_id(&self, id: StatusId) -> StatusRepositoryResult<Option<Status>> {
        self.run_blocking(move |connection| {
            let row = statuses::table
                .find(id.into_inner())
                .select(StatusRow::as_select())
                .first::<StatusRow>(connection)
                .optional()?;
            let Some(row) = row else {
                return Ok(None);
            };
            let edges = status_transitions::table
                .filter(status_transitions::from_status_id.eq(id.into_inner()))
                .select(TransitionRow::as_select())
                .load::<TransitionRow>(connection)?;
            row_to_status(row, edges_by_source(edges).remove(&id).unwrap_or_default()).map(Some)
        })
        .await
    }

    async fn list_all(&self) -> StatusRepositoryResult<Vec<Status>> {
        self.run_blocking(|connection| {
            let rows = statuses::table
                .order((statuses::name.asc(), statuses::id.asc()))
                .select(StatusRow::as_select())
                .load::<StatusRow>(connection)?;
            rows_to_statuses(connection, rows)
        })
        .await
    }

    async fn find_by_role(&self, role: StatusRole) -> StatusRepositoryResult<Vec<Status>> {
        self.run_blocking(move |connection| {
            let rows = with_role_column!(role, column => statuses::table
                .filter(column.eq(true))
                .order((statuses::name.asc(), statuses::id.asc()))
                .select(StatusRow::as_select())
                .load::<StatusRow>(connection))?;
            rows_to_statuses(connection, rows)
        })
        .await
    }

    async fn assign_role(
        &self,
        id: StatusId,
        role: StatusRole,
    ) -> StatusRepositoryResult<Vec<StatusId>> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, StatusRepositoryError, _>(|tx| {
                lock_statuses(tx)?;
                let exists: i64 = statuses::table
                    .filter(statuses::id.eq(id.into_inner()))
                    .count()
                    .get_result(tx)?;
                if exists == 0 {
                    return Err(StatusRepositoryError::NotFound(id));
                }

                let revoked = revoke_role(tx, role, Some(id))?;
                with_role_column!(role, column => diesel::update(statuses::table.find(id.into_inner()))
                    .set(column.eq(true))
                    .execute(tx))?;
                Ok(revoked)
            })
        })
        .await
    }

    async fn clear_role(&self, role: StatusRole) -> StatusRepositoryResult<Vec<StatusId>> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, StatusRepositoryError, _>(|tx| {
                lock_statuses(tx)?;
                revoke_role(tx, role, None)
            })
        })
        .await
    }
}

fn lock_statuses(connection: &mut PgConnection) -> QueryResult<usize> {
    diesel::sql_query("LOCK TABLE statuses IN SHARE ROW EXCLUSIVE MODE").execute(connection)
}

/// Clears `role` from every holder except `keep`, returning the sorted
/// identifiers that lost it.
fn revoke_role(
    connection: &mut PgConnection,
    role: StatusRole,
    keep: Option<StatusId>,
) -> StatusRepositoryResult<Vec<StatusId>> {
    let keep_uuid = keep.map(StatusId::into_inner);
    let mut revoked: Vec<StatusId> = with_role_column!(role, column => {
        let holders = statuses::table.filter(column.eq(true)).into_boxed();
        let holders = match keep_uuid {
            Some(keep_id) => holders.filter(statuses::id.ne(keep_id)),
            None => holders,
        };
        let ids: Vec<uuid::Uuid> = holders.select(statuses::id).load(connection)?;
        diesel::update(statuses::table.filter(statuses::id.eq_any(&ids)))
            .set(column.eq(false))
            .execute(connection)?;
        ids
    })
    .into_iter()
    .map(StatusId::from_uuid)
    .collect();
    revoked.sort();
    Ok(revoked)
}

fn replace_transitions(
    connection: &mut PgConnection,
    status_id: StatusId,
    edges: &[TransitionRow],
) -> StatusRepositoryResult<()> {
    ensure_targets_exist(connection, edges)?;
    diesel::delete(
        status_transitions::table
            .filter(status_transitions::from_status_id.eq(status_id.into_inner())),
    )
    .execute(connection)?;
    if !edges.is_empty() {
        diesel::insert_into(status_transitions::table)
            .values(edges)
            .execute(connection)?;
    }
    Ok(())
}

/// Rejects edges whose target status does not exist, naming the first one.
fn ensure_targets_exist(
    connection: &mut PgConnection,
    edges: &[TransitionRow],
) -> StatusRepositoryResult<()> {
    let targets: Vec<uuid::Uuid> = edges.iter().map(|edge| edge.to_status_id).collect();
    let existing: BTreeSet<uuid::Uuid> = statuses::table
        .filter(statuses::id.eq_any(&targets))
        .select(statuses::id)
        .load::<uuid::Uuid>(connection)?
        .into_iter()
        .collect();
    match targets.into_iter().find(|target| !existing.contains(target)) {
        Some(missing) => Err(StatusRepositoryError::NotFound(StatusId::from_uuid(missing))),
        None => Ok(()),
    }
}

fn rows_to_statuses(
    connection: &mut PgConnection,
    rows: Vec<StatusRow>,
) -> StatusRepositoryResult<Vec<Status>> {
    let ids: Vec<uuid::Uuid> = rows.iter().map(|row| row.id).collect();
    let edges = status_transitions::table
        .filter(status_transitions::from_status_id.eq_any(&ids))
        .select(TransitionRow::as_select())
        .load::<TransitionRow>(connection)?;
    let mut edges = edges_by_source(edges);

    rows.into_iter()
        .map(|row| {
            let next = edges
                .remove(&StatusId::from_uuid(row.id))
                .unwrap_or_default();
            row_to_status(row, next)
        })
        .collect()
}

fn edges_by_source(edges: Vec<TransitionRow>) -> BTreeMap<StatusId, BTreeSet<StatusId>> {
    let mut grouped: BTreeMap<StatusId, BTreeSet<StatusId>> = BTreeMap::new();
    for edge in edges {
        grouped
            .entry(StatusId::from_uuid(edge.from_status_id))
            .or_default()
            .insert(StatusId::from_uuid(edge.to_status_id));
    }
    grouped
}

fn to_new_row(status: &Status) -> NewStatusRow {
    NewStatusRow {
        id: status.id().into_inner(),
        name: status.name().as_str().to_owned(),
        color: status.color().as_str().to_owned(),
        created_at: status.created_at(),
        updated_at: status.updated_at(),
    }
}

fn to_transition_rows(status: &Status) -> Vec<TransitionRow> {
    status
        .next_statuses()
        .iter()
        .map(|target| TransitionRow {
            from_status_id: status.id().into_inner(),
            to_status_id: target.into_inner(),
        })
        .collect()
}

fn row_to_status(row: StatusRow, next_statuses: BTreeSet<StatusId>) -> StatusRepositoryResult<Status> {
    let StatusRow {
        id,
        name,
        color,
        is_default,
        is_pending,
        is_executing,
        is_final,
        created_at,
        updated_at,
    } = row;

    let roles = [
        (StatusRole::Default, is_default),
        (StatusRole::Pending, is_pending),
        (StatusRole::Executing, is_executing),
        (StatusRole::Final, is_final),
    ]
    .into_iter()
    .filter_map(|(role, held)| held.then_some(role))
    .collect();

    Ok(Status::from_persisted(PersistedStatusData {
        id: StatusId::from_uuid(id),
        name: StatusName::new(name).map_err(StatusRepositoryError::persistence)?,
        color: StatusColor::new(color).map_err(StatusRepositoryError::persistence)?,
        roles,
        next_statuses,
        created_at,
        updated_at,
    }))
}
