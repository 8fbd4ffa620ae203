//! Diesel row models for task and pendency persistence.

use super::schema::{pendencies, tasks};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Title.
    pub title: String,
    /// Hierarchy level.
    pub level: String,
    /// Description.
    pub description: String,
    /// Free-form observation.
    pub observation: String,
    /// Parent task.
    pub parent_id: Option<uuid::Uuid>,
    /// Current status.
    pub status_id: Option<uuid::Uuid>,
    /// Responsible user.
    pub responsible_id: Option<uuid::Uuid>,
    /// Creating user.
    pub created_by: Option<uuid::Uuid>,
    /// Planned start.
    pub start_date: Option<NaiveDate>,
    /// Deadline.
    pub due_date: Option<NaiveDate>,
    /// Closure date.
    pub closure_date: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert and update model for task records.
///
/// `None` fields are written as `NULL` so clearing a field persists.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskWriteRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Title.
    pub title: String,
    /// Hierarchy level.
    pub level: String,
    /// Description.
    pub description: String,
    /// Free-form observation.
    pub observation: String,
    /// Parent task.
    pub parent_id: Option<uuid::Uuid>,
    /// Current status.
    pub status_id: Option<uuid::Uuid>,
    /// Responsible user.
    pub responsible_id: Option<uuid::Uuid>,
    /// Creating user.
    pub created_by: Option<uuid::Uuid>,
    /// Planned start.
    pub start_date: Option<NaiveDate>,
    /// Deadline.
    pub due_date: Option<NaiveDate>,
    /// Closure date.
    pub closure_date: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// One step of the recursive ancestor query.
#[derive(Debug, Clone, QueryableByName)]
pub struct AncestorRow {
    /// Task at this step.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub id: uuid::Uuid,
    /// Distance from the starting task.
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub depth: i32,
    /// Whether this step revisits a task already on the path.
    #[diesel(sql_type = diesel::sql_types::Bool)]
    pub cycle: bool,
}

/// Query, insert, and update model for pendency records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = pendencies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct PendencyRow {
    /// Pendency identifier.
    pub id: uuid::Uuid,
    /// Owning task.
    pub task_id: uuid::Uuid,
    /// Description.
    pub description: String,
    /// Creating user.
    pub created_by: Option<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Resolution flag.
    pub resolved: bool,
    /// Resolution timestamp.
    pub resolved_at: Option<DateTime<Utc>>,
}
