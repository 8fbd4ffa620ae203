//! Diesel row models for status persistence.

use super::schema::{status_transitions, statuses};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for status records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = statuses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StatusRow {
    /// Status identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Presentation colour.
    pub color: String,
    /// Default role flag.
    pub is_default: bool,
    /// Pending role flag.
    pub is_pending: bool,
    /// Executing role flag.
    pub is_executing: bool,
    /// Final role flag.
    pub is_final: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for status records. Roles start unset.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = statuses)]
pub struct NewStatusRow {
    /// Status identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Presentation colour.
    pub color: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model and query row for transition edges.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = status_transitions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransitionRow {
    /// Source status.
    pub from_status_id: uuid::Uuid,
    /// Target status.
    pub to_status_id: uuid::Uuid,
}
