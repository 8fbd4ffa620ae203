//! Diesel schema for status registry persistence.

diesel::table! {
    /// Lifecycle statuses with their semantic role flags.
    statuses (id) {
        /// Status identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 100]
        name -> Varchar,
        /// Presentation colour as `#rrggbb`.
        #[max_length = 7]
        color -> Varchar,
        /// Whether new tasks start in this status.
        is_default -> Bool,
        /// Whether reopened pendencies move tasks here.
        is_pending -> Bool,
        /// Whether resolved pendencies move tasks here.
        is_executing -> Bool,
        /// Whether this status is terminal.
        is_final -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed edges of the status transition graph.
    status_transitions (from_status_id, to_status_id) {
        /// Source status.
        from_status_id -> Uuid,
        /// Target status.
        to_status_id -> Uuid,
    }
}
