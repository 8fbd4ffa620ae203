//! Diesel schema for task and pendency persistence.

diesel::table! {
    /// Work items arranged in a forest through `parent_id`.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Title.
        #[max_length = 255]
        title -> Varchar,
        /// Hierarchy level.
        #[max_length = 20]
        level -> Varchar,
        /// Description.
        description -> Text,
        /// Free-form observation.
        observation -> Text,
        /// Parent task, null for top-level tasks.
        parent_id -> Nullable<Uuid>,
        /// Current status.
        status_id -> Nullable<Uuid>,
        /// Responsible user.
        responsible_id -> Nullable<Uuid>,
        /// Creating user.
        created_by -> Nullable<Uuid>,
        /// Planned start.
        start_date -> Nullable<Date>,
        /// Deadline.
        due_date -> Nullable<Date>,
        /// Date the task reached the terminal status.
        closure_date -> Nullable<Date>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Open issues attached to a task.
    pendencies (id) {
        /// Pendency identifier.
        id -> Uuid,
        /// Owning task.
        task_id -> Uuid,
        /// Description.
        description -> Text,
        /// Creating user.
        created_by -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Whether the pendency is resolved.
        resolved -> Bool,
        /// Resolution timestamp.
        resolved_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(pendencies -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, pendencies);
