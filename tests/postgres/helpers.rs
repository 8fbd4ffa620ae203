//! Shared test helpers for `PostgreSQL` integration tests.

use demandhub::{
    status::adapters::postgres::PostgresStatusRepository,
    task::adapters::postgres::PostgresTaskRepository,
};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use rstest::fixture;
use uuid::Uuid;

/// Environment variable naming the server used by these tests.
pub const DATABASE_URL_ENV: &str = "DEMANDHUB_TEST_DATABASE_URL";

/// SQL creating the full schema.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-18-000000_create_core/up.sql");

/// Pins every pooled connection to the test schema.
#[derive(Debug)]
struct SearchPath(String);

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for SearchPath {
    fn on_acquire(&self, connection: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        connection
            .batch_execute(&format!("SET search_path TO {}", self.0))
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// A migrated schema that is dropped with the value.
pub struct TestDatabase {
    url: String,
    schema: String,
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl TestDatabase {
    /// Creates and migrates a fresh schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or migration fails.
    pub fn create(url: &str) -> Result<Self, eyre::Report> {
        let schema = format!("demandhub_test_{}", Uuid::new_v4().simple());
        let mut admin = PgConnection::establish(url)?;
        admin.batch_execute(&format!("CREATE SCHEMA {schema}"))?;

        let pool = Pool::builder()
            .max_size(4)
            .connection_customizer(Box::new(SearchPath(schema.clone())))
            .build(ConnectionManager::new(url))?;
        pool.get()?.batch_execute(CREATE_SCHEMA_SQL)?;
        Ok(Self {
            url: url.to_owned(),
            schema,
            pool,
        })
    }

    /// Returns a status repository bound to the schema.
    #[must_use]
    pub fn statuses(&self) -> PostgresStatusRepository {
        PostgresStatusRepository::new(self.pool.clone())
    }

    /// Returns a task repository bound to the schema.
    #[must_use]
    pub fn tasks(&self) -> PostgresTaskRepository {
        PostgresTaskRepository::new(self.pool.clone())
    }

    /// Runs raw SQL against the schema, bypassing the adapters.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub fn execute(&self, sql: &str) -> Result<(), eyre::Report> {
        self.pool.get()?.batch_execute(sql)?;
        Ok(())
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let result = PgConnection::establish(&self.url)
            .map_err(eyre::Report::from)
            .and_then(|mut admin| {
                admin
                    .batch_execute(&format!("DROP SCHEMA {} CASCADE", self.schema))
                    .map_err(eyre::Report::from)
            });
        if let Err(err) = result {
            tracing::warn!(schema = %self.schema, error = %err, "failed to drop test schema");
        }
    }
}

/// Provides a migrated database, or `None` when no server is configured.
#[fixture]
pub fn database() -> Option<TestDatabase> {
    let Ok(url) = std::env::var(DATABASE_URL_ENV) else {
        tracing::warn!("{DATABASE_URL_ENV} is unset; skipping PostgreSQL test");
        return None;
    };
    Some(TestDatabase::create(&url).unwrap_or_else(|err| panic!("test database setup: {err:?}")))
}
