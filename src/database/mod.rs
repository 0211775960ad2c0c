//! Database module
//!
//! This module handles database connections and operations

pub mod connection;
pub mod repositories;
pub mod service;

// Re-export commonly used database components
pub use connection::{DatabasePool, create_pool, init_schema, health_check};
pub use repositories::{MemberRepository, BroadcastRepository, ClientBotRepository, ClientUserRepository};
pub use service::DatabaseService;

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::sqlite::SqlitePoolOptions;
    use super::connection::{init_schema, DatabasePool};

    /// In-memory pool with the full schema. Single connection so every
    /// query sees the same database.
    pub async fn test_pool() -> DatabasePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");

        init_schema(&pool).await.expect("schema init");
        pool
    }
}
