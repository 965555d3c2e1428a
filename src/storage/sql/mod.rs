//! Unified SQL storage implementations.
//!
//! This module provides shared implementations for SQL-based storage backends
//! (PostgreSQL, SQLite). The implementations are parameterized by database type
//! using the `SqlDatabase` trait.

mod catalog;
mod progress_store;
mod query;

pub use catalog::SqlCatalog;
pub use progress_store::SqlProgressStore;
pub use query::SqlDatabase;

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.

    use sea_query::PostgresQueryBuilder;
    use sqlx::PgPool;

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl super::SqlDatabase for Postgres {
        type Pool = PgPool;

        const GREATEST: &'static str = "GREATEST";
        const LEAST: &'static str = "LEAST";
        const SCHEMA: &'static [&'static str] = crate::storage::schema::POSTGRES_SCHEMA;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_delete(stmt: sea_query::DeleteStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }
    }

    /// PostgreSQL progress store.
    pub type PostgresProgressStore = super::SqlProgressStore<Postgres>;

    /// PostgreSQL lesson/user catalog.
    pub type PostgresCatalog = super::SqlCatalog<Postgres>;
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.

    use sea_query::SqliteQueryBuilder;
    use sqlx::SqlitePool;

    /// SQLite database marker type.
    pub struct Sqlite;

    impl super::SqlDatabase for Sqlite {
        type Pool = SqlitePool;

        const GREATEST: &'static str = "MAX";
        const LEAST: &'static str = "MIN";
        const SCHEMA: &'static [&'static str] = crate::storage::schema::SQLITE_SCHEMA;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_delete(stmt: sea_query::DeleteStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }
    }

    /// SQLite progress store.
    pub type SqliteProgressStore = super::SqlProgressStore<Sqlite>;

    /// SQLite lesson/user catalog.
    pub type SqliteCatalog = super::SqlCatalog<Sqlite>;
}
