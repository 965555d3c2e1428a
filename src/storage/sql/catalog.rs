//! Unified SQL catalog lookups.
//!
//! Answers lesson and user existence checks from the `lessons` and `users`
//! tables. Those tables belong to the catalog and identity services; the
//! `add_*` helpers exist to seed them for local runs and tests.

use std::marker::PhantomData;

use sea_query::{Expr, OnConflict, Query};
use uuid::Uuid;

use super::SqlDatabase;
use crate::storage::schema::{Lessons, Users};
use crate::storage::Result;

/// SQL-based implementation of LessonCatalog and UserDirectory.
pub struct SqlCatalog<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlCatalog<DB> {
    /// Create a new SQL catalog with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }
}

macro_rules! impl_catalog {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlCatalog<$db_type> {
            /// Register a lesson under a chapter. No-op if it already exists.
            pub async fn add_lesson(&self, lesson_id: Uuid, chapter_id: Uuid, title: &str) -> Result<()> {
                let stmt = Query::insert()
                    .into_table(Lessons::Table)
                    .columns([Lessons::Id, Lessons::ChapterId, Lessons::Title])
                    .values_panic([
                        lesson_id.to_string().into(),
                        chapter_id.to_string().into(),
                        title.into(),
                    ])
                    .on_conflict(OnConflict::column(Lessons::Id).do_nothing().to_owned())
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                sqlx::query(&sql).execute(&self.pool).await?;
                Ok(())
            }

            /// Register a user. No-op if it already exists.
            pub async fn add_user(&self, user_id: Uuid) -> Result<()> {
                let stmt = Query::insert()
                    .into_table(Users::Table)
                    .columns([Users::Id])
                    .values_panic([user_id.to_string().into()])
                    .on_conflict(OnConflict::column(Users::Id).do_nothing().to_owned())
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                sqlx::query(&sql).execute(&self.pool).await?;
                Ok(())
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::LessonCatalog for SqlCatalog<$db_type> {
            async fn lesson_exists(&self, lesson_id: Uuid) -> Result<bool> {
                let stmt = Query::select()
                    .column(Lessons::Id)
                    .from(Lessons::Table)
                    .and_where(Expr::col(Lessons::Id).eq(lesson_id.to_string()))
                    .limit(1)
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
                Ok(row.is_some())
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::UserDirectory for SqlCatalog<$db_type> {
            async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
                let stmt = Query::select()
                    .column(Users::Id)
                    .from(Users::Table)
                    .and_where(Expr::col(Users::Id).eq(user_id.to_string()))
                    .limit(1)
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
                Ok(row.is_some())
            }
        }
    };
}

impl_catalog!(super::postgres::Postgres, "postgres");
impl_catalog!(super::sqlite::Sqlite, "sqlite");
