//! Existence checks against the catalog and identity stores.

use async_trait::async_trait;
use uuid::Uuid;

use super::Result;

/// Read-only view of the lesson catalog.
#[async_trait]
pub trait LessonCatalog: Send + Sync {
    async fn lesson_exists(&self, lesson_id: Uuid) -> Result<bool>;
}

/// Read-only view of the user directory.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool>;
}
