//! Mock lesson catalog and user directory.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::storage::{LessonCatalog, Result, StorageError, UserDirectory};

/// In-memory catalog: lesson -> chapter mapping plus a user set.
#[derive(Default)]
pub struct MockCatalog {
    lessons: RwLock<HashMap<Uuid, Uuid>>,
    users: RwLock<HashSet<Uuid>>,
    fail_lookups: RwLock<bool>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_lesson(&self, lesson_id: Uuid, chapter_id: Uuid) {
        self.lessons.write().await.insert(lesson_id, chapter_id);
    }

    pub async fn add_user(&self, user_id: Uuid) {
        self.users.write().await.insert(user_id);
    }

    pub async fn set_fail_lookups(&self, fail: bool) {
        *self.fail_lookups.write().await = fail;
    }

    /// Chapter a lesson belongs to, if the lesson is known.
    pub async fn chapter_of(&self, lesson_id: Uuid) -> Option<Uuid> {
        self.lessons.read().await.get(&lesson_id).copied()
    }

    async fn check_available(&self) -> Result<()> {
        if *self.fail_lookups.read().await {
            return Err(StorageError::Unavailable("Mock catalog unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LessonCatalog for MockCatalog {
    async fn lesson_exists(&self, lesson_id: Uuid) -> Result<bool> {
        self.check_available().await?;
        Ok(self.lessons.read().await.contains_key(&lesson_id))
    }
}

#[async_trait]
impl UserDirectory for MockCatalog {
    async fn user_exists(&self, user_id: Uuid) -> Result<bool> {
        self.check_available().await?;
        Ok(self.users.read().await.contains(&user_id))
    }
}
