//! SQLite storage integration tests.
//!
//! Run with: cargo test --test storage_sqlite --features sqlite
//!
//! Uses in-memory database by default, no external dependencies required.

mod storage;

use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use lesson_progress::config::{SqliteConfig, StorageConfig, StorageType};
use lesson_progress::storage::{
    init_storage, LessonCatalog, SqliteCatalog, SqliteProgressStore, UserDirectory,
};

/// Get SQLite connection string (in-memory for tests)
fn sqlite_uri() -> String {
    std::env::var("SQLITE_URI").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

async fn connect_and_init() -> (SqliteProgressStore, SqliteCatalog) {
    // Every connection to an in-memory database is a separate database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&sqlite_uri())
        .await
        .expect("Failed to connect to SQLite");

    let store = SqliteProgressStore::new(pool.clone());
    store.init().await.expect("Failed to create schema");

    (store, SqliteCatalog::new(pool))
}

#[tokio::test]
async fn test_sqlite_progress_store() {
    println!("=== SQLite ProgressStore Tests ===");
    println!("Connecting to: {}", sqlite_uri());

    let (store, _) = connect_and_init().await;
    run_progress_store_tests!(&store);

    println!("=== All SQLite ProgressStore tests PASSED ===");
}

#[tokio::test]
async fn test_sqlite_list_by_user_and_chapter() {
    let (store, catalog) = connect_and_init().await;

    let chapter = Uuid::new_v4();
    let lessons = [Uuid::new_v4(), Uuid::new_v4()];
    let other = Uuid::new_v4();
    for (i, lesson) in lessons.iter().enumerate() {
        catalog
            .add_lesson(*lesson, chapter, &format!("lesson {}", i))
            .await
            .unwrap();
    }
    catalog.add_lesson(other, Uuid::new_v4(), "elsewhere").await.unwrap();

    storage::progress_store_tests::test_list_by_user_and_chapter(&store, chapter, lessons, other)
        .await;
}

#[tokio::test]
async fn test_sqlite_catalog_lookups() {
    let (_, catalog) = connect_and_init().await;
    let (lesson, user) = (Uuid::new_v4(), Uuid::new_v4());

    assert!(!catalog.lesson_exists(lesson).await.unwrap());
    assert!(!catalog.user_exists(user).await.unwrap());

    catalog.add_lesson(lesson, Uuid::new_v4(), "intro").await.unwrap();
    catalog.add_user(user).await.unwrap();
    // Seeding twice is a no-op.
    catalog.add_user(user).await.unwrap();

    assert!(catalog.lesson_exists(lesson).await.unwrap());
    assert!(catalog.user_exists(user).await.unwrap());
}

#[tokio::test]
async fn test_init_storage_sqlite_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("progress.db");

    let config = StorageConfig {
        storage_type: StorageType::Sqlite,
        sqlite: SqliteConfig {
            path: path.to_string_lossy().into_owned(),
            ..Default::default()
        },
        ..Default::default()
    };

    let storage = init_storage(&config).await.expect("init_storage should succeed");
    assert!(path.exists(), "database file should be created");

    let user = Uuid::new_v4();
    assert!(!storage.users.user_exists(user).await.unwrap());
    assert!(storage.progress.get(user, Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_init_storage_memory() {
    let config = StorageConfig {
        storage_type: StorageType::Memory,
        ..Default::default()
    };

    let storage = init_storage(&config).await.expect("init_storage should succeed");
    assert!(!storage.lessons.lesson_exists(Uuid::new_v4()).await.unwrap());
}
