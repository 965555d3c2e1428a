//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.
//! Identifiers and timestamps are stored as TEXT (UUID / RFC 3339) on both
//! backends so rows decode the same way everywhere.

use sea_query::Iden;

/// Lesson progress table schema.
#[derive(Iden)]
pub enum LessonProgress {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "user_id"]
    UserId,
    #[iden = "lesson_id"]
    LessonId,
    #[iden = "current_position_seconds"]
    CurrentPositionSeconds,
    #[iden = "duration_seconds"]
    DurationSeconds,
    #[iden = "completion_percentage"]
    CompletionPercentage,
    #[iden = "is_completed"]
    IsCompleted,
    #[iden = "completed_at"]
    CompletedAt,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Catalog lessons table schema (owned by the catalog; read here).
#[derive(Iden)]
pub enum Lessons {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "chapter_id"]
    ChapterId,
    #[iden = "title"]
    Title,
}

/// Users table schema (owned by the identity store; read here).
#[derive(Iden)]
pub enum Users {
    Table,
    #[iden = "id"]
    Id,
}

/// Conflict target of the progress upsert; backed by a UNIQUE constraint.
pub const PROGRESS_KEY: [LessonProgress; 2] = [LessonProgress::UserId, LessonProgress::LessonId];

/// SQLite schema statements.
pub const SQLITE_SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS lessons (
    id TEXT PRIMARY KEY,
    chapter_id TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT ''
)"#,
    "CREATE INDEX IF NOT EXISTS idx_lessons_chapter ON lessons(chapter_id)",
    r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY
)"#,
    r#"
CREATE TABLE IF NOT EXISTS lesson_progress (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    lesson_id TEXT NOT NULL,
    current_position_seconds REAL NOT NULL,
    duration_seconds REAL NOT NULL,
    completion_percentage INTEGER NOT NULL,
    is_completed INTEGER NOT NULL DEFAULT 0,
    completed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (user_id, lesson_id)
)"#,
];

/// PostgreSQL schema statements.
pub const POSTGRES_SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS lessons (
    id TEXT PRIMARY KEY,
    chapter_id TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT ''
)"#,
    "CREATE INDEX IF NOT EXISTS idx_lessons_chapter ON lessons(chapter_id)",
    r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY
)"#,
    r#"
CREATE TABLE IF NOT EXISTS lesson_progress (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    lesson_id TEXT NOT NULL,
    current_position_seconds DOUBLE PRECISION NOT NULL,
    duration_seconds DOUBLE PRECISION NOT NULL,
    completion_percentage INTEGER NOT NULL,
    is_completed BOOLEAN NOT NULL DEFAULT FALSE,
    completed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (user_id, lesson_id)
)"#,
];
