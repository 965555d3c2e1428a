//! Shared storage integration tests.
//!
//! Tests the ProgressStore interface against all implementations.
//! Each implementation module imports these test functions and runs them.

pub mod progress_store_tests;
