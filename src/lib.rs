//! Lesson progress tracking.
//!
//! Records how far a user has watched each lesson video, decides when a
//! lesson counts as completed, and serves the merged state over HTTP.
//! Concurrent reports for the same user and lesson converge on the maximum
//! observed progress; completion is sticky once reached.

pub mod config;
pub mod handlers;
pub mod policy;
pub mod progress;
pub mod services;
pub mod storage;
pub mod utils;
