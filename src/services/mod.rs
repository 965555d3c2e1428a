//! Application services.

pub mod progress;

pub use progress::{ProgressError, ProgressReport, ProgressService};
