//! Mock storage implementations for testing.

mod catalog;
mod progress_store;


pub use catalog::MockCatalog;
pub use progress_store::MockProgressStore;
