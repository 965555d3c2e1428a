//! Transport adapters over the application services.

pub mod rest;
