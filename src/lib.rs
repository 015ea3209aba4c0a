//! Shortener - URL shortening core
//!
//! Maps long URLs to compact 8-character ids, persists the mappings in one of
//! several interchangeable backends, and soft-deletes them asynchronously.
//!
//! # Features
//! - **cli**: Command-line interface (default)
//!
//! # Architecture
//! - `storage`: Storage trait plus in-memory, append-log file and SeaORM backends
//! - `deletion`: Bounded queue and background worker for soft deletes
//! - `services`: Shortening flow (validation, dedup, id generation)
//! - `config`: Configuration management
//! - `system`: Logging and shutdown helpers
//! - `utils`: Id generator and URL validation

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod deletion;
pub mod errors;
#[cfg(feature = "cli")]
pub mod interfaces;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
