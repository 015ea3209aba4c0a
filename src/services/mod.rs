//! Service layer
//!
//! Business flows shared by the CLI and any request-handling front end.

mod link_service;

pub use link_service::*;
