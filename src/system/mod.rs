//! System-level modules
//!
//! - Logging initialization
//! - Lifecycle helpers (ctrl-c cancellation, bounded shutdown of background tasks)

pub mod logging;
pub mod shutdown;
