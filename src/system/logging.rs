//! Logging system initialization
//!
//! This module provides functions to initialize the tracing/logging system
//! based on application configuration.

use crate::config::LoggingConfig;
use crate::errors::{Result, ShortenerError};

/// Initialize logging system based on configuration
///
/// **Note**: This should be called only once during application startup,
/// after the configuration has been loaded.
///
/// # Returns
/// * `WorkerGuard` - Must be kept alive for the duration of the program
///   to ensure non-blocking log writes are flushed
pub fn init_logging(config: &LoggingConfig) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let to_file = config.file.as_ref().is_some_and(|f| !f.is_empty());

    let writer: Box<dyn std::io::Write + Send + Sync> = match config.file {
        Some(ref log_file) if !log_file.is_empty() => {
            // Non-rotating, append to file
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)
                .map_err(|e| {
                    ShortenerError::file_operation(format!("无法打开日志文件 {}: {}", log_file, e))
                })?;
            Box::new(file)
        }
        _ => Box::new(std::io::stderr()),
    };

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.clone()));

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(!to_file);

    let installed = if config.format == "json" {
        subscriber_builder.json().try_init()
    } else {
        subscriber_builder.try_init()
    };

    if let Err(e) = installed {
        // 已有全局 subscriber（例如测试中重复初始化），保留原有的
        eprintln!("[WARN] Logging already initialized: {}", e);
    }

    Ok(guard)
}
