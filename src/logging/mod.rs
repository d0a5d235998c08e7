//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - JSON-formatted logs
//! - Configurable log levels
//! - Local file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use custodia::config::LoggingConfig;
//! use custodia::logging::init_logging;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging(&config).expect("Failed to initialize logging");
//!
//! tracing::info!("Library initialized");
//! tracing::warn!(category = "health", "Key nearing rotation window");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};
