//! Domain models and types for Custodia.
//!
//! This module contains the shared domain types and error hierarchy used by
//! every engine.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Error types** ([`CustodiaError`])
//! - **Result type alias** ([`Result`])
//! - **Shared enums** ([`DataCategory`], [`Severity`], [`RiskLevel`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, CustodiaError>`]:
//!
//! ```rust
//! use custodia::domain::{CustodiaError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(CustodiaError::KeyNotFound("health".to_string()))
//! }
//! ```

pub mod errors;
pub mod result;
pub mod types;

pub use errors::CustodiaError;
pub use result::Result;
pub use types::{DataCategory, RiskLevel, Severity};
