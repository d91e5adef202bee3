//! Centralized error handling for the stream ranker
//!
//! # Error Categories
//!
//! - **Template Errors**: malformed or unreadable channel templates (fatal)
//! - **Source Errors**: remote feed failures (recoverable, empty candidate set)
//! - **Probe Errors**: per-URL measurement failures (recoverable, no result)
//! - **Configuration Errors**: invalid settings (fatal at startup)

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;

/// Convenience type alias for Probe Results
pub type ProbeOutcome<T> = Result<T, ProbeError>;
