//! Error type definitions for the stream ranker
//!
//! Only template and configuration problems are fatal. Feed and probe errors
//! exist so they can be logged with context; callers downgrade them to
//! "no candidates" or "no result" respectively.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::utils::resolution::Resolution;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Template parsing errors
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Candidate feed errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Result file could not be written
    #[error("Failed to write report to {path:?}: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while reading the channel template
#[derive(Error, Debug)]
pub enum TemplateError {
    /// A channel line appeared before any `#genre#` marker
    #[error("Malformed template at line {line}: channel '{content}' has no category")]
    Malformed { line: usize, content: String },

    /// Template file could not be read
    #[error("Failed to read template {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Remote candidate feed errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport failure or timeout
    #[error("Feed fetch failed for {url}: {message}")]
    FeedFetch { url: String, message: String },

    /// Non-success HTTP status
    #[error("HTTP error: {status} - {url}")]
    Http { status: u16, url: String },
}

/// Per-URL probe outcomes that produce no result
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Inspection exceeded its budget plus grace and was cancelled
    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),

    /// Inspection process could not run or reported nothing
    #[error("Probe failed: {0}")]
    Failure(String),

    /// No `WxH` descriptor in the diagnostics
    #[error("No video resolution reported")]
    NoResolution,

    /// Stream resolution below the configured minimum
    #[error("Resolution {actual} below minimum {minimum}")]
    BelowMinResolution {
        actual: Resolution,
        minimum: Resolution,
    },

    /// Capture file missing or empty
    #[error("Captured no stream bytes")]
    EmptyCapture,
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create a feed fetch error
    pub fn feed_fetch<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::FeedFetch {
            url: url.into(),
            message: message.into(),
        }
    }
}
