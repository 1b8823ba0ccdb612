//! Batch pipeline turning personal fitness exports into tidy daily tables.
//!
//! Two independent ingestion paths feed one merge:
//! - the health side streams an Apple Health `export.xml` without loading it
//!   into memory ([`extract`]), normalizes units ([`units`]) and collapses
//!   readings into one row per day ([`daily`]);
//! - the strength side loads a Strong-style CSV with flexible column
//!   aliasing and reduces it to daily / per-exercise / personal-record
//!   tables ([`strength`]).
//!
//! [`merge`] outer-joins the two daily series; [`tables`] writes every
//! artifact as a flat CSV with a fixed header order.

use thiserror::Error;

pub mod daily;
pub mod extract;
pub mod merge;
pub mod strength;
pub mod tables;
pub mod timestamp;
pub mod types;
pub mod units;

/// Pipeline errors. Per-row problems never surface here: a malformed
/// record is skipped (and counted) so one bad row cannot abort a run.
#[derive(Debug, Error)]
pub enum FitlogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl FitlogError {
    /// Create a schema error from a message.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create an invalid parameter error from a message.
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, FitlogError>;
