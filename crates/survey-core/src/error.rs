//! Caller-visible planning errors.

use thiserror::Error;

/// Errors returned by the planner.
///
/// Only invalid input is reported here. Degenerate strips, empty headings and
/// capped loops are absorbed internally and surface as diagnostics instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// Ground sample distance outside the supported range.
    #[error("GSD {gsd_cm} cm/px is outside the supported range [{min}, {max}] cm/px")]
    InvalidGsd { gsd_cm: f64, min: f64, max: f64 },

    /// A request parameter failed validation.
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    /// The area of interest is not a usable polygon.
    #[error("invalid polygon: {0}")]
    InvalidPolygon(String),

    /// No candidate heading produced a single flyable mission.
    #[error("no flight lines could be generated for headings {headings:?}")]
    NoCoverage { headings: Vec<f64> },
}

impl PlanError {
    pub(crate) fn parameter(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlanError>;
