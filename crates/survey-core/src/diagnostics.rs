//! Injectable diagnostics sink.
//!
//! The planner never logs directly. Every recoverable condition, capped loop
//! and progress note is emitted as a [`Diagnostic`] to a caller-supplied sink.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warn,
    Error,
}

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Line spacing below the practical minimum
    LowSpacing,
    /// Photo spacing below the practical minimum
    LowPhotoInterval,
    /// Camera minimum interval widened the photo spacing
    CameraIntervalLimited,
    /// Line count per strip was capped
    LineCapApplied,
    /// A strip produced no flight lines
    StripSkipped,
    /// Strip iteration cap reached before the AOI was covered
    StripCapReached,
    /// A single line already exceeds the mission budget
    UnsplittableStrip,
    /// Adjacent missions were merged
    MissionsMerged,
    /// A mission over budget was split
    MissionSplit,
    /// Whole-AOI fallback mission attempted
    FallbackMission,
    /// Missions beyond the mission cap were dropped
    MissionCapReached,
    /// A candidate heading produced no missions
    HeadingFailed,
    /// No candidate heading produced any missions
    NoCoverage,
    HeadingEvaluated,
    PlanSelected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Receiver for planner diagnostics. Shared across candidate headings, so it
/// must be thread-safe.
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);

    fn info(&self, kind: DiagnosticKind, message: String) {
        self.emit(Diagnostic {
            level: DiagnosticLevel::Info,
            kind,
            message,
        });
    }

    fn warn(&self, kind: DiagnosticKind, message: String) {
        self.emit(Diagnostic {
            level: DiagnosticLevel::Warn,
            kind,
            message,
        });
    }

    fn error(&self, kind: DiagnosticKind, message: String) {
        self.emit(Diagnostic {
            level: DiagnosticLevel::Error,
            kind,
            message,
        });
    }
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        let kind = format!("{:?}", diagnostic.kind);
        match diagnostic.level {
            DiagnosticLevel::Info => tracing::info!(kind = %kind, "{}", diagnostic.message),
            DiagnosticLevel::Warn => tracing::warn!(kind = %kind, "{}", diagnostic.message),
            DiagnosticLevel::Error => tracing::error!(kind = %kind, "{}", diagnostic.message),
        }
    }
}

/// Drops every diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn emit(&self, _diagnostic: Diagnostic) {}
}

/// Records diagnostics in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.events().iter().filter(|event| event.kind == kind).count()
    }
}

impl DiagnosticsSink for CollectingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        if let Ok(mut events) = self.events.lock() {
            events.push(diagnostic);
        }
    }
}
