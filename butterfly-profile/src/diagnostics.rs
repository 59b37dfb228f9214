//! Diagnostics sinks
//!
//! Bad input data never aborts an import: parsers and the conditional date evaluator
//! resolve to a safe default and report what they skipped here. The sink is handed to
//! each component at construction time; there is no process-wide logger state.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// What kind of problem a diagnostic describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Conditional value with several `;`-joined clauses (not supported)
    MultiClauseConditional,
    /// Conditional date expression that could not be parsed or is invalid
    UnparsableConditional,
    /// Tag value that could not be interpreted (e.g. `maxspeed=fast`)
    MalformedTag,
    /// Custom model validation issue (fatal at compile time, also reported here)
    ModelIssue,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::MultiClauseConditional => "multi_clause_conditional",
            DiagnosticKind::UnparsableConditional => "unparsable_conditional",
            DiagnosticKind::MalformedTag => "malformed_tag",
            DiagnosticKind::ModelIssue => "model_issue",
        }
    }
}

/// A structured warning
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Edge being parsed, if the diagnostic came from the tag pipeline
    pub edge_id: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            edge_id: None,
            message: message.into(),
        }
    }

    pub fn for_edge(mut self, edge_id: Option<u32>) -> Self {
        self.edge_id = edge_id;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.edge_id {
            Some(edge) => write!(f, "[{}] edge {}: {}", self.kind.as_str(), edge, self.message),
            None => write!(f, "[{}] {}", self.kind.as_str(), self.message),
        }
    }
}

/// Receives diagnostics; shared across parser worker threads
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Shared handle to a sink
pub type SharedSink = Arc<dyn DiagnosticSink>;

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}

/// Forwards diagnostics as structured `tracing` warnings
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::warn!(
            kind = diagnostic.kind.as_str(),
            edge_id = diagnostic.edge_id,
            "{}",
            diagnostic.message
        );
    }
}

/// Keeps every diagnostic in memory (batch imports, tests)
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.lock().iter().filter(|d| d.kind == kind).count()
    }

    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Drain collected diagnostics
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}

/// Sink used when the caller does not care
pub fn null_sink() -> SharedSink {
    Arc::new(NullSink)
}
