//! Conditional restriction values (`<value> @ (<date-range>)`)
//!
//! The evaluator never fails: malformed and multi-clause expressions resolve through
//! the configured [`ConditionalPolicy`] and are reported to the diagnostics sink.

pub mod date_range;

pub use date_range::{check_condition, ConditionState, DateRange, DateRangeError};

use crate::diagnostics::{Diagnostic, DiagnosticKind, SharedSink};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Separator between clauses of a multi-condition value
pub const CLAUSE_SEPARATOR: char = ';';

/// What an expression that cannot be evaluated means for the edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionalPolicy {
    /// Treat as "condition does not hold" (edge stays routable)
    #[default]
    FailOpen,
    /// Treat as "condition holds" (edge gets restricted)
    FailClosed,
}

impl ConditionalPolicy {
    pub fn resolve(self) -> bool {
        matches!(self, ConditionalPolicy::FailClosed)
    }
}

/// Outcome of checking one date expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Holds,
    DoesNotHold,
    /// Nothing to check
    Empty,
    /// Several `;`-joined clauses, not supported
    MultiClause,
    Invalid(DateRangeError),
}

/// Split `no @ (Oct-May)` into (`no`, `(Oct-May)`), both trimmed
///
/// Returns `None` unless the value has exactly one `@`.
pub fn split_conditional(value: &str) -> Option<(&str, &str)> {
    let mut parts = value.split('@');
    let restriction = parts.next()?;
    let condition = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((restriction.trim(), condition.trim()))
}

/// Checks date expressions against a fixed reference date
#[derive(Clone)]
pub struct DateRangeEvaluator {
    reference: NaiveDate,
    policy: ConditionalPolicy,
    sink: SharedSink,
}

impl std::fmt::Debug for DateRangeEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DateRangeEvaluator")
            .field("reference", &self.reference)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl DateRangeEvaluator {
    pub fn new(reference: NaiveDate, policy: ConditionalPolicy, sink: SharedSink) -> Self {
        Self {
            reference,
            policy,
            sink,
        }
    }

    /// Reference date is today (local time)
    pub fn today(policy: ConditionalPolicy, sink: SharedSink) -> Self {
        Self::new(chrono::Local::now().date_naive(), policy, sink)
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference
    }

    pub fn policy(&self) -> ConditionalPolicy {
        self.policy
    }

    /// Check against the reference date
    pub fn check(&self, expr: &str) -> Verdict {
        self.check_at(expr, self.reference)
    }

    /// Check against an arbitrary date; no diagnostics, no policy
    pub fn check_at(&self, expr: &str, date: NaiveDate) -> Verdict {
        if expr.trim().is_empty() {
            return Verdict::Empty;
        }
        if expr.contains(CLAUSE_SEPARATOR) {
            return Verdict::MultiClause;
        }
        let cleaned = expr.replace(['(', ')'], " ");
        match DateRange::parse(cleaned.trim()) {
            Ok(range) if range.contains(date) => Verdict::Holds,
            Ok(_) => Verdict::DoesNotHold,
            Err(err) => Verdict::Invalid(err),
        }
    }

    /// Whether the condition holds today, resolving failures through the policy
    pub fn is_in_range(&self, expr: &str, edge_id: Option<u32>) -> bool {
        match self.check(expr) {
            Verdict::Holds => true,
            Verdict::DoesNotHold | Verdict::Empty => false,
            Verdict::MultiClause => {
                self.report_multi_clause(expr, edge_id);
                self.policy.resolve()
            }
            Verdict::Invalid(err) => {
                self.sink.report(
                    Diagnostic::new(
                        DiagnosticKind::UnparsableConditional,
                        format!("cannot evaluate '{expr}': {err}"),
                    )
                    .for_edge(edge_id),
                );
                self.policy.resolve()
            }
        }
    }

    /// Report a value whose clauses cannot be evaluated individually
    pub fn report_multi_clause(&self, value: &str, edge_id: Option<u32>) {
        self.sink.report(
            Diagnostic::new(
                DiagnosticKind::MultiClauseConditional,
                format!("multi-clause conditional '{value}' is not supported"),
            )
            .for_edge(edge_id),
        );
    }
}
