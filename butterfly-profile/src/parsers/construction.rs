//! Time-windowed construction restrictions
//!
//! `access:conditional = no @ (Oct-May)` marks the edge restricted while the reference
//! date falls inside the window. When the way carries node tags only the nodes are
//! checked; otherwise the way's own tags are. The first matching node wins.

use super::ParseContext;
use crate::conditional::{split_conditional, DateRangeEvaluator, CLAUSE_SEPARATOR};
use crate::ev::{Direction, EvHandle};
use crate::tags::TagMap;

/// Conditional keys that can close an edge
pub const CONDITIONAL_KEYS: [&str; 4] = [
    "access:conditional",
    "vehicle:conditional",
    "motor_vehicle:conditional",
    "motorcar:conditional",
];

/// Restriction value the parser reacts to
const RESTRICTION: &str = "no";

#[derive(Debug, Clone)]
pub struct ConstructionRestrictionParser {
    pub(crate) restricted: EvHandle,
    evaluator: DateRangeEvaluator,
}

impl ConstructionRestrictionParser {
    pub fn new(restricted: EvHandle, evaluator: DateRangeEvaluator) -> Self {
        Self { restricted, evaluator }
    }

    pub fn evaluator(&self) -> &DateRangeEvaluator {
        &self.evaluator
    }

    /// Whether one conditional value restricts the edge today
    pub fn is_restricted(&self, value: &str, edge_id: Option<u32>) -> bool {
        if value.contains(CLAUSE_SEPARATOR) {
            let restricts = value
                .split(CLAUSE_SEPARATOR)
                .filter_map(split_conditional)
                .any(|(restriction, _)| restriction == RESTRICTION);
            if restricts {
                self.evaluator.report_multi_clause(value, edge_id);
                return self.evaluator.policy().resolve();
            }
            return false;
        }
        match split_conditional(value) {
            Some((RESTRICTION, condition)) => self.evaluator.is_in_range(condition, edge_id),
            _ => false,
        }
    }

    fn check<'a>(&self, lookup: impl Fn(&str) -> Option<&'a str>, edge_id: u32) -> bool {
        CONDITIONAL_KEYS
            .iter()
            .filter_map(|&key| lookup(key))
            .any(|value| self.is_restricted(value, Some(edge_id)))
    }

    fn check_node(&self, node: &TagMap, edge_id: u32) -> bool {
        self.check(|key| node.get(key).map(String::as_str), edge_id)
    }

    pub(crate) fn handle(&self, ctx: &ParseContext<'_>, flags: &mut [u32]) {
        let restricted = match ctx.way.node_tags() {
            Some(nodes) => nodes.iter().any(|node| self.check_node(node, ctx.edge_id)),
            None => self.check(|key| ctx.way.get_str(key), ctx.edge_id),
        };
        if restricted {
            ctx.check(
                "conditional",
                self.restricted.set_bool(flags, Direction::Forward, true),
            );
        }
    }
}
