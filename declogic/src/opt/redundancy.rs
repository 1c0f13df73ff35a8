//! Redundant rule detection
//!
//! A later rule is reported when an earlier rule returns the same value and
//! every top-level operand of the later (normalized) condition already
//! appears among the earlier rule's operands. The check is syntactic: it
//! does not consult a solver and compares operands without regard to
//! whether they are joined by `and` or `or`. Return values must be
//! identical; `True` and `1` count as different results.

use serde::Serialize;

use super::{Diagnostic, OptimizationPass, PassOutput, normalize};
use crate::ir::{BoolExpr, IrModel};

const PASS: &str = "redundancy";

/// A rule judged removable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redundancy {
    pub rule_index: usize,
    /// Earlier rule with the same return value that covers it
    pub covered_by: usize,
    pub justification: String,
}

impl Redundancy {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(PASS, Some(self.rule_index), self.justification.clone())
    }
}

/// Later rules covered by an earlier rule, ascending by index
///
/// Each rule is reported at most once, against the earliest rule that
/// covers it.
pub fn find_redundant(model: &IrModel) -> Vec<Redundancy> {
    let conditions: Vec<BoolExpr> = model.conditions().map(normalize).collect();
    let mut found = Vec::new();
    for (later, rule) in model.rules.iter().enumerate().skip(1) {
        let cover = (0..later).find(|&earlier| {
            model.rules[earlier].return_value == rule.return_value
                && covers(&conditions[earlier], &conditions[later])
        });
        if let Some(earlier) = cover {
            found.push(Redundancy {
                rule_index: later,
                covered_by: earlier,
                justification: format!(
                    "returns {} like rule {earlier}, whose condition `{}` already covers `{}`",
                    rule.return_value, conditions[earlier], conditions[later]
                ),
            });
        }
    }
    found
}

fn covers(earlier: &BoolExpr, later: &BoolExpr) -> bool {
    let earlier_parts = earlier.top_level_parts();
    later
        .top_level_parts()
        .iter()
        .all(|part| part == earlier || earlier_parts.contains(part))
}

/// Reports redundant rules without removing them
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectRedundancy;

impl OptimizationPass for DetectRedundancy {
    fn name(&self) -> &'static str {
        PASS
    }

    fn run(&self, model: &IrModel) -> PassOutput {
        PassOutput {
            model: model.clone(),
            diagnostics: find_redundant(model).iter().map(Redundancy::to_diagnostic).collect(),
        }
    }
}
