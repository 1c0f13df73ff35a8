//! Branch merger
//!
//! Collapses all rules returning the same value into one rule whose
//! condition is the disjunction of theirs. Groups keep the position of
//! their first rule. A group that contains a catch-all becomes a catch-all.
//!
//! Merging moves later rules up to the position of their group, so the
//! result only keeps first-match semantics when the merged conditions do
//! not overlap with the groups in between.
//!
//! Return values are grouped by identity, not by Python `==`: `True` and
//! `1` compare equal but are different results, so they stay in separate
//! groups.

use tracing::warn;

use super::{Diagnostic, OptimizationPass, PassOutput};
use crate::ir::{BoolExpr, IrModel, Literal, Rule};

pub fn merge(model: &IrModel) -> IrModel {
    MergeBranches.run(model).model
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MergeBranches;

impl OptimizationPass for MergeBranches {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn run(&self, model: &IrModel) -> PassOutput {
        // (return value, index of first rule, member conditions)
        let mut groups: Vec<(&Literal, usize, Vec<&BoolExpr>)> = Vec::new();
        for (i, rule) in model.rules.iter().enumerate() {
            match groups.iter_mut().find(|(value, _, _)| **value == rule.return_value) {
                Some((_, _, members)) => members.push(&rule.condition),
                None => groups.push((&rule.return_value, i, vec![&rule.condition])),
            }
        }

        let mut diagnostics = Vec::new();
        let group_count = groups.len();
        let rules: Vec<Rule> = groups
            .into_iter()
            .enumerate()
            .map(|(position, (value, first, members))| {
                let condition = if members.iter().any(|c| c.is_true()) {
                    BoolExpr::Literal(true)
                } else {
                    BoolExpr::or(members.into_iter().cloned())
                };
                if condition.is_true() && position + 1 < group_count {
                    warn!(rule = first, value = %value, "merged catch-all shadows later rules");
                    diagnostics.push(Diagnostic::new(
                        self.name(),
                        Some(first),
                        format!(
                            "merged rule returning {value} always matches; {} later group(s) become unreachable",
                            group_count - position - 1
                        ),
                    ));
                }
                Rule::new(condition, value.clone())
            })
            .collect();

        PassOutput {
            model: model.with_rules(rules),
            diagnostics,
        }
    }
}
