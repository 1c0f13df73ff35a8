//! Condition simplifier
//!
//! Rewrites every condition into a canonical negation normal form:
//! negations pushed down to names and opaque leaves, nested `and`/`or`
//! flattened, `True`/`False` operands folded, duplicates removed, operands
//! sorted. The rewrite is idempotent and preserves truth value on every
//! assignment where the original is evaluable.

use super::{Diagnostic, OptimizationPass, PassOutput};
use crate::ir::{BoolExpr, IrModel, Rule};

/// Canonical form of `expr`
pub fn normalize(expr: &BoolExpr) -> BoolExpr {
    fold(push_negation(expr, false))
}

fn push_negation(expr: &BoolExpr, negated: bool) -> BoolExpr {
    match expr {
        BoolExpr::Literal(b) => BoolExpr::Literal(*b != negated),
        BoolExpr::Comparison { variable, op, constant } => BoolExpr::Comparison {
            variable: variable.clone(),
            op: if negated { op.negate() } else { *op },
            constant: constant.clone(),
        },
        BoolExpr::And(parts) | BoolExpr::Or(parts) => {
            let parts = parts.iter().map(|p| push_negation(p, negated)).collect();
            // De Morgan
            if matches!(expr, BoolExpr::And(_)) != negated {
                BoolExpr::And(parts)
            } else {
                BoolExpr::Or(parts)
            }
        }
        BoolExpr::Not(inner) => push_negation(inner, !negated),
        leaf @ (BoolExpr::Var(_) | BoolExpr::Opaque(_)) => {
            if negated {
                BoolExpr::not(leaf.clone())
            } else {
                leaf.clone()
            }
        }
    }
}

fn fold(expr: BoolExpr) -> BoolExpr {
    match expr {
        BoolExpr::And(parts) => fold_junction(parts, true),
        BoolExpr::Or(parts) => fold_junction(parts, false),
        other => other,
    }
}

/// Fold a conjunction (`unit == true`) or disjunction (`unit == false`)
fn fold_junction(parts: Vec<BoolExpr>, unit: bool) -> BoolExpr {
    let mut flat = Vec::with_capacity(parts.len());
    for part in parts {
        match fold(part) {
            BoolExpr::Literal(b) if b == unit => {}
            BoolExpr::Literal(b) => return BoolExpr::Literal(b),
            BoolExpr::And(inner) if unit => flat.extend(inner),
            BoolExpr::Or(inner) if !unit => flat.extend(inner),
            other => flat.push(other),
        }
    }
    flat.sort();
    flat.dedup();
    match flat.len() {
        0 => BoolExpr::Literal(unit),
        1 => flat.swap_remove(0),
        _ if unit => BoolExpr::And(flat),
        _ => BoolExpr::Or(flat),
    }
}

/// `model` with every condition except a bare catch-all normalized
pub fn simplify(model: &IrModel) -> IrModel {
    Simplify.run(model).model
}

/// Normalizes every rule condition
#[derive(Debug, Clone, Copy, Default)]
pub struct Simplify;

impl OptimizationPass for Simplify {
    fn name(&self) -> &'static str {
        "simplify"
    }

    fn run(&self, model: &IrModel) -> PassOutput {
        let mut diagnostics = Vec::new();
        let mut shadowing_reported = false;
        let last = model.rules.len().saturating_sub(1);
        let rules = model
            .rules
            .iter()
            .enumerate()
            .map(|(i, rule)| {
                let condition = normalize(&rule.condition);
                if condition.is_false() {
                    diagnostics.push(Diagnostic::new(
                        self.name(),
                        Some(i),
                        format!("condition `{}` is never true", rule.condition),
                    ));
                } else if condition.is_true() && i < last && !shadowing_reported {
                    shadowing_reported = true;
                    diagnostics.push(Diagnostic::new(
                        self.name(),
                        Some(i),
                        format!("condition `{}` is always true; later rules are unreachable", rule.condition),
                    ));
                }
                Rule::new(condition, rule.return_value.clone())
            })
            .collect();
        PassOutput {
            model: model.with_rules(rules),
            diagnostics,
        }
    }
}
