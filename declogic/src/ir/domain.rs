//! Parameter domain inference and sampling
//!
//! Domains come from three sources, strongest first: a type annotation, the
//! kind of the default value, then how the rules use the name. Integer ranges
//! are derived from the comparison thresholds found in the rules.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BoolExpr, CompareOp, Value};

/// Lower bound assumed when no `>`/`>=` threshold exists
pub const DEFAULT_MIN: i64 = 0;
/// Upper bound assumed when no `<`/`<=` threshold exists
pub const DEFAULT_MAX: i64 = 100;

const BOOLEAN_PREFIXES: &[&str] = &["is_", "has_", "can_", "should_"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Domain {
    Boolean,
    IntegerRange { min: i64, max: i64 },
    Opaque,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Boolean => write!(f, "bool"),
            Domain::IntegerRange { min, max } => write!(f, "int[{min}..={max}]"),
            Domain::Opaque => write!(f, "opaque"),
        }
    }
}

/// Integer thresholds a name is compared against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Thresholds {
    /// Constants of `x > k` / `x >= k`
    pub lower: Vec<i64>,
    /// Constants of `x < k` / `x <= k`
    pub upper: Vec<i64>,
    /// Constants of `x == k` / `x != k`
    pub exact: Vec<i64>,
}

impl Thresholds {
    pub fn collect<'a>(name: &str, conditions: impl IntoIterator<Item = &'a BoolExpr>) -> Self {
        let mut out = Thresholds::default();
        for condition in conditions {
            for (variable, op, constant) in condition.comparisons() {
                if variable != name {
                    continue;
                }
                let Value::Int(k) = constant else { continue };
                match op {
                    CompareOp::Gt | CompareOp::Ge => out.lower.push(*k),
                    CompareOp::Lt | CompareOp::Le => out.upper.push(*k),
                    CompareOp::Eq | CompareOp::Ne => out.exact.push(*k),
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty() && self.upper.is_empty() && self.exact.is_empty()
    }

    /// Every threshold, sorted and deduplicated
    pub fn all(&self) -> BTreeSet<i64> {
        self.lower
            .iter()
            .chain(&self.upper)
            .chain(&self.exact)
            .copied()
            .collect()
    }

    /// Bounding range: the tightest lower threshold to the loosest upper
    /// one, widened to cover equality constants
    pub fn range(&self) -> (i64, i64) {
        let lo = self.lower.iter().min().copied();
        let hi = self.upper.iter().max().copied();
        let (mut min, mut max) = match (lo, hi) {
            (Some(lo), Some(hi)) => (lo, hi),
            (Some(lo), None) => (lo, DEFAULT_MAX.max(lo)),
            (None, Some(hi)) => (DEFAULT_MIN.min(hi), hi),
            (None, None) => (DEFAULT_MIN, DEFAULT_MAX),
        };
        for &k in &self.exact {
            min = min.min(k);
            max = max.max(k);
        }
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        (min, max)
    }
}

/// Whether the name reads like a predicate (`is_ready`, `has_items`, ...)
pub fn is_boolean_name(name: &str) -> bool {
    BOOLEAN_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Infer the domain of `name` from its declaration and the rule conditions
pub fn infer<'a>(
    name: &str,
    annotation: Option<&str>,
    default: Option<&Value>,
    conditions: impl IntoIterator<Item = &'a BoolExpr> + Clone,
) -> Domain {
    let integer = || {
        let (min, max) = Thresholds::collect(name, conditions.clone()).range();
        Domain::IntegerRange { min, max }
    };
    match annotation {
        Some("bool") => return Domain::Boolean,
        Some("int") => return integer(),
        _ => {}
    }
    match default {
        Some(Value::Bool(_)) => return Domain::Boolean,
        Some(Value::Int(_)) => return integer(),
        _ => {}
    }
    if is_boolean_name(name) {
        return Domain::Boolean;
    }
    let usage = Usage::scan(name, conditions.clone());
    if usage.int_compared {
        integer()
    } else if usage.bool_compared || usage.truth_tested {
        Domain::Boolean
    } else {
        Domain::Opaque
    }
}

/// How the rules use a name
#[derive(Debug, Default)]
pub(crate) struct Usage {
    pub int_compared: bool,
    pub bool_compared: bool,
    pub truth_tested: bool,
}

impl Usage {
    pub(crate) fn scan<'a>(name: &str, conditions: impl IntoIterator<Item = &'a BoolExpr>) -> Self {
        let mut usage = Usage::default();
        for condition in conditions {
            condition.visit(&mut |e| match e {
                BoolExpr::Var(v) if v == name => usage.truth_tested = true,
                BoolExpr::Comparison { variable, constant, .. } if variable == name => {
                    match constant {
                        Value::Int(_) => usage.int_compared = true,
                        Value::Bool(_) => usage.bool_compared = true,
                        _ => {}
                    }
                }
                _ => {}
            });
        }
        usage
    }
}

/// Representative values of an integer domain
///
/// The whole range is enumerated when it spans at most `size_cutoff`
/// values beyond its minimum; otherwise only its bounds are kept, plus
/// `t - 1`, `t` and `t + 1` for every threshold `t`. Nothing outside
/// `[min, max]` is ever produced.
pub fn sample_integers(min: i64, max: i64, thresholds: &Thresholds, size_cutoff: usize) -> Vec<i64> {
    let mut values = BTreeSet::new();
    let width = i128::from(max) - i128::from(min);
    if width <= size_cutoff as i128 {
        values.extend(min..=max);
    } else {
        values.insert(min);
        values.insert(max);
        for t in thresholds.all() {
            values.extend(
                [t.saturating_sub(1), t, t.saturating_add(1)]
                    .into_iter()
                    .filter(|v| (min..=max).contains(v)),
            );
        }
    }
    values.into_iter().collect()
}

/// Representative values of any parameter domain
pub fn sample<'a>(
    name: &str,
    domain: &Domain,
    conditions: impl IntoIterator<Item = &'a BoolExpr>,
    size_cutoff: usize,
) -> Vec<Value> {
    match domain {
        Domain::Boolean => vec![Value::Bool(true), Value::Bool(false)],
        Domain::IntegerRange { min, max } => {
            let thresholds = Thresholds::collect(name, conditions);
            sample_integers(*min, *max, &thresholds, size_cutoff)
                .into_iter()
                .map(Value::Int)
                .collect()
        }
        Domain::Opaque => vec![
            Value::None,
            Value::Int(0),
            Value::Int(1),
            Value::Str(String::new()),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lt(name: &str, k: i64) -> BoolExpr {
        BoolExpr::cmp(name, CompareOp::Lt, k)
    }

    #[test]
    fn test_range_from_upper_threshold_only() {
        let conds = [lt("cpu", 95)];
        let th = Thresholds::collect("cpu", &conds);
        assert_eq!(th.range(), (0, 95));
    }

    #[test]
    fn test_range_from_both_sides_and_equality() {
        let conds = [
            BoolExpr::cmp("x", CompareOp::Gt, 10),
            BoolExpr::not(lt("x", 50)),
            BoolExpr::cmp("x", CompareOp::Eq, 70),
        ];
        let th = Thresholds::collect("x", &conds);
        assert_eq!(th.range(), (10, 70));
        assert_eq!(th.all().into_iter().collect::<Vec<_>>(), vec![10, 50, 70]);
    }

    #[test]
    fn test_range_lower_threshold_above_default_max() {
        let conds = [BoolExpr::cmp("x", CompareOp::Ge, 500)];
        assert_eq!(Thresholds::collect("x", &conds).range(), (500, 500));
        let conds = [lt("x", -20)];
        assert_eq!(Thresholds::collect("x", &conds).range(), (-20, -20));
    }

    #[test]
    fn test_inverted_thresholds_are_swapped() {
        let conds = [BoolExpr::cmp("x", CompareOp::Gt, 80), lt("x", 20)];
        assert_eq!(Thresholds::collect("x", &conds).range(), (20, 80));
    }

    #[test]
    fn test_infer_precedence() {
        let conds = [lt("count", 5), BoolExpr::var("flag")];
        assert_eq!(infer("count", Some("bool"), None, &conds), Domain::Boolean);
        assert_eq!(
            infer("n", None, Some(&Value::Int(3)), &conds),
            Domain::IntegerRange { min: 0, max: 100 }
        );
        assert_eq!(infer("is_open", None, None, &conds), Domain::Boolean);
        assert_eq!(
            infer("count", None, None, &conds),
            Domain::IntegerRange { min: 0, max: 5 }
        );
        assert_eq!(infer("flag", None, None, &conds), Domain::Boolean);
        assert_eq!(infer("payload", None, None, &conds), Domain::Opaque);
    }

    #[test]
    fn test_sample_enumerates_small_ranges() {
        let th = Thresholds {
            upper: vec![95],
            ..Thresholds::default()
        };
        let values = sample_integers(0, 95, &th, 100);
        assert_eq!(values.first(), Some(&0));
        assert_eq!(values.last(), Some(&95));
        assert_eq!(values.len(), 96);
    }

    #[test]
    fn test_sample_stays_inside_declared_range() {
        let th = Thresholds {
            lower: vec![50],
            ..Thresholds::default()
        };
        assert_eq!(sample_integers(0, 10, &th, 100), (0..=10).collect::<Vec<_>>());
        assert_eq!(sample_integers(0, 1000, &th, 100), vec![0, 49, 50, 51, 1000]);
        assert_eq!(sample_integers(60, 1000, &th, 10), vec![60, 1000]);
    }

    #[test]
    fn test_sample_wide_range_keeps_bounds_and_neighbours() {
        let th = Thresholds {
            lower: vec![10],
            upper: vec![1000],
            ..Thresholds::default()
        };
        assert_eq!(sample_integers(10, 1000, &th, 100), vec![10, 11, 999, 1000]);
    }

    #[test]
    fn test_sample_neighbours_saturate() {
        let th = Thresholds {
            exact: vec![i64::MAX],
            ..Thresholds::default()
        };
        let values = sample_integers(0, i64::MAX, &th, 100);
        assert_eq!(values, vec![0, i64::MAX - 1, i64::MAX]);
    }

    #[test]
    fn test_sample_boolean_and_opaque() {
        let none: [BoolExpr; 0] = [];
        assert_eq!(
            sample("b", &Domain::Boolean, &none, 100),
            vec![Value::Bool(true), Value::Bool(false)]
        );
        assert_eq!(sample("o", &Domain::Opaque, &none, 100).len(), 4);
    }
}
