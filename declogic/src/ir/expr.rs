//! Boolean condition model

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Value;

/// Comparison operators the IR understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }

    /// Logical complement: `not (a < b)` is `a >= b`
    pub fn negate(self) -> Self {
        match self {
            CompareOp::Lt => CompareOp::Ge,
            CompareOp::Le => CompareOp::Gt,
            CompareOp::Gt => CompareOp::Le,
            CompareOp::Ge => CompareOp::Lt,
            CompareOp::Eq => CompareOp::Ne,
            CompareOp::Ne => CompareOp::Eq,
        }
    }

    /// Operator with swapped operands: `k < x` is `x > k`
    pub fn mirror(self) -> Self {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
            op => op,
        }
    }

    /// Whether `left op right` holds given `left.cmp(right)`
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
        }
    }

    pub fn is_equality(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Ne)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Boolean condition guarding a rule
///
/// `Var` is a bare truth test of a name. `Opaque` keeps the source text of
/// any condition outside the supported subset; it is never evaluated.
/// The derived `Ord` is the total order used to sort normalized operands.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolExpr {
    Literal(bool),
    Var(String),
    Comparison {
        variable: String,
        op: CompareOp,
        constant: Value,
    },
    And(Vec<BoolExpr>),
    Or(Vec<BoolExpr>),
    Not(Box<BoolExpr>),
    Opaque(String),
}

impl BoolExpr {
    pub fn var(name: impl Into<String>) -> Self {
        BoolExpr::Var(name.into())
    }

    pub fn cmp(variable: impl Into<String>, op: CompareOp, constant: impl Into<Value>) -> Self {
        BoolExpr::Comparison {
            variable: variable.into(),
            op,
            constant: constant.into(),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: BoolExpr) -> Self {
        BoolExpr::Not(Box::new(expr))
    }

    /// Conjunction that splices directly nested `And`s and unwraps a single
    /// operand; an empty conjunction is `true`
    pub fn and(parts: impl IntoIterator<Item = BoolExpr>) -> Self {
        Self::join(parts, true)
    }

    /// Disjunction counterpart of [`BoolExpr::and`]; empty is `false`
    pub fn or(parts: impl IntoIterator<Item = BoolExpr>) -> Self {
        Self::join(parts, false)
    }

    fn join(parts: impl IntoIterator<Item = BoolExpr>, conjunction: bool) -> Self {
        let mut flat = Vec::new();
        for part in parts {
            match part {
                BoolExpr::And(inner) if conjunction => flat.extend(inner),
                BoolExpr::Or(inner) if !conjunction => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => BoolExpr::Literal(conjunction),
            1 => flat.pop().unwrap_or(BoolExpr::Literal(conjunction)),
            _ if conjunction => BoolExpr::And(flat),
            _ => BoolExpr::Or(flat),
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, BoolExpr::Literal(true))
    }

    pub fn is_false(&self) -> bool {
        matches!(self, BoolExpr::Literal(false))
    }

    /// Direct operands of a top-level `And`/`Or`, or the expression itself
    pub fn top_level_parts(&self) -> &[BoolExpr] {
        match self {
            BoolExpr::And(parts) | BoolExpr::Or(parts) => parts,
            other => std::slice::from_ref(other),
        }
    }

    /// Every name the condition reads, sorted
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.visit(&mut |e| match e {
            BoolExpr::Var(name) | BoolExpr::Comparison { variable: name, .. } => {
                names.insert(name.as_str());
            }
            _ => {}
        });
        names
    }

    /// Every comparison in the condition, including negated ones
    pub fn comparisons(&self) -> Vec<(&str, CompareOp, &Value)> {
        let mut out = Vec::new();
        self.visit(&mut |e| {
            if let BoolExpr::Comparison { variable, op, constant } = e {
                out.push((variable.as_str(), *op, constant));
            }
        });
        out
    }

    /// Distinct opaque condition texts in first-occurrence order
    pub fn opaque_texts(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        self.visit(&mut |e| {
            if let BoolExpr::Opaque(text) = e {
                if !out.contains(&text.as_str()) {
                    out.push(text);
                }
            }
        });
        out
    }

    /// Pre-order walk over the expression tree
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a BoolExpr)) {
        f(self);
        match self {
            BoolExpr::And(parts) | BoolExpr::Or(parts) => {
                for part in parts {
                    part.visit(f);
                }
            }
            BoolExpr::Not(inner) => inner.visit(f),
            _ => {}
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            BoolExpr::Or(_) => 1,
            BoolExpr::And(_) => 2,
            BoolExpr::Not(_) => 3,
            BoolExpr::Opaque(text) if text.contains(char::is_whitespace) => 0,
            _ => 4,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parent: u8) -> fmt::Result {
        if self.precedence() <= parent {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolExpr::Literal(true) => write!(f, "True"),
            BoolExpr::Literal(false) => write!(f, "False"),
            BoolExpr::Var(name) => write!(f, "{name}"),
            BoolExpr::Comparison { variable, op, constant } => {
                write!(f, "{variable} {op} {constant}")
            }
            BoolExpr::And(parts) | BoolExpr::Or(parts) => {
                let (sep, level) = if matches!(self, BoolExpr::And(_)) {
                    (" and ", 2)
                } else {
                    (" or ", 1)
                };
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    part.fmt_operand(f, level)?;
                }
                Ok(())
            }
            BoolExpr::Not(inner) => {
                f.write_str("not ")?;
                inner.fmt_operand(f, 2)
            }
            BoolExpr::Opaque(text) => write!(f, "{text}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_splices_nested_conjunctions() {
        let e = BoolExpr::and([
            BoolExpr::var("a"),
            BoolExpr::and([BoolExpr::var("b"), BoolExpr::var("c")]),
        ]);
        assert_eq!(
            e,
            BoolExpr::And(vec![BoolExpr::var("a"), BoolExpr::var("b"), BoolExpr::var("c")])
        );
        assert_eq!(BoolExpr::and([BoolExpr::var("a")]), BoolExpr::var("a"));
        assert_eq!(BoolExpr::and([]), BoolExpr::Literal(true));
        assert_eq!(BoolExpr::or([]), BoolExpr::Literal(false));
    }

    #[test]
    fn test_compare_op_algebra() {
        for op in [
            CompareOp::Lt,
            CompareOp::Le,
            CompareOp::Gt,
            CompareOp::Ge,
            CompareOp::Eq,
            CompareOp::Ne,
        ] {
            assert_eq!(op.negate().negate(), op);
            assert_eq!(op.mirror().mirror(), op);
            for ord in [Ordering::Less, Ordering::Equal, Ordering::Greater] {
                assert_ne!(op.holds(ord), op.negate().holds(ord));
                assert_eq!(op.holds(ord), op.mirror().holds(ord.reverse()));
            }
        }
    }

    #[test]
    fn test_display_parenthesizes_by_precedence() {
        let e = BoolExpr::and([
            BoolExpr::or([BoolExpr::var("a"), BoolExpr::var("b")]),
            BoolExpr::not(BoolExpr::cmp("cpu", CompareOp::Lt, 95)),
        ]);
        assert_eq!(e.to_string(), "(a or b) and not cpu < 95");

        let e = BoolExpr::not(BoolExpr::and([BoolExpr::var("a"), BoolExpr::var("b")]));
        assert_eq!(e.to_string(), "not (a and b)");

        let e = BoolExpr::and([BoolExpr::Opaque("f(x) or y".into()), BoolExpr::var("z")]);
        assert_eq!(e.to_string(), "(f(x) or y) and z");
    }

    #[test]
    fn test_variables_and_comparisons() {
        let e = BoolExpr::and([
            BoolExpr::var("is_question"),
            BoolExpr::not(BoolExpr::cmp("cpu", CompareOp::Lt, 95)),
            BoolExpr::Opaque("len(x) > 2".into()),
        ]);
        assert_eq!(e.variables().into_iter().collect::<Vec<_>>(), vec!["cpu", "is_question"]);
        assert_eq!(e.comparisons(), vec![("cpu", CompareOp::Lt, &Value::Int(95))]);
        assert_eq!(e.opaque_texts(), vec!["len(x) > 2"]);
    }

    #[test]
    fn test_top_level_parts() {
        let e = BoolExpr::Or(vec![BoolExpr::var("a"), BoolExpr::var("b")]);
        assert_eq!(e.top_level_parts().len(), 2);
        let single = BoolExpr::var("a");
        assert_eq!(single.top_level_parts(), &[BoolExpr::var("a")]);
    }
}
