//! Restricted interpreter for rule conditions
//!
//! Evaluates a [`BoolExpr`] against concrete parameter values with Python
//! semantics: truthiness for bare names, `bool` coerced to `int` in
//! comparisons, unequal kinds never equal, short-circuiting `and`/`or`
//! whose result does not depend on operand order.
//! Anything outside that subset is an [`EvaluationError`], never a guess.

use thiserror::Error;

use super::{BoolExpr, CompareOp, Rule, Value};

/// Why a condition could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("name `{0}` is not bound")]
    UnknownName(String),
    #[error("cannot order {left} ({}) and {right} ({}) with `{op}`", .left.kind(), .right.kind())]
    Incomparable {
        left: Value,
        op: CompareOp,
        right: Value,
    },
    #[error("cannot evaluate opaque condition `{0}`")]
    Unsupported(String),
}

/// Name bindings for one evaluation
#[derive(Debug, Clone, Default)]
pub struct Env<'a> {
    bindings: Vec<(&'a str, &'a Value)>,
}

impl<'a> Env<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair names with values positionally
    pub fn zip(names: &'a [String], values: &'a [Value]) -> Self {
        Self {
            bindings: names.iter().map(String::as_str).zip(values).collect(),
        }
    }

    pub fn bind(&mut self, name: &'a str, value: &'a Value) {
        self.bindings.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }
}

pub fn eval(expr: &BoolExpr, env: &Env<'_>) -> Result<bool, EvaluationError> {
    match expr {
        BoolExpr::Literal(b) => Ok(*b),
        BoolExpr::Var(name) => lookup(name, env).map(Value::truthy),
        BoolExpr::Comparison { variable, op, constant } => {
            compare(lookup(variable, env)?, *op, constant)
        }
        BoolExpr::And(parts) => junction(parts, env, false),
        BoolExpr::Or(parts) => junction(parts, env, true),
        BoolExpr::Not(inner) => eval(inner, env).map(|b| !b),
        BoolExpr::Opaque(text) => Err(EvaluationError::Unsupported(text.clone())),
    }
}

/// `and` (`decisive == false`) or `or` (`decisive == true`)
///
/// An operand that evaluates to `decisive` settles the result wherever it
/// sits; an operand error only surfaces when no operand settles it. This
/// agrees with Python's left-to-right short-circuit on every input Python
/// answers, and makes the result independent of operand order.
fn junction(parts: &[BoolExpr], env: &Env<'_>, decisive: bool) -> Result<bool, EvaluationError> {
    let mut first_error = None;
    for part in parts {
        match eval(part, env) {
            Ok(b) if b == decisive => return Ok(decisive),
            Ok(_) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(!decisive),
    }
}

/// `left op right` under Python comparison rules
pub fn compare(left: &Value, op: CompareOp, right: &Value) -> Result<bool, EvaluationError> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return Ok(op.holds(a.cmp(&b)));
    }
    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        return Ok(op.holds(a.cmp(b)));
    }
    match op {
        CompareOp::Eq => Ok(left == right),
        CompareOp::Ne => Ok(left != right),
        _ => Err(EvaluationError::Incomparable {
            left: left.clone(),
            op,
            right: right.clone(),
        }),
    }
}

/// Index of the first rule whose condition holds
///
/// An error in any rule consulted before the match aborts the search, since
/// the real function would not have got past it either.
pub fn first_match(rules: &[Rule], env: &Env<'_>) -> Result<Option<usize>, EvaluationError> {
    for (index, rule) in rules.iter().enumerate() {
        if eval(&rule.condition, env)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

fn lookup<'a>(name: &str, env: &Env<'a>) -> Result<&'a Value, EvaluationError> {
    env.get(name)
        .ok_or_else(|| EvaluationError::UnknownName(name.to_string()))
}
