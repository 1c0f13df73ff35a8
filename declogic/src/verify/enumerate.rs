//! Exhaustive in-process checker
//!
//! Evaluates the decision on every admissible assignment. Only finite
//! domains can be enumerated: booleans, bounded ranges and value sets. An
//! obligation with an unbounded or oversized domain is reported as unknown.

use std::time::Instant;

use tracing::debug;

use super::Counterexample;
use super::obligation::{Constraint, ProofObligation, Sort};
use super::solver::{Budget, Solver, SolverError, Verdict};
use crate::ir::{Env, Value};

pub const DEFAULT_ENUMERATION_LIMIT: u64 = 1_000_000;

/// Cancellation and deadline are polled once per this many assignments
const CHECK_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Copy)]
pub struct EnumerationSolver {
    limit: u64,
}

impl Default for EnumerationSolver {
    fn default() -> Self {
        Self::new(DEFAULT_ENUMERATION_LIMIT)
    }
}

impl EnumerationSolver {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    /// Admissible values of every variable, or why there is no finite set
    fn domains(&self, obligation: &ProofObligation) -> Result<Vec<Vec<Value>>, String> {
        let mut total: u128 = 1;
        let mut domains = Vec::with_capacity(obligation.variables.len());
        for variable in &obligation.variables {
            let constraint = obligation.constraints.get(&variable.name);
            let size: u128 = match (variable.sort, constraint) {
                (Sort::Bool, _) => 2,
                (Sort::Int, Some(Constraint::Range { min: Some(lo), max: Some(hi) })) => {
                    u128::try_from(i128::from(*hi) - i128::from(*lo) + 1).unwrap_or(0)
                }
                (Sort::Int, Some(Constraint::OneOf { values })) => values.len() as u128,
                (Sort::Int, _) => {
                    return Err(format!(
                        "`{}` has no finite domain; constrain it with a bounded range or a value set",
                        variable.name
                    ));
                }
            };
            total = total.saturating_mul(size);
            if total > u128::from(self.limit) {
                return Err(format!(
                    "more than {} assignments to enumerate",
                    self.limit
                ));
            }
            let values = match (variable.sort, constraint) {
                (Sort::Bool, _) => vec![Value::Bool(false), Value::Bool(true)],
                (_, Some(Constraint::Range { min: Some(lo), max: Some(hi) })) => {
                    (*lo..=*hi).map(Value::Int).collect()
                }
                (_, Some(Constraint::OneOf { values })) => values.iter().copied().map(Value::Int).collect(),
                _ => Vec::new(),
            };
            domains.push(values);
        }
        Ok(domains)
    }
}

impl Solver for EnumerationSolver {
    fn name(&self) -> &'static str {
        "enumerate"
    }

    fn check(&self, obligation: &ProofObligation, budget: &Budget) -> Result<Verdict, SolverError> {
        let domains = match self.domains(obligation) {
            Ok(domains) => domains,
            Err(reason) => return Ok(Verdict::Unknown(reason)),
        };
        // an empty domain admits no assignment at all
        if domains.iter().any(Vec::is_empty) {
            return Ok(Verdict::Valid);
        }

        let start = Instant::now();
        let deadline = budget.deadline_from(start);
        let names: Vec<String> = obligation.variables.iter().map(|v| v.name.clone()).collect();
        let mut digits = vec![0usize; domains.len()];
        let mut checked: u64 = 0;
        loop {
            if checked % CHECK_INTERVAL == 0 && checked > 0 {
                if budget.cancel.is_cancelled() {
                    return Err(SolverError::Cancelled);
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return Err(SolverError::Timeout);
                }
            }
            let values: Vec<Value> = domains.iter().zip(&digits).map(|(d, &i)| d[i].clone()).collect();
            let env = Env::zip(&names, &values);
            match obligation.decision.eval(&env) {
                Ok(output) if obligation.is_valid_output(output) => {}
                Ok(output) => {
                    debug!(checked, output = %output, "found violating assignment");
                    let assignment = obligation
                        .variables
                        .iter()
                        .zip(&values)
                        .filter(|(v, _)| v.parameter)
                        .map(|(v, value)| (v.name.clone(), value.clone()))
                        .collect();
                    return Ok(Verdict::Invalid(Counterexample::new(assignment)));
                }
                Err(e) => return Ok(Verdict::Unknown(format!("cannot evaluate decision: {e}"))),
            }
            checked += 1;
            if !advance(&mut digits, &domains) {
                break;
            }
        }
        debug!(checked, elapsed_ms = start.elapsed().as_millis() as u64, "enumeration complete");
        Ok(Verdict::Valid)
    }
}

fn advance(digits: &mut [usize], domains: &[Vec<Value>]) -> bool {
    for i in (0..digits.len()).rev() {
        digits[i] += 1;
        if digits[i] < domains[i].len() {
            return true;
        }
        digits[i] = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::ir::{BoolExpr, CompareOp, IrModel, Literal, Parameter, Rule};

    fn gate() -> IrModel {
        IrModel::new(
            "gate",
            vec![Parameter::integer("level", 0, 10), Parameter::boolean("is_admin")],
            vec![
                Rule::new(BoolExpr::var("is_admin"), Literal::str("allow")),
                Rule::new(BoolExpr::cmp("level", CompareOp::Ge, 5), Literal::str("allow")),
                Rule::new(BoolExpr::Literal(true), Literal::str("deny")),
            ],
        )
    }

    fn check(model: &IrModel, constraints: BTreeMap<String, Constraint>, valid: &[Literal]) -> Verdict {
        let ob = ProofObligation::new(model, &constraints, valid).unwrap();
        EnumerationSolver::default().check(&ob, &Budget::default()).unwrap()
    }

    #[test]
    fn test_enumeration_proves() {
        let constraints = BTreeMap::from([("level".to_string(), Constraint::range(0, 10))]);
        let verdict = check(&gate(), constraints, &[Literal::str("allow"), Literal::str("deny")]);
        assert_eq!(verdict, Verdict::Valid);
    }

    #[test]
    fn test_enumeration_finds_first_violation() {
        let constraints = BTreeMap::from([("level".to_string(), Constraint::range(3, 10))]);
        let Verdict::Invalid(cex) = check(&gate(), constraints, &[Literal::str("allow")]) else {
            panic!("expected counterexample");
        };
        assert_eq!(cex.get("level"), Some(&Value::Int(3)));
        assert_eq!(cex.get("is_admin"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_enumeration_unbounded_is_unknown() {
        let verdict = check(&gate(), BTreeMap::new(), &[Literal::str("allow")]);
        assert!(matches!(verdict, Verdict::Unknown(reason) if reason.contains("`level`")));
    }

    #[test]
    fn test_enumeration_limit() {
        let constraints = BTreeMap::from([("level".to_string(), Constraint::range(0, 1_000_000))]);
        let ob = ProofObligation::new(&gate(), &constraints, &[]).unwrap();
        let verdict = EnumerationSolver::new(1000).check(&ob, &Budget::default()).unwrap();
        assert!(matches!(verdict, Verdict::Unknown(reason) if reason.contains("1000")));
    }

    #[test]
    fn test_enumeration_empty_range_is_vacuous() {
        let constraints = BTreeMap::from([("level".to_string(), Constraint::range(5, 1))]);
        assert_eq!(check(&gate(), constraints, &[]), Verdict::Valid);
    }

    #[test]
    fn test_enumeration_value_set_and_cancel() {
        let constraints = BTreeMap::from([("level".to_string(), Constraint::one_of(0..5000))]);
        let ob = ProofObligation::new(&gate(), &constraints, &[Literal::str("allow"), Literal::str("deny")]).unwrap();
        let budget = Budget::default();
        budget.cancel.cancel();
        let err = EnumerationSolver::default().check(&ob, &budget).unwrap_err();
        assert!(matches!(err, SolverError::Cancelled));
    }
}
