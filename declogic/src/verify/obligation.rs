//! Proof obligations
//!
//! An obligation states: for every assignment of the parameters that
//! satisfies the domain constraints, the decision function returns one of
//! the valid outputs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::ir::domain::Usage;
use crate::ir::eval::{self, EvaluationError};
use crate::ir::{BoolExpr, Domain, Env, IrModel, Literal, Parameter, Rule};

/// Admissible values of one parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    Boolean,
    /// Inclusive bounds; a missing side is unbounded
    Range { min: Option<i64>, max: Option<i64> },
    OneOf { values: Vec<i64> },
}

impl Constraint {
    pub fn range(min: i64, max: i64) -> Self {
        Constraint::Range {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn one_of(values: impl IntoIterator<Item = i64>) -> Self {
        Constraint::OneOf {
            values: values.into_iter().collect(),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Boolean => write!(f, "boolean"),
            Constraint::Range { min, max } => {
                let lo = min.map_or_else(|| "-inf".to_string(), |v| v.to_string());
                let hi = max.map_or_else(|| "+inf".to_string(), |v| v.to_string());
                write!(f, "range [{lo}, {hi}]")
            }
            Constraint::OneOf { values } => {
                let items: Vec<String> = values.iter().map(i64::to_string).collect();
                write!(f, "one of {{{}}}", items.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    Bool,
    Int,
}

impl Sort {
    pub fn to_smt(self) -> &'static str {
        match self {
            Sort::Bool => "Bool",
            Sort::Int => "Int",
        }
    }
}

/// Universally quantified name of the obligation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub name: String,
    pub sort: Sort,
    /// False for names the conditions read that are not parameters
    pub parameter: bool,
}

/// The rule list as one expression: `c1 ? r1 : (c2 ? r2 : ... : None)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Branch {
        condition: BoolExpr,
        then: Literal,
        otherwise: Box<Decision>,
    },
    Leaf(Literal),
}

impl Decision {
    /// Fold the rules right to left; a model that is not total falls
    /// through to `None`, as the function would
    pub fn from_rules(rules: &[Rule]) -> Self {
        let (effective, mut decision) = match rules.iter().position(Rule::is_catch_all) {
            Some(i) => (&rules[..i], Decision::Leaf(rules[i].return_value.clone())),
            None => (rules, Decision::Leaf(Literal::none())),
        };
        for rule in effective.iter().rev() {
            decision = Decision::Branch {
                condition: rule.condition.clone(),
                then: rule.return_value.clone(),
                otherwise: Box::new(decision),
            };
        }
        decision
    }

    /// Every literal the decision can produce, in first-occurrence order
    pub fn outputs(&self) -> Vec<&Literal> {
        let mut out: Vec<&Literal> = Vec::new();
        let mut node = self;
        loop {
            let literal = match node {
                Decision::Branch { then, .. } => then,
                Decision::Leaf(l) => l,
            };
            if !out.contains(&literal) {
                out.push(literal);
            }
            match node {
                Decision::Branch { otherwise, .. } => node = otherwise,
                Decision::Leaf(_) => return out,
            }
        }
    }

    pub fn eval(&self, env: &Env<'_>) -> Result<&Literal, EvaluationError> {
        let mut node = self;
        loop {
            match node {
                Decision::Leaf(l) => return Ok(l),
                Decision::Branch {
                    condition,
                    then,
                    otherwise,
                } => {
                    if eval::eval(condition, env)? {
                        return Ok(then);
                    }
                    node = otherwise;
                }
            }
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut node = self;
        let mut open = 0;
        loop {
            match node {
                Decision::Leaf(l) => {
                    write!(f, "{l}")?;
                    break;
                }
                Decision::Branch {
                    condition,
                    then,
                    otherwise,
                } => {
                    if open > 0 {
                        f.write_str("(")?;
                    }
                    write!(f, "{condition} ? {then} : ")?;
                    open += 1;
                    node = otherwise;
                }
            }
        }
        for _ in 1..open {
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObligationError {
    #[error("constraint on `{0}`, which is not a parameter")]
    UnknownParameter(String),
    #[error("{constraint} constraint does not fit {domain} parameter `{parameter}`")]
    SortMismatch {
        parameter: String,
        domain: Domain,
        constraint: Constraint,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProofObligation {
    pub function_name: String,
    pub variables: Vec<Variable>,
    pub decision: Decision,
    pub constraints: BTreeMap<String, Constraint>,
    pub valid_outputs: Vec<Literal>,
}

impl ProofObligation {
    pub fn new(
        model: &IrModel,
        constraints: &BTreeMap<String, Constraint>,
        valid_outputs: &[Literal],
    ) -> Result<Self, ObligationError> {
        if let Some(name) = constraints.keys().find(|n| model.parameter(n).is_none()) {
            return Err(ObligationError::UnknownParameter(name.clone()));
        }

        let mut variables = Vec::with_capacity(model.parameters.len());
        for param in &model.parameters {
            variables.push(Variable {
                name: param.name.clone(),
                sort: parameter_sort(model, param, constraints.get(&param.name))?,
                parameter: true,
            });
        }
        let free: BTreeSet<&str> = model.conditions().flat_map(BoolExpr::variables).collect();
        for name in free {
            if model.parameter(name).is_none() {
                warn!(function = %model.function_name, name, "condition reads a name that is not a parameter; leaving it unconstrained");
                variables.push(Variable {
                    name: name.to_string(),
                    sort: usage_sort(model, name),
                    parameter: false,
                });
            }
        }

        let mut valid = Vec::with_capacity(valid_outputs.len());
        for output in valid_outputs {
            if !valid.contains(output) {
                valid.push(output.clone());
            }
        }

        Ok(Self {
            function_name: model.function_name.clone(),
            variables,
            decision: Decision::from_rules(&model.rules),
            constraints: constraints.clone(),
            valid_outputs: valid,
        })
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(|v| v.parameter)
    }

    pub fn is_valid_output(&self, output: &Literal) -> bool {
        self.valid_outputs.contains(output)
    }
}

fn parameter_sort(
    model: &IrModel,
    param: &Parameter,
    constraint: Option<&Constraint>,
) -> Result<Sort, ObligationError> {
    let mismatch = |constraint: &Constraint| ObligationError::SortMismatch {
        parameter: param.name.clone(),
        domain: param.inferred_domain.clone(),
        constraint: constraint.clone(),
    };
    match (constraint, &param.inferred_domain) {
        (Some(c @ Constraint::Boolean), Domain::IntegerRange { .. }) => Err(mismatch(c)),
        (Some(c @ (Constraint::Range { .. } | Constraint::OneOf { .. })), Domain::Boolean) => Err(mismatch(c)),
        (Some(Constraint::Boolean), _) => Ok(Sort::Bool),
        (Some(_), _) => Ok(Sort::Int),
        (None, Domain::Boolean) => Ok(Sort::Bool),
        (None, Domain::IntegerRange { .. }) => Ok(Sort::Int),
        (None, Domain::Opaque) => Ok(usage_sort(model, &param.name)),
    }
}

fn usage_sort(model: &IrModel, name: &str) -> Sort {
    let usage = Usage::scan(name, model.conditions());
    if !usage.int_compared && (usage.truth_tested || usage.bool_compared) {
        Sort::Bool
    } else {
        Sort::Int
    }
}
