//! Decision Intermediate Representation
//!
//! An [`IrModel`] is the ordered rule list of one decision function: each
//! [`Rule`] pairs a [`BoolExpr`] condition with the literal it returns. Rules
//! are evaluated in order and the first whose condition holds is responsible
//! for the result ("first match wins").
//!
//! Models are built once by [`build`] and never mutated afterwards; every
//! optimizer pass returns a fresh model.

mod build;
pub mod domain;
pub mod eval;
mod expr;
mod lower;
mod value;

pub use build::{BuilderOptions, build, build_from_module, build_with};
pub use domain::Domain;
pub use eval::{Env, EvaluationError};
pub use expr::{BoolExpr, CompareOp};
pub use value::{Literal, Value};

use serde::{Deserialize, Serialize};

/// Function parameter with its inferred value domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub inferred_domain: Domain,
}

impl Parameter {
    pub fn new(name: impl Into<String>, inferred_domain: Domain) -> Self {
        Self {
            name: name.into(),
            inferred_domain,
        }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, Domain::Boolean)
    }

    pub fn integer(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(name, Domain::IntegerRange { min, max })
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self::new(name, Domain::Opaque)
    }
}

/// One guarded return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub condition: BoolExpr,
    pub return_value: Literal,
}

impl Rule {
    pub fn new(condition: BoolExpr, return_value: Literal) -> Self {
        Self {
            condition,
            return_value,
        }
    }

    /// Unconditional rule: its condition is the literal `true`
    pub fn is_catch_all(&self) -> bool {
        self.condition.is_true()
    }
}

/// Ordered rule list of one decision function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrModel {
    pub function_name: String,
    pub parameters: Vec<Parameter>,
    pub rules: Vec<Rule>,
}

impl IrModel {
    pub fn new(function_name: impl Into<String>, parameters: Vec<Parameter>, rules: Vec<Rule>) -> Self {
        Self {
            function_name: function_name.into(),
            parameters,
            rules,
        }
    }

    /// A model is total iff its last rule is a catch-all
    pub fn is_total(&self) -> bool {
        self.rules.last().is_some_and(Rule::is_catch_all)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// A fresh model with the same signature and different rules
    pub fn with_rules(&self, rules: Vec<Rule>) -> IrModel {
        IrModel {
            function_name: self.function_name.clone(),
            parameters: self.parameters.clone(),
            rules,
        }
    }

    /// Iterator over every rule condition, in order
    pub fn conditions(&self) -> impl Iterator<Item = &BoolExpr> {
        self.rules.iter().map(|r| &r.condition)
    }
}

impl std::fmt::Display for IrModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.inferred_domain))
            .collect();
        writeln!(f, "{}({})", self.function_name, params.join(", "))?;
        for (i, rule) in self.rules.iter().enumerate() {
            writeln!(f, "  [{i}] {} => {}", rule.condition, rule.return_value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IrModel {
        IrModel::new(
            "classify",
            vec![Parameter::integer("x", 0, 10), Parameter::boolean("is_hot")],
            vec![
                Rule::new(BoolExpr::var("is_hot"), Literal::int(1)),
                Rule::new(BoolExpr::Literal(true), Literal::int(0)),
            ],
        )
    }

    #[test]
    fn test_total_model() {
        let model = sample();
        assert!(model.is_total());
        let partial = model.with_rules(model.rules[..1].to_vec());
        assert!(!partial.is_total());
        assert!(!model.with_rules(Vec::new()).is_total());
    }

    #[test]
    fn test_parameter_lookup() {
        let model = sample();
        assert_eq!(model.parameter("is_hot").map(|p| &p.inferred_domain), Some(&Domain::Boolean));
        assert!(model.parameter("missing").is_none());
    }

    #[test]
    fn test_display_lists_rules() {
        let text = sample().to_string();
        assert_eq!(
            text,
            "classify(x: int[0..=10], is_hot: bool)\n  [0] is_hot => 1\n  [1] True => 0\n"
        );
    }

    #[test]
    fn test_model_serializes_to_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["function_name"], "classify");
        assert_eq!(json["parameters"][0]["inferred_domain"]["kind"], "integer_range");
        let back: IrModel = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }
}
