//! Lookup-table synthesis
//!
//! Evaluates the rules on every combination of sampled parameter values and
//! records which rule answers. Combinations are laid out in cartesian order
//! with the first parameter varying slowest, so a cell can be found again
//! by mixed-radix indexing.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::ir::{Env, IrModel, Literal, Value, domain, eval};

/// Integer ranges at most this wide are enumerated in full
pub const DEFAULT_SIZE_CUTOFF: usize = 100;

/// Sampled values of one parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSamples {
    pub parameter: String,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableCell {
    /// Rule `rule` matched first and returns `value`
    Hit { rule: usize, value: Literal },
    Unknown { reason: String },
}

impl TableCell {
    pub fn value(&self) -> Option<&Literal> {
        match self {
            TableCell::Hit { value, .. } => Some(value),
            TableCell::Unknown { .. } => None,
        }
    }
}

impl fmt::Display for TableCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableCell::Hit { value, .. } => write!(f, "{value}"),
            TableCell::Unknown { reason } => write!(f, "? ({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableEntry {
    pub inputs: Vec<Value>,
    pub cell: TableCell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupTable {
    pub samples: Vec<ParameterSamples>,
    pub entries: Vec<TableEntry>,
}

impl LookupTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cell for positional inputs, if every value was sampled
    pub fn get(&self, inputs: &[Value]) -> Option<&TableCell> {
        if inputs.len() != self.samples.len() {
            return None;
        }
        let mut index = 0usize;
        for (samples, value) in self.samples.iter().zip(inputs) {
            let digit = samples.values.iter().position(|v| v == value)?;
            index = index * samples.values.len() + digit;
        }
        self.entries.get(index).map(|e| &e.cell)
    }

    /// Cell for named inputs; every parameter must be given
    pub fn lookup(&self, inputs: &[(&str, Value)]) -> Option<&TableCell> {
        let ordered = self
            .samples
            .iter()
            .map(|s| {
                inputs
                    .iter()
                    .find(|(name, _)| *name == s.parameter)
                    .map(|(_, v)| v.clone())
            })
            .collect::<Option<Vec<_>>>()?;
        self.get(&ordered)
    }

    pub fn unknown_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.cell, TableCell::Unknown { .. }))
            .count()
    }
}

impl fmt::Display for LookupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<&str> = self.samples.iter().map(|s| s.parameter.as_str()).collect();
        writeln!(f, "{} => result", header.join(" | "))?;
        for entry in &self.entries {
            let inputs: Vec<String> = entry.inputs.iter().map(Value::to_string).collect();
            writeln!(f, "{} => {}", inputs.join(" | "), entry.cell)?;
        }
        Ok(())
    }
}

/// Build the lookup table of `model`
pub fn synthesize(model: &IrModel, size_cutoff: usize) -> LookupTable {
    let samples: Vec<ParameterSamples> = model
        .parameters
        .iter()
        .map(|p| ParameterSamples {
            parameter: p.name.clone(),
            values: domain::sample(&p.name, &p.inferred_domain, model.conditions(), size_cutoff),
        })
        .collect();
    let names: Vec<String> = samples.iter().map(|s| s.parameter.clone()).collect();
    let radices: Vec<usize> = samples.iter().map(|s| s.values.len()).collect();

    let mut entries = Vec::new();
    let mut digits = vec![0usize; samples.len()];
    if radices.iter().all(|&r| r > 0) {
        loop {
            let inputs: Vec<Value> = samples
                .iter()
                .zip(&digits)
                .map(|(s, &d)| s.values[d].clone())
                .collect();
            let cell = evaluate(model, &names, &inputs);
            entries.push(TableEntry { inputs, cell });
            if !advance(&mut digits, &radices) {
                break;
            }
        }
    }

    let table = LookupTable { samples, entries };
    debug!(
        function = %model.function_name,
        cells = table.len(),
        unknown = table.unknown_count(),
        "synthesized lookup table"
    );
    table
}

fn evaluate(model: &IrModel, names: &[String], inputs: &[Value]) -> TableCell {
    let env = Env::zip(names, inputs);
    match eval::first_match(&model.rules, &env) {
        Ok(Some(rule)) => TableCell::Hit {
            rule,
            value: model.rules[rule].return_value.clone(),
        },
        Ok(None) => TableCell::Unknown {
            reason: "no rule matches".to_string(),
        },
        Err(e) => TableCell::Unknown { reason: e.to_string() },
    }
}

/// Odometer step, last digit fastest; false once every combination is done
fn advance(digits: &mut [usize], radices: &[usize]) -> bool {
    for i in (0..digits.len()).rev() {
        digits[i] += 1;
        if digits[i] < radices[i] {
            return true;
        }
        digits[i] = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BoolExpr, CompareOp, Parameter, Rule};

    fn thermostat() -> IrModel {
        IrModel::new(
            "heat",
            vec![Parameter::integer("temp", 0, 30), Parameter::boolean("is_away")],
            vec![
                Rule::new(BoolExpr::var("is_away"), Literal::str("off")),
                Rule::new(BoolExpr::cmp("temp", CompareOp::Lt, 18), Literal::str("on")),
                Rule::new(BoolExpr::Literal(true), Literal::str("idle")),
            ],
        )
    }

    #[test]
    fn test_synthesize_cartesian_order() {
        let table = synthesize(&thermostat(), DEFAULT_SIZE_CUTOFF);
        assert_eq!(table.samples[0].values.len(), 31);
        assert_eq!(table.len(), 31 * 2);
        assert_eq!(table.entries[0].inputs, vec![Value::Int(0), Value::Bool(true)]);
        assert_eq!(table.entries[1].inputs, vec![Value::Int(0), Value::Bool(false)]);
        assert_eq!(table.unknown_count(), 0);
    }

    #[test]
    fn test_lookup_by_name_and_position() {
        let table = synthesize(&thermostat(), DEFAULT_SIZE_CUTOFF);
        let cell = table.lookup(&[("is_away", Value::Bool(false)), ("temp", Value::Int(12))]);
        assert_eq!(
            cell,
            Some(&TableCell::Hit {
                rule: 1,
                value: Literal::str("on")
            })
        );
        let cell = table.get(&[Value::Int(25), Value::Bool(false)]).unwrap();
        assert_eq!(cell.value(), Some(&Literal::str("idle")));
        assert!(table.get(&[Value::Int(500), Value::Bool(false)]).is_none());
        assert!(table.lookup(&[("temp", Value::Int(1))]).is_none());
    }

    #[test]
    fn test_wide_range_is_sampled() {
        let mut model = thermostat();
        model.parameters[0] = Parameter::integer("temp", -1000, 1000);
        let table = synthesize(&model, DEFAULT_SIZE_CUTOFF);
        assert_eq!(
            table.samples[0].values,
            vec![Value::Int(-1000), Value::Int(17), Value::Int(18), Value::Int(19), Value::Int(1000)]
        );
    }

    #[test]
    fn test_unknown_cells() {
        let model = IrModel::new(
            "f",
            vec![Parameter::boolean("a")],
            vec![
                Rule::new(BoolExpr::Opaque("check(a)".into()), Literal::int(1)),
                Rule::new(BoolExpr::var("a"), Literal::int(2)),
            ],
        );
        let table = synthesize(&model, DEFAULT_SIZE_CUTOFF);
        assert_eq!(table.unknown_count(), 2);
        let partial = model.with_rules(model.rules[1..].to_vec());
        let table = synthesize(&partial, DEFAULT_SIZE_CUTOFF);
        assert_eq!(
            table.get(&[Value::Bool(false)]),
            Some(&TableCell::Unknown {
                reason: "no rule matches".into()
            })
        );
    }

    #[test]
    fn test_no_parameters_yields_single_cell() {
        let model = IrModel::new("k", Vec::new(), vec![Rule::new(BoolExpr::Literal(true), Literal::int(7))]);
        let table = synthesize(&model, DEFAULT_SIZE_CUTOFF);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&[]).and_then(TableCell::value), Some(&Literal::int(7)));
    }
}
