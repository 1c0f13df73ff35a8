//! Decision to SMT-LIB2 translator
//!
//! The obligation is checked by refutation: the parameters are declared as
//! free constants, the domain constraints are asserted together with the
//! negation of "the decision returns a valid output", and the solver is
//! asked for a model. `unsat` proves the obligation; a model is a
//! counterexample.
//!
//! Return literals are encoded as indices into an output table, so the
//! decision is a single `Int` term in QF_LIA regardless of what the function
//! returns.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

use thiserror::Error;

use super::obligation::{Constraint, Decision, ProofObligation, Sort};
use crate::ir::{BoolExpr, CompareOp, Literal, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmtError {
    #[error("cannot translate `{variable} {op} {constant}`: {reason}")]
    UnsupportedComparison {
        variable: String,
        op: CompareOp,
        constant: Value,
        reason: &'static str,
    },
    #[error("name `{0}` is not declared")]
    Undeclared(String),
}

/// SMT-LIB2 script builder
#[derive(Debug)]
pub struct SmtGenerator {
    options: Vec<String>,
    declarations: Vec<String>,
    definitions: Vec<String>,
    assertions: Vec<String>,
    queries: Vec<String>,
    logic: String,
}

impl Default for SmtGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SmtGenerator {
    pub fn new() -> Self {
        Self {
            options: vec!["(set-option :produce-models true)".to_string()],
            declarations: Vec::new(),
            definitions: Vec::new(),
            assertions: Vec::new(),
            queries: Vec::new(),
            logic: "QF_LIA".to_string(),
        }
    }

    pub fn set_option(&mut self, option: &str, value: &str) {
        self.options.push(format!("(set-option {option} {value})"));
    }

    pub fn declare_const(&mut self, symbol: &str, sort: Sort) {
        self.declarations
            .push(format!("(declare-const {symbol} {})", sort.to_smt()));
    }

    pub fn define_fun(&mut self, symbol: &str, sort: Sort, body: &str) {
        self.definitions
            .push(format!("(define-fun {symbol} () {} {body})", sort.to_smt()));
    }

    pub fn comment(&mut self, text: &str) {
        let line: String = text.chars().map(|c| if c == '\n' || c == '\r' { ' ' } else { c }).collect();
        self.declarations.push(format!("; {line}"));
    }

    pub fn assert(&mut self, expr: &str) {
        self.assertions.push(format!("(assert {expr})"));
    }

    pub fn get_value(&mut self, symbols: &[String]) {
        if !symbols.is_empty() {
            self.queries.push(format!("(get-value ({}))", symbols.join(" ")));
        }
    }

    pub fn generate(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "; generated by declogic");
        for option in &self.options {
            let _ = writeln!(output, "{option}");
        }
        let _ = writeln!(output, "(set-logic {})", self.logic);
        for section in [&self.declarations, &self.definitions, &self.assertions] {
            if section.is_empty() {
                continue;
            }
            let _ = writeln!(output);
            for line in section {
                let _ = writeln!(output, "{line}");
            }
        }
        let _ = writeln!(output);
        let _ = writeln!(output, "(check-sat)");
        for query in &self.queries {
            let _ = writeln!(output, "{query}");
        }
        output
    }
}

/// A translated obligation
#[derive(Debug, Clone)]
pub struct Encoding {
    pub script: String,
    /// Output table; the decision term evaluates to an index into it
    pub outputs: Vec<Literal>,
    /// Parameter name for each queried symbol
    pub symbols: BTreeMap<String, (String, Sort)>,
}

/// SMT symbol of a source name; the prefix keeps names clear of SMT-LIB
/// reserved words and builtins
pub fn symbol(name: &str) -> String {
    format!("v_{name}")
}

pub fn encode(obligation: &ProofObligation, timeout: Option<Duration>) -> Result<Encoding, SmtError> {
    let mut generator = SmtGenerator::new();
    if let Some(timeout) = timeout {
        generator.set_option(":timeout", &timeout.as_millis().to_string());
    }

    let sorts: BTreeMap<&str, Sort> = obligation
        .variables
        .iter()
        .map(|v| (v.name.as_str(), v.sort))
        .collect();
    for variable in &obligation.variables {
        generator.declare_const(&symbol(&variable.name), variable.sort);
    }

    let mut outputs: Vec<Literal> = obligation.decision.outputs().into_iter().cloned().collect();
    for valid in &obligation.valid_outputs {
        if !outputs.contains(valid) {
            outputs.push(valid.clone());
        }
    }

    let mut translator = Translator {
        sorts: &sorts,
        opaque: Vec::new(),
    };
    let body = translator.decision(&obligation.decision, &outputs)?;
    for (i, text) in translator.opaque.iter().enumerate() {
        generator.comment(&format!("opaque_{i}: {text}"));
        generator.declare_const(&format!("opaque_{i}"), Sort::Bool);
    }
    for (i, output) in outputs.iter().enumerate() {
        generator.comment(&format!("output {i}: {output}"));
    }
    generator.define_fun("decision", Sort::Int, &body);

    for (name, constraint) in &obligation.constraints {
        if let Some(assertion) = constraint_term(&symbol(name), constraint) {
            generator.assert(&assertion);
        }
    }

    let valid: Vec<String> = obligation
        .valid_outputs
        .iter()
        .filter_map(|v| outputs.iter().position(|o| o == v))
        .map(|i| format!("(= decision {i})"))
        .collect();
    generator.assert(&format!("(not {})", junction("or", valid)));

    let mut symbols = BTreeMap::new();
    let mut queried = Vec::new();
    for variable in obligation.parameters() {
        let sym = symbol(&variable.name);
        queried.push(sym.clone());
        symbols.insert(sym, (variable.name.clone(), variable.sort));
    }
    generator.get_value(&queried);

    Ok(Encoding {
        script: generator.generate(),
        outputs,
        symbols,
    })
}

struct Translator<'a> {
    sorts: &'a BTreeMap<&'a str, Sort>,
    /// Distinct opaque condition texts; each becomes a fresh boolean
    opaque: Vec<String>,
}

impl Translator<'_> {
    fn decision(&mut self, decision: &Decision, outputs: &[Literal]) -> Result<String, SmtError> {
        let index = |literal: &Literal| outputs.iter().position(|o| o == literal).unwrap_or(0);
        let mut branches = Vec::new();
        let mut node = decision;
        let leaf = loop {
            match node {
                Decision::Branch {
                    condition,
                    then,
                    otherwise,
                } => {
                    branches.push((self.expr(condition)?, index(then)));
                    node = otherwise;
                }
                Decision::Leaf(literal) => break index(literal),
            }
        };
        let mut term = leaf.to_string();
        for (condition, then) in branches.into_iter().rev() {
            term = format!("(ite {condition} {then} {term})");
        }
        Ok(term)
    }

    fn expr(&mut self, expr: &BoolExpr) -> Result<String, SmtError> {
        match expr {
            BoolExpr::Literal(b) => Ok(b.to_string()),
            BoolExpr::Var(name) => {
                let sym = symbol(name);
                match self.sort(name)? {
                    Sort::Bool => Ok(sym),
                    Sort::Int => Ok(format!("(not (= {sym} 0))")),
                }
            }
            BoolExpr::Comparison {
                variable,
                op,
                constant,
            } => self.comparison(variable, *op, constant),
            BoolExpr::And(parts) | BoolExpr::Or(parts) => {
                let op = if matches!(expr, BoolExpr::And(_)) { "and" } else { "or" };
                let terms = parts.iter().map(|p| self.expr(p)).collect::<Result<Vec<_>, _>>()?;
                Ok(junction(op, terms))
            }
            BoolExpr::Not(inner) => Ok(format!("(not {})", self.expr(inner)?)),
            BoolExpr::Opaque(text) => {
                let i = match self.opaque.iter().position(|t| t == text) {
                    Some(i) => i,
                    None => {
                        self.opaque.push(text.clone());
                        self.opaque.len() - 1
                    }
                };
                Ok(format!("opaque_{i}"))
            }
        }
    }

    fn comparison(&self, variable: &str, op: CompareOp, constant: &Value) -> Result<String, SmtError> {
        let sym = symbol(variable);
        let sort = self.sort(variable)?;
        if let (Sort::Bool, Value::Bool(b)) = (sort, constant) {
            if op.is_equality() {
                let eq = format!("(= {sym} {b})");
                return Ok(if op == CompareOp::Eq { eq } else { format!("(not {eq})") });
            }
        }
        let term = match sort {
            Sort::Int => sym,
            Sort::Bool => format!("(ite {sym} 1 0)"),
        };
        match constant.as_int() {
            Some(k) => Ok(relation(op, &term, &int_literal(k))),
            // an int or bool is never equal to None or a string
            None => match op {
                CompareOp::Eq => Ok("false".to_string()),
                CompareOp::Ne => Ok("true".to_string()),
                _ => Err(SmtError::UnsupportedComparison {
                    variable: variable.to_string(),
                    op,
                    constant: constant.clone(),
                    reason: "ordering against a non-numeric constant",
                }),
            },
        }
    }

    fn sort(&self, name: &str) -> Result<Sort, SmtError> {
        self.sorts
            .get(name)
            .copied()
            .ok_or_else(|| SmtError::Undeclared(name.to_string()))
    }
}

fn relation(op: CompareOp, left: &str, right: &str) -> String {
    match op {
        CompareOp::Lt => format!("(< {left} {right})"),
        CompareOp::Le => format!("(<= {left} {right})"),
        CompareOp::Gt => format!("(> {left} {right})"),
        CompareOp::Ge => format!("(>= {left} {right})"),
        CompareOp::Eq => format!("(= {left} {right})"),
        CompareOp::Ne => format!("(not (= {left} {right}))"),
    }
}

fn int_literal(k: i64) -> String {
    if k < 0 {
        format!("(- {})", k.unsigned_abs())
    } else {
        k.to_string()
    }
}

/// `(op a b ...)`, with the unit for an empty list and no wrapper for one
/// operand
fn junction(op: &str, mut terms: Vec<String>) -> String {
    match terms.len() {
        0 => (if op == "and" { "true" } else { "false" }).to_string(),
        1 => terms.swap_remove(0),
        _ => format!("({op} {})", terms.join(" ")),
    }
}

fn constraint_term(sym: &str, constraint: &Constraint) -> Option<String> {
    match constraint {
        // carried by the declared sort
        Constraint::Boolean => None,
        Constraint::Range { min, max } => {
            let mut bounds = Vec::new();
            if let Some(lo) = min {
                bounds.push(format!("(>= {sym} {})", int_literal(*lo)));
            }
            if let Some(hi) = max {
                bounds.push(format!("(<= {sym} {})", int_literal(*hi)));
            }
            (!bounds.is_empty()).then(|| junction("and", bounds))
        }
        Constraint::OneOf { values } => {
            let options = values
                .iter()
                .map(|v| format!("(= {sym} {})", int_literal(*v)))
                .collect();
            Some(junction("or", options))
        }
    }
}

// ============================================================================
// Solver response parsing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

/// Parse a sequence of s-expressions
pub fn parse_sexps(text: &str) -> Result<Vec<Sexp>, String> {
    let mut stack: Vec<Vec<Sexp>> = vec![Vec::new()];
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' => stack.push(Vec::new()),
            ')' => {
                let list = stack.pop().ok_or("unbalanced `)`")?;
                match stack.last_mut() {
                    Some(parent) => parent.push(Sexp::List(list)),
                    None => return Err("unbalanced `)`".to_string()),
                }
            }
            c if c.is_whitespace() => {}
            '|' | '"' => {
                let mut atom = String::new();
                for next in chars.by_ref() {
                    if next == c {
                        break;
                    }
                    atom.push(next);
                }
                push_atom(&mut stack, atom)?;
            }
            _ => {
                let mut atom = c.to_string();
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || next == '(' || next == ')' {
                        break;
                    }
                    atom.push(next);
                    chars.next();
                }
                push_atom(&mut stack, atom)?;
            }
        }
    }
    match (stack.pop(), stack.is_empty()) {
        (Some(top), true) => Ok(top),
        _ => Err("unbalanced `(`".to_string()),
    }
}

fn push_atom(stack: &mut [Vec<Sexp>], atom: String) -> Result<(), String> {
    stack
        .last_mut()
        .map(|top| top.push(Sexp::Atom(atom)))
        .ok_or_else(|| "unbalanced `)`".to_string())
}

/// Decode a `get-value` response into parameter values
pub fn parse_model(text: &str, encoding: &Encoding) -> Result<BTreeMap<String, Value>, String> {
    let mut assignment = BTreeMap::new();
    for sexp in parse_sexps(text)? {
        let Sexp::List(pairs) = sexp else {
            return Err(format!("unexpected model item {sexp:?}"));
        };
        for pair in pairs {
            let Sexp::List(items) = pair else {
                return Err(format!("unexpected model entry {pair:?}"));
            };
            let [Sexp::Atom(sym), value] = items.as_slice() else {
                return Err(format!("unexpected model entry {items:?}"));
            };
            let Some((name, sort)) = encoding.symbols.get(sym) else {
                continue;
            };
            assignment.insert(name.clone(), decode_value(value, *sort)?);
        }
    }
    Ok(assignment)
}

fn decode_value(value: &Sexp, sort: Sort) -> Result<Value, String> {
    match (value, sort) {
        (Sexp::Atom(a), Sort::Bool) => match a.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            other => Err(format!("expected boolean, found `{other}`")),
        },
        (Sexp::Atom(a), Sort::Int) => a
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| format!("bad integer `{a}`: {e}")),
        (Sexp::List(items), Sort::Int) => match items.as_slice() {
            [Sexp::Atom(minus), Sexp::Atom(n)] if minus == "-" => n
                .parse::<i64>()
                .map(|n| Value::Int(-n))
                .map_err(|e| format!("bad integer `{n}`: {e}")),
            _ => Err(format!("unsupported integer term {items:?}")),
        },
        (other, _) => Err(format!("unsupported model value {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IrModel, Parameter, Rule};

    fn obligation() -> ProofObligation {
        let model = IrModel::new(
            "respond",
            vec![
                Parameter::integer("cpu", 0, 100),
                Parameter::boolean("is_question"),
                Parameter::boolean("is_command"),
            ],
            vec![
                Rule::new(BoolExpr::var("is_command"), Literal::int(3)),
                Rule::new(
                    BoolExpr::and([BoolExpr::var("is_question"), BoolExpr::cmp("cpu", CompareOp::Lt, 95)]),
                    Literal::int(2),
                ),
                Rule::new(BoolExpr::var("is_question"), Literal::int(1)),
                Rule::new(BoolExpr::Literal(true), Literal::int(0)),
            ],
        );
        let constraints = BTreeMap::from([
            ("cpu".to_string(), Constraint::range(0, 100)),
            ("is_question".to_string(), Constraint::Boolean),
            ("is_command".to_string(), Constraint::Boolean),
        ]);
        ProofObligation::new(&model, &constraints, &[Literal::int(1), Literal::int(2), Literal::int(3)]).unwrap()
    }

    #[test]
    fn test_encode_worked_example() {
        let encoding = encode(&obligation(), None).unwrap();
        insta::assert_snapshot!(encoding.script, @r"
        ; generated by declogic
        (set-option :produce-models true)
        (set-logic QF_LIA)

        (declare-const v_cpu Int)
        (declare-const v_is_question Bool)
        (declare-const v_is_command Bool)
        ; output 0: 3
        ; output 1: 2
        ; output 2: 1
        ; output 3: 0

        (define-fun decision () Int (ite v_is_command 0 (ite (and v_is_question (< v_cpu 95)) 1 (ite v_is_question 2 3))))

        (assert (and (>= v_cpu 0) (<= v_cpu 100)))
        (assert (not (or (= decision 2) (= decision 1) (= decision 0))))

        (check-sat)
        (get-value (v_cpu v_is_question v_is_command))
        ");
    }

    #[test]
    fn test_encode_timeout_and_opaque() {
        let model = IrModel::new(
            "f",
            vec![Parameter::boolean("a")],
            vec![
                Rule::new(BoolExpr::Opaque("check(a)".into()), Literal::int(1)),
                Rule::new(BoolExpr::Opaque("check(a)".into()), Literal::int(2)),
            ],
        );
        let ob = ProofObligation::new(&model, &BTreeMap::new(), &[Literal::int(1)]).unwrap();
        let encoding = encode(&ob, Some(Duration::from_secs(2))).unwrap();
        assert!(encoding.script.contains("(set-option :timeout 2000)"));
        assert!(encoding.script.contains("; opaque_0: check(a)"));
        assert!(!encoding.script.contains("opaque_1"));
        // fall-through output None is index 2
        assert!(encoding.script.contains("(ite opaque_0 0 (ite opaque_0 1 2))"));
    }

    #[test]
    fn test_encode_comparison_coercions() {
        let sorts = BTreeMap::from([("n", Sort::Int), ("flag", Sort::Bool)]);
        let mut t = Translator {
            sorts: &sorts,
            opaque: Vec::new(),
        };
        let cmp = |v: &str, op, c: Value| BoolExpr::cmp(v, op, c);
        assert_eq!(t.expr(&BoolExpr::var("n")).unwrap(), "(not (= v_n 0))");
        assert_eq!(t.expr(&cmp("n", CompareOp::Ge, Value::Int(-3))).unwrap(), "(>= v_n (- 3))");
        assert_eq!(t.expr(&cmp("n", CompareOp::Eq, Value::Bool(true))).unwrap(), "(= v_n 1)");
        assert_eq!(t.expr(&cmp("flag", CompareOp::Ne, Value::Bool(true))).unwrap(), "(not (= v_flag true))");
        assert_eq!(t.expr(&cmp("flag", CompareOp::Gt, Value::Int(0))).unwrap(), "(> (ite v_flag 1 0) 0)");
        assert_eq!(t.expr(&cmp("n", CompareOp::Eq, Value::None)).unwrap(), "false");
        assert!(t.expr(&cmp("n", CompareOp::Lt, Value::Str("a".into()))).is_err());
        assert!(matches!(t.expr(&BoolExpr::var("ghost")), Err(SmtError::Undeclared(_))));
    }

    #[test]
    fn test_parse_model() {
        let encoding = encode(&obligation(), None).unwrap();
        let text = "((v_cpu (- 4))\n (v_is_question false)\n (v_is_command true))";
        let model = parse_model(text, &encoding).unwrap();
        assert_eq!(model.get("cpu"), Some(&Value::Int(-4)));
        assert_eq!(model.get("is_question"), Some(&Value::Bool(false)));
        assert_eq!(model.get("is_command"), Some(&Value::Bool(true)));
        assert!(parse_model("((v_cpu", &encoding).is_err());
    }

    #[test]
    fn test_parse_sexps_quoted_atoms() {
        let parsed = parse_sexps("(error \"line 1: bad (thing)\") (|a b| 1)").unwrap();
        assert_eq!(
            parsed,
            vec![
                Sexp::List(vec![Sexp::Atom("error".into()), Sexp::Atom("line 1: bad (thing)".into())]),
                Sexp::List(vec![Sexp::Atom("a b".into()), Sexp::Atom("1".into())]),
            ]
        );
    }
}
