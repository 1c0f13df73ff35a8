//! IR builder: source text to [`IrModel`]
//!
//! Walks the body of one function and emits a rule for every `return`,
//! guarded by the conjunction of the branch conditions that lead to it.
//! An `elif`/`else` branch is guarded by the negations of the conditions
//! before it, so the rule list preserves first-match semantics exactly.

use tracing::{debug, warn};

use crate::ast::{Expr, FunctionDef, IfStmt, Module, Spanned, Stmt};
use crate::error::{ExtractionError, Result};
use crate::parser::parse_source;

use super::lower::{LowerCtx, constant};
use super::{BoolExpr, IrModel, Parameter, Rule, domain};

/// Builder knobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuilderOptions {
    /// Reject functions with a path that reaches the end of the body
    pub strict: bool,
}

/// Build the model of `target`, or of the only function when `target` is
/// `None`
pub fn build(source: &str, target: Option<&str>) -> Result<IrModel> {
    build_with(source, target, &BuilderOptions::default())
}

pub fn build_with(source: &str, target: Option<&str>, options: &BuilderOptions) -> Result<IrModel> {
    let module = parse_source(source)?;
    build_from_module(source, &module, target, options)
}

/// Build from an already parsed module; `source` must be the text it was
/// parsed from
pub fn build_from_module(
    source: &str,
    module: &Module,
    target: Option<&str>,
    options: &BuilderOptions,
) -> Result<IrModel> {
    let function = locate(module, target)?;
    let builder = Builder {
        ctx: LowerCtx::new(source),
    };
    let walk = builder.block(&function.body, &[]);
    let name = function.name.node.clone();

    if !walk.terminates {
        if options.strict {
            return Err(ExtractionError::FallThrough {
                function: name,
                span: function.span,
            });
        }
        warn!(function = %name, "some paths fall through without returning; the model is not total");
    }

    let rules = walk.rules;
    let parameters = signature(function)
        .map(|param| {
            let annotation = param.annotation.as_ref().and_then(|a| match &a.node {
                Expr::Name(n) => Some(n.as_str()),
                _ => None,
            });
            let default = param.default.as_ref().and_then(constant);
            let conditions = rules.iter().map(|r| &r.condition);
            let inferred = domain::infer(&param.name.node, annotation, default.as_ref(), conditions);
            Parameter::new(param.name.node.clone(), inferred)
        })
        .collect();

    let model = IrModel::new(name, parameters, rules);
    debug!(
        function = %model.function_name,
        rules = model.rules.len(),
        total = model.is_total(),
        "extracted decision rules"
    );
    Ok(model)
}

fn locate<'m>(module: &'m Module, target: Option<&str>) -> Result<&'m FunctionDef> {
    let functions = module.functions();
    match target {
        Some(name) => functions
            .into_iter()
            .find(|f| f.name.node == name)
            .ok_or_else(|| ExtractionError::not_found(Some(name))),
        None => match functions.as_slice() {
            [] => Err(ExtractionError::not_found(None)),
            [only] => Ok(*only),
            many => Err(ExtractionError::AmbiguousTarget {
                candidates: many.iter().map(|f| f.name.node.clone()).collect(),
            }),
        },
    }
}

/// Declared parameters without a leading `self`/`cls`
fn signature(function: &FunctionDef) -> impl Iterator<Item = &crate::ast::Param> {
    let skip = function
        .params
        .first()
        .is_some_and(|p| matches!(p.name.node.as_str(), "self" | "cls"));
    function.params.iter().skip(usize::from(skip))
}

struct Walk {
    rules: Vec<Rule>,
    /// Every path through the block ends in a `return`
    terminates: bool,
}

struct Builder<'a> {
    ctx: LowerCtx<'a>,
}

impl Builder<'_> {
    fn block(&self, block: &[Spanned<Stmt>], guard: &[BoolExpr]) -> Walk {
        let mut rules = Vec::new();
        for (i, stmt) in block.iter().enumerate() {
            let terminates = match &stmt.node {
                Stmt::Return(value) => {
                    let condition = BoolExpr::and(guard.iter().cloned());
                    rules.push(Rule::new(condition, self.ctx.literal(value.as_ref())));
                    true
                }
                Stmt::If(chain) => {
                    let walk = self.if_chain(chain, guard);
                    rules.extend(walk.rules);
                    walk.terminates
                }
                Stmt::For { .. } | Stmt::While { .. } => {
                    debug!(span = %stmt.span, "loop bodies are not analyzed");
                    false
                }
                _ => false,
            };
            if terminates {
                if i + 1 < block.len() {
                    debug!(span = %block[i + 1].span, "skipping unreachable statements");
                }
                return Walk { rules, terminates };
            }
        }
        Walk {
            rules,
            terminates: false,
        }
    }

    fn if_chain(&self, chain: &IfStmt, guard: &[BoolExpr]) -> Walk {
        let mut rules = Vec::new();
        let mut terminates = true;
        // guard plus the negation of every branch condition seen so far
        let mut context = guard.to_vec();
        for branch in &chain.branches {
            let condition = self.ctx.condition(&branch.cond);
            let mut branch_guard = context.clone();
            branch_guard.push(condition.clone());
            let walk = self.block(&branch.body, &branch_guard);
            rules.extend(walk.rules);
            terminates &= walk.terminates;
            context.push(BoolExpr::not(condition));
        }
        match &chain.orelse {
            Some(body) => {
                let walk = self.block(body, &context);
                rules.extend(walk.rules);
                terminates &= walk.terminates;
            }
            None => terminates = false,
        }
        Walk { rules, terminates }
    }
}
