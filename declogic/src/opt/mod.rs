//! Optimizer passes over [`IrModel`]
//!
//! Passes are pure functions from a model to a fresh model plus
//! diagnostics. They run in a fixed order:
//! - `simplify`: canonical normal form of every condition
//! - `merge`: one rule per distinct return value
//! - `redundancy`: rules already covered by an earlier rule
//! - `table`: exhaustive lookup table over sampled domains

pub mod merge;
pub mod redundancy;
pub mod simplify;
pub mod table;

use serde::Serialize;
use tracing::debug;

use crate::ir::IrModel;

pub use merge::{MergeBranches, merge};
pub use redundancy::{DetectRedundancy, Redundancy, find_redundant};
pub use simplify::{Simplify, normalize, simplify};
pub use table::{DEFAULT_SIZE_CUTOFF, LookupTable, TableCell, TableEntry, synthesize};

/// Finding reported by a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub pass: &'static str,
    /// Rule the finding is about, indexed in the pass input
    pub rule_index: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(pass: &'static str, rule_index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            pass,
            rule_index,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.rule_index {
            Some(i) => write!(f, "{}: rule {i}: {}", self.pass, self.message),
            None => write!(f, "{}: {}", self.pass, self.message),
        }
    }
}

/// What a model-to-model pass produces
#[derive(Debug, Clone)]
pub struct PassOutput {
    pub model: IrModel,
    pub diagnostics: Vec<Diagnostic>,
}

/// Trait for optimization passes
pub trait OptimizationPass {
    /// Name of the optimization pass
    fn name(&self) -> &'static str;

    /// Run the pass; the input model is left untouched
    fn run(&self, model: &IrModel) -> PassOutput;
}

/// Ordered chain of passes, each fed the previous pass's model
#[derive(Default)]
pub struct PassPipeline {
    passes: Vec<Box<dyn OptimizationPass>>,
}

impl PassPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass(&mut self, pass: Box<dyn OptimizationPass>) {
        self.passes.push(pass);
    }

    pub fn run(&self, model: &IrModel) -> PassOutput {
        let mut output = PassOutput {
            model: model.clone(),
            diagnostics: Vec::new(),
        };
        for pass in &self.passes {
            let step = pass.run(&output.model);
            debug!(pass = pass.name(), findings = step.diagnostics.len(), "pass finished");
            output.model = step.model;
            output.diagnostics.extend(step.diagnostics);
        }
        output
    }
}

/// Everything the optimizer derives from one model
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub original: IrModel,
    pub simplified: IrModel,
    pub merged: IrModel,
    pub lookup_table: LookupTable,
    pub redundant_rules: Vec<Redundancy>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the fixed pass sequence
#[derive(Debug, Clone, Copy)]
pub struct Optimizer {
    size_cutoff: usize,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_CUTOFF)
    }
}

impl Optimizer {
    pub fn new(size_cutoff: usize) -> Self {
        Self { size_cutoff }
    }

    pub fn size_cutoff(&self) -> usize {
        self.size_cutoff
    }

    pub fn optimize(&self, model: &IrModel) -> OptimizationResult {
        let simplified = Simplify.run(model);
        let merged = MergeBranches.run(&simplified.model);
        let redundant_rules = find_redundant(&simplified.model);
        let lookup_table = synthesize(&simplified.model, self.size_cutoff);

        let mut diagnostics = simplified.diagnostics;
        diagnostics.extend(merged.diagnostics);
        diagnostics.extend(redundant_rules.iter().map(Redundancy::to_diagnostic));

        debug!(
            function = %model.function_name,
            rules = model.rules.len(),
            merged = merged.model.rules.len(),
            redundant = redundant_rules.len(),
            cells = lookup_table.len(),
            "optimization finished"
        );
        OptimizationResult {
            original: model.clone(),
            simplified: simplified.model,
            merged: merged.model,
            lookup_table,
            redundant_rules,
            diagnostics,
        }
    }
}
