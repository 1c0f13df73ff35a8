//! declogic: decision-logic extraction, optimization and verification
//!
//! Turns the `if`/`elif`/`else` return rules of a Python-style function
//! into an [`ir::IrModel`], derives simplified and merged forms and a
//! lookup table from it, and checks output properties with an SMT solver.

pub mod ast;
pub mod config;
pub mod error;
pub mod ir;
pub mod lexer;
pub mod opt;
pub mod parser;
pub mod pipeline;
pub mod verify;

pub use config::Config;
pub use error::{ExtractionError, Result};
pub use ir::{BoolExpr, IrModel, Literal, Rule, Value, build};
pub use opt::{OptimizationResult, Optimizer};
pub use pipeline::{Analysis, analyze};
pub use verify::{Constraint, ProofResult, Verifier};
