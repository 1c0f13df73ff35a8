//! Formal verification of decision functions
//!
//! Proves that every admissible input produces one of a set of valid
//! outputs, or produces a concrete input that does not. Solver trouble of
//! any kind (missing binary, timeout, cancellation, untranslatable
//! conditions) is reported as [`ProofResult::Unknown`], never as an error.

pub mod enumerate;
pub mod obligation;
pub mod smt;
pub mod solver;

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Backend, VerifierConfig};
use crate::ir::{IrModel, Literal, Value};

pub use enumerate::EnumerationSolver;
pub use obligation::{Constraint, Decision, ObligationError, ProofObligation, Sort};
pub use smt::SmtError;
pub use solver::{Budget, CancellationToken, Solver, SolverError, Verdict, Z3Solver};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Parameter values that drive the decision to an invalid output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Counterexample {
    pub assignment: BTreeMap<String, Value>,
}

impl Counterexample {
    pub fn new(assignment: BTreeMap<String, Value>) -> Self {
        Self { assignment }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.assignment.get(name)
    }
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .assignment
            .iter()
            .map(|(name, value)| format!("{name} = {value}"))
            .collect();
        f.write_str(&pairs.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProofResult {
    Proved,
    Disproved { counterexample: Counterexample },
    Unknown { reason: String },
}

impl ProofResult {
    pub fn unknown(reason: impl Into<String>) -> Self {
        ProofResult::Unknown { reason: reason.into() }
    }

    pub fn is_proved(&self) -> bool {
        matches!(self, ProofResult::Proved)
    }

    pub fn counterexample(&self) -> Option<&Counterexample> {
        match self {
            ProofResult::Disproved { counterexample } => Some(counterexample),
            _ => None,
        }
    }
}

impl fmt::Display for ProofResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProofResult::Proved => write!(f, "proved"),
            ProofResult::Disproved { counterexample } => write!(f, "disproved: {counterexample}"),
            ProofResult::Unknown { reason } => write!(f, "unknown: {reason}"),
        }
    }
}

/// Why an SMT script could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Obligation(#[from] ObligationError),
    #[error(transparent)]
    Smt(#[from] SmtError),
}

/// The SMT-LIB2 query the Z3 backend would run
pub fn smt_script(
    model: &IrModel,
    constraints: &BTreeMap<String, Constraint>,
    valid_outputs: &[Literal],
    timeout: Option<Duration>,
) -> Result<String, ScriptError> {
    let obligation = ProofObligation::new(model, constraints, valid_outputs)?;
    Ok(smt::encode(&obligation, timeout)?.script)
}

/// Check `model` with the default z3 backend and timeout
pub fn verify(
    model: &IrModel,
    constraints: &BTreeMap<String, Constraint>,
    valid_outputs: &[Literal],
) -> ProofResult {
    Verifier::default().verify(model, constraints, valid_outputs)
}

/// Verification driver
pub struct Verifier {
    solver: Box<dyn Solver>,
    timeout: Option<Duration>,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(Z3Solver::new())
    }
}

impl Verifier {
    pub fn new(solver: impl Solver + 'static) -> Self {
        Self {
            solver: Box::new(solver),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    pub fn from_config(config: &VerifierConfig) -> Self {
        let verifier = match config.backend {
            Backend::Z3 => Self::new(Z3Solver::new().with_path(&config.z3_path)),
            Backend::Enumerate => Self::new(EnumerationSolver::new(config.enumeration_limit)),
        };
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        verifier.with_timeout(timeout)
    }

    /// Set the per-check time limit; `None` waits indefinitely
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    pub fn verify(
        &self,
        model: &IrModel,
        constraints: &BTreeMap<String, Constraint>,
        valid_outputs: &[Literal],
    ) -> ProofResult {
        self.verify_with_cancel(model, constraints, valid_outputs, &CancellationToken::new())
    }

    pub fn verify_with_cancel(
        &self,
        model: &IrModel,
        constraints: &BTreeMap<String, Constraint>,
        valid_outputs: &[Literal],
        cancel: &CancellationToken,
    ) -> ProofResult {
        let start = Instant::now();
        let obligation = match ProofObligation::new(model, constraints, valid_outputs) {
            Ok(obligation) => obligation,
            Err(e) => {
                warn!(function = %model.function_name, error = %e, "invalid proof obligation");
                return ProofResult::unknown(e.to_string());
            }
        };
        if cancel.is_cancelled() {
            return ProofResult::unknown(SolverError::Cancelled.to_string());
        }

        let budget = Budget {
            timeout: self.timeout,
            cancel: cancel.clone(),
        };
        let result = match self.solver.check(&obligation, &budget) {
            Ok(Verdict::Valid) => ProofResult::Proved,
            Ok(Verdict::Invalid(counterexample)) => ProofResult::Disproved { counterexample },
            Ok(Verdict::Unknown(reason)) => ProofResult::Unknown { reason },
            Err(e) => {
                warn!(function = %model.function_name, solver = self.solver.name(), error = %e, "solver failed");
                ProofResult::unknown(e.to_string())
            }
        };
        info!(
            function = %model.function_name,
            solver = self.solver.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            result = %result,
            "verification finished"
        );
        result
    }
}
