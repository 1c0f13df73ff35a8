//! Solver backends
//!
//! [`Z3Solver`] runs an external `z3` process on the SMT-LIB2 encoding.
//! Both the solver-side `:timeout` option and a wall-clock deadline are
//! enforced; a process still running past the deadline is killed.

use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, trace};

use super::Counterexample;
use super::obligation::ProofObligation;
use super::smt::{self, Encoding, SmtError};

/// Solver process gets this long past its own timeout before it is killed
const KILL_GRACE: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Cooperative cancellation flag shared with a running check
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resource limits for one check
#[derive(Debug, Clone, Default)]
pub struct Budget {
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

impl Budget {
    pub fn deadline_from(&self, start: Instant) -> Option<Instant> {
        self.timeout.map(|t| start + t)
    }
}

/// Outcome of a completed check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No admissible assignment violates the obligation
    Valid,
    Invalid(Counterexample),
    Unknown(String),
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("solver `{0}` is not available")]
    Unavailable(String),
    #[error("solver I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("solver exited abnormally: {0}")]
    Crashed(String),
    #[error("solver rejected the query: {0}")]
    Rejected(String),
    #[error("malformed solver output: {0}")]
    Malformed(String),
    #[error("timeout")]
    Timeout,
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Encoding(#[from] SmtError),
}

/// Decides proof obligations
pub trait Solver: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, obligation: &ProofObligation, budget: &Budget) -> Result<Verdict, SolverError>;
}

/// Z3 SMT solver run as a subprocess
#[derive(Debug, Clone)]
pub struct Z3Solver {
    path: String,
}

impl Default for Z3Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Z3Solver {
    pub fn new() -> Self {
        Self {
            path: "z3".to_string(),
        }
    }

    /// Set custom Z3 path
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Check if the solver binary can be run
    pub fn is_available(&self) -> bool {
        Command::new(&self.path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    fn spawn(&self) -> Result<Child, SolverError> {
        Command::new(&self.path)
            .args(["-in", "-smt2"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => SolverError::Unavailable(self.path.clone()),
                _ => SolverError::Io(e),
            })
    }

    fn wait(child: &mut Child, budget: &Budget) -> Result<ExitStatus, SolverError> {
        let deadline = budget.deadline_from(Instant::now()).map(|d| d + KILL_GRACE);
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            let expired = deadline.is_some_and(|d| Instant::now() >= d);
            if expired || budget.cancel.is_cancelled() {
                // the process may exit between the poll and the kill
                let _ = child.kill();
                let _ = child.wait();
                return Err(if expired {
                    SolverError::Timeout
                } else {
                    SolverError::Cancelled
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Solver for Z3Solver {
    fn name(&self) -> &'static str {
        "z3"
    }

    fn check(&self, obligation: &ProofObligation, budget: &Budget) -> Result<Verdict, SolverError> {
        let encoding = smt::encode(obligation, budget.timeout)?;
        trace!(script = %encoding.script, "smt query");

        let mut child = self.spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(encoding.script.as_bytes())?;
        }
        let status = Self::wait(&mut child, budget)?;

        let mut stdout = String::new();
        if let Some(mut out) = child.stdout.take() {
            out.read_to_string(&mut stdout)?;
        }
        let mut stderr = String::new();
        if let Some(mut err) = child.stderr.take() {
            err.read_to_string(&mut stderr)?;
        }
        debug!(status = %status, bytes = stdout.len(), "z3 finished");

        match parse_response(&stdout, &encoding) {
            Err(SolverError::Malformed(_)) if !status.success() => {
                let detail = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
                Err(SolverError::Crashed(format!("{status}: {detail}")))
            }
            other => other,
        }
    }
}

/// Interpret z3 output: the first verdict line, then for `sat` the
/// `get-value` block that follows it
pub fn parse_response(output: &str, encoding: &Encoding) -> Result<Verdict, SolverError> {
    let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());
    while let Some(line) = lines.next() {
        match line {
            "unsat" => return Ok(Verdict::Valid),
            "unknown" => return Ok(Verdict::Unknown("solver returned unknown".to_string())),
            "timeout" => return Err(SolverError::Timeout),
            "sat" => {
                let rest: Vec<&str> = lines.collect();
                let assignment =
                    smt::parse_model(&rest.join("\n"), encoding).map_err(SolverError::Malformed)?;
                return Ok(Verdict::Invalid(Counterexample::new(assignment)));
            }
            l if l.starts_with("(error") => return Err(SolverError::Rejected(l.to_string())),
            _ => {}
        }
    }
    Err(SolverError::Malformed("no check-sat verdict in solver output".to_string()))
}
