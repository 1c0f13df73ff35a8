//! declogic CLI

use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use declogic::config::{Backend, Config};
use declogic::error::report_error;
use declogic::ir::{self, IrModel, Literal, Value};
use declogic::opt::Optimizer;
use declogic::verify::{self, Constraint, ProofResult, Verifier};

#[derive(Parser)]
#[command(name = "declogic", version, about = "Extract, optimize and verify decision logic")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output: -v info, -vv debug, -vvv trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Input {
    /// Source file
    file: PathBuf,

    /// Function to analyze; required when the file defines several
    #[arg(short, long)]
    function: Option<String>,

    /// Reject functions with a path that falls through without returning
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct Property {
    /// Integer bounds as `name=lo..hi`; either side may be left open
    #[arg(long = "range", value_parser = parse_range)]
    ranges: Vec<(String, Constraint)>,

    /// Integer value set as `name=1,2,3`
    #[arg(long = "one-of", value_parser = parse_one_of)]
    one_of: Vec<(String, Constraint)>,

    /// Boolean parameter
    #[arg(long = "bool", value_name = "NAME")]
    booleans: Vec<String>,

    /// Valid outputs as comma separated literals: `0,1,"ok",None`
    #[arg(long, required = true, value_delimiter = ',', value_parser = parse_literal)]
    valid: Vec<Literal>,
}

impl Property {
    fn constraints(&self) -> BTreeMap<String, Constraint> {
        let mut constraints: BTreeMap<String, Constraint> =
            self.ranges.iter().chain(&self.one_of).cloned().collect();
        for name in &self.booleans {
            constraints.insert(name.clone(), Constraint::Boolean);
        }
        constraints
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SolverKind {
    Z3,
    Enumerate,
}

#[derive(Subcommand)]
enum Command {
    /// Print the extracted IR model as JSON
    Extract {
        #[command(flatten)]
        input: Input,
    },
    /// Run the optimizer passes and print the result as JSON
    Optimize {
        #[command(flatten)]
        input: Input,

        /// Enumerate integer ranges up to this width
        #[arg(long)]
        size_cutoff: Option<usize>,
    },
    /// Print the synthesized lookup table
    Table {
        #[command(flatten)]
        input: Input,

        /// Enumerate integer ranges up to this width
        #[arg(long)]
        size_cutoff: Option<usize>,
    },
    /// Check that every admissible input yields a valid output
    Verify {
        #[command(flatten)]
        input: Input,

        #[command(flatten)]
        property: Property,

        #[arg(long, value_enum)]
        solver: Option<SolverKind>,

        /// Time limit in seconds; 0 disables it
        #[arg(long)]
        timeout: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the SMT-LIB2 query `verify` would send to z3
    Smt {
        #[command(flatten)]
        input: Input,

        #[command(flatten)]
        property: Property,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    };
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => Config::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Extract { input } => {
            let Some(model) = load(&input, &mut config)? else {
                return Ok(ExitCode::FAILURE);
            };
            println!("{}", serde_json::to_string_pretty(&model)?);
        }
        Command::Optimize { input, size_cutoff } => {
            let Some(model) = load(&input, &mut config)? else {
                return Ok(ExitCode::FAILURE);
            };
            let cutoff = size_cutoff.unwrap_or(config.optimizer.size_cutoff);
            let result = Optimizer::new(cutoff).optimize(&model);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Table { input, size_cutoff } => {
            let Some(model) = load(&input, &mut config)? else {
                return Ok(ExitCode::FAILURE);
            };
            let cutoff = size_cutoff.unwrap_or(config.optimizer.size_cutoff);
            let result = Optimizer::new(cutoff).optimize(&model);
            print!("{}", result.lookup_table);
        }
        Command::Verify {
            input,
            property,
            solver,
            timeout,
            json,
        } => {
            let Some(model) = load(&input, &mut config)? else {
                return Ok(ExitCode::FAILURE);
            };
            match solver {
                Some(SolverKind::Z3) => config.verifier.backend = Backend::Z3,
                Some(SolverKind::Enumerate) => config.verifier.backend = Backend::Enumerate,
                None => {}
            }
            if let Some(secs) = timeout {
                config.verifier.timeout_secs = secs;
            }
            let verifier = Verifier::from_config(&config.verifier);
            let result = verifier.verify(&model, &property.constraints(), &property.valid);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}: {result}", model.function_name);
            }
            return Ok(match result {
                ProofResult::Proved => ExitCode::SUCCESS,
                ProofResult::Disproved { .. } => ExitCode::from(1),
                ProofResult::Unknown { .. } => ExitCode::from(2),
            });
        }
        Command::Smt { input, property } => {
            let Some(model) = load(&input, &mut config)? else {
                return Ok(ExitCode::FAILURE);
            };
            let timeout = (config.verifier.timeout_secs > 0)
                .then(|| Duration::from_secs(config.verifier.timeout_secs));
            let script = verify::smt_script(&model, &property.constraints(), &property.valid, timeout)?;
            print!("{script}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Read and extract; extraction errors are reported with source context
fn load(input: &Input, config: &mut Config) -> Result<Option<IrModel>, Box<dyn Error>> {
    let source = std::fs::read_to_string(&input.file)?;
    if input.strict {
        config.builder.strict = true;
    }
    match ir::build_with(&source, input.function.as_deref(), &config.builder.options()) {
        Ok(model) => Ok(Some(model)),
        Err(e) => {
            report_error(&input.file.display().to_string(), &source, &e);
            Ok(None)
        }
    }
}

fn parse_range(arg: &str) -> Result<(String, Constraint), String> {
    let (name, bounds) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected `name=lo..hi`, got `{arg}`"))?;
    let (lo, hi) = bounds
        .split_once("..")
        .ok_or_else(|| format!("expected `lo..hi`, got `{bounds}`"))?;
    let bound = |text: &str| -> Result<Option<i64>, String> {
        let text = text.trim().trim_start_matches('=');
        if text.is_empty() {
            Ok(None)
        } else {
            text.parse().map(Some).map_err(|e| format!("bad bound `{text}`: {e}"))
        }
    };
    Ok((
        name.trim().to_string(),
        Constraint::Range {
            min: bound(lo)?,
            max: bound(hi)?,
        },
    ))
}

fn parse_one_of(arg: &str) -> Result<(String, Constraint), String> {
    let (name, values) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected `name=v1,v2,...`, got `{arg}`"))?;
    let values = values
        .split(',')
        .map(|v| v.trim().parse::<i64>().map_err(|e| format!("bad value `{v}`: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name.trim().to_string(), Constraint::one_of(values)))
}

/// Python-style literal; anything unrecognized is taken as a bare string
fn parse_literal(arg: &str) -> Result<Literal, String> {
    let text = arg.trim();
    let value = match text {
        "None" => Value::None,
        "True" => Value::Bool(true),
        "False" => Value::Bool(false),
        _ => match text.parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => {
                let unquoted = ['"', '\'']
                    .iter()
                    .find_map(|q| text.strip_prefix(*q).and_then(|t| t.strip_suffix(*q)))
                    .unwrap_or(text);
                Value::Str(unquoted.to_string())
            }
        },
    };
    Ok(Literal::Value(value))
}
