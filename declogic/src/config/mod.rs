//! Configuration file (`declogic.toml`)
//!
//! ```toml
//! [builder]
//! strict = false
//!
//! [optimizer]
//! size_cutoff = 100
//!
//! [verifier]
//! backend = "z3"          # or "enumerate"
//! z3_path = "z3"
//! timeout_secs = 10       # 0 disables the limit
//! enumeration_limit = 1000000
//! ```
//!
//! Every key is optional; missing keys take the defaults shown.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ir::BuilderOptions;
use crate::opt::DEFAULT_SIZE_CUTOFF;
use crate::verify::enumerate::DEFAULT_ENUMERATION_LIMIT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub builder: BuilderConfig,
    pub optimizer: OptimizerConfig,
    pub verifier: VerifierConfig,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuilderConfig {
    pub strict: bool,
}

impl BuilderConfig {
    pub fn options(&self) -> BuilderOptions {
        BuilderOptions { strict: self.strict }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    pub size_cutoff: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            size_cutoff: DEFAULT_SIZE_CUTOFF,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Z3,
    Enumerate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    pub backend: Backend,
    pub z3_path: String,
    pub timeout_secs: u64,
    pub enumeration_limit: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Z3,
            z3_path: "z3".to_string(),
            timeout_secs: 10,
            enumeration_limit: DEFAULT_ENUMERATION_LIMIT,
        }
    }
}
