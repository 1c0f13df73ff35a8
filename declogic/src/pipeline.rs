//! End-to-end analysis: extract, then optimize

use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::ir::{self, IrModel};
use crate::opt::{OptimizationResult, Optimizer};

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub model: IrModel,
    pub optimization: OptimizationResult,
}

/// Build the model of `target` and run every optimizer pass over it
pub fn analyze(source: &str, target: Option<&str>, config: &Config) -> Result<Analysis> {
    let model = ir::build_with(source, target, &config.builder.options())?;
    let optimization = Optimizer::new(config.optimizer.size_cutoff).optimize(&model);
    Ok(Analysis { model, optimization })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;

    #[test]
    fn test_analyze_respects_strict_builder() {
        let source = "def f(x):\n    if x > 1:\n        return 1\n";
        let mut config = Config::default();
        assert!(analyze(source, None, &config).is_ok());
        config.builder.strict = true;
        assert!(matches!(
            analyze(source, None, &config),
            Err(ExtractionError::FallThrough { .. })
        ));
    }

    #[test]
    fn test_analyze_uses_size_cutoff() {
        let source = "def f(x: int):\n    if x >= 0 and x < 50:\n        return 1\n    return 0\n";
        let mut config = Config::default();
        let full = analyze(source, None, &config).unwrap();
        assert_eq!(full.optimization.lookup_table.samples[0].values.len(), 51);
        config.optimizer.size_cutoff = 10;
        let sampled = analyze(source, None, &config).unwrap();
        assert_eq!(sampled.optimization.lookup_table.samples[0].values.len(), 4);
    }
}
