//! Engine selection from configuration.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::adapters::{AuthorityRound, AuthorityRoundParams, Ethash, EthashParams};
use crate::domain::{EngineError, EngineResult};
use crate::ports::ConsensusEngine;

/// Which engine to run, with its parameters.
///
/// ```json
/// { "engine": "ethash", "params": { "minimum_difficulty": "0x20000" } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "engine", content = "params", rename_all = "snake_case")]
pub enum EngineSpec {
    Ethash(EthashParams),
    AuthorityRound(AuthorityRoundParams),
}

impl EngineSpec {
    /// Parse a spec from JSON.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::InvalidSpec(e.to_string()))
    }

    /// Instantiate the engine.
    pub fn build(self) -> EngineResult<Arc<dyn ConsensusEngine>> {
        let engine: Arc<dyn ConsensusEngine> = match self {
            EngineSpec::Ethash(params) => {
                if params.difficulty_bound_divisor.is_zero() || params.difficulty_increment_divisor == 0 {
                    return Err(EngineError::InvalidSpec("divisors must be positive".into()));
                }
                Arc::new(Ethash::new(params))
            }
            EngineSpec::AuthorityRound(params) => Arc::new(AuthorityRound::new(params)?),
        };
        if engine.params().gas_limit_bound_divisor == 0 {
            return Err(EngineError::InvalidSpec(
                "gas_limit_bound_divisor must be positive".into(),
            ));
        }
        info!(engine = engine.name(), "Consensus engine ready");
        Ok(engine)
    }
}

impl Default for EngineSpec {
    fn default() -> Self {
        EngineSpec::Ethash(EthashParams::default())
    }
}
