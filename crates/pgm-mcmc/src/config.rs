use std::fs;
use std::path::Path;

use pgm_core::{ErrorInfo, PgmError, RngHandle};
use serde::{Deserialize, Serialize};

/// YAML-configurable parameters governing a sampling run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Number of full sweeps to execute, burn-in included.
    #[serde(default = "default_sweeps")]
    pub sweeps: usize,
    /// Number of initial sweeps the trace recorder discards.
    #[serde(default)]
    pub burn_in: usize,
    /// Interval at which the trace recorder keeps a sweep.
    #[serde(default = "default_thinning")]
    pub thinning: usize,
    /// Master seed and chain substream.
    #[serde(default)]
    pub seed_policy: SeedPolicy,
    /// Tuning of the built-in proposals.
    #[serde(default)]
    pub proposals: ProposalConfig,
}

fn default_sweeps() -> usize {
    1_000
}

fn default_thinning() -> usize {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sweeps: default_sweeps(),
            burn_in: 0,
            thinning: default_thinning(),
            seed_policy: SeedPolicy::default(),
            proposals: ProposalConfig::default(),
        }
    }
}

impl RunConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, PgmError> {
        let config: RunConfig = serde_yaml::from_str(yaml)
            .map_err(|err| PgmError::Serde(ErrorInfo::new("config-parse", err.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    pub fn load(path: &Path) -> Result<Self, PgmError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            PgmError::Serde(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&contents).map_err(|err| match err {
            PgmError::Serde(info) => {
                PgmError::Serde(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Renders the configuration as YAML.
    pub fn to_yaml_string(&self) -> Result<String, PgmError> {
        serde_yaml::to_string(self)
            .map_err(|err| PgmError::Serde(ErrorInfo::new("config-serialize", err.to_string())))
    }

    /// Rejects settings no run can honour.
    pub fn validate(&self) -> Result<(), PgmError> {
        if self.thinning == 0 {
            return Err(PgmError::Config(
                ErrorInfo::new("invalid-thinning", "thinning must be at least 1")
                    .with_context("thinning", "0"),
            ));
        }
        let sd = self.proposals.real_step_sd;
        if !(sd.is_finite() && sd > 0.0) {
            return Err(PgmError::Config(
                ErrorInfo::new("invalid-step-size", "real_step_sd must be finite and positive")
                    .with_context("real_step_sd", sd.to_string()),
            ));
        }
        Ok(())
    }
}

/// Deterministic seeding configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedPolicy {
    /// Master seed used for the run.
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
    /// Chain index; when set, the chain draws from its own substream of the
    /// master seed.
    #[serde(default)]
    pub chain: Option<u64>,
}

fn default_master_seed() -> u64 {
    0x05EE_D5EE_DD15_5EED_u64
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            master_seed: default_master_seed(),
            chain: None,
        }
    }
}

impl SeedPolicy {
    /// Fixed master seed, no chain substream.
    pub fn fixed(master_seed: u64) -> Self {
        Self {
            master_seed,
            chain: None,
        }
    }

    /// RNG for this policy.
    pub fn rng(&self) -> RngHandle {
        match self.chain {
            None => RngHandle::from_seed(self.master_seed),
            Some(chain) => RngHandle::from_substream(self.master_seed, chain),
        }
    }
}

/// Tuning of the built-in proposals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProposalConfig {
    /// Standard deviation of the Gaussian random-walk step on real variables.
    #[serde(default = "default_real_step_sd")]
    pub real_step_sd: f64,
}

fn default_real_step_sd() -> f64 {
    1.0
}

impl Default for ProposalConfig {
    fn default() -> Self {
        Self {
            real_step_sd: default_real_step_sd(),
        }
    }
}
