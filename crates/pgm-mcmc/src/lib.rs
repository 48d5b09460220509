#![deny(missing_docs)]
#![doc = include_str!("../docs/sampling-api.md")]

//! Move synthesis and Metropolis-Hastings execution over object models.

/// YAML configuration schema and defaults.
pub mod config;
pub mod distributions;
/// Metropolis-Hastings state machine, samplers and the sweep driver.
pub mod kernel;
/// Model construction and density evaluation.
pub mod model;
pub mod moves;
pub mod processor;
pub mod registry;
/// Matching archetype slots against connected factors.
pub mod synthesis;
/// Built-in variable types.
pub mod variables;

pub use config::{ProposalConfig, RunConfig, SeedPolicy};
pub use distributions::{DiscreteUniform, Exponential, Normal, Poisson, RealParam};
pub use kernel::{
    run, sample, MhMove, MoveOutcome, MoveStatistics, Proposal, RunSummary, Sampler,
    SelfContainedMove,
};
pub use model::{total_log_density, ModelBuilder, ProbabilityModel};
pub use moves::{IntegerGibbs, IntegerRandomWalk, RealRandomWalk};
pub use processor::{ModelView, NullProcessor, Processor, TraceRecorder};
pub use registry::{
    Cardinality, FactorRequirement, MoveArchetype, MoveBody, MoveRegistry, SlotSpec, Wiring,
};
pub use synthesis::synthesize;
pub use variables::{IntVar, RealVar};
