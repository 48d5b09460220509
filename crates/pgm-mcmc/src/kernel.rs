use std::mem;
use std::rc::Rc;

use pgm_core::{ErrorInfo, Factor, PgmError, RngHandle, Variable, VariableValue};
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::config::RunConfig;
use crate::model::{total_log_density, ProbabilityModel};
use crate::processor::{ModelView, Processor};
use crate::registry::MoveRegistry;
use crate::synthesis::synthesize;

/// Mutates a variable in place and reports the proposal's log ratio.
pub trait Proposal {
    /// Applies the proposal and returns `log q(old | new) - log q(new | old)`.
    fn propose(&mut self, rng: &mut RngHandle) -> Result<f64, PgmError>;
}

/// A move that carries out its own update, e.g. an exact conditional draw.
pub trait SelfContainedMove {
    /// Executes one update.
    fn execute(&mut self, rng: &mut RngHandle) -> Result<(), PgmError>;
}

/// Outcome of executing one sampler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MoveOutcome {
    /// A Metropolis-Hastings step.
    Metropolis {
        /// Whether the proposal was kept.
        accepted: bool,
        /// Log ratio reported by the proposal.
        log_ratio: f64,
        /// Acceptance probability, capped at one.
        acceptance: f64,
    },
    /// A self-contained move ran.
    Executed,
}

enum MoveState {
    Idle,
    Proposed { saved: VariableValue },
}

/// Metropolis-Hastings wrapper around a [`Proposal`].
///
/// The move is bound to one variable and to every factor connected to it;
/// only those factors enter the acceptance ratio.
pub struct MhMove {
    label: String,
    variable: Rc<dyn Variable>,
    factors: Vec<Rc<dyn Factor>>,
    proposal: Box<dyn Proposal>,
    state: MoveState,
}

impl MhMove {
    /// Binds `proposal` to `variable` and its connected `factors`.
    pub fn new(
        label: impl Into<String>,
        variable: Rc<dyn Variable>,
        factors: Vec<Rc<dyn Factor>>,
        proposal: Box<dyn Proposal>,
    ) -> Self {
        Self {
            label: label.into(),
            variable,
            factors,
            proposal,
            state: MoveState::Idle,
        }
    }

    /// Label of the move, `archetype@variable-path`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Factors entering the acceptance ratio.
    pub fn factors(&self) -> &[Rc<dyn Factor>] {
        &self.factors
    }

    /// Whether a proposal is awaiting [`MhMove::accept_reject`].
    pub fn is_proposed(&self) -> bool {
        matches!(self.state, MoveState::Proposed { .. })
    }

    /// Snapshots the variable and applies the proposal.
    pub fn propose(&mut self, rng: &mut RngHandle) -> Result<f64, PgmError> {
        if self.is_proposed() {
            return Err(PgmError::Usage(
                ErrorInfo::new("reentrant-propose", "propose called while a proposal is pending")
                    .with_context("move", self.label.clone())
                    .with_hint("call accept_reject before proposing again"),
            ));
        }
        self.state = MoveState::Proposed {
            saved: self.variable.value(),
        };
        let ratio = match self.proposal.propose(rng) {
            Ok(ratio) => ratio,
            Err(err) => {
                self.accept_reject(false)?;
                return Err(err);
            }
        };
        if ratio.is_nan() {
            self.accept_reject(false)?;
            return Err(PgmError::Numeric(
                ErrorInfo::new("nan-proposal-ratio", "proposal log ratio evaluated to NaN")
                    .with_context("move", self.label.clone()),
            ));
        }
        Ok(ratio)
    }

    /// Keeps the proposed value or restores the snapshot.
    pub fn accept_reject(&mut self, accept: bool) -> Result<(), PgmError> {
        match mem::replace(&mut self.state, MoveState::Idle) {
            MoveState::Idle => Err(PgmError::Usage(
                ErrorInfo::new("no-pending-proposal", "accept_reject called without a proposal")
                    .with_context("move", self.label.clone()),
            )),
            MoveState::Proposed { saved } => {
                if !accept {
                    self.variable.restore(&saved)?;
                }
                Ok(())
            }
        }
    }

    /// One complete Metropolis-Hastings step.
    pub fn step(&mut self, rng: &mut RngHandle) -> Result<MoveOutcome, PgmError> {
        let before = total_log_density(&self.factors)?;
        let log_ratio = self.propose(rng)?;
        let after = match total_log_density(&self.factors) {
            Ok(after) => after,
            Err(err) => {
                self.accept_reject(false)?;
                return Err(err);
            }
        };
        let log_acceptance = log_ratio + after - before;
        // -inf - -inf: both states outside the support.
        let acceptance = if log_acceptance.is_nan() {
            0.0
        } else {
            log_acceptance.exp().min(1.0)
        };
        let draw = rng.uniform();
        let accepted = draw < acceptance;
        self.accept_reject(accepted)?;
        trace!(
            label = %self.label,
            before,
            after,
            acceptance,
            accepted,
            "metropolis step"
        );
        Ok(MoveOutcome::Metropolis {
            accepted,
            log_ratio,
            acceptance,
        })
    }
}

impl std::fmt::Debug for MhMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MhMove")
            .field("label", &self.label)
            .field("variable", &self.variable)
            .field("factors", &self.factors.len())
            .field("proposed", &self.is_proposed())
            .finish()
    }
}

/// An executable move produced by synthesis.
pub enum Sampler {
    /// Metropolis-Hastings move.
    Metropolis(MhMove),
    /// Move with its own update protocol.
    SelfContained {
        /// Label of the move, `archetype@variable-path`.
        label: String,
        /// The move itself.
        body: Box<dyn SelfContainedMove>,
    },
}

impl Sampler {
    /// Label of the move.
    pub fn label(&self) -> &str {
        match self {
            Sampler::Metropolis(mh) => mh.label(),
            Sampler::SelfContained { label, .. } => label,
        }
    }

    /// Executes the move once.
    pub fn execute(&mut self, rng: &mut RngHandle) -> Result<MoveOutcome, PgmError> {
        match self {
            Sampler::Metropolis(mh) => mh.step(rng),
            Sampler::SelfContained { body, .. } => {
                body.execute(rng)?;
                Ok(MoveOutcome::Executed)
            }
        }
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sampler::Metropolis(mh) => std::fmt::Debug::fmt(mh, f),
            Sampler::SelfContained { label, .. } => {
                f.debug_struct("SelfContained").field("label", label).finish()
            }
        }
    }
}

/// Per-sampler counters accumulated over a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoveStatistics {
    /// Label of the move.
    pub label: String,
    /// Metropolis proposals made.
    pub proposed: usize,
    /// Metropolis proposals accepted.
    pub accepted: usize,
    /// Self-contained executions.
    pub executed: usize,
}

impl MoveStatistics {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            proposed: 0,
            accepted: 0,
            executed: 0,
        }
    }

    fn record(&mut self, outcome: &MoveOutcome) {
        match outcome {
            MoveOutcome::Metropolis { accepted, .. } => {
                self.proposed += 1;
                if *accepted {
                    self.accepted += 1;
                }
            }
            MoveOutcome::Executed => self.executed += 1,
        }
    }

    /// Fraction of proposals accepted; `None` when nothing was proposed.
    pub fn acceptance_rate(&self) -> Option<f64> {
        if self.proposed == 0 {
            None
        } else {
            Some(self.accepted as f64 / self.proposed as f64)
        }
    }
}

/// Summary returned to callers after a run completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Sweeps executed, burn-in included.
    pub sweeps: usize,
    /// Statistics per sampler, in execution order.
    pub moves: Vec<MoveStatistics>,
    /// Joint log density of the final state.
    pub final_log_density: f64,
}

impl RunSummary {
    /// Pretty-printed JSON rendering of the summary.
    pub fn to_json(&self) -> Result<String, PgmError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| PgmError::Serde(ErrorInfo::new("summary-serialize", err.to_string())))
    }
}

/// Runs `config.sweeps` sweeps, each executing every sampler once in order
/// and then handing a read-only view of the model to `processor`.
pub fn run(
    model: &ProbabilityModel,
    samplers: &mut [Sampler],
    config: &RunConfig,
    rng: &mut RngHandle,
    processor: &mut dyn Processor,
) -> Result<RunSummary, PgmError> {
    config.validate()?;
    info!(
        sweeps = config.sweeps,
        samplers = samplers.len(),
        "starting run"
    );
    let mut statistics: Vec<MoveStatistics> = samplers
        .iter()
        .map(|sampler| MoveStatistics::new(sampler.label()))
        .collect();

    for sweep in 0..config.sweeps {
        for (sampler, stats) in samplers.iter_mut().zip(statistics.iter_mut()) {
            let outcome = sampler.execute(rng).map_err(|err| with_sweep(err, sweep))?;
            stats.record(&outcome);
        }
        processor.process(sweep, &ModelView::new(model))?;
    }

    let final_log_density = model.log_density()?;
    info!(sweeps = config.sweeps, final_log_density, "run finished");
    Ok(RunSummary {
        sweeps: config.sweeps,
        moves: statistics,
        final_log_density,
    })
}

/// Synthesizes the model's moves and runs them with the RNG seeded from
/// `config.seed_policy`.
pub fn sample(
    model: &ProbabilityModel,
    registry: &MoveRegistry,
    config: &RunConfig,
    processor: &mut dyn Processor,
) -> Result<RunSummary, PgmError> {
    let mut samplers = synthesize(model, registry)?;
    let mut rng = config.seed_policy.rng();
    run(model, &mut samplers, config, &mut rng, processor)
}

fn with_sweep(err: PgmError, sweep: usize) -> PgmError {
    let attach = |info: ErrorInfo| info.with_context("sweep", sweep.to_string());
    match err {
        PgmError::Usage(info) => PgmError::Usage(attach(info)),
        PgmError::Numeric(info) => PgmError::Numeric(attach(info)),
        other => other,
    }
}
