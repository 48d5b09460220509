//! Built-in archetypes.

use std::rc::Rc;

use pgm_core::{ErrorInfo, Factor, PgmError, RngHandle};

use crate::distributions::DiscreteUniform;
use crate::kernel::{Proposal, SelfContainedMove};
use crate::model::total_log_density;
use crate::registry::{MoveArchetype, MoveBody, SlotSpec, Wiring};
use crate::variables::{IntVar, RealVar};

/// Gaussian random walk on a [`RealVar`]; symmetric, so the log ratio is zero.
#[derive(Debug, Clone)]
pub struct RealRandomWalk {
    step_sd: f64,
}

impl RealRandomWalk {
    /// Random walk with steps of standard deviation `step_sd`.
    pub fn new(step_sd: f64) -> Self {
        Self { step_sd }
    }
}

impl MoveArchetype for RealRandomWalk {
    fn name(&self) -> &str {
        "real-random-walk"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::sampled_variable::<RealVar>("variable"),
            SlotSpec::any_factors("factors"),
        ]
    }

    fn instantiate(&self, wiring: Wiring) -> Result<MoveBody, PgmError> {
        Ok(MoveBody::Proposal(Box::new(GaussianStep {
            variable: wiring.variable::<RealVar>()?,
            step_sd: self.step_sd,
        })))
    }
}

struct GaussianStep {
    variable: Rc<RealVar>,
    step_sd: f64,
}

impl Proposal for GaussianStep {
    fn propose(&mut self, rng: &mut RngHandle) -> Result<f64, PgmError> {
        let step = self.step_sd * rng.standard_normal();
        self.variable.set(self.variable.get() + step);
        Ok(0.0)
    }
}

/// Random walk moving an [`IntVar`] up or down by one with equal probability.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerRandomWalk;

impl MoveArchetype for IntegerRandomWalk {
    fn name(&self) -> &str {
        "integer-random-walk"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::sampled_variable::<IntVar>("variable"),
            SlotSpec::any_factors("factors"),
        ]
    }

    fn instantiate(&self, wiring: Wiring) -> Result<MoveBody, PgmError> {
        Ok(MoveBody::Proposal(Box::new(UnitStep {
            variable: wiring.variable::<IntVar>()?,
        })))
    }
}

struct UnitStep {
    variable: Rc<IntVar>,
}

impl Proposal for UnitStep {
    fn propose(&mut self, rng: &mut RngHandle) -> Result<f64, PgmError> {
        let step = if rng.coin() { 1 } else { -1 };
        self.variable.set(self.variable.get().saturating_add(step));
        Ok(0.0)
    }
}

/// Exact conditional draw for an [`IntVar`] whose support is bounded by a
/// [`DiscreteUniform`] factor.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerGibbs;

/// Largest support the Gibbs move enumerates.
pub const MAX_GIBBS_SUPPORT: i64 = 1 << 16;

impl MoveArchetype for IntegerGibbs {
    fn name(&self) -> &str {
        "integer-gibbs"
    }

    fn slots(&self) -> Vec<SlotSpec> {
        vec![
            SlotSpec::sampled_variable::<IntVar>("variable"),
            SlotSpec::factor::<DiscreteUniform>("support"),
            SlotSpec::any_factors("factors"),
        ]
    }

    fn instantiate(&self, wiring: Wiring) -> Result<MoveBody, PgmError> {
        let (lower, upper) = wiring.factor::<DiscreteUniform>("support")?.bounds();
        let width = upper.checked_sub(lower).filter(|w| *w >= 0);
        if !matches!(width, Some(w) if w < MAX_GIBBS_SUPPORT) {
            return Err(PgmError::Config(
                ErrorInfo::new("unsupported-support", "support is empty or too large to enumerate")
                    .with_context("variable", wiring.path())
                    .with_context("lower", lower.to_string())
                    .with_context("upper", upper.to_string()),
            ));
        }
        Ok(MoveBody::SelfContained(Box::new(GibbsUpdate {
            variable: wiring.variable::<IntVar>()?,
            factors: wiring.connected_factors().to_vec(),
            lower,
            upper,
            weights: Vec::new(),
        })))
    }
}

struct GibbsUpdate {
    variable: Rc<IntVar>,
    factors: Vec<Rc<dyn Factor>>,
    lower: i64,
    upper: i64,
    weights: Vec<f64>,
}

impl SelfContainedMove for GibbsUpdate {
    fn execute(&mut self, rng: &mut RngHandle) -> Result<(), PgmError> {
        let current = self.variable.get();
        self.weights.clear();
        for k in self.lower..=self.upper {
            self.variable.set(k);
            match total_log_density(&self.factors) {
                Ok(log_density) => self.weights.push(log_density),
                Err(err) => {
                    self.variable.set(current);
                    return Err(err);
                }
            }
        }

        let max = self.weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max == f64::NEG_INFINITY {
            self.variable.set(current);
            return Ok(());
        }
        for weight in &mut self.weights {
            *weight = (*weight - max).exp();
        }
        let total: f64 = self.weights.iter().sum();
        let mut remaining = rng.uniform() * total;
        // Rounding can leave a little mass after the last bin.
        let mut chosen = self.weights.iter().rposition(|w| *w > 0.0).unwrap_or(0);
        for (offset, weight) in self.weights.iter().enumerate() {
            if remaining < *weight {
                chosen = offset;
                break;
            }
            remaining -= weight;
        }
        self.variable.set(self.lower + chosen as i64);
        Ok(())
    }
}
