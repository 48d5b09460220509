use std::rc::Rc;

use pgm_core::{Factor, PgmError, RngHandle, Variable};
use pgm_mcmc::{Exponential, MhMove, MoveOutcome, Proposal, RealVar};

const TRIALS: usize = 100_000;

struct Jump {
    target: Rc<RealVar>,
    to: f64,
    log_ratio: f64,
}

impl Proposal for Jump {
    fn propose(&mut self, _rng: &mut RngHandle) -> Result<f64, PgmError> {
        self.target.set(self.to);
        Ok(self.log_ratio)
    }
}

/// Fraction of `TRIALS` steps from `from` to `to` that are accepted under an
/// Exponential(1) density.
fn acceptance_frequency(from: f64, to: f64, log_ratio: f64, seed: u64) -> f64 {
    let x = RealVar::new(from);
    let prior: Rc<dyn Factor> = Exponential::new(&x, 1.0);
    let proposal = Jump {
        target: x.clone(),
        to,
        log_ratio,
    };
    let mut mh = MhMove::new(
        "jump@x",
        x.clone() as Rc<dyn Variable>,
        vec![prior],
        Box::new(proposal),
    );
    let mut rng = RngHandle::from_seed(seed);
    let mut accepted = 0usize;
    for _ in 0..TRIALS {
        x.set(from);
        if let MoveOutcome::Metropolis { accepted: true, .. } = mh.step(&mut rng).unwrap() {
            accepted += 1;
        }
    }
    accepted as f64 / TRIALS as f64
}

#[test]
fn downhill_move_is_accepted_at_the_density_ratio() {
    let expected = (-0.5f64).exp();
    let observed = acceptance_frequency(1.0, 1.5, 0.0, 1);
    assert!(
        (observed - expected).abs() < 0.01,
        "observed {observed}, expected {expected}"
    );
}

#[test]
fn uphill_move_is_always_accepted() {
    assert_eq!(acceptance_frequency(1.5, 1.0, 0.0, 2), 1.0);
}

#[test]
fn move_outside_the_support_is_never_accepted() {
    assert_eq!(acceptance_frequency(1.0, -0.5, 0.0, 3), 0.0);
}

#[test]
fn proposal_ratio_enters_the_acceptance() {
    // Density ratio e^-1 offset by a proposal ratio of e^0.5.
    let expected = (-0.5f64).exp();
    let observed = acceptance_frequency(1.0, 2.0, 0.5, 4);
    assert!(
        (observed - expected).abs() < 0.01,
        "observed {observed}, expected {expected}"
    );
    assert_eq!(acceptance_frequency(1.0, 2.0, 1.0, 5), 1.0);
}
