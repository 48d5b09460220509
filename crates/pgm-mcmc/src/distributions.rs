//! Built-in factors over [`RealVar`] and [`IntVar`] realizations.
//!
//! Every factor declares its realization through [`Members::defines`] and its
//! parameters as ordinary members, so constant parameters show up as opaque
//! constituents and variable parameters link the factor to another variable.

use std::f64::consts::PI;
use std::rc::Rc;

use pgm_core::{Factor, Members, ObjectRef};

use crate::variables::{IntVar, RealVar};

/// A real parameter that is either fixed or read from another variable.
#[derive(Debug, Clone)]
pub enum RealParam {
    /// Fixed value.
    Constant(f64),
    /// Current value of a variable.
    Variable(Rc<RealVar>),
}

impl RealParam {
    /// Current parameter value.
    pub fn get(&self) -> f64 {
        match self {
            RealParam::Constant(value) => *value,
            RealParam::Variable(variable) => variable.get(),
        }
    }

    fn declare(&self, name: &'static str, members: &mut Members) {
        match self {
            RealParam::Constant(_) => members.opaque(name),
            RealParam::Variable(variable) => members.field(name, ObjectRef::variable(variable)),
        };
    }
}

impl From<f64> for RealParam {
    fn from(value: f64) -> Self {
        RealParam::Constant(value)
    }
}

impl From<&Rc<RealVar>> for RealParam {
    fn from(variable: &Rc<RealVar>) -> Self {
        RealParam::Variable(Rc::clone(variable))
    }
}

/// Exponential distribution with the given rate.
#[derive(Debug)]
pub struct Exponential {
    realization: Rc<RealVar>,
    rate: RealParam,
}

impl Exponential {
    /// Defines `realization ~ Exponential(rate)`.
    pub fn new(realization: &Rc<RealVar>, rate: impl Into<RealParam>) -> Rc<Self> {
        Rc::new(Self {
            realization: Rc::clone(realization),
            rate: rate.into(),
        })
    }
}

impl Factor for Exponential {
    fn log_density(&self) -> f64 {
        let x = self.realization.get();
        let rate = self.rate.get();
        if x < 0.0 || rate <= 0.0 {
            return f64::NEG_INFINITY;
        }
        rate.ln() - rate * x
    }

    fn members(&self, members: &mut Members) {
        members.defines("realization", ObjectRef::variable(&self.realization));
        self.rate.declare("rate", members);
    }
}

/// Normal distribution parameterised by mean and standard deviation.
#[derive(Debug)]
pub struct Normal {
    realization: Rc<RealVar>,
    mean: RealParam,
    sd: RealParam,
}

impl Normal {
    /// Defines `realization ~ Normal(mean, sd)`.
    pub fn new(
        realization: &Rc<RealVar>,
        mean: impl Into<RealParam>,
        sd: impl Into<RealParam>,
    ) -> Rc<Self> {
        Rc::new(Self {
            realization: Rc::clone(realization),
            mean: mean.into(),
            sd: sd.into(),
        })
    }
}

impl Factor for Normal {
    fn log_density(&self) -> f64 {
        let sd = self.sd.get();
        if sd <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let z = (self.realization.get() - self.mean.get()) / sd;
        -0.5 * (2.0 * PI).ln() - sd.ln() - 0.5 * z * z
    }

    fn members(&self, members: &mut Members) {
        members.defines("realization", ObjectRef::variable(&self.realization));
        self.mean.declare("mean", members);
        self.sd.declare("sd", members);
    }
}

/// Uniform distribution over the integers `lower..=upper`.
#[derive(Debug)]
pub struct DiscreteUniform {
    realization: Rc<IntVar>,
    lower: i64,
    upper: i64,
}

impl DiscreteUniform {
    /// Defines `realization ~ DiscreteUniform(lower, upper)`, both bounds inclusive.
    pub fn new(realization: &Rc<IntVar>, lower: i64, upper: i64) -> Rc<Self> {
        Rc::new(Self {
            realization: Rc::clone(realization),
            lower,
            upper,
        })
    }

    /// Inclusive support bounds.
    pub fn bounds(&self) -> (i64, i64) {
        (self.lower, self.upper)
    }
}

impl Factor for DiscreteUniform {
    fn log_density(&self) -> f64 {
        let k = self.realization.get();
        if self.upper < self.lower || k < self.lower || k > self.upper {
            return f64::NEG_INFINITY;
        }
        // Widened so the full i64 range does not overflow.
        let count = (i128::from(self.upper) - i128::from(self.lower) + 1) as f64;
        -count.ln()
    }

    fn members(&self, members: &mut Members) {
        members
            .defines("realization", ObjectRef::variable(&self.realization))
            .opaque("lower")
            .opaque("upper");
    }
}

/// Poisson distribution with the given rate.
#[derive(Debug)]
pub struct Poisson {
    realization: Rc<IntVar>,
    rate: RealParam,
}

impl Poisson {
    /// Defines `realization ~ Poisson(rate)`.
    pub fn new(realization: &Rc<IntVar>, rate: impl Into<RealParam>) -> Rc<Self> {
        Rc::new(Self {
            realization: Rc::clone(realization),
            rate: rate.into(),
        })
    }
}

impl Factor for Poisson {
    fn log_density(&self) -> f64 {
        let k = self.realization.get();
        let rate = self.rate.get();
        if k < 0 || rate < 0.0 {
            return f64::NEG_INFINITY;
        }
        if rate == 0.0 {
            return if k == 0 { 0.0 } else { f64::NEG_INFINITY };
        }
        k as f64 * rate.ln() - rate - ln_factorial(k)
    }

    fn members(&self, members: &mut Members) {
        members.defines("realization", ObjectRef::variable(&self.realization));
        self.rate.declare("rate", members);
    }
}

fn ln_factorial(k: i64) -> f64 {
    (2..=k).map(|i| (i as f64).ln()).sum()
}
