use std::cell::Cell;
use std::rc::Rc;

use pgm_core::{ErrorInfo, PgmError, Variable, VariableValue};

fn kind_mismatch(expected: &str, found: &VariableValue) -> PgmError {
    PgmError::Usage(
        ErrorInfo::new("value-kind-mismatch", "snapshot kind does not match the variable")
            .with_context("expected", expected)
            .with_context("found", found.kind()),
    )
}

/// Real-valued random variable.
#[derive(Debug)]
pub struct RealVar {
    value: Cell<f64>,
    observed: bool,
}

impl RealVar {
    /// Latent variable with an initial value.
    pub fn new(initial: f64) -> Rc<Self> {
        Rc::new(Self {
            value: Cell::new(initial),
            observed: false,
        })
    }

    /// Observed variable fixed at `value`.
    pub fn observed(value: f64) -> Rc<Self> {
        Rc::new(Self {
            value: Cell::new(value),
            observed: true,
        })
    }

    /// Current value.
    pub fn get(&self) -> f64 {
        self.value.get()
    }

    /// Overwrites the current value.
    pub fn set(&self, value: f64) {
        self.value.set(value);
    }
}

impl Variable for RealVar {
    fn value(&self) -> VariableValue {
        VariableValue::Real(self.value.get())
    }

    fn restore(&self, value: &VariableValue) -> Result<(), PgmError> {
        let v = value.as_real().ok_or_else(|| kind_mismatch("real", value))?;
        self.value.set(v);
        Ok(())
    }

    fn is_observed(&self) -> bool {
        self.observed
    }
}

/// Integer-valued random variable.
#[derive(Debug)]
pub struct IntVar {
    value: Cell<i64>,
    observed: bool,
}

impl IntVar {
    /// Latent variable with an initial value.
    pub fn new(initial: i64) -> Rc<Self> {
        Rc::new(Self {
            value: Cell::new(initial),
            observed: false,
        })
    }

    /// Observed variable fixed at `value`.
    pub fn observed(value: i64) -> Rc<Self> {
        Rc::new(Self {
            value: Cell::new(value),
            observed: true,
        })
    }

    /// Current value.
    pub fn get(&self) -> i64 {
        self.value.get()
    }

    /// Overwrites the current value.
    pub fn set(&self, value: i64) {
        self.value.set(value);
    }
}

impl Variable for IntVar {
    fn value(&self) -> VariableValue {
        VariableValue::Integer(self.value.get())
    }

    fn restore(&self, value: &VariableValue) -> Result<(), PgmError> {
        let v = value
            .as_integer()
            .ok_or_else(|| kind_mismatch("integer", value))?;
        self.value.set(v);
        Ok(())
    }

    fn is_observed(&self) -> bool {
        self.observed
    }
}
