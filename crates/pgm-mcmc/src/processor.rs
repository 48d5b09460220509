//! Per-sweep consumers of the model state.

use std::collections::BTreeMap;

use pgm_core::{PgmError, VariableValue};

use crate::config::RunConfig;
use crate::model::ProbabilityModel;

/// Read-only view of the model handed to processors after each sweep.
#[derive(Debug, Clone, Copy)]
pub struct ModelView<'a> {
    model: &'a ProbabilityModel,
}

impl<'a> ModelView<'a> {
    /// Wraps a model.
    pub fn new(model: &'a ProbabilityModel) -> Self {
        Self { model }
    }

    /// Paths and current values of the latent variables, in discovery order.
    pub fn latent(&self) -> Result<Vec<(&'a str, VariableValue)>, PgmError> {
        self.model
            .latent_variables()
            .iter()
            .map(|id| -> Result<(&'a str, VariableValue), PgmError> {
                let path = self.model.name_of(*id)?;
                Ok((path, self.model.variable(*id)?.value()))
            })
            .collect()
    }

    /// Current value of the variable at `path`.
    pub fn value_of(&self, path: &str) -> Option<VariableValue> {
        self.model.value_of(path)
    }

    /// Joint log density of the current state.
    pub fn log_density(&self) -> Result<f64, PgmError> {
        self.model.log_density()
    }
}

/// Consumer invoked once per sweep with the sweep index.
pub trait Processor {
    /// Handles the state reached at the end of `sweep`.
    fn process(&mut self, sweep: usize, view: &ModelView<'_>) -> Result<(), PgmError>;
}

impl<F> Processor for F
where
    F: FnMut(usize, &ModelView<'_>) -> Result<(), PgmError>,
{
    fn process(&mut self, sweep: usize, view: &ModelView<'_>) -> Result<(), PgmError> {
        self(sweep, view)
    }
}

/// Processor that discards every sweep.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProcessor;

impl Processor for NullProcessor {
    fn process(&mut self, _sweep: usize, _view: &ModelView<'_>) -> Result<(), PgmError> {
        Ok(())
    }
}

/// In-memory traces of the latent variables.
///
/// Sweeps before `burn_in` are skipped; afterwards every `thinning`-th sweep
/// is kept.
#[derive(Debug, Clone)]
pub struct TraceRecorder {
    burn_in: usize,
    thinning: usize,
    sweeps: Vec<usize>,
    traces: BTreeMap<String, Vec<VariableValue>>,
}

impl TraceRecorder {
    /// Creates a recorder; a thinning of zero is treated as one.
    pub fn new(burn_in: usize, thinning: usize) -> Self {
        Self {
            burn_in,
            thinning: thinning.max(1),
            sweeps: Vec::new(),
            traces: BTreeMap::new(),
        }
    }

    /// Recorder using the run's burn-in and thinning.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.burn_in, config.thinning)
    }

    /// Sweep indices that were recorded.
    pub fn sweeps(&self) -> &[usize] {
        &self.sweeps
    }

    /// Recorded values of the variable at `path`.
    pub fn trace(&self, path: &str) -> Option<&[VariableValue]> {
        self.traces.get(path).map(Vec::as_slice)
    }

    /// Sample mean of the variable at `path`.
    pub fn mean(&self, path: &str) -> Option<f64> {
        let trace = self.traces.get(path)?;
        if trace.is_empty() {
            return None;
        }
        Some(trace.iter().map(VariableValue::to_f64).sum::<f64>() / trace.len() as f64)
    }

    /// Sample means of every recorded variable.
    pub fn means(&self) -> BTreeMap<String, f64> {
        self.traces
            .keys()
            .filter_map(|path| self.mean(path).map(|mean| (path.clone(), mean)))
            .collect()
    }
}

impl Processor for TraceRecorder {
    fn process(&mut self, sweep: usize, view: &ModelView<'_>) -> Result<(), PgmError> {
        if sweep < self.burn_in || (sweep - self.burn_in) % self.thinning != 0 {
            return Ok(());
        }
        self.sweeps.push(sweep);
        for (path, value) in view.latent()? {
            self.traces.entry(path.to_string()).or_default().push(value);
        }
        Ok(())
    }
}
