use std::rc::Rc;

use pgm_core::{AsAny, ErrorInfo, Factor, NodeId, ObjectRef, PgmError, Variable, VariableValue};
use pgm_graph::AccessibilityGraph;
use tracing::{info, warn};

/// Collects named roots and builds a [`ProbabilityModel`] from them.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    roots: Vec<(String, ObjectRef)>,
}

impl ModelBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named root object. Root labels must be unique.
    pub fn root(mut self, label: impl Into<String>, object: ObjectRef) -> Self {
        self.roots.push((label.into(), object));
        self
    }

    /// Traverses the roots and resolves the latent variables.
    pub fn build(self) -> Result<ProbabilityModel, PgmError> {
        let graph = AccessibilityGraph::build(self.roots)?;
        let mut latent = Vec::new();
        for id in graph.variables() {
            if graph.variable(id)?.is_observed() {
                continue;
            }
            if graph.defining_factors(id)?.is_empty() {
                let path = graph.path(id)?;
                warn!(variable = path, "latent variable has no defining factor");
            }
            latent.push(id);
        }
        let summary = graph.summary();
        info!(
            variables = summary.variables,
            latent = latent.len(),
            factors = summary.factors,
            edges = summary.edges,
            "model built"
        );
        Ok(ProbabilityModel { graph, latent })
    }
}

/// A model: the accessibility graph over its roots plus the latent variables
/// in discovery order.
#[derive(Debug)]
pub struct ProbabilityModel {
    graph: AccessibilityGraph,
    latent: Vec<NodeId>,
}

impl ProbabilityModel {
    /// Underlying accessibility graph.
    pub fn graph(&self) -> &AccessibilityGraph {
        &self.graph
    }

    /// Unobserved variables, in discovery order.
    pub fn latent_variables(&self) -> &[NodeId] {
        &self.latent
    }

    /// Shared handle of the variable at `id`.
    pub fn variable(&self, id: NodeId) -> Result<&Rc<dyn Variable>, PgmError> {
        self.graph.variable(id)
    }

    /// Discovery path naming the node, e.g. `prior.realization`.
    pub fn name_of(&self, id: NodeId) -> Result<&str, PgmError> {
        self.graph.path(id)
    }

    /// Looks a node up by its discovery path.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.graph.lookup_path(path)
    }

    /// Factors whose density depends on the variable at `id`.
    pub fn connected_factors(&self, id: NodeId) -> Result<Vec<Rc<dyn Factor>>, PgmError> {
        self.graph
            .connected_factors(id)?
            .into_iter()
            .map(|factor| self.graph.factor(factor).cloned())
            .collect()
    }

    /// Current value of the variable at `path`, if there is one.
    pub fn value_of(&self, path: &str) -> Option<VariableValue> {
        let id = self.find(path)?;
        self.graph.variable(id).ok().map(|variable| variable.value())
    }

    /// Joint log density of the current state over every factor in the model.
    pub fn log_density(&self) -> Result<f64, PgmError> {
        let factors = self
            .graph
            .factors()
            .into_iter()
            .map(|id| self.graph.factor(id).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        total_log_density(&factors)
    }
}

/// Sums the log densities of `factors`. A NaN term is a numeric error.
pub fn total_log_density(factors: &[Rc<dyn Factor>]) -> Result<f64, PgmError> {
    let mut total = 0.0;
    for factor in factors {
        let term = factor.log_density();
        if term.is_nan() {
            return Err(PgmError::Numeric(
                ErrorInfo::new("nan-log-density", "factor log density evaluated to NaN")
                    .with_context("factor", AsAny::type_label(&**factor))
                    .with_hint("log densities may be -inf outside the support but never NaN"),
            ));
        }
        total += term;
    }
    Ok(total)
}
