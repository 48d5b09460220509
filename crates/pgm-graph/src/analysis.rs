use std::collections::{BTreeSet, VecDeque};

use pgm_core::{errors::PgmError, NodeId};

use crate::accessibility::{AccessibilityGraph, ContextExt};
use crate::node::NodeKind;

impl AccessibilityGraph {
    /// Forward-reachability closure of `generators`.
    ///
    /// The result contains every generator and is closed under outgoing
    /// edges. Cycles are handled by the visited set.
    pub fn closure<I>(&self, generators: I) -> Result<BTreeSet<NodeId>, PgmError>
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();
        for generator in generators {
            self.record(generator)?;
            if visited.insert(generator) {
                queue.push_back(generator);
            }
        }
        while let Some(node) = queue.pop_front() {
            for next in &self.nodes[node.index()].out_edges {
                if visited.insert(*next) {
                    queue.push_back(*next);
                }
            }
        }
        Ok(visited)
    }

    /// Factors whose log density reads `variable`, in discovery order.
    ///
    /// Walks backwards from the variable through constituents and components
    /// and stops at the first factor on each path. A factor reached along
    /// several paths is reported once.
    pub fn connected_factors(&self, variable: NodeId) -> Result<Vec<NodeId>, PgmError> {
        self.variable(variable)?;
        let mut factors = BTreeSet::new();
        let mut visited = BTreeSet::from([variable]);
        let mut queue = VecDeque::from([variable]);
        while let Some(node) = queue.pop_front() {
            for previous in &self.nodes[node.index()].in_edges {
                if !visited.insert(*previous) {
                    continue;
                }
                match self.nodes[previous.index()].kind() {
                    NodeKind::Factor => {
                        factors.insert(*previous);
                    }
                    NodeKind::Constituent | NodeKind::Component => queue.push_back(*previous),
                    NodeKind::Variable => {}
                }
            }
        }
        Ok(factors.into_iter().collect())
    }

    /// Variables read directly by `factor` (the forward counterpart of
    /// [`connected_factors`](Self::connected_factors)).
    pub fn connected_variables(&self, factor: NodeId) -> Result<Vec<NodeId>, PgmError> {
        self.factor(factor)?;
        let mut variables = BTreeSet::new();
        let mut visited = BTreeSet::from([factor]);
        let mut queue = VecDeque::from([factor]);
        while let Some(node) = queue.pop_front() {
            for next in &self.nodes[node.index()].out_edges {
                if !visited.insert(*next) {
                    continue;
                }
                match self.nodes[next.index()].kind() {
                    NodeKind::Variable => {
                        variables.insert(*next);
                    }
                    NodeKind::Constituent | NodeKind::Component => queue.push_back(*next),
                    NodeKind::Factor => {}
                }
            }
        }
        Ok(variables.into_iter().collect())
    }

    /// Verifies the structural invariants of the graph: edges alternate
    /// between object-kind nodes and constituents, a constituent has at most
    /// one outgoing edge and variables have none.
    pub fn check_alternation(&self) -> Result<(), PgmError> {
        for (index, record) in self.nodes.iter().enumerate() {
            let source = NodeId::from_raw(index as u64);
            let kind = record.kind();
            if kind == NodeKind::Variable && !record.out_edges.is_empty() {
                return Err(PgmError::graph("variable-out-edge", "variables must be leaves")
                    .with_context("node", source));
            }
            if kind == NodeKind::Constituent && record.out_edges.len() > 1 {
                return Err(PgmError::graph(
                    "constituent-fan-out",
                    "constituent has more than one outgoing edge",
                )
                .with_context("node", source));
            }
            for target in &record.out_edges {
                let target_kind = self.nodes[target.index()].kind();
                if kind.is_object() == target_kind.is_object() {
                    return Err(PgmError::graph(
                        "alternation-violated",
                        "edge joins two nodes of the same class",
                    )
                    .with_context("source", source)
                    .with_context("target", *target));
                }
            }
        }
        Ok(())
    }
}
