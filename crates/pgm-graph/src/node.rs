use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use pgm_core::{Component, Factor, MemberLabel, NodeId, Variable};
use serde::{Deserialize, Serialize};

/// Classification of a node in the accessibility graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Leaf holding stochastic state.
    Variable,
    /// Log-density contributor.
    Factor,
    /// Aggregate or helper object traversed through its members.
    Component,
    /// Member slot of an object-kind node.
    Constituent,
}

impl NodeKind {
    /// Whether the node wraps an author object (anything but a constituent).
    pub fn is_object(&self) -> bool {
        !matches!(self, NodeKind::Constituent)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeKind::Variable => "variable",
            NodeKind::Factor => "factor",
            NodeKind::Component => "component",
            NodeKind::Constituent => "constituent",
        };
        f.write_str(label)
    }
}

/// Payload stored for each node.
#[derive(Clone)]
pub(crate) enum NodePayload {
    Variable(Rc<dyn Variable>),
    Factor(Rc<dyn Factor>),
    Component(Rc<dyn Component>),
    Constituent { owner: NodeId, label: MemberLabel },
}

impl NodePayload {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Variable(_) => NodeKind::Variable,
            NodePayload::Factor(_) => NodeKind::Factor,
            NodePayload::Component(_) => NodeKind::Component,
            NodePayload::Constituent { .. } => NodeKind::Constituent,
        }
    }
}

#[derive(Clone)]
pub(crate) struct NodeRecord {
    pub(crate) payload: NodePayload,
    pub(crate) path: String,
    pub(crate) out_edges: BTreeSet<NodeId>,
    pub(crate) in_edges: BTreeSet<NodeId>,
}

impl NodeRecord {
    pub(crate) fn new(payload: NodePayload, path: String) -> Self {
        Self {
            payload,
            path,
            out_edges: BTreeSet::new(),
            in_edges: BTreeSet::new(),
        }
    }

    pub(crate) fn kind(&self) -> NodeKind {
        self.payload.kind()
    }
}

/// Node counts per kind, used for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    /// Number of variable nodes.
    pub variables: usize,
    /// Number of factor nodes.
    pub factors: usize,
    /// Number of component nodes.
    pub components: usize,
    /// Number of constituent nodes.
    pub constituents: usize,
    /// Number of directed edges.
    pub edges: usize,
}
