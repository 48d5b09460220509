use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use pgm_core::{
    errors::PgmError, Factor, MemberLabel, MemberRole, Members, NodeId, ObjectIdentity, ObjectRef,
    Variable,
};
use tracing::debug;

use crate::node::{GraphSummary, NodeKind, NodePayload, NodeRecord};

/// Directed graph of the variables, factors and components reachable from a
/// set of root objects.
///
/// Object-kind nodes are keyed by reference identity, so an object reached
/// along several paths is a single node and equal-valued objects stay
/// distinct. Every edge alternates between an object-kind node and one of its
/// constituents.
#[derive(Clone, Default)]
pub struct AccessibilityGraph {
    pub(crate) nodes: Vec<NodeRecord>,
    objects: BTreeMap<ObjectIdentity, NodeId>,
    constituents: BTreeMap<(NodeId, MemberLabel), NodeId>,
    roots: Vec<(String, NodeId)>,
    defined: BTreeMap<NodeId, NodeId>,
    edge_count: usize,
}

impl AccessibilityGraph {
    /// Traverses every object reachable from `roots` and builds the graph.
    ///
    /// Traversal is breadth-first, so node identifiers follow discovery order.
    /// Opaque roots are ignored. Fails on malformed member declarations:
    /// duplicate root labels, a member label declared twice by one owner, or
    /// a factor defining more than one variable (or a non-variable).
    pub fn build<I, S>(roots: I) -> Result<Self, PgmError>
    where
        I: IntoIterator<Item = (S, ObjectRef)>,
        S: Into<String>,
    {
        let mut graph = Self::default();
        let mut pending = VecDeque::new();
        for (label, root) in roots {
            let label = label.into();
            if graph.roots.iter().any(|(existing, _)| *existing == label) {
                return Err(PgmError::config("duplicate-root", "root label is used twice")
                    .with_context("root", label));
            }
            if let Some(id) = graph.intern(&root, &label, &mut pending) {
                graph.roots.push((label, id));
            }
        }
        while let Some(owner) = pending.pop_front() {
            let members = match graph.members_of(owner) {
                Some(members) => members,
                None => continue,
            };
            graph.expand(owner, members, &mut pending)?;
        }
        let summary = graph.summary();
        debug!(
            variables = summary.variables,
            factors = summary.factors,
            components = summary.components,
            constituents = summary.constituents,
            edges = summary.edges,
            "built accessibility graph"
        );
        Ok(graph)
    }

    fn intern(
        &mut self,
        target: &ObjectRef,
        path: &str,
        pending: &mut VecDeque<NodeId>,
    ) -> Option<NodeId> {
        let identity = target.identity()?;
        if let Some(existing) = self.objects.get(&identity) {
            return Some(*existing);
        }
        let payload = match target {
            ObjectRef::Variable(rc) => NodePayload::Variable(Rc::clone(rc)),
            ObjectRef::Factor(rc) => NodePayload::Factor(Rc::clone(rc)),
            ObjectRef::Component(rc) => NodePayload::Component(Rc::clone(rc)),
            ObjectRef::Opaque => return None,
        };
        let traverse = !matches!(payload, NodePayload::Variable(_));
        let id = self.push_node(NodeRecord::new(payload, path.to_string()));
        self.objects.insert(identity, id);
        if traverse {
            pending.push_back(id);
        }
        Some(id)
    }

    fn members_of(&self, owner: NodeId) -> Option<Members> {
        let mut members = Members::new();
        match &self.nodes[owner.index()].payload {
            NodePayload::Factor(factor) => factor.members(&mut members),
            NodePayload::Component(component) => component.members(&mut members),
            NodePayload::Variable(_) | NodePayload::Constituent { .. } => return None,
        }
        Some(members)
    }

    fn expand(
        &mut self,
        owner: NodeId,
        members: Members,
        pending: &mut VecDeque<NodeId>,
    ) -> Result<(), PgmError> {
        let owner_path = self.nodes[owner.index()].path.clone();
        let owner_kind = self.nodes[owner.index()].kind();
        let mut defined: Option<NodeId> = None;
        for member in members.into_entries() {
            if self.constituents.contains_key(&(owner, member.label)) {
                return Err(
                    PgmError::config("duplicate-member", "member label declared twice")
                        .with_context("owner", owner_path.clone())
                        .with_context("member", member.label.to_string()),
                );
            }
            if member.role == MemberRole::Defines {
                if owner_kind != NodeKind::Factor {
                    return Err(PgmError::config(
                        "defines-outside-factor",
                        "only factors may declare the variable they define",
                    )
                    .with_context("owner", owner_path.clone())
                    .with_context("member", member.label.to_string()));
                }
                if !member.target.is_variable() {
                    return Err(PgmError::config(
                        "defined-member-not-variable",
                        "defined member must reference a variable",
                    )
                    .with_context("owner", owner_path.clone())
                    .with_context("member", member.label.to_string()));
                }
                if defined.is_some() {
                    return Err(PgmError::config(
                        "multiple-defined-variables",
                        "a factor may define at most one variable",
                    )
                    .with_context("owner", owner_path.clone())
                    .with_context("member", member.label.to_string()));
                }
            }
            let path = format!("{owner_path}.{}", member.label);
            let constituent = self.push_node(NodeRecord::new(
                NodePayload::Constituent {
                    owner,
                    label: member.label,
                },
                path.clone(),
            ));
            self.constituents.insert((owner, member.label), constituent);
            self.add_edge(owner, constituent);
            if let Some(target) = self.intern(&member.target, &path, pending) {
                self.add_edge(constituent, target);
                if member.role == MemberRole::Defines {
                    defined = Some(target);
                }
            }
        }
        if let Some(variable) = defined {
            self.defined.insert(owner, variable);
        }
        Ok(())
    }

    fn push_node(&mut self, record: NodeRecord) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u64);
        self.nodes.push(record);
        id
    }

    fn add_edge(&mut self, source: NodeId, target: NodeId) {
        if self.nodes[source.index()].out_edges.insert(target) {
            self.nodes[target.index()].in_edges.insert(source);
            self.edge_count += 1;
        }
    }

    pub(crate) fn record(&self, id: NodeId) -> Result<&NodeRecord, PgmError> {
        self.nodes.get(id.index()).ok_or_else(|| {
            PgmError::graph("unknown-node", "node does not exist").with_context("node", id)
        })
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// All node identifiers in discovery order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|index| NodeId::from_raw(index as u64))
    }

    /// Root labels and the nodes they resolved to.
    pub fn roots(&self) -> &[(String, NodeId)] {
        &self.roots
    }

    /// Kind of the given node.
    pub fn kind(&self, id: NodeId) -> Result<NodeKind, PgmError> {
        Ok(self.record(id)?.kind())
    }

    /// Path under which the node was first discovered (e.g. `model.mu[2]`).
    pub fn path(&self, id: NodeId) -> Result<&str, PgmError> {
        Ok(&self.record(id)?.path)
    }

    /// Outgoing neighbours of a node.
    pub fn successors(&self, id: NodeId) -> Result<Vec<NodeId>, PgmError> {
        Ok(self.record(id)?.out_edges.iter().copied().collect())
    }

    /// Incoming neighbours of a node.
    pub fn predecessors(&self, id: NodeId) -> Result<Vec<NodeId>, PgmError> {
        Ok(self.record(id)?.in_edges.iter().copied().collect())
    }

    /// Owner and label of a constituent node.
    pub fn constituent(&self, id: NodeId) -> Result<(NodeId, MemberLabel), PgmError> {
        match &self.record(id)?.payload {
            NodePayload::Constituent { owner, label } => Ok((*owner, *label)),
            other => Err(PgmError::graph("not-a-constituent", "node is not a constituent")
                .with_context("node", id)
                .with_context("kind", other.kind())),
        }
    }

    /// Variable nodes in discovery order.
    pub fn variables(&self) -> Vec<NodeId> {
        self.nodes_of_kind(NodeKind::Variable)
    }

    /// Factor nodes in discovery order.
    pub fn factors(&self) -> Vec<NodeId> {
        self.nodes_of_kind(NodeKind::Factor)
    }

    fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.nodes()
            .filter(|id| self.nodes[id.index()].kind() == kind)
            .collect()
    }

    /// Shared handle to the variable wrapped by `id`.
    pub fn variable(&self, id: NodeId) -> Result<&Rc<dyn Variable>, PgmError> {
        match &self.record(id)?.payload {
            NodePayload::Variable(variable) => Ok(variable),
            other => Err(PgmError::graph("not-a-variable", "node is not a variable")
                .with_context("node", id)
                .with_context("kind", other.kind())),
        }
    }

    /// Shared handle to the factor wrapped by `id`.
    pub fn factor(&self, id: NodeId) -> Result<&Rc<dyn Factor>, PgmError> {
        match &self.record(id)?.payload {
            NodePayload::Factor(factor) => Ok(factor),
            other => Err(PgmError::graph("not-a-factor", "node is not a factor")
                .with_context("node", id)
                .with_context("kind", other.kind())),
        }
    }

    /// Node holding the referenced object, looked up by identity.
    pub fn node_of(&self, object: &ObjectRef) -> Option<NodeId> {
        object
            .identity()
            .and_then(|identity| self.objects.get(&identity).copied())
    }

    /// Object-kind node first discovered under `path`.
    pub fn lookup_path(&self, path: &str) -> Option<NodeId> {
        self.nodes().find(|id| {
            let record = &self.nodes[id.index()];
            record.kind().is_object() && record.path == path
        })
    }

    /// Variable the factor declares it defines, if any.
    pub fn defined_variable(&self, factor: NodeId) -> Result<Option<NodeId>, PgmError> {
        self.factor(factor)?;
        Ok(self.defined.get(&factor).copied())
    }

    /// Factors declaring that they define `variable`.
    pub fn defining_factors(&self, variable: NodeId) -> Result<Vec<NodeId>, PgmError> {
        self.variable(variable)?;
        Ok(self
            .defined
            .iter()
            .filter(|(_, defined)| **defined == variable)
            .map(|(factor, _)| *factor)
            .collect())
    }

    /// Node counts per kind.
    pub fn summary(&self) -> GraphSummary {
        let mut summary = GraphSummary {
            edges: self.edge_count,
            ..GraphSummary::default()
        };
        for record in &self.nodes {
            match record.kind() {
                NodeKind::Variable => summary.variables += 1,
                NodeKind::Factor => summary.factors += 1,
                NodeKind::Component => summary.components += 1,
                NodeKind::Constituent => summary.constituents += 1,
            }
        }
        summary
    }
}

impl std::fmt::Debug for AccessibilityGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessibilityGraph")
            .field("summary", &self.summary())
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}

pub(crate) trait ContextExt {
    fn with_context(self, key: impl Into<String>, value: impl ToString) -> PgmError;
}

impl ContextExt for PgmError {
    fn with_context(self, key: impl Into<String>, value: impl ToString) -> PgmError {
        match self {
            PgmError::Graph(info) => PgmError::Graph(info.with_context(key, value.to_string())),
            PgmError::Config(info) => PgmError::Config(info.with_context(key, value.to_string())),
            other => other,
        }
    }
}
