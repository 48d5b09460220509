#![deny(missing_docs)]

//! Connectivity engine: discovers the variable/factor dependency structure of
//! an arbitrary `Rc`-linked object graph.
//!
//! [`AccessibilityGraph::build`] traverses the roots of a model,
//! [`AccessibilityGraph::closure`] answers forward-reachability queries and
//! [`AccessibilityGraph::connected_factors`] returns the factors whose log
//! density changes when a variable changes.

mod accessibility;
mod analysis;
mod node;

pub use accessibility::AccessibilityGraph;
pub use node::{GraphSummary, NodeKind};
