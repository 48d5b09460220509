mod common;

use std::rc::Rc;

use common::{real, Bag, Real};
use pgm_core::{NodeId, ObjectRef};
use pgm_graph::{AccessibilityGraph, NodeKind};
use proptest::prelude::*;

/// Builds `bags` components and `vars` variables wired by `links`, where a
/// link `(from, to)` appends target `to` (bags first, then variables) to bag
/// `from`. Cycles, self-loops and repeated links are all allowed.
fn wire(bags: usize, vars: usize, links: &[(usize, usize)]) -> (Vec<Rc<Bag>>, Vec<Rc<Real>>) {
    let bag_list: Vec<Rc<Bag>> = (0..bags).map(|_| Bag::with(Vec::new())).collect();
    let var_list: Vec<Rc<Real>> = (0..vars).map(|_| real(0.0)).collect();
    for &(from, to) in links {
        let target = if to < bags {
            ObjectRef::component(&bag_list[to])
        } else {
            ObjectRef::variable(&var_list[to - bags])
        };
        bag_list[from].items.borrow_mut().push(target);
    }
    (bag_list, var_list)
}

fn scenario() -> impl Strategy<Value = (usize, usize, Vec<(usize, usize)>, Vec<usize>)> {
    (1usize..6, 0usize..5).prop_flat_map(|(bags, vars)| {
        let link = (0..bags, 0..bags + vars);
        (
            Just(bags),
            Just(vars),
            prop::collection::vec(link, 0..20),
            prop::collection::vec(0..bags, 1..3),
        )
    })
}

proptest! {
    #[test]
    fn closure_is_closed_under_outgoing_edges((bags, vars, links, generators) in scenario()) {
        let (bag_list, var_list) = wire(bags, vars, &links);
        let roots: Vec<(String, ObjectRef)> = bag_list
            .iter()
            .enumerate()
            .map(|(i, bag)| (format!("bag{i}"), ObjectRef::component(bag)))
            .collect();
        let graph = AccessibilityGraph::build(roots).unwrap();
        graph.check_alternation().unwrap();

        let summary = graph.summary();
        prop_assert_eq!(summary.components, bags);
        prop_assert_eq!(summary.constituents, links.len());

        let seeds: Vec<NodeId> = generators
            .iter()
            .map(|g| graph.node_of(&ObjectRef::component(&bag_list[*g])).unwrap())
            .collect();
        let closure = graph.closure(seeds.iter().copied()).unwrap();
        for seed in &seeds {
            prop_assert!(closure.contains(seed));
        }
        for node in &closure {
            for next in graph.successors(*node).unwrap() {
                prop_assert!(closure.contains(&next));
            }
        }

        for var in &var_list {
            if let Some(node) = graph.node_of(&ObjectRef::variable(var)) {
                prop_assert_eq!(graph.kind(node).unwrap(), NodeKind::Variable);
                prop_assert!(graph.successors(node).unwrap().is_empty());
            }
        }

        drop(graph);
        for bag in &bag_list {
            bag.clear();
        }
    }

    #[test]
    fn every_distinct_variable_gets_its_own_node(count in 1usize..12) {
        let vars: Vec<Rc<Real>> = (0..count).map(|_| real(1.0)).collect();
        let bag = Bag::with(vars.iter().map(ObjectRef::variable).collect());
        let graph = AccessibilityGraph::build([("bag", ObjectRef::component(&bag))]).unwrap();
        prop_assert_eq!(graph.variables().len(), count);
    }
}
