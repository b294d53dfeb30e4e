use eframe::egui::{Vec2, vec2};
use tracing::debug;

use super::node::{EdgeKind, GraphNode, Union, UnionState};
use super::store::GraphStore;
use crate::family::Child;

/// Couple node id. Depends only on the unordered spouse pair.
pub fn union_id(a: &str, b: &str) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("union_{low}_{high}")
}

/// Returns the union id and whether it was created. Partner and spouse-bind edges are
/// (re)linked either way; an existing union keeps its state and children.
pub(crate) fn ensure_union(store: &mut GraphStore, a: &str, b: &str, spawn: Vec2) -> (String, bool) {
    let id = union_id(a, b);
    let created = !store.contains(&id);

    if created {
        let mut spouses = [a.to_owned(), b.to_owned()];
        spouses.sort();
        store.add_node(GraphNode::union(
            id.clone(),
            Union {
                spouses,
                children: Vec::new(),
                state: UnionState::Empty,
            },
            spawn,
        ));
        debug!(union = %id, "created union");
    }

    store.add_edge(a, &id, EdgeKind::Partner);
    store.add_edge(b, &id, EdgeKind::Partner);
    if !store.has_edge(b, a) {
        store.add_edge(a, b, EdgeKind::SpouseBind);
    }
    (id, created)
}

/// Records the couple's children. An empty list never replaces a known one, and an
/// expanded union stays expanded.
pub(crate) fn offer_children(store: &mut GraphStore, id: &str, children: Vec<Child>) {
    if children.is_empty() {
        return;
    }
    let Some(node) = store.node_mut(id) else {
        return;
    };
    let Some(union) = node.as_union_mut() else {
        return;
    };

    let count = children.len();
    union.children = children;
    if union.state != UnionState::Expanded {
        node.set_union_state(UnionState::Collapsed(count));
    }
}

/// Upgrades the displayed child count of a union that is not expanded.
pub(crate) fn offer_count(store: &mut GraphStore, id: &str, count: usize) {
    if count == 0 {
        return;
    }
    if let Some(node) = store.node_mut(id)
        && node
            .as_union()
            .is_some_and(|union| union.state != UnionState::Expanded)
    {
        node.set_union_state(UnionState::Collapsed(count));
    }
}

/// Puts every union midway between its spouses, `offset_y` below them. Moves under two
/// units are ignored.
pub fn recenter_unions(store: &mut GraphStore, offset_y: f32) {
    let updates = store
        .nodes()
        .iter()
        .filter_map(|node| {
            let union = node.as_union()?;
            let first = store.position(&union.spouses[0])?;
            let second = store.position(&union.spouses[1])?;
            let target = vec2(
                (first.x + second.x) / 2.0,
                (first.y + second.y) / 2.0 + offset_y,
            );
            let delta = target - node.pos;
            (delta.x.abs() > 2.0 || delta.y.abs() > 2.0).then(|| (node.id.clone(), target))
        })
        .collect::<Vec<_>>();

    for (id, target) in updates {
        store.set_position(&id, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::{Gender, Relative};
    use crate::tree::node::Person;

    fn add_person(store: &mut GraphStore, id: &str, x: f32, y: f32) {
        store.add_node(GraphNode::person(
            id,
            Person {
                label: id.to_owned(),
                gender: Gender::Unknown,
                life_span: None,
                resolved: true,
            },
            vec2(x, y),
            14.0,
        ));
    }

    fn child(id: &str) -> Child {
        Child {
            person: Relative {
                id: id.to_owned(),
                label: id.to_owned(),
                gender: Gender::Unknown,
                life_span: None,
            },
            other_parents: Vec::new(),
        }
    }

    fn state(store: &GraphStore, id: &str) -> Option<UnionState> {
        store.node(id)?.as_union().map(|union| union.state)
    }

    #[test]
    fn union_id_is_order_independent() {
        assert_eq!(union_id("Q2", "Q1"), union_id("Q1", "Q2"));
        assert_eq!(union_id("Q1", "Q2"), "union_Q1_Q2");
    }

    #[test]
    fn ensure_union_is_idempotent_for_either_order() {
        let mut store = GraphStore::new();
        add_person(&mut store, "a", 0.0, 0.0);
        add_person(&mut store, "b", 200.0, 0.0);

        let (first, created) = ensure_union(&mut store, "a", "b", vec2(100.0, 100.0));
        assert!(created);
        let (second, created_again) = ensure_union(&mut store, "b", "a", vec2(0.0, 0.0));
        assert!(!created_again);
        assert_eq!(first, second);

        assert_eq!(store.nodes().iter().filter(|n| n.is_union()).count(), 1);
        assert_eq!(store.query_edges(|e| e.kind == EdgeKind::Partner).len(), 2);
        assert_eq!(store.query_edges(|e| e.kind == EdgeKind::SpouseBind).len(), 1);
        assert_eq!(store.position(&first), Some(vec2(100.0, 100.0)));
    }

    #[test]
    fn expanded_union_is_never_downgraded() {
        let mut store = GraphStore::new();
        add_person(&mut store, "a", 0.0, 0.0);
        add_person(&mut store, "b", 200.0, 0.0);
        let (id, _) = ensure_union(&mut store, "a", "b", Vec2::ZERO);

        offer_count(&mut store, &id, 2);
        assert_eq!(state(&store, &id), Some(UnionState::Collapsed(2)));

        offer_children(&mut store, &id, vec![child("x"), child("y"), child("z")]);
        assert_eq!(state(&store, &id), Some(UnionState::Collapsed(3)));

        if let Some(node) = store.node_mut(&id) {
            node.set_union_state(UnionState::Expanded);
        }
        offer_count(&mut store, &id, 5);
        offer_children(&mut store, &id, vec![child("x")]);
        offer_children(&mut store, &id, Vec::new());
        assert_eq!(state(&store, &id), Some(UnionState::Expanded));
        let children = store.node(&id).and_then(|n| n.as_union()).map(|u| u.children.len());
        assert_eq!(children, Some(1));
    }

    #[test]
    fn recenter_places_union_below_midpoint() {
        let mut store = GraphStore::new();
        add_person(&mut store, "a", -100.0, 0.0);
        add_person(&mut store, "b", 300.0, 40.0);
        let (id, _) = ensure_union(&mut store, "a", "b", Vec2::ZERO);

        recenter_unions(&mut store, 160.0);
        assert_eq!(store.position(&id), Some(vec2(100.0, 180.0)));
    }
}
