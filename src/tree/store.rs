use std::collections::HashMap;

use eframe::egui::Vec2;
use tracing::debug;

use super::node::{Edge, EdgeId, EdgeKind, GraphNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rename {
    Missing,
    Unchanged,
    Renamed,
    /// The target id already existed; the old node was dropped and its edges moved over.
    Merged,
}

/// Node and edge container. Node ids are unique, and so is every directed `(from, to)` pair.
#[derive(Debug, Default)]
pub struct GraphStore {
    nodes: Vec<GraphNode>,
    index_by_id: HashMap<String, usize>,
    edges: Vec<Edge>,
    next_edge_id: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index_by_id.clear();
        self.edges.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [GraphNode] {
        &mut self.nodes
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.index_of(id).map(|index| &mut self.nodes[index])
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.node(id).map(|node| node.pos)
    }

    pub fn set_position(&mut self, id: &str, pos: Vec2) {
        if let Some(node) = self.node_mut(id) {
            node.pos = pos;
        }
    }

    /// Returns `false` and leaves the store untouched when the id is taken.
    pub fn add_node(&mut self, node: GraphNode) -> bool {
        if self.contains(&node.id) {
            return false;
        }
        self.index_by_id.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Removes the node and every edge incident to it.
    pub fn remove_node(&mut self, id: &str) -> Option<GraphNode> {
        let index = self.index_by_id.remove(id)?;
        let removed = self.nodes.swap_remove(index);
        if let Some(moved) = self.nodes.get(index) {
            self.index_by_id.insert(moved.id.clone(), index);
        }
        self.edges.retain(|edge| !edge.touches(id));
        Some(removed)
    }

    pub fn remove_nodes<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> usize {
        ids.into_iter()
            .filter(|id| self.remove_node(id).is_some())
            .count()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|edge| edge.from == from && edge.to == to)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edge(from, to).is_some()
    }

    pub fn query_edges(&self, filter: impl Fn(&Edge) -> bool) -> Vec<&Edge> {
        self.edges.iter().filter(|edge| filter(edge)).collect()
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|edge| edge.id == id)
    }

    pub(crate) fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    /// Adds a directed edge. Self-loops, duplicates and edges to unknown nodes are skipped.
    pub fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) -> Option<EdgeId> {
        if from == to || !self.contains(from) || !self.contains(to) || self.has_edge(from, to) {
            return None;
        }
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        self.edges.push(Edge {
            id,
            from: from.to_owned(),
            to: to.to_owned(),
            kind,
            style: kind.default_style(),
        });
        Some(id)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let index = self.edges.iter().position(|edge| edge.id == id)?;
        Some(self.edges.remove(index))
    }

    pub fn degree(&self, id: &str) -> usize {
        self.edges.iter().filter(|edge| edge.touches(id)).count()
    }

    /// Moves `old` to the id `new`. When `new` already exists the two nodes are merged: the
    /// old node is dropped and its edges are re-pointed at the survivor.
    pub fn rename_node(&mut self, old: &str, new: &str) -> Rename {
        if !self.contains(old) {
            return Rename::Missing;
        }
        if old == new {
            return Rename::Unchanged;
        }

        let outcome = if self.contains(new) {
            if let Some(index) = self.index_by_id.remove(old) {
                self.nodes.swap_remove(index);
                if let Some(moved) = self.nodes.get(index) {
                    self.index_by_id.insert(moved.id.clone(), index);
                }
            }
            Rename::Merged
        } else {
            if let Some(index) = self.index_by_id.remove(old) {
                self.nodes[index].id = new.to_owned();
                self.index_by_id.insert(new.to_owned(), index);
            }
            Rename::Renamed
        };

        self.relink(old, new);
        debug!(old, new, ?outcome, "renamed graph node");
        outcome
    }

    fn relink(&mut self, old: &str, new: &str) {
        let edges = std::mem::take(&mut self.edges);
        for mut edge in edges {
            if edge.from == old {
                edge.from = new.to_owned();
            }
            if edge.to == old {
                edge.to = new.to_owned();
            }
            if edge.from == edge.to || self.has_edge(&edge.from, &edge.to) {
                continue;
            }
            self.edges.push(edge);
        }
    }
}
