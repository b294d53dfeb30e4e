use std::collections::{HashMap, HashSet};

use eframe::egui::Color32;

use super::node::EdgeId;
use super::store::GraphStore;

const HIGHLIGHT: Color32 = Color32::from_rgb(0xE0, 0x6C, 0x00);
const DIM_FILL_OPACITY: f32 = 0.2;
const DIM_LABEL_OPACITY: f32 = 0.3;

#[derive(Debug, Default, PartialEq)]
pub struct Bloodline {
    pub nodes: HashSet<String>,
    pub edges: HashSet<EdgeId>,
}

/// Direct ancestors and descendants of `focal`: one breadth-first walk up the lineage edges
/// and one down. Sibling and spouse-bind edges are never followed.
pub fn trace(store: &GraphStore, focal: &str) -> Bloodline {
    let mut line = Bloodline::default();
    if !store.contains(focal) {
        return line;
    }
    line.nodes.insert(focal.to_owned());
    walk(store, focal, Direction::Up, &mut line);
    walk(store, focal, Direction::Down, &mut line);
    line
}

#[derive(Clone, Copy)]
enum Direction {
    Up,
    Down,
}

fn walk(store: &GraphStore, focal: &str, direction: Direction, line: &mut Bloodline) {
    let mut visited = HashSet::from([focal.to_owned()]);
    let mut frontier = vec![focal.to_owned()];

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for edge in store.edges().iter().filter(|edge| edge.kind.is_lineage()) {
            let (near, far) = match direction {
                Direction::Up => (&edge.to, &edge.from),
                Direction::Down => (&edge.from, &edge.to),
            };
            if !frontier.contains(near) {
                continue;
            }
            line.edges.insert(edge.id);
            if visited.insert(far.clone()) {
                line.nodes.insert(far.clone());
                next.push(far.clone());
            }
        }
        frontier = next;
    }
}

#[derive(Clone, Copy, Debug)]
struct SavedNode {
    border: Color32,
    border_width: f32,
    fill_opacity: f32,
    label_opacity: f32,
}

#[derive(Clone, Copy, Debug)]
struct SavedEdge {
    color: Color32,
    width: f32,
}

/// Applies and reverts bloodline styling. The touched style fields are snapshotted before
/// the first change and written back verbatim on restore.
#[derive(Debug, Default)]
pub struct Highlighter {
    focus: Option<String>,
    selection: Option<String>,
    saved_nodes: HashMap<String, SavedNode>,
    saved_edges: HashMap<EdgeId, SavedEdge>,
}

impl Highlighter {
    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn select(&mut self, store: &mut GraphStore, id: &str) {
        self.selection = Some(id.to_owned());
        self.show(store, id);
    }

    /// Back to the persistent selection, or to no highlight at all.
    pub fn release_hover(&mut self, store: &mut GraphStore) {
        match self.selection.clone() {
            Some(selected) => self.show(store, &selected),
            None => self.clear_focus(store),
        }
    }

    pub fn clear(&mut self, store: &mut GraphStore) {
        self.selection = None;
        self.clear_focus(store);
    }

    pub fn forget(&mut self) {
        self.focus = None;
        self.selection = None;
        self.saved_nodes.clear();
        self.saved_edges.clear();
    }

    /// Re-traces the current focus after the graph changed.
    pub fn refresh(&mut self, store: &mut GraphStore) {
        if self.selection.as_deref().is_some_and(|id| !store.contains(id)) {
            self.selection = None;
        }
        match self.focus.clone() {
            Some(focus) if store.contains(&focus) => self.show(store, &focus),
            Some(_) => self.release_hover(store),
            None => {}
        }
    }

    pub fn show(&mut self, store: &mut GraphStore, focal: &str) {
        self.restore(store);
        if !store.contains(focal) {
            self.focus = None;
            return;
        }
        self.focus = Some(focal.to_owned());

        let line = trace(store, focal);
        for node in store.nodes_mut() {
            if node.is_trigger() {
                continue;
            }
            self.saved_nodes.insert(
                node.id.clone(),
                SavedNode {
                    border: node.style.border,
                    border_width: node.style.border_width,
                    fill_opacity: node.style.fill_opacity,
                    label_opacity: node.style.label_opacity,
                },
            );
            if line.nodes.contains(&node.id) {
                node.style.border = HIGHLIGHT;
                node.style.border_width = 3.0;
            } else {
                node.style.fill_opacity = DIM_FILL_OPACITY;
                node.style.label_opacity = DIM_LABEL_OPACITY;
            }
        }

        for edge in store.edges_mut() {
            if !line.edges.contains(&edge.id) {
                continue;
            }
            self.saved_edges.insert(
                edge.id,
                SavedEdge {
                    color: edge.style.color,
                    width: edge.style.width,
                },
            );
            edge.style.color = HIGHLIGHT;
            edge.style.width = edge.style.width.max(1.0) * 2.5;
        }
    }

    fn clear_focus(&mut self, store: &mut GraphStore) {
        self.focus = None;
        self.restore(store);
    }

    fn restore(&mut self, store: &mut GraphStore) {
        for (id, saved) in self.saved_nodes.drain() {
            if let Some(node) = store.node_mut(&id) {
                node.style.border = saved.border;
                node.style.border_width = saved.border_width;
                node.style.fill_opacity = saved.fill_opacity;
                node.style.label_opacity = saved.label_opacity;
            }
        }
        for (id, saved) in self.saved_edges.drain() {
            if let Some(edge) = store.edge_mut(id) {
                edge.style.color = saved.color;
                edge.style.width = saved.width;
            }
        }
    }
}

/// Delays hover highlighting until the pointer has rested on one node.
#[derive(Debug, Default)]
pub struct HoverDebounce {
    pending: Option<(String, f64)>,
    shown: Option<String>,
}

impl HoverDebounce {
    pub fn enter(&mut self, id: &str, now: f64, delay: f64) {
        let waiting = self.pending.as_ref().is_some_and(|(pending, _)| pending == id);
        if waiting || self.shown.as_deref() == Some(id) {
            return;
        }
        self.shown = None;
        self.pending = Some((id.to_owned(), now + delay));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
        self.shown = None;
    }

    /// Yields the hovered id once its delay has elapsed.
    pub fn poll(&mut self, now: f64) -> Option<String> {
        let settled = self.pending.as_ref().is_some_and(|(_, due)| now >= *due);
        if !settled {
            return None;
        }
        let (id, _) = self.pending.take()?;
        self.shown = Some(id.clone());
        Some(id)
    }
}
