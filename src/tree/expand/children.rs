use eframe::egui::vec2;
use tracing::info;

use super::ExpansionController;
use crate::family::Child;
use crate::tree::node::{EdgeKind, GraphNode, UnionState};
use crate::tree::state::TreeState;
use crate::tree::tween::TweenTarget;

impl TreeState {
    fn union_children(&self, union: &str) -> Option<Vec<Child>> {
        self.store
            .node(union)
            .and_then(GraphNode::as_union)
            .map(|union| union.children.clone())
    }

    /// Shows every recorded child of `union` on the level below it, centered under the union.
    /// Returns the ids of all its children.
    pub(crate) fn place_children(&mut self, union: &str) -> Vec<String> {
        let Some(children) = self.union_children(union).filter(|c| !c.is_empty()) else {
            return Vec::new();
        };
        let Some(pos) = self.store.position(union) else {
            return Vec::new();
        };
        self.lock(union);

        let level = pos.y + self.config.child_offset_y;
        let spacing = self.config.child_spacing_x;
        let start = pos.x - (children.len() - 1) as f32 * spacing / 2.0;
        let font_size = self.config.label_font_size;

        let mut targets = Vec::new();
        for (index, child) in children.iter().enumerate() {
            if self.spawn_person(&child.person, pos) {
                let x = start + index as f32 * spacing;
                targets.push(TweenTarget::growing(child.id(), vec2(x, level), font_size));
            }
            self.store.add_edge(union, child.id(), EdgeKind::Descent);
        }
        if let Some(node) = self.store.node_mut(union) {
            node.set_union_state(UnionState::Expanded);
        }

        let animated = self.animate(targets);
        self.schedule_overlap(level, animated);
        self.settle();
        children.iter().map(|child| child.id().to_owned()).collect()
    }

    /// Hides the union's children and their triggers.
    pub(crate) fn collapse_children(&mut self, union: &str) -> usize {
        let Some(children) = self.union_children(union) else {
            return 0;
        };
        let removed = children
            .iter()
            .filter(|child| self.remove_with_triggers(child.id()))
            .count();
        if let Some(node) = self.store.node_mut(union) {
            node.set_union_state(UnionState::from_count(children.len()));
        }
        self.settle();
        removed
    }

    /// Every recorded child is on the graph. `None` when the union has no recorded children.
    fn children_shown(&self, union: &str) -> Option<bool> {
        let node = self.store.node(union)?.as_union()?;
        if node.children.is_empty() {
            return None;
        }
        Some(
            node.children
                .iter()
                .all(|child| self.store.contains(child.id())),
        )
    }
}

impl ExpansionController {
    pub fn expand_children(&self, union: &str) {
        let children = self.state.borrow_mut().place_children(union);
        info!(union, children = children.len(), "expanded children");
        for child in children {
            self.spawn_expand(child);
        }
    }

    pub fn collapse_children(&self, union: &str) {
        let removed = self.state.borrow_mut().collapse_children(union);
        info!(union, removed, "collapsed children");
    }

    /// Union click: refreshes the couple's child list from the first spouse's record, then
    /// collapses when every child is shown and reveals the rest otherwise.
    pub async fn toggle_union(&self, union: &str) {
        let spouses = self
            .state
            .borrow()
            .store
            .node(union)
            .and_then(GraphNode::as_union)
            .map(|union| union.spouses.clone());
        let Some([first, second]) = spouses else {
            return;
        };

        if let Some(record) = self.expand(&first, false).await {
            self.state
                .borrow_mut()
                .correct_union(union, &record, &second);
        }

        let shown = self.state.borrow().children_shown(union);
        match shown {
            Some(true) => self.collapse_children(union),
            Some(false) => self.expand_children(union),
            None => {}
        }
    }
}
