use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use eframe::egui::vec2;
use tracing::{debug, info};

use super::ExpansionController;
use crate::family::{FamilyRecord, Relative};
use crate::tree::node::EdgeKind;
use crate::tree::state::TreeState;
use crate::tree::tween::TweenTarget;
use crate::tree::union::{ensure_union, offer_children, offer_count, recenter_unions};

/// Children whose parents were already linked during one cascade.
type Visited = Rc<RefCell<HashSet<String>>>;

struct CoupleRef {
    id: String,
    first: String,
    second: String,
}

pub(crate) struct ParentPlacement {
    couple: Option<CoupleRef>,
    shown_siblings: Vec<String>,
}

impl TreeState {
    /// Places up to two parents above `child` and links them to it, through their union when
    /// there are two.
    pub(crate) fn place_parents(&mut self, child: &str, parents: &[Relative]) -> Option<ParentPlacement> {
        if parents.is_empty() {
            return None;
        }
        let mut pos = self.store.position(child)?;
        self.lock(child);

        let level = pos.y - self.config.parent_offset_y;
        let spread = self.config.parent_spread_x;
        let tolerance = self.config.level_tolerance;

        // Make room when the upper level is already occupied on the left.
        let rightmost = self
            .store
            .nodes()
            .iter()
            .filter(|node| !node.is_trigger() && (node.pos.y - level).abs() < tolerance)
            .filter(|node| node.pos.x < pos.x)
            .filter(|node| parents.iter().all(|parent| parent.id != node.id))
            .map(|node| node.pos.x)
            .max_by(f32::total_cmp);
        if let Some(rightmost) = rightmost {
            let reach = rightmost + self.config.level_padding;
            let left_edge = pos.x - spread;
            if left_edge < reach {
                pos.x += reach - left_edge;
                self.store.set_position(child, pos);
                recenter_unions(&mut self.store, self.config.union_offset_y);
                debug!(child, shift = reach - left_edge, "shifted child to clear upper level");
            }
        }

        let font_size = self.config.label_font_size;
        let mut targets = Vec::new();
        for (index, parent) in parents.iter().enumerate() {
            let offset = if index == 0 { -spread } else { spread };
            if self.spawn_person(parent, pos) {
                targets.push(TweenTarget::growing(
                    parent.id.clone(),
                    vec2(pos.x + offset, level),
                    font_size,
                ));
            }
        }

        let couple = match parents {
            [single] => {
                self.store.add_edge(&single.id, child, EdgeKind::Descent);
                None
            }
            [first, second, ..] => {
                let (id, created) = ensure_union(&mut self.store, &first.id, &second.id, pos);
                if created {
                    let siblings = self
                        .session
                        .record(child)
                        .map_or(0, |record| record.siblings().count());
                    offer_count(&mut self.store, &id, 1 + siblings);
                    let union_pos = vec2(pos.x, level + self.config.union_spawn_offset_y);
                    targets.push(TweenTarget::to(id.clone(), union_pos));
                }
                self.store.add_edge(&id, child, EdgeKind::Descent);
                self.drop_sibling_links(&id, child);
                Some(CoupleRef {
                    id,
                    first: first.id.clone(),
                    second: second.id.clone(),
                })
            }
            [] => None,
        };

        let shown_siblings = self
            .session
            .record(child)
            .map(|record| {
                record
                    .siblings()
                    .filter(|sibling| self.store.contains(&sibling.id))
                    .map(|sibling| sibling.id.clone())
                    .collect()
            })
            .unwrap_or_default();

        let animated = self.animate(targets);
        self.schedule_overlap(level, animated);
        self.settle();
        Some(ParentPlacement {
            couple,
            shown_siblings,
        })
    }

    /// Dashed sibling edges between `child` and another child of `union` are redundant once
    /// both hang from it.
    fn drop_sibling_links(&mut self, union: &str, child: &str) {
        let stale = self
            .store
            .query_edges(|edge| edge.kind == EdgeKind::Sibling && edge.touches(child))
            .into_iter()
            .filter(|edge| {
                let other = if edge.from == child { &edge.to } else { &edge.from };
                self.store
                    .edge(union, other)
                    .is_some_and(|link| link.kind == EdgeKind::Descent)
            })
            .map(|edge| edge.id)
            .collect::<Vec<_>>();
        for id in stale {
            self.store.remove_edge(id);
        }
    }

    /// Late correction from the first parent's record: the couple's true child list. Never
    /// touches an expanded union's state.
    pub(crate) fn correct_union(&mut self, union: &str, record: &FamilyRecord, other_parent: &str) {
        if !self.store.contains(union) {
            return;
        }
        let children = record.family.children_with(other_parent);
        debug!(union, children = children.len(), "correcting union children");
        offer_children(&mut self.store, union, children);
        self.settle();
    }
}

impl ExpansionController {
    pub fn expand_parents(&self, child: &str, parents: &[Relative]) {
        self.expand_parents_guarded(child, parents, Visited::default());
    }

    fn expand_parents_guarded(&self, child: &str, parents: &[Relative], visited: Visited) {
        if !visited.borrow_mut().insert(child.to_owned()) {
            return;
        }
        let Some(placement) = self.state.borrow_mut().place_parents(child, parents) else {
            return;
        };
        info!(child, parents = parents.len(), "expanded parents");

        if let Some(couple) = placement.couple {
            let controller = self.clone();
            self.spawn(async move {
                if let Some(record) = controller.expand(&couple.first, true).await {
                    controller
                        .state
                        .borrow_mut()
                        .correct_union(&couple.id, &record, &couple.second);
                }
            });
        }

        for parent in parents {
            self.spawn_expand(parent.id.clone());
        }

        for sibling in placement.shown_siblings {
            self.spawn_sibling_relink(sibling, Rc::clone(&visited));
        }
    }

    /// Expands a shown sibling and links it to its own parents once the record is known.
    fn spawn_sibling_relink(&self, sibling: String, visited: Visited) {
        let controller = self.clone();
        self.spawn(async move {
            let Some(record) = controller.expand(&sibling, true).await else {
                return;
            };
            if !record.family.parents.is_empty() {
                controller.expand_parents_guarded(&record.id, &record.family.parents, visited);
            }
        });
    }

    /// Starts a fresh relink cascade for `sibling`.
    pub(super) fn relink_sibling(&self, sibling: String) {
        self.spawn_sibling_relink(sibling, Visited::default());
    }
}
