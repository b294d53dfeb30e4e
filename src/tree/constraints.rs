use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use super::config::LayoutConfig;
use super::node::{Edge, EdgeKind};
use super::store::GraphStore;

/// Positions of one frame as seen by a constraint.
pub struct Frame<'a> {
    store: &'a GraphStore,
    degrees: &'a HashMap<String, usize>,
    pub config: &'a LayoutConfig,
}

impl<'a> Frame<'a> {
    fn endpoints(&self, edge: &Edge) -> Option<(usize, usize)> {
        let from = self.store.index_of(&edge.from)?;
        let to = self.store.index_of(&edge.to)?;
        let simulated = |index: usize| !self.store.nodes()[index].is_trigger();
        (simulated(from) && simulated(to)).then_some((from, to))
    }

    fn pos(&self, index: usize) -> Vec2 {
        self.store.nodes()[index].pos
    }

    fn fixed(&self, index: usize) -> bool {
        self.store.nodes()[index].is_fixed()
    }

    fn is_union(&self, index: usize) -> bool {
        self.store.nodes()[index].is_union()
    }

    fn degree(&self, id: &str) -> usize {
        self.degrees.get(id).copied().unwrap_or(1)
    }

    fn edges_of(&self, kind: EdgeKind) -> impl Iterator<Item = &'a Edge> + use<'a> {
        let store: &'a GraphStore = self.store;
        store.edges().iter().filter(move |edge| edge.kind == kind)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correction {
    pub node: usize,
    pub delta: Vec2,
}

/// A positional rule applied after the base physics step.
pub trait Constraint {
    fn name(&self) -> &'static str;

    fn corrections(&self, frame: &Frame<'_>) -> Vec<Correction>;
}

/// Moves a pair by the intended deltas. When one side is fixed the free side takes the
/// whole relative move; when both are fixed nothing happens.
fn push_pair(out: &mut Vec<Correction>, frame: &Frame<'_>, a: (usize, Vec2), b: (usize, Vec2)) {
    let ((a, delta_a), (b, delta_b)) = (a, b);
    match (frame.fixed(a), frame.fixed(b)) {
        (false, false) => {
            out.push(Correction { node: a, delta: delta_a });
            out.push(Correction { node: b, delta: delta_b });
        }
        (true, false) => out.push(Correction {
            node: b,
            delta: delta_b - delta_a,
        }),
        (false, true) => out.push(Correction {
            node: a,
            delta: delta_a - delta_b,
        }),
        (true, true) => {}
    }
}

/// Pulls the centroid of the free nodes back toward the origin.
pub struct DriftDamping;

impl Constraint for DriftDamping {
    fn name(&self) -> &'static str {
        "drift-damping"
    }

    fn corrections(&self, frame: &Frame<'_>) -> Vec<Correction> {
        let free = frame
            .store
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.is_fixed() && !node.is_trigger())
            .map(|(index, _)| index)
            .collect::<Vec<_>>();
        if free.is_empty() {
            return Vec::new();
        }

        let centroid = free
            .iter()
            .fold(Vec2::ZERO, |sum, &index| sum + frame.pos(index))
            / free.len() as f32;
        let delta = -centroid * frame.config.drift_damping;
        free.into_iter()
            .map(|node| Correction { node, delta })
            .collect()
    }
}

/// Caps the length of structural edges. Crowded nodes get longer, softer leashes, and the
/// upper node takes most of the pull so children are not lifted.
pub struct DescentLeash;

impl Constraint for DescentLeash {
    fn name(&self) -> &'static str {
        "descent-leash"
    }

    fn corrections(&self, frame: &Frame<'_>) -> Vec<Correction> {
        let config = frame.config;
        let mut out = Vec::new();

        let structural = frame
            .edges_of(EdgeKind::Descent)
            .chain(frame.edges_of(EdgeKind::Partner));
        for edge in structural {
            let Some((from, to)) = frame.endpoints(edge) else {
                continue;
            };
            let delta = frame.pos(from) - frame.pos(to);
            let distance = delta.length();
            let max_degree = frame.degree(&edge.from).max(frame.degree(&edge.to)) as f32;
            let limit = config.edge_base_length + max_degree * config.edge_length_per_degree;
            if distance <= limit || distance <= f32::EPSILON {
                continue;
            }

            let stiffness = (0.6 - max_degree * 0.03).max(0.1);
            let pull = delta / distance * ((distance - limit) * stiffness);
            let (from_share, to_share) = if frame.pos(from).y < frame.pos(to).y {
                (0.95, 0.05)
            } else {
                (0.05, 0.95)
            };
            push_pair(
                &mut out,
                frame,
                (from, -pull * from_share),
                (to, pull * to_share),
            );
        }
        out
    }
}

/// Keeps each union a fixed distance below its spouses and loosely under them.
pub struct SpouseUnion;

impl Constraint for SpouseUnion {
    fn name(&self) -> &'static str {
        "spouse-union"
    }

    fn corrections(&self, frame: &Frame<'_>) -> Vec<Correction> {
        let config = frame.config;
        let mut out = Vec::new();

        for edge in frame.edges_of(EdgeKind::Partner) {
            let Some((spouse, union)) = frame.endpoints(edge) else {
                continue;
            };
            if !frame.is_union(union) || frame.is_union(spouse) {
                continue;
            }
            let (spouse_pos, union_pos) = (frame.pos(spouse), frame.pos(union));

            let dy = spouse_pos.y + config.union_offset_y - union_pos.y;
            if dy.abs() > 2.0 {
                let force = dy * 0.1;
                push_pair(
                    &mut out,
                    frame,
                    (spouse, vec2(0.0, -force * 0.5)),
                    (union, vec2(0.0, force * 0.5)),
                );
            }

            let dx = spouse_pos.x - union_pos.x;
            let slack = config.union_cohesion_distance + config.union_cohesion_margin;
            if dx.abs() > slack {
                let pull = (dx.abs() - slack) * 0.02;
                push_pair(
                    &mut out,
                    frame,
                    (spouse, vec2(-pull * dx.signum(), 0.0)),
                    (union, Vec2::ZERO),
                );
            }
        }
        out
    }
}

/// Enforces a minimum vertical gap between a parent (or union) and its child.
pub struct GenerationGap;

impl Constraint for GenerationGap {
    fn name(&self) -> &'static str {
        "generation-gap"
    }

    fn corrections(&self, frame: &Frame<'_>) -> Vec<Correction> {
        let config = frame.config;
        let mut out = Vec::new();

        for edge in frame.edges_of(EdgeKind::Descent) {
            let Some((parent, child)) = frame.endpoints(edge) else {
                continue;
            };
            let gap = frame.pos(child).y - frame.pos(parent).y;
            if gap >= config.level_height {
                continue;
            }
            let force = ((config.level_height - gap) * 0.05).min(config.max_gap_step);
            push_pair(
                &mut out,
                frame,
                (parent, vec2(0.0, -force)),
                (child, vec2(0.0, force)),
            );
        }
        out
    }
}

/// Siblings may wander up to the leash radius; beyond it they are reeled in gently.
pub struct SiblingLeash;

impl Constraint for SiblingLeash {
    fn name(&self) -> &'static str {
        "sibling-leash"
    }

    fn corrections(&self, frame: &Frame<'_>) -> Vec<Correction> {
        let config = frame.config;
        let mut out = Vec::new();

        for edge in frame.edges_of(EdgeKind::Sibling) {
            let Some((a, b)) = frame.endpoints(edge) else {
                continue;
            };
            let delta = frame.pos(a) - frame.pos(b);
            let distance = delta.length();
            if distance <= config.sibling_leash_radius {
                continue;
            }
            let pull = delta / distance
                * ((distance - config.sibling_leash_radius) * config.sibling_leash_strength);
            push_pair(&mut out, frame, (a, -pull * 0.5), (b, pull * 0.5));
        }
        out
    }
}

/// The ordered constraint list run once per frame.
pub struct Simulation {
    constraints: Vec<Box<dyn Constraint>>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            constraints: vec![
                Box::new(DriftDamping),
                Box::new(DescentLeash),
                Box::new(SpouseUnion),
                Box::new(GenerationGap),
                Box::new(SiblingLeash),
            ],
        }
    }
}

impl Simulation {
    pub fn names(&self) -> Vec<&'static str> {
        self.constraints
            .iter()
            .map(|constraint| constraint.name())
            .collect()
    }

    /// Each constraint sees the positions left by the previous one. Fixed and trigger nodes
    /// never move.
    pub fn apply(&self, store: &mut GraphStore, config: &LayoutConfig) {
        if store.is_empty() {
            return;
        }
        let degrees = degree_map(store);

        for constraint in &self.constraints {
            let corrections = {
                let frame = Frame {
                    store: &*store,
                    degrees: &degrees,
                    config,
                };
                constraint.corrections(&frame)
            };

            let nodes = store.nodes_mut();
            for correction in corrections {
                if let Some(node) = nodes.get_mut(correction.node)
                    && !node.is_fixed()
                    && !node.is_trigger()
                {
                    node.pos += correction.delta;
                }
            }
        }
    }
}

fn degree_map(store: &GraphStore) -> HashMap<String, usize> {
    let mut degrees = HashMap::new();
    for edge in store.edges() {
        *degrees.entry(edge.from.clone()).or_insert(0) += 1;
        *degrees.entry(edge.to.clone()).or_insert(0) += 1;
    }
    degrees
}
