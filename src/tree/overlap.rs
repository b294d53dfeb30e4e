use eframe::egui::vec2;
use tracing::debug;

use super::config::LayoutConfig;
use super::state::TreeState;
use super::store::GraphStore;
use super::tween::TweenTarget;
use super::union::recenter_unions;

/// One generation-level sweep: the nodes within `level_tolerance` of `level`, pushed right
/// until every neighbour pair is at least half-widths plus `min_node_gap` apart.
pub fn plan_level(store: &GraphStore, level: f32, config: &LayoutConfig) -> Vec<TweenTarget> {
    let mut on_level = store
        .nodes()
        .iter()
        .filter(|node| (node.pos.y - level).abs() < config.level_tolerance)
        .collect::<Vec<_>>();
    if on_level.len() < 2 {
        return Vec::new();
    }
    on_level.sort_by(|a, b| a.pos.x.total_cmp(&b.pos.x));

    let mut shifts = Vec::new();
    let mut pushed = 0.0;
    for pair in on_level.windows(2) {
        let [left, right] = pair else {
            continue;
        };
        let left_width = left.width(config.person_width, config.compact_width);
        let right_width = right.width(config.person_width, config.compact_width);
        let min_gap = left_width / 2.0 + right_width / 2.0 + config.min_node_gap;

        let distance = right.pos.x - left.pos.x;
        if distance < min_gap {
            pushed += min_gap - distance;
        }
        if pushed > 0.0 {
            shifts.push(TweenTarget::to(
                right.id.clone(),
                vec2(right.pos.x + pushed, right.pos.y),
            ));
        }
    }
    shifts
}

impl TreeState {
    /// Runs the sweep on one level. Moves are animated; when nothing moves the unions are
    /// still re-centered.
    pub(crate) fn resolve_overlap(&mut self, level: f32) {
        let shifts = plan_level(&self.store, level, &self.config);
        if shifts.is_empty() {
            recenter_unions(&mut self.store, self.config.union_offset_y);
            return;
        }
        debug!(level, moved = shifts.len(), "resolving level overlap");
        self.animate(shifts);
    }

    /// Resolves `level` now, or after the growth animation when `animated`.
    pub(crate) fn schedule_overlap(&mut self, level: f32, animated: bool) {
        if animated {
            self.defer_overlap(level);
        } else {
            self.resolve_overlap(level);
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::Vec2;

    use super::*;
    use crate::family::Gender;
    use crate::tree::node::{GraphNode, Person, Union, UnionState};

    fn person(id: &str, x: f32, y: f32) -> GraphNode {
        GraphNode::person(
            id,
            Person {
                label: id.to_owned(),
                gender: Gender::Male,
                life_span: None,
                resolved: true,
            },
            vec2(x, y),
            14.0,
        )
    }

    fn union(id: &str, x: f32, y: f32) -> GraphNode {
        GraphNode::union(
            id,
            Union {
                spouses: ["p".into(), "q".into()],
                children: Vec::new(),
                state: UnionState::Empty,
            },
            vec2(x, y),
        )
    }

    fn apply(store: &mut GraphStore, shifts: &[TweenTarget]) {
        for shift in shifts {
            store.set_position(&shift.id, shift.pos);
        }
    }

    #[test]
    fn sweep_leaves_every_neighbour_pair_apart() {
        let config = LayoutConfig::default();
        let mut store = GraphStore::new();
        store.add_node(person("a", 0.0, 100.0));
        store.add_node(person("b", 50.0, 105.0));
        store.add_node(union("u", 60.0, 95.0));
        store.add_node(person("c", 400.0, 110.0));
        store.add_node(person("far", 10.0, 400.0));

        let shifts = plan_level(&store, 100.0, &config);
        assert!(!shifts.is_empty());
        assert!(shifts.iter().all(|shift| shift.id != "a" && shift.id != "far"));
        apply(&mut store, &shifts);

        let mut level = store
            .nodes()
            .iter()
            .filter(|node| (node.pos.y - 100.0).abs() < config.level_tolerance)
            .collect::<Vec<_>>();
        level.sort_by(|a, b| a.pos.x.total_cmp(&b.pos.x));
        for pair in level.windows(2) {
            let needed = pair[0].width(config.person_width, config.compact_width) / 2.0
                + pair[1].width(config.person_width, config.compact_width) / 2.0
                + config.min_node_gap;
            assert!(pair[1].pos.x - pair[0].pos.x >= needed - 0.001);
        }
        assert!(plan_level(&store, 100.0, &config).is_empty());
    }

    #[test]
    fn wide_levels_and_lone_nodes_do_not_move() {
        let config = LayoutConfig::default();
        let mut store = GraphStore::new();
        store.add_node(person("a", 0.0, 0.0));
        assert!(plan_level(&store, 0.0, &config).is_empty());

        store.add_node(person("b", 180.0, 0.0));
        assert!(plan_level(&store, 0.0, &config).is_empty());
        assert_eq!(store.position("b"), Some(Vec2::new(180.0, 0.0)));
    }
}
