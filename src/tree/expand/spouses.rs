use eframe::egui::vec2;
use tracing::info;

use super::ExpansionController;
use crate::tree::state::TreeState;
use crate::tree::tween::TweenTarget;
use crate::tree::union::{ensure_union, offer_children};

/// Side and distance of the `index`-th relative placed beside a person: right, left, further
/// right, further left.
pub(super) fn alternating_offset(index: usize, spacing: f32) -> f32 {
    let side = if index % 2 == 0 { 1.0 } else { -1.0 };
    side * (index / 2 + 1) as f32 * spacing
}

impl TreeState {
    /// Reveals every spouse of `person` with one union per couple. Returns the newly added
    /// spouse ids.
    pub(crate) fn place_spouses(&mut self, person: &str) -> Vec<String> {
        let Some(record) = self.session.record(person) else {
            return Vec::new();
        };
        let Some(pos) = self.store.position(person) else {
            return Vec::new();
        };
        self.lock(person);

        let spacing = self.config.relative_spacing_x;
        let font_size = self.config.label_font_size;
        let union_y = pos.y + self.config.union_spawn_offset_y;
        let mut targets = Vec::new();
        let mut revealed = Vec::new();

        for (index, spouse) in record.family.spouses.iter().enumerate() {
            let spouse_x = if self.spawn_person(spouse, pos) {
                let x = pos.x + alternating_offset(index, spacing);
                targets.push(TweenTarget::growing(spouse.id.clone(), vec2(x, pos.y), font_size));
                revealed.push(spouse.id.clone());
                x
            } else {
                self.store
                    .position(&spouse.id)
                    .map_or(pos.x + alternating_offset(index, spacing), |at| at.x)
            };

            let (union, created) = ensure_union(&mut self.store, &record.id, &spouse.id, pos);
            offer_children(&mut self.store, &union, record.family.children_with(&spouse.id));
            if created {
                targets.push(TweenTarget::to(union, vec2((pos.x + spouse_x) / 2.0, union_y)));
            }
        }

        let animated = self.animate(targets);
        self.schedule_overlap(pos.y, animated);
        self.settle();
        revealed
    }
}

impl ExpansionController {
    pub fn expand_spouses(&self, person: &str) {
        let revealed = self.state.borrow_mut().place_spouses(person);
        info!(person, revealed = revealed.len(), "expanded spouses");
        for spouse in revealed {
            self.spawn_expand(spouse);
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::super::testing::{Harness, RecordBuilder, ScriptedProvider, child};
    use super::alternating_offset;
    use crate::tree::node::{EdgeKind, TriggerKind, UnionState};
    use crate::tree::trigger::trigger_id;
    use crate::tree::union::union_id;

    fn family() -> ScriptedProvider {
        ScriptedProvider::with(vec![
            RecordBuilder::new("P")
                .spouses(&["S1", "S2"])
                .children(vec![
                    child("A", &["S1"]),
                    child("B", &["S1"]),
                    child("C", &["S2"]),
                    child("D", &[]),
                ])
                .build(),
            RecordBuilder::new("S1").spouses(&["P"]).build(),
            RecordBuilder::new("S2").spouses(&["P"]).build(),
        ])
        .term("Person P", "P")
    }

    fn union_state(harness: &Harness, id: &str) -> Option<UnionState> {
        let state = harness.controller.state().borrow();
        state.store.node(id)?.as_union().map(|union| union.state)
    }

    #[test]
    fn offsets_alternate_and_widen() {
        let offsets = (0..4).map(|i| alternating_offset(i, 160.0)).collect::<Vec<_>>();
        assert_eq!(offsets, vec![160.0, -160.0, 320.0, -320.0]);
    }

    #[test]
    fn each_spouse_gets_a_union_with_its_own_children() {
        let mut harness = Harness::new(family());
        harness.controller.seed("Person P");
        harness.settle();

        harness.controller.activate(&trigger_id(TriggerKind::Spouses, "P"));
        harness.settle();

        assert!(harness.contains("S1") && harness.contains("S2"));
        assert_eq!(
            union_state(&harness, &union_id("P", "S1")),
            Some(UnionState::Collapsed(2))
        );
        assert_eq!(
            union_state(&harness, &union_id("P", "S2")),
            Some(UnionState::Collapsed(1))
        );

        let state = harness.controller.state().borrow();
        assert!(state.store.edge("S1", &union_id("P", "S1")).is_some_and(|e| e.kind == EdgeKind::Partner));
        assert!(state.store.has_edge("P", "S2") || state.store.has_edge("S2", "P"));
        assert!(!state.store.contains(&trigger_id(TriggerKind::Spouses, "S1")));
        assert_eq!(harness.provider.calls.get(), 3);
    }

    #[test]
    fn spouses_and_unions_animate_into_place() {
        let mut harness = Harness::new(family());
        harness.controller.seed("Person P");
        harness.settle();
        harness.controller.expand_spouses("P");

        harness.controller.advance(5.0);
        let state = harness.controller.state().borrow();
        assert_eq!(state.store.position("S1"), Some(vec2(160.0, 0.0)));
        assert_eq!(state.store.position("S2"), Some(vec2(-160.0, 0.0)));
        let union = state.store.position(&union_id("P", "S1"));
        assert!(union.is_some_and(|pos| (pos.x - 80.0).abs() < 0.01));
    }

    #[test]
    fn repeated_expansion_is_idempotent() {
        let mut harness = Harness::new(family());
        harness.controller.seed("Person P");
        harness.settle();
        harness.controller.expand_spouses("P");
        harness.settle();
        let before = harness.ids();
        let edges = harness.controller.state().borrow().store.edges().len();

        harness.controller.expand_spouses("P");
        harness.settle();
        assert_eq!(harness.ids(), before);
        assert_eq!(harness.controller.state().borrow().store.edges().len(), edges);
    }
}
