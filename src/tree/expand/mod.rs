mod children;
mod fetch;
mod parents;
mod siblings;
mod spouses;

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use eframe::egui::Vec2;
use futures::executor::LocalSpawner;
use futures::task::LocalSpawnExt;
use tracing::{info, warn};

use super::node::{GraphNode, NodeKind, Person, TriggerKind};
use super::state::TreeState;
use crate::family::{FamilyProvider, Gender};
use crate::util::{normalized_id, wordwrap};

/// Orchestrates expansion intents against the shared tree state. Cheap to clone; clones
/// share the state, the provider and the spawner.
#[derive(Clone)]
pub struct ExpansionController {
    state: Rc<RefCell<TreeState>>,
    provider: Rc<dyn FamilyProvider>,
    spawner: LocalSpawner,
}

enum Target {
    Person,
    Union,
    Trigger(TriggerKind, String),
}

impl ExpansionController {
    pub fn new(
        state: Rc<RefCell<TreeState>>,
        provider: Rc<dyn FamilyProvider>,
        spawner: LocalSpawner,
    ) -> Self {
        Self {
            state,
            provider,
            spawner,
        }
    }

    pub fn state(&self) -> &Rc<RefCell<TreeState>> {
        &self.state
    }

    fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        if let Err(err) = self.spawner.spawn_local(task) {
            warn!(%err, "could not schedule background expansion");
        }
    }

    /// Fetches a newly revealed relative in the background so its own triggers appear.
    fn spawn_expand(&self, id: String) {
        let controller = self.clone();
        self.spawn(async move {
            controller.expand(&id, true).await;
        });
    }

    /// Starts a new session from a free-text term: one unresolved placeholder at the origin,
    /// expanded right away.
    pub fn seed(&self, term: &str) -> Option<String> {
        let id = normalized_id(term);
        if id.is_empty() {
            return None;
        }

        {
            let mut state = self.state.borrow_mut();
            state.reset();
            let person = Person {
                label: wordwrap(term.trim(), state.config.label_wrap),
                gender: Gender::Unknown,
                life_span: None,
                resolved: false,
            };
            let font_size = state.config.label_font_size;
            state
                .store
                .add_node(GraphNode::person(id.clone(), person, Vec2::ZERO, font_size));
        }
        info!(term, placeholder = %id, "seeded family tree");

        let controller = self.clone();
        let placeholder = id.clone();
        self.spawn(async move {
            controller.expand(&placeholder, false).await;
        });
        Some(id)
    }

    pub fn reset(&self) {
        self.state.borrow_mut().reset();
    }

    /// Click dispatch: unions toggle their children, triggers reveal their category, people
    /// are selected and refreshed.
    pub fn activate(&self, id: &str) {
        let target = {
            let state = self.state.borrow();
            match state.store.node(id).map(|node| &node.kind) {
                Some(NodeKind::Person(_)) => Target::Person,
                Some(NodeKind::Union(_)) => Target::Union,
                Some(NodeKind::Trigger(trigger)) => {
                    Target::Trigger(trigger.kind, trigger.person_id.clone())
                }
                None => return,
            }
        };

        match target {
            Target::Person => {
                self.select(id);
                self.spawn_expand(id.to_owned());
            }
            Target::Union => {
                let controller = self.clone();
                let union = id.to_owned();
                self.spawn(async move { controller.toggle_union(&union).await });
            }
            Target::Trigger(TriggerKind::Parents, person) => {
                let parents = self
                    .state
                    .borrow()
                    .session
                    .record(&person)
                    .map(|record| record.family.parents.clone());
                if let Some(parents) = parents {
                    self.expand_parents(&person, &parents);
                }
            }
            Target::Trigger(TriggerKind::Spouses, person) => self.expand_spouses(&person),
            Target::Trigger(TriggerKind::Siblings, person) => self.toggle_siblings(&person),
        }
    }

    pub fn select(&self, id: &str) {
        let mut state = self.state.borrow_mut();
        if state.store.node(id).is_some_and(GraphNode::is_person) {
            let state = &mut *state;
            state.highlighter.select(&mut state.store, id);
        }
    }

    pub fn clear_selection(&self) {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        state.highlighter.clear(&mut state.store);
    }

    /// Hover tracing kicks in after the debounce delay; see [`TreeState::advance`].
    pub fn hover(&self, id: &str) {
        let mut state = self.state.borrow_mut();
        let (now, delay) = (state.now(), state.config.hover_delay_secs);
        state.hover.enter(id, now, delay);
    }

    pub fn hover_end(&self) {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        state.hover.cancel();
        state.highlighter.release_hover(&mut state.store);
    }

    /// Returns the new pin state.
    pub fn toggle_pin(&self, id: &str) -> Option<bool> {
        let mut state = self.state.borrow_mut();
        let node = state.store.node_mut(id)?;
        if node.is_trigger() {
            return None;
        }
        node.pinned = !node.pinned;
        node.velocity = Vec2::ZERO;
        Some(node.pinned)
    }

    /// Removes a person or union. People take their trigger ids with them; triggers themselves
    /// are derived and cannot be deleted.
    pub fn delete(&self, id: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let (person, union) = state
            .store
            .node(id)
            .map_or((false, false), |node| (node.is_person(), node.is_union()));
        let removed = if person {
            state.remove_with_triggers(id)
        } else if union {
            state.remove_node(id)
        } else {
            false
        };
        if removed {
            info!(id, "deleted node");
            state.settle();
        }
        removed
    }

    pub fn advance(&self, now: f64) {
        self.state.borrow_mut().advance(now);
    }

    pub fn step_physics(&self) {
        self.state.borrow_mut().step_physics();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Harness, RecordBuilder, ScriptedProvider};
    use crate::tree::node::{TriggerKind, UnionState};
    use crate::tree::trigger::trigger_id;

    fn family() -> ScriptedProvider {
        ScriptedProvider::with(vec![
            RecordBuilder::new("P")
                .parents(&["M", "F"])
                .spouses(&["S"])
                .build(),
            RecordBuilder::new("M").build(),
            RecordBuilder::new("F").build(),
            RecordBuilder::new("S").build(),
        ])
        .term("Person P", "P")
    }

    #[test]
    fn seed_resolves_placeholder_and_creates_triggers() {
        let mut harness = Harness::new(family());
        let placeholder = harness.controller.seed("  Person   P ");
        assert_eq!(placeholder.as_deref(), Some("person_p"));
        assert!(harness.contains("person_p"));

        harness.settle();
        assert!(!harness.contains("person_p"));
        assert!(harness.contains("P"));
        assert!(harness.contains(&trigger_id(TriggerKind::Parents, "P")));
        assert!(harness.contains(&trigger_id(TriggerKind::Spouses, "P")));
        assert!(!harness.contains(&trigger_id(TriggerKind::Siblings, "P")));

        let state = harness.controller.state().borrow();
        assert!(!state.is_busy());
        assert_eq!(state.loading_count(), 0);
        let resolved = state.store.node("P").and_then(|n| n.as_person()).map(|p| p.resolved);
        assert_eq!(resolved, Some(true));
    }

    #[test]
    fn activating_the_parents_trigger_places_parents() {
        let mut harness = Harness::new(family());
        harness.controller.seed("Person P");
        harness.settle();

        harness.controller.activate(&trigger_id(TriggerKind::Parents, "P"));
        harness.settle();

        assert!(harness.contains("M") && harness.contains("F"));
        assert!(!harness.contains(&trigger_id(TriggerKind::Parents, "P")));
        let state = harness.controller.state().borrow();
        let union = state.store.node("union_F_M").and_then(|n| n.as_union());
        assert_eq!(union.map(|u| u.state), Some(UnionState::Collapsed(1)));
        assert!(state.store.has_edge("union_F_M", "P"));
    }

    #[test]
    fn pin_and_delete() {
        let mut harness = Harness::new(family());
        harness.controller.seed("Person P");
        harness.settle();

        assert_eq!(harness.controller.toggle_pin("P"), Some(true));
        assert_eq!(harness.controller.toggle_pin("P"), Some(false));
        assert_eq!(harness.controller.toggle_pin("trigger_parents_P"), None);

        assert!(!harness.controller.delete("trigger_parents_P"));
        assert!(harness.controller.delete("P"));
        assert!(harness.ids().is_empty());
        assert!(!harness.controller.delete("P"));
    }

    #[test]
    fn deleting_a_person_keeps_the_rest_of_the_family() {
        let provider = ScriptedProvider::with(vec![
            RecordBuilder::new("P")
                .parents(&["M", "F"])
                .spouses(&["S"])
                .siblings(&["B"])
                .build(),
            RecordBuilder::new("M").build(),
            RecordBuilder::new("F").build(),
            RecordBuilder::new("S").parents(&["SM"]).build(),
        ])
        .term("Person P", "P");
        let mut harness = Harness::new(provider);
        harness.controller.seed("Person P");
        harness.settle();
        harness.controller.activate(&trigger_id(TriggerKind::Parents, "P"));
        harness.controller.activate(&trigger_id(TriggerKind::Spouses, "P"));
        harness.settle();

        let edges = |harness: &Harness| {
            let state = harness.controller.state().borrow();
            let mut edges = state
                .store
                .edges()
                .iter()
                .filter(|edge| !edge.touches("P"))
                .map(|edge| (edge.from.clone(), edge.to.clone(), edge.kind))
                .collect::<Vec<_>>();
            edges.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
            edges
        };
        let before = harness.ids();
        let kept_edges = edges(&harness);
        assert!(before.contains(&trigger_id(TriggerKind::Siblings, "P")));
        assert!(before.contains(&trigger_id(TriggerKind::Parents, "S")));
        assert!(kept_edges.len() >= 3);

        assert!(harness.controller.delete("P"));

        let expected = before
            .iter()
            .filter(|id| {
                id.as_str() != "P"
                    && !TriggerKind::ALL
                        .iter()
                        .any(|kind| **id == trigger_id(*kind, "P"))
            })
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(harness.ids(), expected);
        for survivor in ["M", "F", "S", "union_F_M", "union_P_S"] {
            assert!(harness.contains(survivor), "{survivor}");
        }
        assert_eq!(edges(&harness), kept_edges);
        let state = harness.controller.state().borrow();
        assert!(state.store.edges().iter().all(|edge| !edge.touches("P")));
    }

    #[test]
    fn reset_clears_graph_and_session() {
        let mut harness = Harness::new(family());
        harness.controller.seed("Person P");
        harness.settle();
        harness.controller.reset();

        let state = harness.controller.state().borrow();
        assert!(state.store.is_empty());
        assert!(state.session.record("P").is_none());
        assert_eq!(state.session.active_triggers().count(), 0);
    }
}
