use std::rc::Rc;

use futures::FutureExt;
use tracing::{debug, info, warn};

use super::ExpansionController;
use crate::family::{FamilyRecord, Lookup};
use crate::tree::node::gender_color;
use crate::tree::session::SharedFetch;
use crate::tree::state::TreeState;
use crate::tree::store::{GraphStore, Rename};
use crate::util::{unwrap_label, wordwrap};

/// Placeholders are looked up by their label, everything else by id.
fn query_for(store: &GraphStore, id: &str) -> Option<Lookup> {
    let node = store.node(id)?;
    match node.as_person() {
        Some(person) if !person.resolved => Some(Lookup::Term(unwrap_label(&person.label))),
        _ => Some(Lookup::Identity(id.to_owned())),
    }
}

impl TreeState {
    /// Applies a resolved record: renames (or merges) the requested node onto the canonical
    /// id, refreshes the person's details and caches the record.
    pub(crate) fn settle_fetch(&mut self, requested: &str, record: FamilyRecord) -> Rc<FamilyRecord> {
        let canonical = record.id.clone();
        if requested != canonical && self.store.contains(requested) {
            self.highlighter.clear(&mut self.store);
            let outcome = self.store.rename_node(requested, &canonical);
            if outcome == Rename::Merged {
                info!(requested, %canonical, "merged placeholder into existing node");
            } else {
                info!(requested, %canonical, "resolved placeholder");
            }
        }

        let label = wordwrap(&record.label, self.config.label_wrap);
        if let Some(node) = self.store.node_mut(&canonical)
            && let Some(person) = node.as_person_mut()
        {
            person.label = label;
            person.gender = record.gender;
            person.life_span = record.life_span.clone();
            person.resolved = true;
            node.style.fill = gender_color(record.gender);
        }

        let record = self.session.resolve(requested, record);
        self.settle();
        record
    }
}

impl ExpansionController {
    /// Returns the family record of `id`, fetching it at most once per session no matter how
    /// many callers ask concurrently. Failed lookups resolve to `None` and are not cached.
    pub async fn expand(&self, id: &str, silent: bool) -> Option<Rc<FamilyRecord>> {
        let (fetch, epoch) = {
            let mut state = self.state.borrow_mut();
            if let Some(record) = state.session.record(id) {
                state.sync_triggers(&record.id);
                return Some(record);
            }

            let epoch = state.session.epoch();
            let fetch = match state.session.in_flight(id) {
                Some(fetch) => fetch,
                None => {
                    let query = query_for(&state.store, id)?;
                    let fetch = self.start_fetch(id, query, epoch);
                    state.session.begin(id, fetch.clone());
                    fetch
                }
            };
            state.loading.insert(id.to_owned());
            if !silent {
                state.busy += 1;
            }
            (fetch, epoch)
        };

        let record = fetch.await;

        let mut state = self.state.borrow_mut();
        if state.session.epoch() != epoch {
            return None;
        }
        state.loading.remove(id);
        if !silent {
            state.busy = state.busy.saturating_sub(1);
        }
        if let Some(record) = &record {
            state.sync_triggers(&record.id);
        }
        record
    }

    fn start_fetch(&self, requested: &str, query: Lookup, epoch: u64) -> SharedFetch {
        debug!(requested, query = query.describe(), "fetching family record");
        let lookup = self.provider.lookup(query.clone());
        let state = Rc::downgrade(&self.state);
        let requested = requested.to_owned();

        async move {
            let result = lookup.await;
            let state = state.upgrade()?;
            let mut state = state.borrow_mut();
            if state.session.epoch() != epoch {
                return None;
            }

            match result {
                Ok(record) => Some(state.settle_fetch(&requested, record)),
                Err(err) => {
                    warn!(query = query.describe(), %err, "family lookup failed");
                    state.session.fail(&requested);
                    None
                }
            }
        }
        .boxed_local()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::Vec2;
    use futures::task::LocalSpawnExt;

    use super::super::testing::{Harness, RecordBuilder, ScriptedProvider};
    use crate::family::Gender;
    use crate::tree::node::{EdgeKind, GraphNode, Person, TriggerKind, gender_color};
    use crate::tree::trigger::trigger_id;

    fn provider() -> ScriptedProvider {
        ScriptedProvider::with(vec![
            RecordBuilder::new("P")
                .gender(Gender::Female)
                .parents(&["M", "F"])
                .spouses(&["S"])
                .build(),
            RecordBuilder::new("M").build(),
            RecordBuilder::new("F").build(),
        ])
        .term("Person P", "P")
        .term("Also P", "P")
    }

    #[test]
    fn concurrent_callers_share_a_single_lookup() {
        let mut harness = Harness::new(provider());
        harness.provider.gate();
        harness.controller.seed("Person P");
        harness.settle();
        assert_eq!(harness.provider.calls.get(), 1);

        let spawner = harness.pool.spawner();
        for silent in [true, false] {
            let controller = harness.controller.clone();
            spawner
                .spawn_local(async move {
                    controller.expand("person_p", silent).await;
                })
                .expect("spawn");
        }
        harness.settle();
        assert_eq!(harness.provider.calls.get(), 1);
        assert!(harness.controller.state().borrow().is_busy());
        assert!(harness.controller.state().borrow().is_loading("person_p"));

        harness.provider.release();
        harness.settle();
        assert_eq!(harness.provider.calls.get(), 1);
        assert!(harness.contains("P"));
        assert!(harness.contains(&trigger_id(TriggerKind::Parents, "P")));
        let state = harness.controller.state().borrow();
        assert!(!state.is_busy());
        assert_eq!(state.loading_count(), 0);
        assert!(state.session.record("person_p").is_some());
    }

    #[test]
    fn cached_records_skip_the_provider() {
        let mut harness = Harness::new(provider());
        harness.controller.seed("Person P");
        harness.settle();

        let controller = harness.controller.clone();
        let record = harness
            .pool
            .run_until(async move { controller.expand("P", false).await });
        assert_eq!(record.map(|r| r.id.clone()).as_deref(), Some("P"));
        assert_eq!(harness.provider.calls.get(), 1);
    }

    #[test]
    fn resolved_records_update_the_node() {
        let mut harness = Harness::new(provider());
        harness.controller.seed("Person P");
        harness.settle();

        let state = harness.controller.state().borrow();
        let node = state.store.node("P").expect("renamed node");
        let person = node.as_person().expect("person");
        assert_eq!(person.gender, Gender::Female);
        assert_eq!(person.label, "Person P");
        assert!(person.resolved);
        assert_eq!(node.style.fill, gender_color(Gender::Female));
    }

    #[test]
    fn placeholder_merges_into_existing_canonical_node() {
        let mut harness = Harness::new(provider());
        harness.controller.seed("Person P");
        harness.settle();
        {
            let mut state = harness.controller.state().borrow_mut();
            let placeholder = Person {
                label: "Also P".into(),
                gender: Gender::Unknown,
                life_span: None,
                resolved: false,
            };
            state
                .store
                .add_node(GraphNode::person("also_p", placeholder, Vec2::ZERO, 14.0));
            state.store.add_edge("also_p", "P", EdgeKind::Sibling);
        }

        let controller = harness.controller.clone();
        let record = harness
            .pool
            .run_until(async move { controller.expand("also_p", true).await });
        assert_eq!(record.map(|r| r.id.clone()).as_deref(), Some("P"));
        assert!(!harness.contains("also_p"));
        let state = harness.controller.state().borrow();
        assert!(state.store.edges().iter().all(|edge| edge.from != edge.to));
        assert_eq!(state.session.canonical("also_p"), "P");
    }

    #[test]
    fn failed_lookups_leave_a_leaf_and_are_retried() {
        let mut harness = Harness::new(provider());
        harness.controller.seed("Nobody Known");
        harness.settle();

        assert_eq!(harness.ids(), vec!["nobody_known".to_owned()]);
        {
            let state = harness.controller.state().borrow();
            assert!(!state.is_busy());
            assert_eq!(state.loading_count(), 0);
        }

        let controller = harness.controller.clone();
        let retry = harness
            .pool
            .run_until(async move { controller.expand("nobody_known", true).await });
        assert!(retry.is_none());
        assert_eq!(harness.provider.calls.get(), 2);
    }

    #[test]
    fn unavailable_provider_leaves_a_leaf_until_it_recovers() {
        let mut harness = Harness::new(provider());
        harness.provider.set_offline(true);
        harness.controller.seed("Person P");
        harness.settle();

        assert_eq!(harness.ids(), vec!["person_p".to_owned()]);
        assert!(harness.controller.state().borrow().session.record("person_p").is_none());

        harness.provider.set_offline(false);
        let controller = harness.controller.clone();
        let record = harness
            .pool
            .run_until(async move { controller.expand("person_p", false).await });
        assert_eq!(record.map(|r| r.id.clone()).as_deref(), Some("P"));
        assert!(harness.contains(&trigger_id(TriggerKind::Parents, "P")));
        assert_eq!(harness.provider.calls.get(), 2);
    }

    #[test]
    fn stale_continuations_are_dropped_after_reset() {
        let mut harness = Harness::new(provider());
        harness.provider.gate();
        harness.controller.seed("Person P");
        harness.settle();

        harness.controller.reset();
        harness.provider.release();
        harness.settle();
        assert!(harness.ids().is_empty());
        assert!(harness.controller.state().borrow().session.record("P").is_none());
    }
}
