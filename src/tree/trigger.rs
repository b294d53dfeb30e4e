use tracing::debug;

use super::node::{EdgeKind, GraphNode, Trigger, TriggerKind};
use super::state::TreeState;
use crate::family::Relative;

pub fn trigger_id(kind: TriggerKind, person_id: &str) -> String {
    format!("trigger_{}_{}", kind.slug(), person_id)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Wanted {
    pending: usize,
    toggled: bool,
}

impl TreeState {
    fn unseen(&self, relatives: &[&Relative]) -> usize {
        relatives
            .iter()
            .filter(|relative| !self.store.contains(&relative.id))
            .count()
    }

    /// Derives the three triggers of one person from the cached record and the graph.
    pub(crate) fn sync_triggers(&mut self, person_id: &str) {
        if !self.store.node(person_id).is_some_and(GraphNode::is_person) {
            return;
        }
        let Some(record) = self.session.record(person_id) else {
            return;
        };
        let family = &record.family;

        let parents = family.parents.iter().collect::<Vec<_>>();
        let unseen_parents = self.unseen(&parents);
        let linked = self
            .store
            .edges()
            .iter()
            .any(|edge| edge.kind == EdgeKind::Descent && edge.to == person_id);
        let parents_wanted = !parents.is_empty() && (unseen_parents > 0 || !linked);
        let parents_trigger = parents_wanted.then_some(Wanted {
            pending: unseen_parents,
            toggled: false,
        });

        let spouses = family.spouses.iter().collect::<Vec<_>>();
        let unseen_spouses = self.unseen(&spouses);
        let lone_spouse_shown = spouses.len() == 1 && unseen_spouses == 0;
        let spouses_trigger = (!spouses.is_empty() && !lone_spouse_shown).then_some(Wanted {
            pending: unseen_spouses,
            toggled: false,
        });

        let siblings = record.siblings().collect::<Vec<_>>();
        let siblings_trigger = (!siblings.is_empty()).then(|| Wanted {
            pending: self.unseen(&siblings),
            toggled: self.session.siblings_expanded(person_id),
        });

        self.set_trigger(person_id, TriggerKind::Parents, parents_trigger);
        self.set_trigger(person_id, TriggerKind::Spouses, spouses_trigger);
        self.set_trigger(person_id, TriggerKind::Siblings, siblings_trigger);
    }

    pub(crate) fn sync_all_triggers(&mut self) {
        let people = self
            .store
            .nodes()
            .iter()
            .filter(|node| node.is_person())
            .map(|node| node.id.clone())
            .collect::<Vec<_>>();
        for person in people {
            self.sync_triggers(&person);
        }
    }

    fn set_trigger(&mut self, person_id: &str, kind: TriggerKind, wanted: Option<Wanted>) {
        let id = trigger_id(kind, person_id);
        let Some(wanted) = wanted else {
            if self.remove_node(&id) {
                debug!(trigger = %id, "removed trigger");
            }
            return;
        };

        if let Some(trigger) = self
            .store
            .node_mut(&id)
            .and_then(GraphNode::as_trigger_mut)
        {
            trigger.pending = wanted.pending;
            trigger.toggled = wanted.toggled;
            return;
        }

        let Some(owner) = self.store.position(person_id) else {
            return;
        };
        let trigger = Trigger {
            kind,
            person_id: person_id.to_owned(),
            pending: wanted.pending,
            toggled: wanted.toggled,
        };
        if self
            .store
            .add_node(GraphNode::trigger(id.clone(), trigger, owner + kind.offset()))
        {
            self.session.track_trigger(&id);
            debug!(trigger = %id, pending = wanted.pending, "added trigger");
        }
    }

    /// Pins every trigger to its owner's current position.
    pub(crate) fn place_triggers(&mut self) {
        let placements = self
            .session
            .active_triggers()
            .filter_map(|id| {
                let trigger = self.store.node(id)?.as_trigger()?;
                let owner = self.store.position(&trigger.person_id)?;
                Some((id.to_owned(), owner + trigger.kind.offset()))
            })
            .collect::<Vec<_>>();

        for (id, pos) in placements {
            self.store.set_position(&id, pos);
        }
    }
}
