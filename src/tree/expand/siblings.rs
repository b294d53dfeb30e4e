use eframe::egui::vec2;
use tracing::info;

use super::ExpansionController;
use super::spouses::alternating_offset;
use crate::tree::node::EdgeKind;
use crate::tree::state::TreeState;
use crate::tree::tween::TweenTarget;
use crate::tree::union::union_id;

#[derive(Debug, Default)]
pub(crate) struct SiblingToggle {
    revealed: Vec<String>,
    parents_shown: bool,
}

impl TreeState {
    /// Shows or hides the siblings of `person`. Siblings go to the side away from visible
    /// spouses. A sibling hangs from the parents' union when its own record names both
    /// spouses; any other sibling gets a dashed edge until its parents are placed.
    pub(crate) fn toggle_siblings(&mut self, person: &str) -> Option<SiblingToggle> {
        let record = self.session.record(person)?;
        let pos = self.store.position(person)?;
        self.lock(person);

        if self.session.siblings_expanded(person) {
            for sibling in record.siblings() {
                self.remove_with_triggers(&sibling.id);
            }
            self.session.set_siblings_expanded(person, false);
            self.settle();
            return Some(SiblingToggle::default());
        }

        let spouse_xs = record
            .family
            .spouses
            .iter()
            .filter_map(|spouse| self.store.position(&spouse.id))
            .map(|at| at.x)
            .collect::<Vec<_>>();
        let away = (!spouse_xs.is_empty()).then(|| {
            let mean = spouse_xs.iter().sum::<f32>() / spouse_xs.len() as f32;
            if mean > pos.x { -1.0 } else { 1.0 }
        });

        let parents = &record.family.parents;
        let parent_couple = match parents.as_slice() {
            [first, second, ..] => Some((union_id(&first.id, &second.id), [&first.id, &second.id]))
                .filter(|(union, _)| self.store.contains(union)),
            _ => None,
        };
        let parents_shown =
            !parents.is_empty() && parents.iter().all(|parent| self.store.contains(&parent.id));

        let spacing = self.config.relative_spacing_x;
        let font_size = self.config.label_font_size;
        let mut targets = Vec::new();
        let mut revealed = Vec::new();

        for (index, sibling) in record.siblings().enumerate() {
            let offset = match away {
                Some(side) => side * (index + 1) as f32 * spacing,
                None => alternating_offset(index, spacing),
            };
            if self.spawn_person(sibling, pos) {
                targets.push(TweenTarget::growing(
                    sibling.id.clone(),
                    vec2(pos.x + offset, pos.y),
                    font_size,
                ));
                revealed.push(sibling.id.clone());
            }

            // Only a sibling known to share both parents hangs from their union.
            let shared_union = parent_couple.as_ref().filter(|(_, couple)| {
                self.session.record(&sibling.id).is_some_and(|known| {
                    couple
                        .iter()
                        .all(|parent| known.family.parents.iter().any(|p| &p.id == *parent))
                })
            });
            match shared_union {
                Some((union, _)) => {
                    self.store.add_edge(union, &sibling.id, EdgeKind::Descent);
                }
                None => {
                    let joined = self
                        .store
                        .edges()
                        .iter()
                        .any(|edge| edge.joins(person, &sibling.id));
                    if !joined {
                        self.store.add_edge(person, &sibling.id, EdgeKind::Sibling);
                    }
                }
            }
        }

        self.session.set_siblings_expanded(person, true);
        let animated = self.animate(targets);
        self.schedule_overlap(pos.y, animated);
        self.settle();
        Some(SiblingToggle {
            revealed,
            parents_shown,
        })
    }
}

impl ExpansionController {
    pub fn toggle_siblings(&self, person: &str) {
        let Some(toggle) = self.state.borrow_mut().toggle_siblings(person) else {
            return;
        };
        info!(person, revealed = toggle.revealed.len(), "toggled siblings");

        for sibling in toggle.revealed {
            if toggle.parents_shown {
                self.relink_sibling(sibling);
            } else {
                self.spawn_expand(sibling);
            }
        }
    }
}
