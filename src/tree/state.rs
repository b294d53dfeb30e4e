use std::collections::HashSet;

use eframe::egui::Vec2;
use tracing::debug;

use super::bloodline::{Highlighter, HoverDebounce};
use super::config::{LayoutConfig, PhysicsConfig};
use super::constraints::Simulation;
use super::node::{GraphNode, Person, TriggerKind};
use super::physics;
use super::session::Session;
use super::store::GraphStore;
use super::trigger::trigger_id;
use super::tween::{TweenTarget, Tweener};
use super::union::recenter_unions;
use crate::family::Relative;
use crate::util::wordwrap;

#[derive(Clone, Copy, Debug)]
struct DeferredOverlap {
    due: f64,
    level: f32,
}

/// Everything the expansion engine mutates: the graph, the session cache and the frame-driven
/// machinery (animations, deferred overlap passes, locks, highlighting).
pub struct TreeState {
    pub(crate) store: GraphStore,
    pub(crate) session: Session,
    pub(crate) config: LayoutConfig,
    pub(crate) simulation: Simulation,
    pub(crate) tweener: Tweener,
    pub(crate) highlighter: Highlighter,
    pub(crate) hover: HoverDebounce,
    pub(crate) loading: HashSet<String>,
    pub(crate) busy: usize,
    pub(crate) physics_enabled: bool,
    deferred_overlaps: Vec<DeferredOverlap>,
    now: f64,
}

impl TreeState {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            store: GraphStore::new(),
            session: Session::default(),
            tweener: Tweener::new(config.animation_secs),
            simulation: Simulation::default(),
            highlighter: Highlighter::default(),
            hover: HoverDebounce::default(),
            loading: HashSet::new(),
            busy: 0,
            physics_enabled: true,
            deferred_overlaps: Vec::new(),
            now: 0.0,
            config,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Live tuning of the base simulator.
    pub fn physics_mut(&mut self) -> &mut PhysicsConfig {
        &mut self.config.physics
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// A non-silent expansion is running.
    pub fn is_busy(&self) -> bool {
        self.busy > 0
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.loading.contains(id)
    }

    pub fn loading_count(&self) -> usize {
        self.loading.len()
    }

    pub fn selected(&self) -> Option<&str> {
        self.highlighter.selection()
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.highlighter.focus()
    }

    pub fn physics_enabled(&self) -> bool {
        self.physics_enabled
    }

    pub fn set_physics_enabled(&mut self, enabled: bool) {
        self.physics_enabled = enabled;
    }

    /// Animations or deferred overlap passes are still pending.
    pub fn is_animating(&self) -> bool {
        self.tweener.is_active() || !self.deferred_overlaps.is_empty()
    }

    /// Frame clock: releases expired anchor locks, ticks animations, runs due overlap passes
    /// and applies a settled hover.
    pub fn advance(&mut self, now: f64) {
        self.now = now;

        for node in self.store.nodes_mut() {
            if node.locked_until.is_some_and(|until| now >= until) {
                node.locked_until = None;
            }
        }

        if self.tweener.tick(&mut self.store, now) {
            recenter_unions(&mut self.store, self.config.union_offset_y);
        }

        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.deferred_overlaps)
            .into_iter()
            .partition(|pass| pass.due <= now);
        self.deferred_overlaps = waiting;
        for pass in due {
            self.resolve_overlap(pass.level);
        }

        if let Some(id) = self.hover.poll(now)
            && self.store.node(&id).is_some_and(GraphNode::is_person)
        {
            self.highlighter.show(&mut self.store, &id);
        }
    }

    /// Base physics (when enabled), then the constraint list, then trigger placement.
    pub fn step_physics(&mut self) {
        if self.physics_enabled {
            physics::step(&mut self.store, &self.config);
            self.simulation.apply(&mut self.store, &self.config);
        }
        self.place_triggers();
    }

    pub(crate) fn reset(&mut self) {
        self.store.clear();
        self.session.clear();
        self.tweener.clear();
        self.highlighter.forget();
        self.hover.cancel();
        self.loading.clear();
        self.busy = 0;
        self.deferred_overlaps.clear();
        debug!("tree state reset");
    }

    /// Fixes the node in place until the anchor lock expires.
    pub(crate) fn lock(&mut self, id: &str) {
        let until = self.now + self.config.anchor_lock_secs;
        if let Some(node) = self.store.node_mut(id) {
            node.locked_until = Some(until);
        }
    }

    pub(crate) fn animate(&mut self, targets: Vec<TweenTarget>) -> bool {
        self.tweener.animate(&self.store, targets, self.now)
    }

    pub(crate) fn defer_overlap(&mut self, level: f32) {
        self.deferred_overlaps.push(DeferredOverlap {
            due: self.now + self.config.overlap_delay_secs,
            level,
        });
    }

    /// Adds a not-yet-grown person node at `origin`. Returns `false` when it already exists.
    pub(crate) fn spawn_person(&mut self, relative: &Relative, origin: Vec2) -> bool {
        let person = Person {
            label: wordwrap(&relative.label, self.config.label_wrap),
            gender: relative.gender,
            life_span: relative.life_span.clone(),
            resolved: true,
        };
        self.store
            .add_node(GraphNode::person(relative.id.clone(), person, origin, 0.0))
    }

    pub(crate) fn remove_node(&mut self, id: &str) -> bool {
        self.session.untrack_trigger(id);
        self.store.remove_node(id).is_some()
    }

    /// Removes a node together with the three trigger ids it may own.
    pub(crate) fn remove_with_triggers(&mut self, id: &str) -> bool {
        for kind in TriggerKind::ALL {
            self.remove_node(&trigger_id(kind, id));
        }
        self.remove_node(id)
    }

    /// Re-derives triggers and re-applies the highlight after a structural change.
    pub(crate) fn settle(&mut self) {
        self.sync_all_triggers();
        self.highlighter.refresh(&mut self.store);
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::family::Gender;

    fn relative(id: &str) -> Relative {
        Relative {
            id: id.to_owned(),
            label: format!("{id} of a very long house"),
            gender: Gender::Male,
            life_span: Some("1900-1950".into()),
        }
    }

    #[test]
    fn anchor_lock_is_released_by_the_clock() {
        let mut state = TreeState::new(LayoutConfig::default());
        state.advance(5.0);
        state.spawn_person(&relative("a"), Vec2::ZERO);
        state.lock("a");

        state.advance(6.9);
        assert!(state.store.node("a").is_some_and(GraphNode::is_fixed));
        state.advance(7.0);
        assert!(!state.store.node("a").is_some_and(GraphNode::is_fixed));
    }

    #[test]
    fn spawned_people_start_small_with_wrapped_labels() {
        let mut state = TreeState::new(LayoutConfig::default());
        assert!(state.spawn_person(&relative("a"), vec2(3.0, 4.0)));
        assert!(!state.spawn_person(&relative("a"), Vec2::ZERO));

        let node = state.store.node("a").expect("spawned");
        assert_eq!(node.font_size, 0.0);
        assert_eq!(node.pos, vec2(3.0, 4.0));
        assert_eq!(node.label(), "a of a very\nlong house");
    }

    #[test]
    fn deferred_overlap_runs_once_due() {
        let mut state = TreeState::new(LayoutConfig::default());
        state.spawn_person(&relative("a"), vec2(0.0, 0.0));
        state.spawn_person(&relative("b"), vec2(10.0, 0.0));

        state.schedule_overlap(0.0, true);
        state.advance(0.5);
        assert_eq!(state.store.position("b"), Some(vec2(10.0, 0.0)));
        assert!(state.is_animating());

        state.advance(0.65);
        state.advance(2.0);
        assert_eq!(state.store.position("b"), Some(vec2(180.0, 0.0)));
        assert!(!state.is_animating());
    }
}
