use eframe::egui::{Vec2, vec2};

use super::config::{LayoutConfig, PhysicsConfig};
use super::store::GraphStore;
use crate::util::stable_pair;

/// Base force step: softened pairwise repulsion, collision push and damped springs along
/// structural edges. Trigger nodes take no part; fixed nodes push but do not move.
pub fn step(store: &mut GraphStore, layout: &LayoutConfig) {
    let config: PhysicsConfig = layout.physics;
    let simulated = store
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| !node.is_trigger())
        .map(|(index, _)| index)
        .collect::<Vec<_>>();
    if simulated.len() < 2 {
        return;
    }

    let node_count = store.len();
    let mut forces = vec![Vec2::ZERO; node_count];
    let intensity = config.intensity.clamp(0.2, 2.5);
    let repulsion_strength = 78_000.0 * intensity * config.repulsion_scale.clamp(0.25, 2.6);
    let spring_strength = 0.016 * intensity * config.spring_scale.clamp(0.2, 2.2);
    let spring_damping = 0.22;
    let collision_strength = 1.9 * intensity * config.collision_scale.clamp(0.2, 2.0);
    let damping = (config.velocity_damping - (intensity * 0.015)).clamp(0.78, 0.97);
    let softening = 620.0;

    let nodes = store.nodes();
    let radius = |index: usize| {
        nodes[index].width(layout.person_width, layout.compact_width) / 2.0
    };

    for (slot, &i) in simulated.iter().enumerate() {
        for &j in &simulated[(slot + 1)..] {
            let delta = nodes[i].pos - nodes[j].pos;
            let distance_sq = delta.length_sq();
            let distance = distance_sq.sqrt();
            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                separation(&nodes[i].id, &nodes[j].id)
            };

            let min_distance = radius(i) + radius(j);
            let repulsion = repulsion_strength / (distance_sq + softening);

            forces[i] += direction * repulsion;
            forces[j] -= direction * repulsion;

            if distance < min_distance {
                let overlap_push = (min_distance - distance) * collision_strength;
                forces[i] += direction * overlap_push;
                forces[j] -= direction * overlap_push;
            }
        }
    }

    for edge in store.edges() {
        let Some(preferred) = edge.kind.rest_length() else {
            continue;
        };
        let (Some(from), Some(to)) = (store.index_of(&edge.from), store.index_of(&edge.to)) else {
            continue;
        };
        if nodes[from].is_trigger() || nodes[to].is_trigger() {
            continue;
        }

        let delta = nodes[from].pos - nodes[to].pos;
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }
        let direction = delta / distance;

        let spring = (distance - preferred) * spring_strength;
        let relative_velocity = nodes[from].velocity - nodes[to].velocity;
        let damping_force = relative_velocity.dot(direction) * spring_damping;
        let correction = direction * (spring + damping_force);

        forces[from] -= correction;
        forces[to] += correction;
    }

    let max_force = 165.0 + (intensity * 90.0);
    let max_speed = 11.0 + (intensity * 15.0);
    let nodes = store.nodes_mut();
    for index in simulated {
        let node = &mut nodes[index];
        if node.is_fixed() {
            node.velocity = Vec2::ZERO;
            continue;
        }

        let mut force = forces[index];
        let mut force_magnitude = force.length();
        if force_magnitude > max_force {
            force = force / force_magnitude * max_force;
            force_magnitude = max_force;
        }

        let mut velocity = (node.velocity + (force * 0.055)) * damping;
        let mut speed = velocity.length();
        if speed > max_speed {
            velocity = velocity / speed * max_speed;
            speed = max_speed;
        }

        if speed < 0.02 && force_magnitude < 0.08 {
            velocity = Vec2::ZERO;
        }

        node.velocity = velocity;
        node.pos += velocity;
    }
}

/// Deterministic push-apart direction for two nodes sitting on the same spot.
fn separation(a: &str, b: &str) -> Vec2 {
    let (ax, ay) = stable_pair(a);
    let (bx, by) = stable_pair(b);
    let direction = vec2(ax - bx, ay - by);
    if direction.length_sq() > 0.0001 {
        direction.normalized()
    } else {
        vec2(1.0, 0.0)
    }
}
