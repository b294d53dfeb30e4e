use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Base simulator tuning. Scales multiply the built-in constants of the physics step.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub intensity: f32,
    pub repulsion_scale: f32,
    pub spring_scale: f32,
    pub collision_scale: f32,
    pub velocity_damping: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            repulsion_scale: 1.0,
            spring_scale: 1.0,
            collision_scale: 1.0,
            velocity_damping: 0.9,
        }
    }
}

/// Every placement, force, overlap and timing constant of the tree engine.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub parent_offset_y: f32,
    pub parent_spread_x: f32,
    pub level_padding: f32,
    pub union_spawn_offset_y: f32,
    pub relative_spacing_x: f32,
    pub child_offset_y: f32,
    pub child_spacing_x: f32,

    pub union_offset_y: f32,
    pub union_cohesion_distance: f32,
    pub union_cohesion_margin: f32,
    pub level_height: f32,
    pub max_gap_step: f32,
    pub sibling_leash_radius: f32,
    pub sibling_leash_strength: f32,
    pub drift_damping: f32,
    pub edge_base_length: f32,
    pub edge_length_per_degree: f32,

    pub level_tolerance: f32,
    pub min_node_gap: f32,
    pub person_width: f32,
    pub compact_width: f32,

    pub animation_secs: f64,
    pub overlap_delay_secs: f64,
    pub anchor_lock_secs: f64,
    pub hover_delay_secs: f64,

    pub label_font_size: f32,
    pub label_wrap: usize,

    pub physics: PhysicsConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            parent_offset_y: 200.0,
            parent_spread_x: 80.0,
            level_padding: 50.0,
            union_spawn_offset_y: 100.0,
            relative_spacing_x: 160.0,
            child_offset_y: 150.0,
            child_spacing_x: 160.0,

            union_offset_y: 160.0,
            union_cohesion_distance: 120.0,
            union_cohesion_margin: 50.0,
            level_height: 280.0,
            max_gap_step: 10.0,
            sibling_leash_radius: 600.0,
            sibling_leash_strength: 0.05,
            drift_damping: 0.05,
            edge_base_length: 200.0,
            edge_length_per_degree: 25.0,

            level_tolerance: 20.0,
            min_node_gap: 20.0,
            person_width: 160.0,
            compact_width: 30.0,

            animation_secs: 0.6,
            overlap_delay_secs: 0.65,
            anchor_lock_secs: 2.0,
            hover_delay_secs: 0.1,

            label_font_size: 14.0,
            label_wrap: 15,

            physics: PhysicsConfig::default(),
        }
    }
}

impl LayoutConfig {
    /// Reads a JSON layout file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read layout config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse layout config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{"level_height": 320.0, "physics": {"intensity": 1.5}}"#)
                .expect("valid layout config");

        assert_eq!(config.level_height, 320.0);
        assert_eq!(config.physics.intensity, 1.5);
        assert_eq!(config.physics.velocity_damping, 0.9);
        assert_eq!(config.sibling_leash_radius, 600.0);
    }
}
