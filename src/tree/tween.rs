use eframe::egui::Vec2;

use super::store::GraphStore;

pub fn ease_out_cubic(progress: f64) -> f64 {
    let progress = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - progress).powi(3)
}

#[derive(Clone, Debug, PartialEq)]
pub struct TweenTarget {
    pub id: String,
    pub pos: Vec2,
    pub font_size: Option<f32>,
}

impl TweenTarget {
    pub fn to(id: impl Into<String>, pos: Vec2) -> Self {
        Self {
            id: id.into(),
            pos,
            font_size: None,
        }
    }

    pub fn growing(id: impl Into<String>, pos: Vec2, font_size: f32) -> Self {
        Self {
            id: id.into(),
            pos,
            font_size: Some(font_size),
        }
    }
}

#[derive(Debug)]
struct Track {
    id: String,
    from: Vec2,
    to: Vec2,
    font: Option<(f32, f32)>,
}

#[derive(Debug)]
struct Animation {
    started: f64,
    tracks: Vec<Track>,
}

/// Eases batches of nodes from where they are to their targets.
#[derive(Debug)]
pub struct Tweener {
    duration: f64,
    animations: Vec<Animation>,
}

impl Tweener {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(f64::EPSILON),
            animations: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.animations.is_empty()
    }

    pub fn clear(&mut self) {
        self.animations.clear();
    }

    /// Captures each target's current position and font size as the start values. Targets
    /// for nodes that do not exist are skipped.
    pub fn animate(&mut self, store: &GraphStore, targets: Vec<TweenTarget>, now: f64) -> bool {
        let tracks = targets
            .into_iter()
            .filter_map(|target| {
                let node = store.node(&target.id)?;
                Some(Track {
                    from: node.pos,
                    to: target.pos,
                    font: target.font_size.map(|size| (node.font_size, size)),
                    id: target.id,
                })
            })
            .collect::<Vec<_>>();

        if tracks.is_empty() {
            return false;
        }
        self.animations.push(Animation {
            started: now,
            tracks,
        });
        true
    }

    /// Applies one frame. Returns `true` when any node moved.
    pub fn tick(&mut self, store: &mut GraphStore, now: f64) -> bool {
        let mut applied = false;

        for animation in &self.animations {
            let progress = (now - animation.started) / self.duration;
            let ease = ease_out_cubic(progress) as f32;

            for track in &animation.tracks {
                let Some(node) = store.node_mut(&track.id) else {
                    continue;
                };
                node.pos = track.from + (track.to - track.from) * ease;
                if let Some((from, to)) = track.font {
                    node.font_size = from + (to - from) * ease;
                }
                applied = true;
            }
        }

        let duration = self.duration;
        self.animations
            .retain(|animation| now - animation.started < duration);
        applied
    }
}
