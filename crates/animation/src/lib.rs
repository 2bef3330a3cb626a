use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

// CONFIG

// -- Animation Definition Configuration --
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationIndices {
    pub start: usize,
    pub end: usize, // Inclusive end index
}

impl AnimationIndices {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of frames in the clip, never zero.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) + 1
    }

    /// Sprite index of `frame` inside this clip, clamped to the last frame.
    pub fn sprite_index(&self, frame: usize) -> usize {
        self.start + frame.min(self.len() - 1)
    }
}

/// Frame table of one sprite sheet. `frame_duration` is counted in simulation ticks.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AnimationMapConfig {
    pub frame_duration: u32,
    pub animations: BTreeMap<String, AnimationIndices>,
}

impl Default for AnimationMapConfig {
    fn default() -> Self {
        Self {
            frame_duration: 6,
            animations: BTreeMap::new(),
        }
    }
}

impl AnimationMapConfig {
    /// Build a table where clips are laid out one after the other on the sheet.
    pub fn sequential(frame_duration: u32, clips: &[(&str, usize)]) -> Self {
        let mut animations = BTreeMap::new();
        let mut start = 0;
        for (name, frames) in clips {
            let frames = (*frames).max(1);
            animations.insert(
                (*name).to_string(),
                AnimationIndices::new(start, start + frames - 1),
            );
            start += frames;
        }
        Self {
            frame_duration,
            animations,
        }
    }

    pub fn clip(&self, action: &str) -> Option<&AnimationIndices> {
        self.animations.get(action)
    }

    pub fn clip_len_or(&self, action: &str, fallback: usize) -> usize {
        self.clip(action).map_or(fallback.max(1), AnimationIndices::len)
    }
}

// COMPONENT

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    #[default]
    Loop,
    /// Hold the last frame once reached.
    Once,
}

/// Result of advancing an [`AnimationState`] by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTick {
    /// Same frame as before.
    Held,
    /// Moved to the next frame.
    Advanced,
    /// Wrapped back to frame 0.
    Looped,
    /// A one-shot clip has played its last frame.
    Finished,
}

/// Animation cursor of one character: current action key, frame in the clip and
/// ticks spent on that frame.
#[derive(Component, Default, Clone, Debug, PartialEq, Eq)]
pub struct AnimationState {
    pub action: String,
    pub frame: usize,
    pub frame_timer: u32,
}

impl AnimationState {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            frame: 0,
            frame_timer: 0,
        }
    }

    /// Switch action. A different action restarts at frame 0 so a stale index from
    /// a longer clip is never reused. Returns whether the action changed.
    pub fn set_action(&mut self, action: &str) -> bool {
        if self.action == action {
            return false;
        }
        self.action.clear();
        self.action.push_str(action);
        self.restart();
        true
    }

    pub fn restart(&mut self) {
        self.frame = 0;
        self.frame_timer = 0;
    }

    pub fn advance(&mut self, clip_len: usize, frame_duration: u32, mode: PlayMode) -> AnimationTick {
        let clip_len = clip_len.max(1);
        let frame_duration = frame_duration.max(1);

        if mode == PlayMode::Once && self.frame + 1 >= clip_len && self.frame_timer >= frame_duration {
            return AnimationTick::Finished;
        }

        self.frame_timer += 1;
        if self.frame_timer < frame_duration {
            return AnimationTick::Held;
        }

        if self.frame + 1 < clip_len {
            self.frame += 1;
            self.frame_timer = 0;
            return AnimationTick::Advanced;
        }

        match mode {
            PlayMode::Loop => {
                self.frame = 0;
                self.frame_timer = 0;
                AnimationTick::Looped
            }
            PlayMode::Once => {
                self.frame = clip_len - 1;
                AnimationTick::Finished
            }
        }
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingDirection {
    #[default]
    Right,
    Left,
}

impl FacingDirection {
    /// Facing from the horizontal sign of a movement. No horizontal movement keeps `current`.
    pub fn from_horizontal(dx: f32, current: Self) -> Self {
        if dx > 0.0 {
            FacingDirection::Right
        } else if dx < 0.0 {
            FacingDirection::Left
        } else {
            current
        }
    }

    /// Check if sprite should be flipped horizontally
    pub fn should_flip_x(&self) -> bool {
        matches!(self, FacingDirection::Left)
    }
}
