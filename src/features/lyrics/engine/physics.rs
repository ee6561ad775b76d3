//! Physics simulation for lyrics scrolling
//!
//! Implements:
//! - Exponential follow of the playback focus target
//! - Direct drag with clamping to the content bounds
//! - Fling with frame-rate independent friction
//! - A cooldown before control returns to auto-follow

use std::time::{Duration, Instant};

use super::LyricsEngineConfig;
use crate::utils::frame_rate_independent;

/// Scroll state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Following playback
    AutoFollow,
    /// Finger down, deltas move the content directly
    UserDragging,
    /// Decelerating after a fast release
    Flinging,
    /// Holding still until the resume deadline passes
    CooldownPendingAutoFollow,
}

/// Physics simulation for scrolling
///
/// `scroll_y` is the content-space y of the viewport top.
#[derive(Debug)]
pub struct ScrollPhysics {
    /// Current scroll position in pixels
    scroll_y: f32,
    /// Current scroll velocity in pixels per second
    velocity: f32,
    min_scroll: f32,
    max_scroll: f32,

    /// State machine
    mode: ScrollMode,
    /// When a pending return to auto-follow fires
    resume_at: Option<Instant>,

    /// Physics parameters
    damping: f32,
    snap_epsilon: f32,
    friction: f32,
    min_fling_velocity: f32,
    max_fling_velocity: f32,
    fling_stop_velocity: f32,
    resume_delay: Duration,
}

impl ScrollPhysics {
    /// Create new scroll physics
    pub fn new(config: &LyricsEngineConfig) -> Self {
        let mut physics = Self {
            scroll_y: 0.0,
            velocity: 0.0,
            min_scroll: 0.0,
            max_scroll: 0.0,
            mode: ScrollMode::AutoFollow,
            resume_at: None,
            damping: 0.0,
            snap_epsilon: 0.0,
            friction: 0.0,
            min_fling_velocity: 0.0,
            max_fling_velocity: 0.0,
            fling_stop_velocity: 0.0,
            resume_delay: Duration::ZERO,
        };
        physics.apply_config(config);
        physics
    }

    pub fn apply_config(&mut self, config: &LyricsEngineConfig) {
        self.damping = config.scroll_damping;
        self.snap_epsilon = config.snap_epsilon;
        self.friction = config.fling_friction;
        self.min_fling_velocity = config.min_fling_velocity;
        self.max_fling_velocity = config.max_fling_velocity;
        self.fling_stop_velocity = config.fling_stop_velocity;
        self.resume_delay = Duration::from_millis(config.resume_delay_ms);
    }

    /// Update physics simulation
    ///
    /// `dt` is the time since the last update in seconds. `follow_target`
    /// is the desired scroll position while auto-following. Returns whether
    /// the position is still moving.
    pub fn update(&mut self, dt: f32, now: Instant, follow_target: Option<f32>) -> bool {
        match self.mode {
            ScrollMode::UserDragging => false,
            ScrollMode::Flinging => {
                self.step_fling(dt, now);
                true
            }
            ScrollMode::CooldownPendingAutoFollow => {
                if self.resume_at.is_some_and(|deadline| now >= deadline) {
                    tracing::trace!("Scroll cooldown elapsed, resuming auto-follow");
                    self.resume_at = None;
                    self.mode = ScrollMode::AutoFollow;
                    self.step_follow(dt, follow_target)
                } else {
                    false
                }
            }
            ScrollMode::AutoFollow => self.step_follow(dt, follow_target),
        }
    }

    fn step_follow(&mut self, dt: f32, follow_target: Option<f32>) -> bool {
        let Some(target) = follow_target else {
            return false;
        };
        let target = self.clamp(target);
        let diff = target - self.scroll_y;
        if diff.abs() > self.snap_epsilon {
            self.scroll_y += diff * frame_rate_independent(self.damping, dt);
            true
        } else {
            self.scroll_y = target;
            false
        }
    }

    fn step_fling(&mut self, dt: f32, now: Instant) {
        self.scroll_y += self.velocity * dt;
        // the friction: v = v * friction^(dt * 60)
        self.velocity *= self.friction.powf(dt * 60.0);

        let clamped = self.clamp(self.scroll_y);
        let hit_bound = clamped != self.scroll_y;
        self.scroll_y = clamped;

        if hit_bound || self.velocity.abs() < self.fling_stop_velocity {
            self.velocity = 0.0;
            self.arm_cooldown(now);
        }
    }

    fn arm_cooldown(&mut self, now: Instant) {
        self.mode = ScrollMode::CooldownPendingAutoFollow;
        self.resume_at = Some(now + self.resume_delay);
    }

    fn clamp(&self, y: f32) -> f32 {
        y.clamp(self.min_scroll, self.max_scroll.max(self.min_scroll))
    }

    /// Finger down: stop any fling and cancel a pending resume
    pub fn touch_down(&mut self) {
        self.mode = ScrollMode::UserDragging;
        self.velocity = 0.0;
        self.resume_at = None;
    }

    /// Apply a finger delta while dragging
    pub fn drag_by(&mut self, finger_delta: f32) {
        if self.mode == ScrollMode::UserDragging {
            self.scroll_y = self.clamp(self.scroll_y - finger_delta);
        }
    }

    /// Finger up after a drag with the given finger velocity
    pub fn release(&mut self, finger_velocity: f32, now: Instant) {
        let velocity = -finger_velocity;
        if velocity.abs() > self.min_fling_velocity {
            self.velocity = velocity.clamp(-self.max_fling_velocity, self.max_fling_velocity);
            self.mode = ScrollMode::Flinging;
            tracing::trace!("Fling started at {:.0} px/s", self.velocity);
        } else {
            self.velocity = 0.0;
            self.arm_cooldown(now);
        }
    }

    /// Tap: intentional seek, return to auto-follow without delay
    pub fn tap(&mut self) {
        self.velocity = 0.0;
        self.resume_at = None;
        self.mode = ScrollMode::AutoFollow;
    }

    /// Set scroll limits; the position is clamped into them
    pub fn set_bounds(&mut self, min_scroll: f32, max_scroll: f32) {
        self.min_scroll = min_scroll;
        self.max_scroll = max_scroll;
        self.scroll_y = self.clamp(self.scroll_y);
    }

    pub fn bounds(&self) -> (f32, f32) {
        (self.min_scroll, self.max_scroll)
    }

    /// Jump to a position and drop any user interaction
    pub fn reset(&mut self, position: f32) {
        self.mode = ScrollMode::AutoFollow;
        self.velocity = 0.0;
        self.resume_at = None;
        self.scroll_y = self.clamp(position);
    }

    /// Get current scroll position
    pub fn position(&self) -> f32 {
        self.scroll_y
    }

    /// Get current velocity
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Get current state
    pub fn mode(&self) -> ScrollMode {
        self.mode
    }

    /// Pending resume deadline, if any
    pub fn resume_at(&self) -> Option<Instant> {
        self.resume_at
    }
}

impl Default for ScrollPhysics {
    fn default() -> Self {
        Self::new(&LyricsEngineConfig::default())
    }
}
