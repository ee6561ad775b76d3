//! Touch gesture tracking
//!
//! Turns raw down/move/up events into drag deltas, a release velocity and
//! tap detection.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples older than this (relative to the newest) are ignored
const VELOCITY_WINDOW: Duration = Duration::from_millis(100);

/// Maximum number of retained samples
const MAX_SAMPLES: usize = 20;

/// Least-squares velocity estimate over recent touch samples
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    samples: VecDeque<(Instant, f32)>,
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, y: f32, at: Instant) {
        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back((at, y));
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Finger velocity in pixels per second (positive = moving down)
    pub fn velocity(&self) -> f32 {
        let Some(&(newest, _)) = self.samples.back() else {
            return 0.0;
        };
        let recent: Vec<(f32, f32)> = self
            .samples
            .iter()
            .filter(|(at, _)| newest.saturating_duration_since(*at) <= VELOCITY_WINDOW)
            .map(|(at, y)| (-newest.saturating_duration_since(*at).as_secs_f32(), *y))
            .collect();
        if recent.len() < 2 {
            return 0.0;
        }

        let n = recent.len() as f32;
        let mean_t = recent.iter().map(|(t, _)| t).sum::<f32>() / n;
        let mean_y = recent.iter().map(|(_, y)| y).sum::<f32>() / n;
        let (cov, var) = recent.iter().fold((0.0f32, 0.0f32), |(cov, var), (t, y)| {
            let dt = t - mean_t;
            (cov + dt * (y - mean_y), var + dt * dt)
        });
        if var <= f32::EPSILON { 0.0 } else { cov / var }
    }
}

/// How a gesture ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchRelease {
    /// Short press without travel
    Tap { y: f32 },
    /// Drag released with a finger velocity in pixels per second
    ///
    /// `delta` is the movement between the last move event and lift-off.
    Drag { delta: f32, velocity: f32 },
}

/// State of one touch from down to up
#[derive(Debug, Clone)]
pub struct TouchGesture {
    down_y: f32,
    down_at: Instant,
    last_y: f32,
    max_travel: f32,
    tracker: VelocityTracker,
}

impl TouchGesture {
    pub fn begin(y: f32, now: Instant) -> Self {
        let mut tracker = VelocityTracker::new();
        tracker.add(y, now);
        Self {
            down_y: y,
            down_at: now,
            last_y: y,
            max_travel: 0.0,
            tracker,
        }
    }

    /// Record a move and return the finger delta since the previous event
    pub fn move_to(&mut self, y: f32, now: Instant) -> f32 {
        let delta = y - self.last_y;
        self.last_y = y;
        self.max_travel = self.max_travel.max((y - self.down_y).abs());
        self.tracker.add(y, now);
        delta
    }

    /// Classify the gesture on release
    pub fn release(mut self, y: f32, now: Instant, touch_slop: f32, tap_timeout: Duration) -> TouchRelease {
        let delta = self.move_to(y, now);
        let held = now.saturating_duration_since(self.down_at);
        if self.max_travel <= touch_slop && held <= tap_timeout {
            TouchRelease::Tap { y }
        } else {
            TouchRelease::Drag {
                delta,
                velocity: self.tracker.velocity(),
            }
        }
    }
}
