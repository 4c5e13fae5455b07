//! Capture triggering: a repeating timer and an edge-triggered manual request.

use bevy::prelude::*;

/// Decides, once per step, whether a capture runs.
///
/// Timer mode accumulates elapsed time while enabled and fires each time the accumulator
/// reaches `delay_secs`, carrying the remainder. A manual request is consumed by the next
/// step. Both firing in the same step yield a single capture.
#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct CaptureTrigger {
    /// Capture repeatedly every `delay_secs`
    pub timer_enabled: bool,
    /// Seconds between timed captures; non-positive fires every step
    pub delay_secs:    f32,
    elapsed_secs:      f32,
    manual_pending:    bool,
}

impl Default for CaptureTrigger {
    fn default() -> Self {
        Self {
            timer_enabled:  false,
            delay_secs:     0.5,
            elapsed_secs:   0.0,
            manual_pending: false,
        }
    }
}

impl CaptureTrigger {
    pub fn with_timer(delay_secs: f32) -> Self {
        Self {
            timer_enabled: true,
            delay_secs,
            ..default()
        }
    }

    /// Arms a manual capture for the next step.
    pub const fn request(&mut self) { self.manual_pending = true; }

    pub const fn is_requested(&self) -> bool { self.manual_pending }

    /// Time accumulated toward the next timed capture
    pub const fn elapsed_secs(&self) -> f32 { self.elapsed_secs }

    /// Advances the trigger by `delta_secs`; returns true when a capture should run.
    pub fn step(&mut self, delta_secs: f32) -> bool {
        let timer_fired = self.advance_timer(delta_secs);
        let manual_fired = std::mem::take(&mut self.manual_pending);
        timer_fired || manual_fired
    }

    fn advance_timer(&mut self, delta_secs: f32) -> bool {
        if !self.timer_enabled {
            self.elapsed_secs = 0.0;
            return false;
        }

        self.elapsed_secs += delta_secs.max(0.0);
        if self.delay_secs <= 0.0 {
            self.elapsed_secs = 0.0;
            return true;
        }
        if self.elapsed_secs < self.delay_secs {
            return false;
        }

        // one capture per step; a backlog longer than one period is dropped
        self.elapsed_secs = (self.elapsed_secs - self.delay_secs) % self.delay_secs;
        true
    }
}
