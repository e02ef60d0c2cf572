#![forbid(unsafe_code)]

//! Frame-driven tweening primitives.
//!
//! Animations advance only when the host calls [`Animation::tick`] with the
//! time elapsed since the previous frame. Nothing here reads a wall clock,
//! so runs are deterministic and tests can step time explicitly.
//!
//! # Invariants
//!
//! 1. `Tween::value()` is exactly `from` before the first tick and exactly
//!    `to` once complete.
//! 2. Progress is monotonic in elapsed time and clamped to `[0.0, 1.0]`.
//! 3. A zero duration is clamped to 1ns, so the first tick completes it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Maps linear progress `t ∈ [0, 1]` to eased progress.
pub type EasingFn = fn(f64) -> f64;

#[must_use]
pub fn linear(t: f64) -> f64 {
    t
}

/// Cubic ease-in-out, the default for box transitions.
#[must_use]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = 2.0 * t - 2.0;
        0.5 * u * u * u + 1.0
    }
}

/// Named easing, for configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    #[default]
    CubicInOut,
}

impl Easing {
    #[must_use]
    pub fn function(self) -> EasingFn {
        match self {
            Self::Linear => linear,
            Self::CubicInOut => ease_in_out_cubic,
        }
    }
}

/// Something that progresses over frames.
pub trait Animation {
    /// Advance by `dt`.
    fn tick(&mut self, dt: Duration);
    fn is_complete(&self) -> bool;
    /// Current output value.
    fn value(&self) -> f64;
    /// Rewind to the start.
    fn reset(&mut self);
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

/// Interpolates a number from `from` to `to` over a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    from: f64,
    to: f64,
    duration: Duration,
    elapsed: Duration,
    easing: EasingFn,
}

impl Tween {
    #[must_use]
    pub fn new(from: f64, to: f64, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            elapsed: Duration::ZERO,
            easing: ease_in_out_cubic,
        }
    }

    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    #[must_use]
    pub const fn from(&self) -> f64 {
        self.from
    }

    #[must_use]
    pub const fn to(&self) -> f64 {
        self.to
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Linear progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        (self.elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

impl Animation for Tween {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt).min(self.duration);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f64 {
        if self.is_complete() {
            return self.to;
        }
        let t = (self.easing)(self.progress());
        self.from + (self.to - self.from) * t
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}

// ---------------------------------------------------------------------------
// FrameClock
// ---------------------------------------------------------------------------

/// Monotonic clock advanced by the host, one frame at a time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    now: Duration,
    frames: u64,
}

impl FrameClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            frames: 0,
        }
    }

    /// Advance by `dt` and count a frame.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
        self.frames += 1;
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_100: Duration = Duration::from_millis(100);

    #[test]
    fn tween_hits_endpoints_exactly() {
        let mut tween = Tween::new(13.7, 41.3, MS_100);
        assert_eq!(tween.value(), 13.7);
        for _ in 0..7 {
            tween.tick(Duration::from_millis(16));
        }
        assert!(tween.is_complete());
        assert_eq!(tween.value(), 41.3);
    }

    #[test]
    fn tween_overshooting_tick_completes() {
        let mut tween = Tween::new(0.0, 1.0, MS_100);
        tween.tick(Duration::from_secs(5));
        assert!(tween.is_complete());
        assert_eq!(tween.progress(), 1.0);
    }

    #[test]
    fn zero_duration_completes_on_first_tick() {
        let mut tween = Tween::new(0.0, 10.0, Duration::ZERO);
        assert!(!tween.is_complete());
        tween.tick(Duration::from_nanos(1));
        assert!(tween.is_complete());
    }

    #[test]
    fn linear_midpoint() {
        let mut tween = Tween::new(0.0, 10.0, MS_100).easing(linear);
        tween.tick(Duration::from_millis(50));
        assert!((tween.value() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn reset_rewinds() {
        let mut tween = Tween::new(2.0, 4.0, MS_100);
        tween.tick(MS_100);
        tween.reset();
        assert_eq!(tween.value(), 2.0);
    }

    #[test]
    fn easings_are_monotonic_and_pinned() {
        for easing in [linear, ease_in_out_cubic] {
            assert_eq!(easing(0.0), 0.0);
            assert!((easing(1.0) - 1.0).abs() < 1e-12);
            let mut prev = 0.0;
            for i in 0..=100 {
                let v = easing(f64::from(i) / 100.0);
                assert!(v >= prev - 1e-12);
                prev = v;
            }
        }
    }

    #[test]
    fn clock_counts_frames() {
        let mut clock = FrameClock::new();
        clock.advance(Duration::from_millis(16));
        clock.advance(Duration::from_millis(17));
        assert_eq!(clock.now(), Duration::from_millis(33));
        assert_eq!(clock.frames(), 2);
    }
}
