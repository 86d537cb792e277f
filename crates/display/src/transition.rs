//! Transition state machine.
//!
//! The machine is either `Idle`, showing its current content, or
//! `Transitioning` towards a next piece of content. Time is always passed in
//! explicitly so the renderer and the tests drive it the same way.

use std::time::{Duration, Instant};

/// Smoothstep easing, `t²(3 - 2t)` over `t` clamped to `[0, 1]`.
pub fn ease(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[derive(Debug, Clone)]
enum Phase<T> {
    Idle,
    Transitioning { next: T, started: Instant },
}

/// What to draw for one frame.
#[derive(Debug, PartialEq)]
pub enum Frame<'a, T> {
    Still(&'a T),
    Blend { from: &'a T, to: &'a T, progress: f64 },
}

/// Current content plus an optional transition in flight.
#[derive(Debug, Clone)]
pub struct Transitions<T> {
    current: T,
    phase: Phase<T>,
    queued: Option<T>,
    duration: Duration,
}

impl<T> Transitions<T> {
    pub fn new(current: T, duration: Duration) -> Self {
        Self { current, phase: Phase::Idle, queued: None, duration }
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    pub fn has_queued(&self) -> bool {
        self.queued.is_some()
    }

    /// Start moving to `next`, or queue it if a transition is running.
    ///
    /// Only the latest queued content is kept.
    pub fn offer(&mut self, next: T, now: Instant) {
        match self.phase {
            Phase::Idle => self.phase = Phase::Transitioning { next, started: now },
            Phase::Transitioning { .. } => self.queued = Some(next),
        }
    }

    /// Raw progress in `[0, 1]`, `None` when idle.
    pub fn progress(&self, now: Instant) -> Option<f64> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Transitioning { started, .. } => {
                if self.duration.is_zero() {
                    return Some(1.0);
                }
                let elapsed = now.saturating_duration_since(*started).as_secs_f64();
                Some((elapsed / self.duration.as_secs_f64()).clamp(0.0, 1.0))
            }
        }
    }

    /// Advance to `now` and return the frame to draw.
    ///
    /// Reaching progress 1 promotes the next content to current and returns
    /// to `Idle`; queued content then starts its own transition at `now`.
    pub fn tick(&mut self, now: Instant) -> Frame<'_, T> {
        let Some(progress) = self.progress(now) else {
            return Frame::Still(&self.current);
        };

        if progress >= 1.0 {
            if let Phase::Transitioning { next, .. } = std::mem::replace(&mut self.phase, Phase::Idle) {
                self.current = next;
            }
            if let Some(queued) = self.queued.take() {
                self.phase = Phase::Transitioning { next: queued, started: now };
            }
            return Frame::Still(&self.current);
        }

        match &self.phase {
            Phase::Transitioning { next, .. } => Frame::Blend { from: &self.current, to: next, progress: ease(progress) },
            Phase::Idle => Frame::Still(&self.current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_endpoints_and_midpoint() {
        assert_eq!(ease(0.0), 0.0);
        assert_eq!(ease(0.5), 0.5);
        assert_eq!(ease(1.0), 1.0);
        assert_eq!(ease(-1.0), 0.0);
        assert_eq!(ease(2.0), 1.0);
        assert!(ease(0.25) < 0.25);
        assert!(ease(0.75) > 0.75);
    }

    #[test]
    fn test_eased_progress_at_half_duration() {
        let start = Instant::now();
        let mut t = Transitions::new("old", Duration::from_secs(1));
        t.offer("new", start);

        match t.tick(start + Duration::from_millis(500)) {
            Frame::Blend { from, to, progress } => {
                assert_eq!(*from, "old");
                assert_eq!(*to, "new");
                assert_eq!(progress, 0.5);
            }
            other => panic!("expected blend, got {other:?}"),
        }
    }

    #[test]
    fn test_completes_to_idle_with_next_as_current() {
        let start = Instant::now();
        let mut t = Transitions::new("old", Duration::from_secs(1));
        t.offer("new", start);

        assert_eq!(t.tick(start + Duration::from_secs(1)), Frame::Still(&"new"));
        assert!(t.is_idle());
        assert_eq!(*t.current(), "new");

        assert_eq!(t.tick(start + Duration::from_secs(5)), Frame::Still(&"new"));
    }

    #[test]
    fn test_content_during_transition_is_queued() {
        let start = Instant::now();
        let mut t = Transitions::new("a", Duration::from_secs(1));
        t.offer("b", start);
        t.offer("c", start + Duration::from_millis(200));
        t.offer("d", start + Duration::from_millis(300));
        assert!(t.has_queued());

        let mid = start + Duration::from_millis(400);
        assert!(matches!(t.tick(mid), Frame::Blend { to: &"b", .. }));

        let done = start + Duration::from_secs(1);
        assert_eq!(t.tick(done), Frame::Still(&"b"));
        assert!(!t.is_idle());
        assert!(!t.has_queued());

        assert_eq!(t.tick(done + Duration::from_secs(1)), Frame::Still(&"d"));
        assert!(t.is_idle());
    }

    #[test]
    fn test_idle_progress_is_none() {
        let t = Transitions::new(0u8, Duration::from_secs(1));
        assert_eq!(t.progress(Instant::now()), None);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let now = Instant::now();
        let mut t = Transitions::new(1, Duration::ZERO);
        t.offer(2, now);
        assert_eq!(t.tick(now), Frame::Still(&2));
    }
}
