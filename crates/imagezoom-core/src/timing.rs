//! Rate limiting for high-frequency window events.
//!
//! These types only keep bookkeeping; the caller schedules the actual work
//! through its [`Platform`] and reports back when a timer or frame fires.
//! That keeps the controller's state borrow released while callbacks run.

use crate::platform::{Callback, Platform, TimerId};

/// Trailing-edge debounce: work runs `wait_ms` after the last trigger.
#[derive(Debug)]
pub struct Debounce {
    wait_ms: u32,
    pending: Option<TimerId>,
}

impl Debounce {
    pub fn new(wait_ms: u32) -> Self {
        Self {
            wait_ms,
            pending: None,
        }
    }

    /// Restarts the wait and schedules `callback` at its end, dropping any
    /// previously scheduled callback. The callback should call
    /// [`Debounce::fired`] before doing its work.
    pub fn trigger<P: Platform>(&mut self, platform: &P, callback: Callback) {
        if let Some(timer) = self.pending.take() {
            platform.clear_timeout(timer);
        }
        self.pending = Some(platform.set_timeout(callback, self.wait_ms));
    }

    pub fn fired(&mut self) {
        self.pending = None;
    }

    pub fn cancel<P: Platform>(&mut self, platform: &P) {
        if let Some(timer) = self.pending.take() {
            platform.clear_timeout(timer);
        }
    }
}

/// What a [`Throttle`] wants done with an incoming trigger.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ThrottleDecision {
    /// Run the work now.
    Run,
    /// Schedule a trailing run after the given delay.
    Defer(u32),
    /// A trailing run is already scheduled.
    Skip,
}

/// Leading and trailing edge throttle: at most one run per `wait_ms`, and
/// the last trigger inside a window is never lost.
#[derive(Debug)]
pub struct Throttle {
    wait_ms: u32,
    last_run: Option<f64>,
    trailing: Option<TimerId>,
}

impl Throttle {
    pub fn new(wait_ms: u32) -> Self {
        Self {
            wait_ms,
            last_run: None,
            trailing: None,
        }
    }

    pub fn poll(&mut self, now_ms: f64) -> ThrottleDecision {
        if self.trailing.is_some() {
            return ThrottleDecision::Skip;
        }
        match self.last_run {
            Some(last) if now_ms - last < self.wait_ms as f64 => {
                let remaining = (self.wait_ms as f64 - (now_ms - last)).ceil();
                ThrottleDecision::Defer(remaining.max(0.0) as u32)
            }
            _ => {
                self.last_run = Some(now_ms);
                ThrottleDecision::Run
            }
        }
    }

    pub fn set_trailing(&mut self, timer: TimerId) {
        self.trailing = Some(timer);
    }

    /// Records that the trailing run is happening now.
    pub fn trailing_fired(&mut self, now_ms: f64) {
        self.trailing = None;
        self.last_run = Some(now_ms);
    }

    pub fn cancel<P: Platform>(&mut self, platform: &P) {
        if let Some(timer) = self.trailing.take() {
            platform.clear_timeout(timer);
        }
    }
}

/// Collapses any number of triggers into one run on the next animation
/// frame.
#[derive(Debug, Default)]
pub struct FrameGate {
    ticking: bool,
}

impl FrameGate {
    pub fn new() -> Self {
        Self { ticking: false }
    }

    /// Returns true when the caller should request a frame.
    pub fn open(&mut self) -> bool {
        if self.ticking {
            false
        } else {
            self.ticking = true;
            true
        }
    }

    pub fn close(&mut self) {
        self.ticking = false;
    }

    pub fn is_ticking(&self) -> bool {
        self.ticking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_runs_leading_then_defers_remainder() {
        let mut throttle = Throttle::new(100);
        assert_eq!(throttle.poll(1000.0), ThrottleDecision::Run);
        assert_eq!(throttle.poll(1030.0), ThrottleDecision::Defer(70));

        throttle.set_trailing(TimerId(1));
        assert_eq!(throttle.poll(1050.0), ThrottleDecision::Skip);

        throttle.trailing_fired(1100.0);
        assert_eq!(throttle.poll(1150.0), ThrottleDecision::Defer(50));
        assert_eq!(throttle.poll(1200.0), ThrottleDecision::Run);
    }

    #[test]
    fn frame_gate_opens_once_until_closed() {
        let mut gate = FrameGate::new();
        assert!(gate.open());
        assert!(!gate.open());
        assert!(gate.is_ticking());
        gate.close();
        assert!(gate.open());
    }
}
