// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Producer-side frame throttle.

use std::time::Duration;

use tokio::time::Instant;

/// Admits at most one frame per `interval`. Rejected frames do not push the
/// window forward.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval: Duration,
    last_admitted: Option<Instant>,
}

impl FrameThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: None,
        }
    }

    /// Whether a frame arriving at `now` should be analysed.
    pub fn admit(&mut self, now: Instant) -> bool {
        match self.last_admitted {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_admitted = Some(now);
                true
            }
        }
    }

    /// Forget the last admission so the next frame goes straight through.
    pub fn reset(&mut self) {
        self.last_admitted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_is_admitted() {
        let mut throttle = FrameThrottle::new(Duration::from_millis(400));
        assert!(throttle.admit(Instant::now()));
    }

    #[test]
    fn frames_inside_the_interval_are_dropped() {
        let mut throttle = FrameThrottle::new(Duration::from_millis(400));
        let t0 = Instant::now();
        let admitted: Vec<u64> = (0..30u64)
            .map(|n| n * 33) // ~30 fps
            .filter(|ms| throttle.admit(t0 + Duration::from_millis(*ms)))
            .collect();
        assert_eq!(admitted, vec![0, 429, 858]);
    }

    #[test]
    fn reset_reopens_the_window() {
        let mut throttle = FrameThrottle::new(Duration::from_millis(400));
        let t0 = Instant::now();
        assert!(throttle.admit(t0));
        throttle.reset();
        assert!(throttle.admit(t0 + Duration::from_millis(1)));
    }
}
