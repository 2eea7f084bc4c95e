// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Auto-capture scheduler.
//
// Once guidance reports a well-framed document the scheduler arms a
// countdown. If guidance stays ready until the trigger point, exactly one
// capture is requested and the scheduler cools down so the operator is not
// photographed again straight away. Any other guidance state cancels the
// countdown on the spot.
//
// The scheduler owns no timers. Callers pass the current instant into every
// method and drive the countdown with `tick`, so a cancelled countdown has
// nothing left running that could fire later.

use std::time::Duration;

use livescan_core::config::TimingConfig;
use livescan_core::types::{CaptureArmState, CaptureId, GuidanceState};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// A transition worth acting on. Every event carries the arm cycle it
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerEvent {
    Armed { generation: u64 },
    Cancelled { generation: u64 },
    /// Issue this capture request now.
    Fired { generation: u64, id: CaptureId },
    /// The countdown ran out without reaching the trigger point.
    Expired { generation: u64 },
    CooldownStarted { generation: u64, id: CaptureId },
    /// No delivery within the capture timeout; the cool-down started anyway.
    CaptureTimedOut { generation: u64, id: CaptureId },
    CooledDown { generation: u64 },
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Armed {
        since: Instant,
    },
    CoolingDown {
        id: CaptureId,
        fired_at: Instant,
        /// The camera handed the bytes over and they are being decoded. No
        /// capture timeout applies any more.
        received: bool,
        /// Set once the picture (or its failure) came back.
        settled_at: Option<Instant>,
    },
}

#[derive(Debug, Clone)]
pub struct CaptureScheduler {
    phase: Phase,
    generation: u64,
    countdown: Duration,
    trigger_remaining: Duration,
    cooldown: Duration,
    capture_timeout: Duration,
}

impl CaptureScheduler {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            phase: Phase::Idle,
            generation: 0,
            countdown: timing.countdown(),
            trigger_remaining: timing.trigger_remaining(),
            cooldown: timing.cooldown(),
            capture_timeout: timing.capture_timeout(),
        }
    }

    pub fn state(&self) -> CaptureArmState {
        match self.phase {
            Phase::Idle => CaptureArmState::Idle,
            Phase::Armed { .. } => CaptureArmState::Armed,
            Phase::CoolingDown { .. } => CaptureArmState::CoolingDown,
        }
    }

    /// The capture that has been requested but not yet delivered, including
    /// one whose bytes are still being decoded.
    pub fn pending_capture(&self) -> Option<CaptureId> {
        match self.phase {
            Phase::CoolingDown {
                id,
                settled_at: None,
                ..
            } => Some(id),
            _ => None,
        }
    }

    /// The pending capture if the camera has not answered it yet.
    pub fn awaiting_bytes(&self) -> Option<CaptureId> {
        match self.phase {
            Phase::CoolingDown {
                id,
                received: false,
                settled_at: None,
                ..
            } => Some(id),
            _ => None,
        }
    }

    /// The camera answered the pending capture. The capture stays in flight
    /// until [`capture_settled`](Self::capture_settled) but can no longer
    /// time out. Returns `None` if nothing was waiting for bytes.
    pub fn capture_received(&mut self) -> Option<CaptureId> {
        let id = self.awaiting_bytes()?;
        if let Phase::CoolingDown { received, .. } = &mut self.phase {
            *received = true;
        }
        debug!(generation = self.generation, %id, "capture bytes received");
        Some(id)
    }

    /// Feed the latest guidance state.
    ///
    /// `CapturingImage` arms an idle scheduler and is a no-op while armed.
    /// Anything else cancels an armed countdown.
    pub fn on_state(&mut self, state: GuidanceState, now: Instant) -> Option<SchedulerEvent> {
        match (state, self.phase) {
            (GuidanceState::CapturingImage, Phase::Idle) => {
                self.generation += 1;
                self.phase = Phase::Armed { since: now };
                debug!(generation = self.generation, "auto-capture armed");
                Some(SchedulerEvent::Armed {
                    generation: self.generation,
                })
            }
            (GuidanceState::CapturingImage, _) => None,
            (_, Phase::Armed { .. }) => self.cancel(),
            _ => None,
        }
    }

    /// Stop an armed countdown. Has no effect in any other state.
    pub fn cancel(&mut self) -> Option<SchedulerEvent> {
        if let Phase::Armed { .. } = self.phase {
            self.phase = Phase::Idle;
            debug!(generation = self.generation, "auto-capture cancelled");
            Some(SchedulerEvent::Cancelled {
                generation: self.generation,
            })
        } else {
            None
        }
    }

    /// Advance the countdown or cool-down to `now`.
    pub fn tick(&mut self, now: Instant) -> Option<SchedulerEvent> {
        match self.phase {
            Phase::Idle => None,
            Phase::Armed { since } => {
                let elapsed = now.saturating_duration_since(since);
                if elapsed >= self.countdown {
                    self.phase = Phase::Idle;
                    debug!(generation = self.generation, "countdown expired unfired");
                    return Some(SchedulerEvent::Expired {
                        generation: self.generation,
                    });
                }
                let remaining = self.countdown - elapsed;
                if remaining <= self.trigger_remaining {
                    Some(self.fire(now))
                } else {
                    None
                }
            }
            Phase::CoolingDown {
                id,
                fired_at,
                received,
                settled_at,
            } => match settled_at {
                Some(settled) if now.saturating_duration_since(settled) >= self.cooldown => {
                    self.phase = Phase::Idle;
                    debug!(generation = self.generation, "cool-down over");
                    Some(SchedulerEvent::CooledDown {
                        generation: self.generation,
                    })
                }
                Some(_) => None,
                None if !received
                    && now.saturating_duration_since(fired_at) >= self.capture_timeout =>
                {
                    warn!(
                        generation = self.generation,
                        %id,
                        timeout_ms = self.capture_timeout.as_millis() as u64,
                        "capture never delivered, cooling down anyway"
                    );
                    self.phase = Phase::CoolingDown {
                        id,
                        fired_at,
                        received,
                        settled_at: Some(now),
                    };
                    Some(SchedulerEvent::CaptureTimedOut {
                        generation: self.generation,
                        id,
                    })
                }
                None => None,
            },
        }
    }

    /// Manual shutter press. Goes through the same single-capture guard as
    /// the countdown: returns `None` while a capture is pending or cooling
    /// down.
    pub fn fire_now(&mut self, now: Instant) -> Option<SchedulerEvent> {
        match self.phase {
            Phase::Idle => {
                self.generation += 1;
                Some(self.fire(now))
            }
            Phase::Armed { .. } => Some(self.fire(now)),
            Phase::CoolingDown { .. } => {
                debug!(generation = self.generation, "capture already in flight, dropped");
                None
            }
        }
    }

    /// The picture for `id` arrived (or failed). Starts the cool-down.
    ///
    /// Returns `None` for a capture that is not the pending one.
    pub fn capture_settled(&mut self, id: CaptureId, now: Instant) -> Option<SchedulerEvent> {
        match self.phase {
            Phase::CoolingDown {
                id: pending,
                fired_at,
                received,
                settled_at: None,
            } if pending == id => {
                self.phase = Phase::CoolingDown {
                    id,
                    fired_at,
                    received,
                    settled_at: Some(now),
                };
                debug!(generation = self.generation, %id, "cool-down started");
                Some(SchedulerEvent::CooldownStarted {
                    generation: self.generation,
                    id,
                })
            }
            _ => None,
        }
    }

    fn fire(&mut self, now: Instant) -> SchedulerEvent {
        let id = CaptureId::new();
        self.phase = Phase::CoolingDown {
            id,
            fired_at: now,
            received: false,
            settled_at: None,
        };
        info!(generation = self.generation, %id, "capture fired");
        SchedulerEvent::Fired {
            generation: self.generation,
            id,
        }
    }
}
