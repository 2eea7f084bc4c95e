// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// livescan-capture: Decision loop of the live scanner.
//
// Turns per-frame measurements into operator guidance, decides when to take
// the picture, and runs the threaded frame pipeline that ties detection,
// guidance, and the host together.

pub mod classify;
pub mod pipeline;
pub mod scheduler;
pub mod throttle;

pub use classify::{CaptureAction, Classification, classify, classify_missing};
pub use pipeline::{
    CaptureDisposition, FrameAnalysis, FrameDisposition, FramePipeline, IgnoreReason,
};
pub use scheduler::{CaptureScheduler, SchedulerEvent};
pub use throttle::FrameThrottle;
