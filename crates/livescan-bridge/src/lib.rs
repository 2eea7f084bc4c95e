// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// livescan-bridge: Host collaborator abstractions.
//
// The capture engine never touches the camera or the screen itself. It talks
// to the host application through the traits defined here. Mobile shells
// implement them over their native SDKs; desktop replay and tests use the
// recording host.

pub mod recording;
pub mod traits;

pub use recording::{HostEvent, RecordingHost};
pub use traits::{CameraControl, CaptureConsumer, GuidanceDisplay, ScanHost};
