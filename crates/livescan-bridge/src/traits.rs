// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the host side of the scanner.

use livescan_core::error::{LiveScanError, Result};
use livescan_core::overlay::Overlay;
use livescan_core::types::{CaptureId, GuidanceState};
use livescan_vision::CapturedPicture;

/// Everything the pipeline needs from the host, as one object.
///
/// Methods are called from pipeline tasks, never from the thread that feeds
/// frames, so implementations must be `Send + Sync` and marshal onto their
/// own UI thread if they have one.
pub trait ScanHost: GuidanceDisplay + CameraControl + CaptureConsumer {
    /// Human-readable platform name (e.g. "Android 14", "Desktop replay").
    fn platform_name(&self) -> &str;
}

/// Operator-facing hint banner and overlay canvas.
pub trait GuidanceDisplay: Send + Sync {
    /// Show the hint for `state`. Called for every published analysis; hosts
    /// that animate should ignore repeats.
    fn display_hint(&self, state: GuidanceState);

    /// Draw the quadrilateral outline in preview coordinates.
    fn draw_overlay(&self, overlay: &Overlay);

    /// Remove any outline.
    fn clear_overlay(&self);
}

/// Still-capture trigger on the device camera.
pub trait CameraControl: Send + Sync {
    /// Ask the camera to take one picture. The result comes back through
    /// `FramePipeline::on_capture_complete` or `on_capture_failed`.
    ///
    /// An `Err` means the request could not even be issued; the pipeline
    /// treats it as a failed capture.
    fn request_capture(&self, id: CaptureId) -> Result<()>;
}

/// Receiver of finished pictures.
pub trait CaptureConsumer: Send + Sync {
    fn on_picture(&self, picture: CapturedPicture);

    /// A capture was requested but no picture will arrive.
    fn on_capture_failed(&self, id: Option<CaptureId>, error: &LiveScanError);
}
