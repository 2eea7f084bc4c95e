// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop stand-ins for the camera and screen.
//
// Frames come from image files instead of a sensor. The replay host logs
// hints and overlays, reports capture requests back to the main loop over a
// channel, and writes delivered pictures to disk.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use livescan_bridge::{CameraControl, CaptureConsumer, GuidanceDisplay, ScanHost};
use livescan_core::error::{LiveScanError, Result};
use livescan_core::overlay::Overlay;
use livescan_core::types::{CaptureId, Frame, GuidanceState, PixelEncoding};
use livescan_vision::CapturedPicture;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Something the main loop has to react to.
#[derive(Debug)]
pub enum ReplayEvent {
    CaptureRequested(CaptureId),
    PictureSaved(PathBuf),
    CaptureFailed(String),
}

/// A decoded input image plus the raw frame made from it.
pub struct ReplayFrame {
    pub image: DynamicImage,
    pub frame: Frame,
}

impl ReplayFrame {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let image = image::open(path.as_ref()).map_err(|err| {
            LiveScanError::ImageError(format!(
                "failed to open {}: {err}",
                path.as_ref().display()
            ))
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        debug!(width, height, "replay frame loaded");
        Ok(Self {
            frame: Frame::new(rgba.into_raw(), width, height, PixelEncoding::Rgba8888),
            image,
        })
    }

    /// What a camera would hand back for this frame: JPEG bytes.
    pub fn to_jpeg(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.image
            .to_rgb8()
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))
            .map_err(|err| LiveScanError::ImageError(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }
}

pub struct ReplayHost {
    output_dir: PathBuf,
    events: mpsc::UnboundedSender<ReplayEvent>,
    last_hint: Mutex<Option<GuidanceState>>,
}

impl ReplayHost {
    pub fn new(output_dir: PathBuf, events: mpsc::UnboundedSender<ReplayEvent>) -> Self {
        Self {
            output_dir,
            events,
            last_hint: Mutex::new(None),
        }
    }

    fn notify(&self, event: ReplayEvent) {
        if self.events.send(event).is_err() {
            debug!("replay loop gone, event dropped");
        }
    }
}

impl ScanHost for ReplayHost {
    fn platform_name(&self) -> &str {
        "Desktop replay"
    }
}

impl GuidanceDisplay for ReplayHost {
    fn display_hint(&self, state: GuidanceState) {
        let mut last = self.last_hint.lock().unwrap_or_else(PoisonError::into_inner);
        if *last == Some(state) {
            return;
        }
        *last = Some(state);
        info!(hint = %state, message = state.message(), "guidance");
    }

    fn draw_overlay(&self, overlay: &Overlay) {
        debug!(
            corners = ?overlay.corners,
            border = ?overlay.style.border,
            "overlay"
        );
    }

    fn clear_overlay(&self) {
        debug!("overlay cleared");
    }
}

impl CameraControl for ReplayHost {
    fn request_capture(&self, id: CaptureId) -> Result<()> {
        if self.events.send(ReplayEvent::CaptureRequested(id)).is_err() {
            return Err(LiveScanError::Bridge("replay loop is not running".into()));
        }
        info!(%id, "shutter");
        Ok(())
    }
}

impl CaptureConsumer for ReplayHost {
    fn on_picture(&self, picture: CapturedPicture) {
        let name = format!(
            "livescan-{}.jpg",
            picture.captured_at().format("%Y%m%d-%H%M%S")
        );
        let path = self.output_dir.join(name);
        match picture.save(&path) {
            Ok(()) => {
                info!(id = %picture.id(), path = %path.display(), "picture saved");
                self.notify(ReplayEvent::PictureSaved(path));
            }
            Err(err) => {
                warn!(error = %err, "could not save picture");
                self.notify(ReplayEvent::CaptureFailed(err.to_string()));
            }
        }
    }

    fn on_capture_failed(&self, id: Option<CaptureId>, error: &LiveScanError) {
        warn!(id = ?id, error = %error, "capture failed");
        self.notify(ReplayEvent::CaptureFailed(error.to_string()));
    }
}
