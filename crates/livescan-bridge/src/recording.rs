// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recording host for desktop replay and tests.
//
// Every call is appended to an in-memory log. Camera requests succeed unless
// the host is told to refuse them, in which case `PlatformUnavailable` is
// returned the way a device without a camera would.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use livescan_core::error::{LiveScanError, Result};
use livescan_core::overlay::Overlay;
use livescan_core::types::{CaptureId, GuidanceState};
use livescan_vision::CapturedPicture;
use tracing::{debug, warn};

use crate::traits::{CameraControl, CaptureConsumer, GuidanceDisplay, ScanHost};

/// One observed host call.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Hint(GuidanceState),
    Overlay(Overlay),
    OverlayCleared,
    CaptureRequested(CaptureId),
    Picture {
        id: CaptureId,
        width: u32,
        height: u32,
    },
    CaptureFailed {
        id: Option<CaptureId>,
        message: String,
    },
}

#[derive(Debug, Default)]
pub struct RecordingHost {
    events: Mutex<Vec<HostEvent>>,
    pictures: Mutex<Vec<CapturedPicture>>,
    refuse_captures: AtomicBool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `request_capture` calls fail.
    pub fn refuse_captures(&self, refuse: bool) {
        self.refuse_captures.store(refuse, Ordering::SeqCst);
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<HostEvent> {
        lock(&self.events).clone()
    }

    pub fn hints(&self) -> Vec<GuidanceState> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                HostEvent::Hint(state) => Some(*state),
                _ => None,
            })
            .collect()
    }

    pub fn last_hint(&self) -> Option<GuidanceState> {
        self.hints().last().copied()
    }

    pub fn capture_requests(&self) -> Vec<CaptureId> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                HostEvent::CaptureRequested(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<(Option<CaptureId>, String)> {
        lock(&self.events)
            .iter()
            .filter_map(|e| match e {
                HostEvent::CaptureFailed { id, message } => Some((*id, message.clone())),
                _ => None,
            })
            .collect()
    }

    /// Pictures handed to the consumer, oldest first.
    pub fn take_pictures(&self) -> Vec<CapturedPicture> {
        std::mem::take(&mut *lock(&self.pictures))
    }

    pub fn picture_count(&self) -> usize {
        lock(&self.events)
            .iter()
            .filter(|e| matches!(e, HostEvent::Picture { .. }))
            .count()
    }

    fn record(&self, event: HostEvent) {
        lock(&self.events).push(event);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScanHost for RecordingHost {
    fn platform_name(&self) -> &str {
        "Recording host"
    }
}

impl GuidanceDisplay for RecordingHost {
    fn display_hint(&self, state: GuidanceState) {
        self.record(HostEvent::Hint(state));
    }

    fn draw_overlay(&self, overlay: &Overlay) {
        self.record(HostEvent::Overlay(overlay.clone()));
    }

    fn clear_overlay(&self) {
        self.record(HostEvent::OverlayCleared);
    }
}

impl CameraControl for RecordingHost {
    fn request_capture(&self, id: CaptureId) -> Result<()> {
        if self.refuse_captures.load(Ordering::SeqCst) {
            warn!(%id, "capture refused by recording host");
            return Err(LiveScanError::PlatformUnavailable);
        }
        debug!(%id, "capture requested");
        self.record(HostEvent::CaptureRequested(id));
        Ok(())
    }
}

impl CaptureConsumer for RecordingHost {
    fn on_picture(&self, picture: CapturedPicture) {
        self.record(HostEvent::Picture {
            id: picture.id(),
            width: picture.width(),
            height: picture.height(),
        });
        lock(&self.pictures).push(picture);
    }

    fn on_capture_failed(&self, id: Option<CaptureId>, error: &LiveScanError) {
        self.record(HostEvent::CaptureFailed {
            id,
            message: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use livescan_core::overlay::OverlayStyle;
    use livescan_core::types::Point;

    #[test]
    fn records_calls_in_order() {
        let host = RecordingHost::new();
        host.display_hint(GuidanceState::FindRect);
        host.draw_overlay(&Overlay {
            corners: [Point::default(); 4],
            frame_width: 10,
            frame_height: 20,
            style: OverlayStyle::for_state(GuidanceState::FindRect),
        });
        host.clear_overlay();

        let events = host.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], HostEvent::Hint(GuidanceState::FindRect));
        assert_eq!(events[2], HostEvent::OverlayCleared);
    }

    #[test]
    fn refused_capture_is_platform_unavailable() {
        let host = RecordingHost::new();
        host.refuse_captures(true);
        let result = host.request_capture(CaptureId::new());
        assert!(matches!(result, Err(LiveScanError::PlatformUnavailable)));
        assert!(host.capture_requests().is_empty());
    }

    #[test]
    fn pictures_are_kept() {
        let host = RecordingHost::new();
        let id = CaptureId::new();
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 3));
        host.on_picture(CapturedPicture::from_dynamic(id, image));

        assert_eq!(host.picture_count(), 1);
        let pictures = host.take_pictures();
        assert_eq!(pictures[0].id(), id);
        assert!(host.take_pictures().is_empty());
    }
}
