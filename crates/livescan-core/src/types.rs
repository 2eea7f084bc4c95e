// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the livescan capture engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an issued capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureId(pub Uuid);

impl CaptureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CaptureId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CaptureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A four-cornered document candidate.
///
/// `corners` are ordered so that index 0 -> 1 runs along the "top" edge of
/// whichever coordinate space the quadrilateral lives in. The detector emits
/// `[top-left, top-right, bottom-right, bottom-left]` in sensor space; after
/// mapping into display space the order becomes
/// `[top-right, bottom-right, bottom-left, top-left]`.
///
/// `contour` is the polygon the corners were approximated from and is what
/// area measurements use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quadrilateral {
    pub corners: [Point; 4],
    pub contour: Vec<Point>,
}

impl Quadrilateral {
    pub fn new(corners: [Point; 4], contour: Vec<Point>) -> Self {
        Self { corners, contour }
    }

    /// Build a quadrilateral whose contour is exactly its four corners.
    pub fn from_corners(corners: [Point; 4]) -> Self {
        Self {
            corners,
            contour: corners.to_vec(),
        }
    }
}

/// The single operator instruction currently in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GuidanceState {
    /// Nothing to show (detection paused or capture just delivered).
    #[default]
    NoMessage,
    /// Searching: no usable document in view.
    FindRect,
    /// Document too small in frame.
    MoveCloser,
    /// Document cropped or too large in frame.
    MoveAway,
    /// Device held in the wrong orientation for the document.
    Rotate,
    /// Perspective too skewed.
    AdjustAngle,
    /// Well framed; auto-capture is counting down.
    CapturingImage,
}

impl GuidanceState {
    /// Whether this is one of the corrective "attention" hints.
    pub fn is_attention(&self) -> bool {
        matches!(
            self,
            Self::MoveCloser | Self::MoveAway | Self::Rotate | Self::AdjustAngle
        )
    }

    /// Plain-language text for the hint banner.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoMessage => "",
            Self::FindRect => "Looking for a document",
            Self::MoveCloser => "Move closer",
            Self::MoveAway => "Move away",
            Self::Rotate => "Rotate your device",
            Self::AdjustAngle => "Hold the camera straight above the document",
            Self::CapturingImage => "Hold still, capturing image",
        }
    }
}

impl std::fmt::Display for GuidanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NoMessage => "NO_MESSAGE",
            Self::FindRect => "FIND_RECT",
            Self::MoveCloser => "MOVE_CLOSER",
            Self::MoveAway => "MOVE_AWAY",
            Self::Rotate => "ROTATE",
            Self::AdjustAngle => "ADJUST_ANGLE",
            Self::CapturingImage => "CAPTURING_IMAGE",
        };
        f.write_str(label)
    }
}

/// Lifecycle of the auto-capture timer. Firing is instantaneous: the
/// scheduler reports it as an event and goes straight to `CoolingDown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CaptureArmState {
    /// No countdown running; may arm.
    #[default]
    Idle,
    /// Counting down towards the trigger point.
    Armed,
    /// Capture issued or delivered; arming is blocked until the delay ends.
    CoolingDown,
}

/// How the host is currently acquiring documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AcquisitionMode {
    /// Picking an existing image from storage; the camera is not running.
    FileMode,
    /// Operator presses the shutter themselves; no live analysis.
    ManualMode,
    /// Live detection with guidance and auto-capture.
    #[default]
    DetectionMode,
}

/// Raw pixel layout of a sensor frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelEncoding {
    /// YUV 4:2:0: full-resolution Y plane followed by interleaved V/U at half
    /// resolution. The default Android preview format.
    Nv21,
    /// 8-bit RGBA, row-major.
    Rgba8888,
    /// 8-bit RGB, row-major.
    Rgb888,
    /// 8-bit luma only.
    Gray8,
}

impl PixelEncoding {
    /// Number of bytes a `width` x `height` buffer must hold.
    pub fn required_len(&self, width: u32, height: u32) -> usize {
        let w = width as usize;
        let h = height as usize;
        match self {
            Self::Nv21 => {
                let chroma = w.div_ceil(2) * h.div_ceil(2) * 2;
                w * h + chroma
            }
            Self::Rgba8888 => w * h * 4,
            Self::Rgb888 => w * h * 3,
            Self::Gray8 => w * h,
        }
    }
}

/// One sensor frame, exactly as the camera delivered it.
///
/// Frames are moved through the pipeline and dropped after analysis; nothing
/// keeps a reference to one across frames.
#[derive(Debug, Clone)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    encoding: PixelEncoding,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, encoding: PixelEncoding) -> Self {
        Self {
            data,
            width,
            height,
            encoding,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn encoding(&self) -> PixelEncoding {
        self.encoding
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Rotation between the sensor's native axes and the display.
///
/// Phone sensors are usually mounted landscape while the preview is shown in
/// portrait, which is `Rotate90`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorOrientation {
    Rotate0,
    #[default]
    Rotate90,
    Rotate180,
    Rotate270,
}

impl SensorOrientation {
    /// Display dimensions for a native frame of `width` x `height`.
    pub fn display_size(&self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Self::Rotate0 | Self::Rotate180 => (width, height),
            Self::Rotate90 | Self::Rotate270 => (height, width),
        }
    }

    /// Map a point from native sensor space into display space.
    pub fn to_display(&self, point: Point, width: u32, height: u32) -> Point {
        let w = f64::from(width);
        let h = f64::from(height);
        match self {
            Self::Rotate0 => point,
            Self::Rotate90 => Point::new(h - point.y, point.x),
            Self::Rotate180 => Point::new(w - point.x, h - point.y),
            Self::Rotate270 => Point::new(point.y, w - point.x),
        }
    }

    /// Clockwise rotation in degrees that brings a sensor image upright.
    pub fn degrees(&self) -> u32 {
        match self {
            Self::Rotate0 => 0,
            Self::Rotate90 => 90,
            Self::Rotate180 => 180,
            Self::Rotate270 => 270,
        }
    }
}

/// Classification of errors for recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Frame flicker, decode hiccup: the next frame is a fresh attempt.
    Transient,
    /// Operator must act (hold still, switch mode, retry the shot).
    UserAction,
    /// Misconfiguration or missing platform support.
    Permanent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nv21_length_includes_chroma_plane() {
        assert_eq!(PixelEncoding::Nv21.required_len(4, 4), 16 + 8);
        // Odd dimensions round the chroma plane up.
        assert_eq!(PixelEncoding::Nv21.required_len(3, 3), 9 + 8);
    }

    #[test]
    fn rotate90_swaps_axes() {
        let o = SensorOrientation::Rotate90;
        assert_eq!(o.display_size(1920, 1080), (1080, 1920));
        let p = o.to_display(Point::new(100.0, 50.0), 1920, 1080);
        assert_eq!(p, Point::new(1030.0, 100.0));
    }

    #[test]
    fn rotations_keep_points_inside_display() {
        let native = Point::new(10.0, 20.0);
        for o in [
            SensorOrientation::Rotate0,
            SensorOrientation::Rotate90,
            SensorOrientation::Rotate180,
            SensorOrientation::Rotate270,
        ] {
            let (dw, dh) = o.display_size(640, 480);
            let p = o.to_display(native, 640, 480);
            assert!(p.x >= 0.0 && p.x <= f64::from(dw), "{o:?} x out of range");
            assert!(p.y >= 0.0 && p.y <= f64::from(dh), "{o:?} y out of range");
        }
    }

    #[test]
    fn attention_states() {
        assert!(GuidanceState::MoveCloser.is_attention());
        assert!(GuidanceState::AdjustAngle.is_attention());
        assert!(!GuidanceState::FindRect.is_attention());
        assert!(!GuidanceState::CapturingImage.is_attention());
    }

    #[test]
    fn guidance_display_uses_wire_names() {
        assert_eq!(GuidanceState::CapturingImage.to_string(), "CAPTURING_IMAGE");
        assert_eq!(GuidanceState::FindRect.to_string(), "FIND_RECT");
    }
}
