// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration. Every threshold and interval the pipeline uses lives
// here; nothing adapts at runtime.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LiveScanError, Result};
use crate::types::SensorOrientation;

/// Complete engine settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub detection: DetectionConfig,
    pub thresholds: GuidanceThresholds,
    pub timing: TimingConfig,
    pub capture: CaptureConfig,
    /// Rotation from sensor axes to display axes.
    pub orientation: SensorOrientation,
}

/// Contour extraction and polygon approximation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Longest side (pixels) frames are downscaled to before edge detection.
    pub working_size: u32,
    /// Gaussian blur sigma applied before Canny.
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// How many of the largest contours are tried before giving up.
    pub max_candidates: usize,
    /// Douglas-Peucker epsilon as a fraction of the contour perimeter.
    pub approx_epsilon_ratio: f64,
    /// Smallest accepted candidate, as a fraction of the working image area.
    pub min_area_ratio: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            working_size: 500,
            blur_sigma: 2.0,
            canny_low: 50.0,
            canny_high: 150.0,
            max_candidates: 5,
            approx_epsilon_ratio: 0.02,
            min_area_ratio: 0.02,
        }
    }
}

/// Fixed limits behind the guidance predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceThresholds {
    /// Above this area fraction the candidate is implausible (FIND_RECT).
    pub area_upper_ratio: f64,
    /// Below this area fraction the document is too far away.
    pub area_lower_ratio: f64,
    /// Secondary "too close" area fraction.
    pub area_secondary_ratio: f64,
    /// Width fraction of the preview width considered too wide.
    pub width_ratio: f64,
    /// Height fraction of the preview height considered too tall.
    pub height_ratio: f64,
    /// Corners within this many pixels of a border count as touching it.
    pub edge_margin_px: f64,
    /// Largest accepted deviation of a corner angle from 90 degrees.
    pub angle_tolerance_deg: f64,
    /// Width/height ratio above which the operator is asked to rotate.
    pub rotate_aspect_ratio: f64,
}

impl Default for GuidanceThresholds {
    fn default() -> Self {
        Self {
            area_upper_ratio: 0.95,
            area_lower_ratio: 0.20,
            area_secondary_ratio: 0.75,
            width_ratio: 0.90,
            height_ratio: 0.90,
            edge_margin_px: 10.0,
            angle_tolerance_deg: 10.0,
            rotate_aspect_ratio: 4.0,
        }
    }
}

/// Throttle, countdown, and cool-down intervals (milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Minimum gap between frames accepted for analysis.
    pub frame_interval_ms: u64,
    /// Total auto-capture countdown once armed.
    pub countdown_ms: u64,
    /// Countdown sampling period.
    pub tick_ms: u64,
    /// Fire when this much countdown remains.
    pub trigger_remaining_ms: u64,
    /// Quiet period after a capture is delivered.
    pub cooldown_ms: u64,
    /// Start the cool-down anyway if a capture is never delivered.
    pub capture_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 400,
            countdown_ms: 2000,
            tick_ms: 100,
            trigger_remaining_ms: 1000,
            cooldown_ms: 3000,
            capture_timeout_ms: 10_000,
        }
    }
}

impl TimingConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn countdown(&self) -> Duration {
        Duration::from_millis(self.countdown_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn trigger_remaining(&self) -> Duration {
        Duration::from_millis(self.trigger_remaining_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}

/// Post-processing of the delivered picture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Pictures larger than this on either side are downsampled.
    pub max_dimension: u32,
    /// JPEG quality used when a picture is re-encoded.
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_dimension: 2200,
            jpeg_quality: 90,
        }
    }
}

impl ScanConfig {
    /// Parse and validate a JSON document. Missing fields keep defaults.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&data)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        for (name, value) in [
            ("area_upper_ratio", t.area_upper_ratio),
            ("area_lower_ratio", t.area_lower_ratio),
            ("area_secondary_ratio", t.area_secondary_ratio),
            ("width_ratio", t.width_ratio),
            ("height_ratio", t.height_ratio),
            ("detection.min_area_ratio", self.detection.min_area_ratio),
            ("detection.approx_epsilon_ratio", self.detection.approx_epsilon_ratio),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(LiveScanError::Config(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if t.area_lower_ratio >= t.area_upper_ratio {
            return Err(LiveScanError::Config(
                "area_lower_ratio must be below area_upper_ratio".into(),
            ));
        }
        // Written so NaN fails every check.
        if !(t.edge_margin_px >= 0.0 && t.edge_margin_px.is_finite())
            || !(t.angle_tolerance_deg >= 0.0 && t.angle_tolerance_deg.is_finite())
            || !(t.rotate_aspect_ratio > 0.0)
        {
            return Err(LiveScanError::Config(
                "edge margin, angle tolerance, and rotate ratio must be positive numbers".into(),
            ));
        }

        let timing = &self.timing;
        if timing.tick_ms == 0 {
            return Err(LiveScanError::Config("timing.tick_ms must be non-zero".into()));
        }
        if timing.capture_timeout_ms == 0 {
            return Err(LiveScanError::Config(
                "timing.capture_timeout_ms must be non-zero".into(),
            ));
        }
        if timing.trigger_remaining_ms == 0 || timing.trigger_remaining_ms >= timing.countdown_ms {
            return Err(LiveScanError::Config(format!(
                "trigger point ({} ms) must lie inside the countdown ({} ms)",
                timing.trigger_remaining_ms, timing.countdown_ms
            )));
        }

        let d = &self.detection;
        if !(d.blur_sigma > 0.0 && d.blur_sigma.is_finite())
            || !(d.canny_low >= 0.0 && d.canny_low <= d.canny_high && d.canny_high.is_finite())
        {
            return Err(LiveScanError::Config(
                "detection.blur_sigma must be positive and canny_low <= canny_high".into(),
            ));
        }
        if self.detection.working_size < 32 {
            return Err(LiveScanError::Config(
                "detection.working_size must be at least 32 pixels".into(),
            ));
        }
        if self.detection.max_candidates == 0 {
            return Err(LiveScanError::Config(
                "detection.max_candidates must be non-zero".into(),
            ));
        }
        if self.capture.max_dimension == 0 || !(1..=100).contains(&self.capture.jpeg_quality) {
            return Err(LiveScanError::Config(
                "capture.max_dimension must be non-zero and jpeg_quality in 1..=100".into(),
            ));
        }
        Ok(())
    }
}
