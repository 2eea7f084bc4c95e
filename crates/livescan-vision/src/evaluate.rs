// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometric evaluator: measures a display-space quadrilateral against the
// preview and derives the boolean predicates guidance is built from.

use livescan_core::config::GuidanceThresholds;
use livescan_core::types::{Point, Quadrilateral};
use serde::{Deserialize, Serialize};

use crate::geometry::{max_right_angle_deviation, polygon_area};

/// Measurements of one detected quadrilateral against the preview.
///
/// Corners are in display order `[top-right, bottom-right, bottom-left,
/// top-left]`. Built fresh for every frame and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMetrics {
    pub preview_width: f64,
    pub preview_height: f64,
    pub preview_area: f64,
    pub detected_area: f64,
    pub detected_width: f64,
    pub detected_height: f64,
    pub corners: [Point; 4],
}

/// Predicate results for one frame, in the vocabulary of the guidance rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    /// Implausibly large: almost the whole preview.
    pub area_beyond_limits: bool,
    pub area_below_limit: bool,
    pub height_above_limit: bool,
    pub width_above_limit: bool,
    /// Past the secondary "too close" area fraction.
    pub area_above_secondary: bool,
    pub edge_touching: bool,
    pub angle_not_correct: bool,
    pub rotate_suggested: bool,
}

impl FrameMetrics {
    /// Measure `quad` (display space) against a preview of the given size.
    pub fn evaluate(quad: &Quadrilateral, preview_width: u32, preview_height: u32) -> Self {
        let [p0, p1, p2, p3] = quad.corners;
        let preview_width = f64::from(preview_width);
        let preview_height = f64::from(preview_height);

        let detected_area = if quad.contour.len() >= 3 {
            polygon_area(&quad.contour)
        } else {
            polygon_area(&quad.corners)
        };

        Self {
            preview_width,
            preview_height,
            preview_area: preview_width * preview_height,
            detected_area,
            detected_width: (p3.x - p0.x).abs().max((p2.x - p1.x).abs()),
            detected_height: (p1.y - p0.y).abs().max((p2.y - p3.y).abs()),
            corners: quad.corners,
        }
    }

    /// Fraction of the preview covered by the document.
    pub fn area_ratio(&self) -> f64 {
        if self.preview_area > 0.0 {
            self.detected_area / self.preview_area
        } else {
            0.0
        }
    }

    /// Width over height. Infinite when the height collapsed to zero.
    pub fn aspect_ratio(&self) -> f64 {
        if self.detected_height > 0.0 {
            self.detected_width / self.detected_height
        } else {
            f64::INFINITY
        }
    }

    /// Largest deviation of any corner angle from a right angle, in degrees.
    pub fn max_angle_deviation(&self) -> f64 {
        max_right_angle_deviation(&self.corners)
    }

    /// Whether any corner sits within `margin` pixels of a preview border.
    pub fn touches_edge(&self, margin: f64) -> bool {
        self.corners.iter().any(|p| {
            p.x <= margin
                || p.y <= margin
                || p.x >= self.preview_width - margin
                || p.y >= self.preview_height - margin
        })
    }

    /// Evaluate every guidance predicate against `thresholds`.
    pub fn assess(&self, thresholds: &GuidanceThresholds) -> Assessment {
        let area = self.detected_area;
        let preview = self.preview_area;
        Assessment {
            area_beyond_limits: area > thresholds.area_upper_ratio * preview,
            area_below_limit: area < thresholds.area_lower_ratio * preview,
            height_above_limit: self.detected_height
                > thresholds.height_ratio * self.preview_height,
            width_above_limit: self.detected_width > thresholds.width_ratio * self.preview_width,
            area_above_secondary: area > thresholds.area_secondary_ratio * preview,
            edge_touching: self.touches_edge(thresholds.edge_margin_px),
            angle_not_correct: self.max_angle_deviation() > thresholds.angle_tolerance_deg,
            rotate_suggested: self.aspect_ratio() > thresholds.rotate_aspect_ratio,
        }
    }
}
