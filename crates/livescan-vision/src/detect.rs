// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quadrilateral detector: finds the largest convex four-cornered contour in a
// preview frame.

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::morphology::dilate;
use imageproc::point::Point as PixelPoint;
use livescan_core::config::DetectionConfig;
use livescan_core::types::{Point, Quadrilateral};
use tracing::{debug, instrument, trace};

use crate::geometry::{is_convex, order_corners, polygon_area};

/// Extra epsilon ratios tried when the configured one does not collapse a
/// contour to four points.
const EPSILON_RETRY_STEPS: [f64; 2] = [1.5, 2.0];

/// Stateless document detector. Cheap to clone; one per pipeline.
#[derive(Debug, Clone, Default)]
pub struct QuadDetector {
    config: DetectionConfig,
}

impl QuadDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Find the document quadrilateral in `image`.
    ///
    /// ## Pipeline
    ///
    /// 1. Grayscale, downscaled so the longest side is at most `working_size`
    /// 2. Gaussian blur, then Canny edges
    /// 3. Dilate the edge map so broken borders close up
    /// 4. Trace outer contours and keep the largest `max_candidates`
    /// 5. Douglas-Peucker approximation; accept the first convex 4-gon above
    ///    `min_area_ratio` of the working area
    ///
    /// Corners come back in full-resolution sensor coordinates, ordered
    /// `[top-left, top-right, bottom-right, bottom-left]`. `None` means no
    /// candidate passed; that is the normal "nothing in view" outcome.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect(&self, image: &RgbImage) -> Option<Quadrilateral> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return None;
        }

        let (working, (sx, sy)) = self.working_image(image);
        let blurred = gaussian_blur_f32(&working, self.config.blur_sigma);
        let edges = canny(&blurred, self.config.canny_low, self.config.canny_high);
        let closed = dilate(&edges, Norm::LInf, 1);

        let mut candidates: Vec<(f64, Vec<PixelPoint<u32>>)> = find_contours::<u32>(&closed)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.points.len() >= 4)
            .map(|c| (polygon_area(&to_points(&c.points)), c.points))
            .collect();
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        candidates.truncate(self.config.max_candidates);
        trace!(candidates = candidates.len(), "outer contours ranked");

        let (ww, wh) = working.dimensions();
        let min_area = self.config.min_area_ratio * f64::from(ww) * f64::from(wh);

        for (area, contour) in &candidates {
            if *area < min_area {
                // Sorted by area, so nothing further can pass.
                break;
            }
            let Some(corners) = self.approximate_quad(contour) else {
                continue;
            };
            let corner_area = polygon_area(&corners);
            if corner_area < min_area {
                continue;
            }

            let scaled = corners.map(|p| Point::new(p.x * sx, p.y * sy));
            let ordered = order_corners(scaled);
            let outline = contour
                .iter()
                .map(|p| Point::new(f64::from(p.x) * sx, f64::from(p.y) * sy))
                .collect();
            debug!(
                area = corner_area * sx * sy,
                top_left = ?ordered[0],
                bottom_right = ?ordered[2],
                "document quadrilateral found"
            );
            return Some(Quadrilateral::new(ordered, outline));
        }

        debug!("no quadrilateral in frame");
        None
    }

    /// Grayscale working copy plus the x and y factors that map its
    /// coordinates back to the input's. Both sides are rounded separately, so
    /// the factors differ slightly.
    fn working_image(&self, image: &RgbImage) -> (GrayImage, (f64, f64)) {
        let gray = imageops::grayscale(image);
        let (width, height) = gray.dimensions();
        let longest = width.max(height);
        let target = self.config.working_size;
        if longest <= target {
            return (gray, (1.0, 1.0));
        }

        let ratio = f64::from(target) / f64::from(longest);
        let new_w = ((f64::from(width) * ratio).round() as u32).max(1);
        let new_h = ((f64::from(height) * ratio).round() as u32).max(1);
        let resized = imageops::resize(&gray, new_w, new_h, FilterType::Triangle);
        let scale = (
            f64::from(width) / f64::from(new_w),
            f64::from(height) / f64::from(new_h),
        );
        (resized, scale)
    }

    /// Reduce a traced contour to exactly four strictly convex corners.
    fn approximate_quad(&self, contour: &[PixelPoint<u32>]) -> Option<[Point; 4]> {
        let perimeter = arc_length(contour, true);
        let base = self.config.approx_epsilon_ratio;

        for factor in std::iter::once(1.0).chain(EPSILON_RETRY_STEPS) {
            let mut approx = approximate_polygon_dp(contour, base * factor * perimeter, true);
            if approx.len() > 1 && approx.first() == approx.last() {
                approx.pop();
            }
            if approx.len() < 4 {
                return None;
            }
            if approx.len() > 4 {
                continue;
            }

            let points = to_points(&approx);
            if !is_convex(&points) {
                return None;
            }
            return Some([points[0], points[1], points[2], points[3]]);
        }
        None
    }
}

fn to_points(points: &[PixelPoint<u32>]) -> Vec<Point> {
    points
        .iter()
        .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn canvas(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([20, 20, 20]))
    }

    fn fill_rect(image: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                image.put_pixel(x, y, Rgb([235, 235, 235]));
            }
        }
    }

    fn assert_near(actual: Point, expected: (f64, f64), tolerance: f64) {
        let dx = (actual.x - expected.0).abs();
        let dy = (actual.y - expected.1).abs();
        assert!(
            dx <= tolerance && dy <= tolerance,
            "corner {actual:?} not within {tolerance}px of {expected:?}"
        );
    }

    #[test]
    fn blank_frame_has_no_document() {
        let detector = QuadDetector::default();
        assert!(detector.detect(&canvas(320, 240)).is_none());
    }

    #[test]
    fn finds_bright_page_on_dark_desk() {
        let mut image = canvas(400, 300);
        fill_rect(&mut image, 80, 60, 320, 240);

        let quad = QuadDetector::default()
            .detect(&image)
            .expect("page should be found");

        let [tl, tr, br, bl] = quad.corners;
        assert_near(tl, (80.0, 60.0), 8.0);
        assert_near(tr, (320.0, 60.0), 8.0);
        assert_near(br, (320.0, 240.0), 8.0);
        assert_near(bl, (80.0, 240.0), 8.0);
        assert!(quad.contour.len() >= 4);
    }

    #[test]
    fn large_frames_are_scaled_back() {
        // 1000 px wide forces a downscale to the 500 px working size.
        let mut image = canvas(1000, 600);
        fill_rect(&mut image, 200, 100, 800, 500);

        let quad = QuadDetector::default()
            .detect(&image)
            .expect("page should be found");

        assert_near(quad.corners[0], (200.0, 100.0), 12.0);
        assert_near(quad.corners[2], (800.0, 500.0), 12.0);
    }

    #[test]
    fn working_scale_is_per_axis() {
        // 1000x301 shrinks to 500x151, so y maps back by 301/151, not by 2.
        let (working, (sx, sy)) = QuadDetector::default().working_image(&canvas(1000, 301));
        assert_eq!(working.dimensions(), (500, 151));
        assert_eq!(sx, 2.0);
        assert!((sy - 301.0 / 151.0).abs() < 1e-12);
    }

    #[test]
    fn specks_are_ignored() {
        let mut image = canvas(400, 300);
        fill_rect(&mut image, 190, 140, 200, 150);
        assert!(QuadDetector::default().detect(&image).is_none());
    }

    #[test]
    fn triangle_is_not_a_document() {
        let mut image = canvas(300, 300);
        for y in 50..250u32 {
            for x in 50..(50 + (y - 50)) {
                image.put_pixel(x, y, Rgb([235, 235, 235]));
            }
        }
        assert!(QuadDetector::default().detect(&image).is_none());
    }

    #[test]
    fn empty_image_is_none() {
        assert!(QuadDetector::default().detect(&RgbImage::new(0, 0)).is_none());
    }
}
