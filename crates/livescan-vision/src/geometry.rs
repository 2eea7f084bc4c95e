// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polygon helpers: area, corner ordering, convexity, angles, and the mapping
// from sensor space into display space.

use livescan_core::types::{Point, Quadrilateral, SensorOrientation};

/// Area of a simple polygon via the shoelace formula. Vertices may be in
/// either winding order.
pub fn polygon_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    twice.abs() / 2.0
}

/// Order four corners as `[top-left, top-right, bottom-right, bottom-left]`
/// (clockwise on screen, y pointing down).
///
/// Corners are sorted by angle around their centroid, then rotated so the
/// corner closest to the origin (smallest `x + y`) comes first.
pub fn order_corners(points: [Point; 4]) -> [Point; 4] {
    let cx = points.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / 4.0;

    let mut sorted = points;
    sorted.sort_by(|a, b| {
        let angle_a = (a.y - cy).atan2(a.x - cx);
        let angle_b = (b.y - cy).atan2(b.x - cx);
        angle_a.total_cmp(&angle_b)
    });

    let start = sorted
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (a.x + a.y).total_cmp(&(b.x + b.y)))
        .map_or(0, |(i, _)| i);
    sorted.rotate_left(start);
    sorted
}

/// Whether a closed polygon is strictly convex (all turns share one sign and
/// none are degenerate).
pub fn is_convex(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross.abs() < f64::EPSILON {
            return false;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Interior angle (degrees) at each corner of a quadrilateral.
fn interior_angles(corners: &[Point; 4]) -> [f64; 4] {
    let mut angles = [0.0; 4];
    for (i, angle) in angles.iter_mut().enumerate() {
        let prev = corners[(i + 3) % 4];
        let here = corners[i];
        let next = corners[(i + 1) % 4];
        let (ax, ay) = (prev.x - here.x, prev.y - here.y);
        let (bx, by) = (next.x - here.x, next.y - here.y);
        let norms = ax.hypot(ay) * bx.hypot(by);
        *angle = if norms == 0.0 {
            0.0
        } else {
            ((ax * bx + ay * by) / norms).clamp(-1.0, 1.0).acos().to_degrees()
        };
    }
    angles
}

/// Largest absolute difference between a corner angle and 90 degrees.
pub fn max_right_angle_deviation(corners: &[Point; 4]) -> f64 {
    interior_angles(corners)
        .iter()
        .map(|a| (a - 90.0).abs())
        .fold(0.0, f64::max)
}

/// Map a sensor-space quadrilateral into display space.
///
/// The result's corners are `[top-right, bottom-right, bottom-left,
/// top-left]` on the display, which is the order a 90 degree sensor yields
/// for detector output and what the evaluator's width/height formulas expect.
pub fn to_display(
    quad: &Quadrilateral,
    orientation: SensorOrientation,
    frame_width: u32,
    frame_height: u32,
) -> Quadrilateral {
    let map = |p: &Point| orientation.to_display(*p, frame_width, frame_height);
    let mapped = [
        map(&quad.corners[0]),
        map(&quad.corners[1]),
        map(&quad.corners[2]),
        map(&quad.corners[3]),
    ];
    let mut corners = order_corners(mapped);
    corners.rotate_left(1);
    Quadrilateral::new(corners, quad.contour.iter().map(map).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> [Point; 4] {
        [
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]
    }

    #[test]
    fn shoelace_area_rectangle() {
        assert!((polygon_area(&rect(0.0, 0.0, 10.0, 5.0)) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn area_ignores_winding() {
        let mut points = rect(0.0, 0.0, 4.0, 4.0);
        points.reverse();
        assert!((polygon_area(&points) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn order_corners_from_shuffled() {
        let [tl, tr, br, bl] = rect(10.0, 20.0, 110.0, 220.0);
        let ordered = order_corners([br, tl, bl, tr]);
        assert_eq!(ordered, [tl, tr, br, bl]);
    }

    #[test]
    fn order_corners_tilted() {
        // A diamond-ish quad rotated ~20 degrees.
        let tl = Point::new(30.0, 10.0);
        let tr = Point::new(120.0, 40.0);
        let br = Point::new(95.0, 130.0);
        let bl = Point::new(5.0, 100.0);
        assert_eq!(order_corners([bl, br, tl, tr]), [tl, tr, br, bl]);
    }

    #[test]
    fn convexity() {
        assert!(is_convex(&rect(0.0, 0.0, 5.0, 5.0)));
        let dart = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(3.0, 3.0),
            Point::new(0.0, 10.0),
        ];
        assert!(!is_convex(&dart));
    }

    #[test]
    fn rectangle_angles_are_right() {
        assert!(max_right_angle_deviation(&rect(0.0, 0.0, 30.0, 70.0)) < 1e-9);
    }

    #[test]
    fn skewed_corner_deviates() {
        let mut corners = rect(0.0, 0.0, 100.0, 100.0);
        corners[1].x = 130.0; // top-right pushed out
        assert!(max_right_angle_deviation(&corners) > 10.0);
    }

    #[test]
    fn rotate90_display_order() {
        // Native 1920x1080 sensor, detector order TL, TR, BR, BL.
        let native = Quadrilateral::from_corners(rect(200.0, 100.0, 1700.0, 900.0));
        let display = to_display(&native, SensorOrientation::Rotate90, 1920, 1080);

        // Display is 1080 wide: x' = 1080 - y, y' = x.
        let [p0, p1, p2, p3] = display.corners;
        assert_eq!(p0, Point::new(980.0, 200.0)); // top-right
        assert_eq!(p1, Point::new(980.0, 1700.0)); // bottom-right
        assert_eq!(p2, Point::new(180.0, 1700.0)); // bottom-left
        assert_eq!(p3, Point::new(180.0, 200.0)); // top-left
        assert_eq!(display.contour.len(), 4);
    }

    #[test]
    fn rotate180_display_order() {
        let native = Quadrilateral::from_corners(rect(200.0, 100.0, 1700.0, 900.0));
        let display = to_display(&native, SensorOrientation::Rotate180, 1920, 1080);

        // x' = 1920 - x, y' = 1080 - y.
        assert_eq!(
            display.corners,
            [
                Point::new(1720.0, 180.0),
                Point::new(1720.0, 980.0),
                Point::new(220.0, 980.0),
                Point::new(220.0, 180.0),
            ]
        );
    }

    #[test]
    fn rotate270_display_order() {
        let native = Quadrilateral::from_corners(rect(200.0, 100.0, 1700.0, 900.0));
        let display = to_display(&native, SensorOrientation::Rotate270, 1920, 1080);

        // Display is 1080 wide: x' = y, y' = 1920 - x.
        assert_eq!(
            display.corners,
            [
                Point::new(900.0, 220.0),
                Point::new(900.0, 1720.0),
                Point::new(100.0, 1720.0),
                Point::new(100.0, 220.0),
            ]
        );
    }

    #[test]
    fn rotate0_display_order_starts_top_right() {
        let native = Quadrilateral::from_corners(rect(10.0, 10.0, 50.0, 90.0));
        let display = to_display(&native, SensorOrientation::Rotate0, 100, 100);
        assert_eq!(display.corners[0], Point::new(50.0, 10.0));
        assert_eq!(display.corners[3], Point::new(10.0, 10.0));
    }
}
