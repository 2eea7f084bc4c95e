// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Guidance classifier: an ordered veto cascade over the frame's predicates.
// The first rule that applies decides the hint and whether auto-capture may
// stay armed.

use livescan_core::types::GuidanceState;
use livescan_vision::Assessment;
use serde::{Deserialize, Serialize};

/// What the classification means for the auto-capture timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureAction {
    /// Well framed: arm if idle, keep counting if armed.
    Arm,
    /// Anything else: an armed countdown stops.
    Cancel,
}

/// Result of classifying one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub state: GuidanceState,
    pub action: CaptureAction,
    /// Name of the rule that matched.
    pub rule: &'static str,
}

struct Rule {
    name: &'static str,
    applies: fn(&Assessment) -> bool,
    hint: fn(&Assessment) -> GuidanceState,
    action: CaptureAction,
}

/// Rotate hint unless the document is merely too close.
fn rotate_or_move_away(a: &Assessment) -> GuidanceState {
    if a.rotate_suggested {
        GuidanceState::Rotate
    } else {
        GuidanceState::MoveAway
    }
}

/// Evaluated top to bottom; the last rule always applies.
const RULES: [Rule; 8] = [
    Rule {
        name: "area_beyond_limits",
        applies: |a| a.area_beyond_limits,
        hint: |_| GuidanceState::FindRect,
        action: CaptureAction::Cancel,
    },
    Rule {
        name: "area_below_limit",
        applies: |a| a.area_below_limit,
        hint: |a| {
            if a.edge_touching {
                GuidanceState::MoveAway
            } else if a.rotate_suggested {
                GuidanceState::Rotate
            } else {
                GuidanceState::MoveCloser
            }
        },
        action: CaptureAction::Cancel,
    },
    Rule {
        name: "height_above_limit",
        applies: |a| a.height_above_limit,
        hint: rotate_or_move_away,
        action: CaptureAction::Cancel,
    },
    // Same outcome as the height rule; kept as its own entry so logs say
    // which limit tripped.
    Rule {
        name: "width_or_area_above_limit",
        applies: |a| a.width_above_limit || a.area_above_secondary,
        hint: rotate_or_move_away,
        action: CaptureAction::Cancel,
    },
    Rule {
        name: "edge_touching",
        applies: |a| a.edge_touching,
        hint: |_| GuidanceState::MoveAway,
        action: CaptureAction::Cancel,
    },
    Rule {
        name: "angle_not_correct",
        applies: |a| a.angle_not_correct,
        hint: |_| GuidanceState::AdjustAngle,
        action: CaptureAction::Cancel,
    },
    Rule {
        name: "rotate_suggested",
        applies: |a| a.rotate_suggested,
        hint: |_| GuidanceState::Rotate,
        action: CaptureAction::Cancel,
    },
    Rule {
        name: "ready",
        applies: |_| true,
        hint: |_| GuidanceState::CapturingImage,
        action: CaptureAction::Arm,
    },
];

/// Classify a frame that produced a quadrilateral.
pub fn classify(assessment: &Assessment) -> Classification {
    RULES
        .iter()
        .find(|rule| (rule.applies)(assessment))
        .map_or(NOTHING_FOUND, |rule| Classification {
            state: (rule.hint)(assessment),
            action: rule.action,
            rule: rule.name,
        })
}

/// Classification for a frame with no quadrilateral, or one that failed to
/// process.
pub fn classify_missing() -> Classification {
    NOTHING_FOUND
}

const NOTHING_FOUND: Classification = Classification {
    state: GuidanceState::FindRect,
    action: CaptureAction::Cancel,
    rule: "no_quadrilateral",
};

#[cfg(test)]
mod tests {
    use super::*;
    use livescan_core::config::GuidanceThresholds;
    use livescan_core::types::{Point, Quadrilateral};
    use livescan_vision::FrameMetrics;

    fn everything() -> Assessment {
        Assessment {
            area_beyond_limits: true,
            area_below_limit: true,
            height_above_limit: true,
            width_above_limit: true,
            area_above_secondary: true,
            edge_touching: true,
            angle_not_correct: true,
            rotate_suggested: true,
        }
    }

    #[test]
    fn beyond_limits_wins_over_everything() {
        let c = classify(&everything());
        assert_eq!(c.state, GuidanceState::FindRect);
        assert_eq!(c.action, CaptureAction::Cancel);
        assert_eq!(c.rule, "area_beyond_limits");
    }

    #[test]
    fn clean_frame_is_ready() {
        let c = classify(&Assessment::default());
        assert_eq!(c.state, GuidanceState::CapturingImage);
        assert_eq!(c.action, CaptureAction::Arm);
        assert_eq!(c.rule, "ready");
    }

    #[test]
    fn too_small_variants() {
        let small = Assessment {
            area_below_limit: true,
            ..Assessment::default()
        };
        assert_eq!(classify(&small).state, GuidanceState::MoveCloser);

        let small_rotated = Assessment {
            rotate_suggested: true,
            ..small
        };
        assert_eq!(classify(&small_rotated).state, GuidanceState::Rotate);

        let small_cropped = Assessment {
            edge_touching: true,
            ..small_rotated
        };
        assert_eq!(classify(&small_cropped).state, GuidanceState::MoveAway);
    }

    #[test]
    fn too_tall_and_too_wide_share_an_outcome() {
        let tall = Assessment {
            height_above_limit: true,
            ..Assessment::default()
        };
        let wide = Assessment {
            width_above_limit: true,
            ..Assessment::default()
        };
        let close = Assessment {
            area_above_secondary: true,
            ..Assessment::default()
        };
        assert_eq!(classify(&tall).state, GuidanceState::MoveAway);
        assert_eq!(classify(&wide).state, GuidanceState::MoveAway);
        assert_eq!(classify(&close).state, GuidanceState::MoveAway);
        assert_eq!(classify(&tall).rule, "height_above_limit");
        assert_eq!(classify(&wide).rule, "width_or_area_above_limit");

        let wide_strip = Assessment {
            rotate_suggested: true,
            ..wide
        };
        assert_eq!(classify(&wide_strip).state, GuidanceState::Rotate);
    }

    #[test]
    fn later_rules_in_order() {
        let edge = Assessment {
            edge_touching: true,
            angle_not_correct: true,
            rotate_suggested: true,
            ..Assessment::default()
        };
        assert_eq!(classify(&edge).state, GuidanceState::MoveAway);

        let angle = Assessment {
            angle_not_correct: true,
            rotate_suggested: true,
            ..Assessment::default()
        };
        assert_eq!(classify(&angle).state, GuidanceState::AdjustAngle);

        let rotate = Assessment {
            rotate_suggested: true,
            ..Assessment::default()
        };
        assert_eq!(classify(&rotate).state, GuidanceState::Rotate);
    }

    #[test]
    fn only_ready_arms() {
        // Walk every single-predicate assessment: none of them may arm.
        let fields: [fn(&mut Assessment); 8] = [
            |a| a.area_beyond_limits = true,
            |a| a.area_below_limit = true,
            |a| a.height_above_limit = true,
            |a| a.width_above_limit = true,
            |a| a.area_above_secondary = true,
            |a| a.edge_touching = true,
            |a| a.angle_not_correct = true,
            |a| a.rotate_suggested = true,
        ];
        for set in fields {
            let mut a = Assessment::default();
            set(&mut a);
            let c = classify(&a);
            assert_eq!(c.action, CaptureAction::Cancel, "{a:?}");
            assert_ne!(c.state, GuidanceState::CapturingImage);
        }
    }

    #[test]
    fn missing_quad_is_find_rect() {
        let c = classify_missing();
        assert_eq!(c.state, GuidanceState::FindRect);
        assert_eq!(c.action, CaptureAction::Cancel);
    }

    #[test]
    fn rule_order_is_stable() {
        let names: Vec<_> = RULES.iter().map(|rule| rule.name).collect();
        assert_eq!(names.first(), Some(&"area_beyond_limits"));
        assert_eq!(names.last(), Some(&"ready"));
        assert_eq!(names.len(), 8);
    }

    // Portrait preview with a centred document covering half of it.
    fn framed_document(left_inset: f64) -> Quadrilateral {
        let (w, h): (f64, f64) = (1080.0, 1920.0);
        let area = 0.5 * w * h;
        let doc_w = (area / 1.3).sqrt();
        let doc_h = area / doc_w;
        let shear = doc_h * 2f64.to_radians().tan() / 2.0;
        let left = (w - doc_w) / 2.0;
        let top = (h - doc_h) / 2.0;
        Quadrilateral::from_corners([
            Point::new(left + doc_w + shear, top),
            Point::new(left + doc_w - shear, top + doc_h),
            Point::new(left - shear, top + doc_h),
            Point::new(left_inset.min(left + shear), top),
        ])
    }

    #[test]
    fn centred_document_is_ready() {
        let metrics = FrameMetrics::evaluate(&framed_document(f64::MAX), 1080, 1920);
        let c = classify(&metrics.assess(&GuidanceThresholds::default()));
        assert_eq!(c.state, GuidanceState::CapturingImage);
    }

    #[test]
    fn corner_on_left_border_moves_away() {
        let metrics = FrameMetrics::evaluate(&framed_document(0.0), 1080, 1920);
        let c = classify(&metrics.assess(&GuidanceThresholds::default()));
        assert_eq!(c.state, GuidanceState::MoveAway);
        assert_eq!(c.action, CaptureAction::Cancel);
    }
}
