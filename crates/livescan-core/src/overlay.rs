// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay shapes and the fixed guidance colour palette.

use serde::{Deserialize, Serialize};

use crate::types::{GuidanceState, Point};

/// Border stroke width in display pixels.
pub const BORDER_STROKE_WIDTH: f32 = 12.0;

/// An 8-bit colour with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::argb(0, 0, 0, 0);

    pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::argb(255, r, g, b)
    }
}

/// Fill and border colours for the quadrilateral overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub fill: Rgba,
    pub border: Rgba,
    pub stroke_width: f32,
}

impl OverlayStyle {
    /// Colour scheme associated with a guidance state.
    ///
    /// Attention hints are translucent red, the ready state is translucent
    /// green, and searching draws nothing visible.
    pub fn for_state(state: GuidanceState) -> Self {
        let (fill, border) = match state {
            GuidanceState::MoveCloser
            | GuidanceState::MoveAway
            | GuidanceState::Rotate
            | GuidanceState::AdjustAngle => (Rgba::argb(30, 255, 38, 0), Rgba::rgb(255, 38, 0)),
            GuidanceState::CapturingImage => (Rgba::argb(30, 38, 216, 76), Rgba::rgb(38, 216, 76)),
            GuidanceState::FindRect | GuidanceState::NoMessage => {
                (Rgba::TRANSPARENT, Rgba::TRANSPARENT)
            }
        };
        Self {
            fill,
            border,
            stroke_width: BORDER_STROKE_WIDTH,
        }
    }

    pub fn is_invisible(&self) -> bool {
        self.fill.a == 0 && self.border.a == 0
    }
}

/// A quadrilateral ready to draw, in display (preview) coordinates.
///
/// `frame_width`/`frame_height` give the coordinate space so the UI can
/// scale the shape onto its own view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub corners: [Point; 4],
    pub frame_width: u32,
    pub frame_height: u32,
    pub style: OverlayStyle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attention_states_are_red() {
        for state in [
            GuidanceState::MoveCloser,
            GuidanceState::MoveAway,
            GuidanceState::Rotate,
            GuidanceState::AdjustAngle,
        ] {
            let style = OverlayStyle::for_state(state);
            assert_eq!(style.border, Rgba::rgb(255, 38, 0), "{state}");
            assert_eq!(style.fill.a, 30);
        }
    }

    #[test]
    fn ready_state_is_green() {
        let style = OverlayStyle::for_state(GuidanceState::CapturingImage);
        assert_eq!(style.fill, Rgba::argb(30, 38, 216, 76));
        assert_eq!(style.border, Rgba::rgb(38, 216, 76));
    }

    #[test]
    fn searching_is_invisible() {
        assert!(OverlayStyle::for_state(GuidanceState::FindRect).is_invisible());
        assert!(OverlayStyle::for_state(GuidanceState::NoMessage).is_invisible());
    }
}
