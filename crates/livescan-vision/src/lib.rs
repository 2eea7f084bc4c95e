// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// livescan-vision: Pixel-level work for the capture engine.
//
// Converts raw sensor frames into colour images, finds the largest
// document-shaped quadrilateral, measures it against the preview, and decodes
// the final captured picture.

pub mod detect;
pub mod evaluate;
pub mod frame;
pub mod geometry;
pub mod picture;

pub use detect::QuadDetector;
pub use evaluate::{Assessment, FrameMetrics};
pub use frame::to_rgb_image;
pub use picture::CapturedPicture;
