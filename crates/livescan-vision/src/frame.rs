// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raw sensor frame -> RGB image conversion.

use image::{Rgb, RgbImage};
use livescan_core::error::{LiveScanError, Result};
use livescan_core::types::{Frame, PixelEncoding};
use tracing::trace;

/// Convert a raw sensor frame into an 8-bit RGB image.
///
/// Fails if the frame has a zero dimension or its buffer is shorter than the
/// encoding requires. Trailing padding bytes are ignored.
pub fn to_rgb_image(frame: &Frame) -> Result<RgbImage> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 {
        return Err(LiveScanError::FrameConversion(format!(
            "empty frame {width}x{height}"
        )));
    }

    let required = frame.encoding().required_len(width, height);
    let data = frame.data();
    if data.len() < required {
        return Err(LiveScanError::FrameConversion(format!(
            "{:?} frame {width}x{height} needs {required} bytes, got {}",
            frame.encoding(),
            data.len()
        )));
    }

    trace!(width, height, encoding = ?frame.encoding(), "converting frame");

    let image = match frame.encoding() {
        PixelEncoding::Nv21 => nv21_to_rgb(&data[..required], width, height),
        PixelEncoding::Rgb888 => RgbImage::from_raw(width, height, data[..required].to_vec())
            .ok_or_else(|| LiveScanError::FrameConversion("RGB buffer rejected".into()))?,
        PixelEncoding::Rgba8888 => RgbImage::from_fn(width, height, |x, y| {
            let i = pixel_index(x, y, width, 4);
            Rgb([data[i], data[i + 1], data[i + 2]])
        }),
        PixelEncoding::Gray8 => RgbImage::from_fn(width, height, |x, y| {
            let v = data[pixel_index(x, y, width, 1)];
            Rgb([v, v, v])
        }),
    };
    Ok(image)
}

/// NV21 (Y plane + interleaved VU at quarter resolution) to RGB using the
/// full-range BT.601 matrix cameras emit.
fn nv21_to_rgb(data: &[u8], width: u32, height: u32) -> RgbImage {
    let w = width as usize;
    let luma_len = w * height as usize;
    let chroma_stride = w.div_ceil(2) * 2;

    RgbImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let luma = i32::from(data[y * w + x]);
        let uv = luma_len + (y / 2) * chroma_stride + (x / 2) * 2;
        let v = i32::from(data[uv]) - 128;
        let u = i32::from(data[uv + 1]) - 128;

        // Fixed-point coefficients scaled by 1024.
        let r = luma + ((1436 * v) >> 10);
        let g = luma - ((352 * u + 731 * v) >> 10);
        let b = luma + ((1815 * u) >> 10);
        Rgb([clamp_u8(r), clamp_u8(g), clamp_u8(b)])
    })
}

/// Byte offset of pixel `(x, y)` in a packed buffer. Computed in `usize` so
/// large frames do not wrap.
fn pixel_index(x: u32, y: u32, width: u32, channels: usize) -> usize {
    (y as usize * width as usize + x as usize) * channels
}

fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nv21_uniform(width: u32, height: u32, y: u8, v: u8, u: u8) -> Frame {
        let mut data = vec![y; (width * height) as usize];
        let chroma_pairs = (width.div_ceil(2) * height.div_ceil(2)) as usize;
        for _ in 0..chroma_pairs {
            data.push(v);
            data.push(u);
        }
        Frame::new(data, width, height, PixelEncoding::Nv21)
    }

    #[test]
    fn nv21_neutral_chroma_is_gray() {
        let frame = nv21_uniform(6, 4, 120, 128, 128);
        let rgb = to_rgb_image(&frame).expect("conversion");
        assert_eq!(rgb.dimensions(), (6, 4));
        for pixel in rgb.pixels() {
            assert_eq!(pixel.0, [120, 120, 120]);
        }
    }

    #[test]
    fn nv21_red_chroma_pushes_red() {
        // High V (Cr) means red.
        let frame = nv21_uniform(4, 4, 100, 200, 128);
        let rgb = to_rgb_image(&frame).expect("conversion");
        let [r, g, b] = rgb.get_pixel(0, 0).0;
        assert!(r > 180, "red channel {r}");
        assert!(g < 100, "green channel {g}");
        assert_eq!(b, 100);
    }

    #[test]
    fn nv21_odd_dimensions_convert() {
        let frame = nv21_uniform(5, 3, 60, 128, 128);
        let rgb = to_rgb_image(&frame).expect("conversion");
        assert_eq!(rgb.get_pixel(4, 2).0, [60, 60, 60]);
    }

    #[test]
    fn rgba_drops_alpha() {
        let data = vec![10, 20, 30, 255, 40, 50, 60, 0];
        let frame = Frame::new(data, 2, 1, PixelEncoding::Rgba8888);
        let rgb = to_rgb_image(&frame).expect("conversion");
        assert_eq!(rgb.get_pixel(0, 0).0, [10, 20, 30]);
        assert_eq!(rgb.get_pixel(1, 0).0, [40, 50, 60]);
    }

    #[test]
    fn gray_is_replicated() {
        let frame = Frame::new(vec![7, 200], 1, 2, PixelEncoding::Gray8);
        let rgb = to_rgb_image(&frame).expect("conversion");
        assert_eq!(rgb.get_pixel(0, 1).0, [200, 200, 200]);
    }

    #[test]
    fn pixel_offsets_do_not_wrap() {
        // Past u32::MAX bytes for a 40000x40000 RGBA frame.
        assert_eq!(pixel_index(1, 40_000, 40_000, 4), 6_400_000_004);
        assert_eq!(pixel_index(3, 2, 5, 1), 13);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let frame = Frame::new(vec![0; 10], 4, 4, PixelEncoding::Nv21);
        assert!(matches!(
            to_rgb_image(&frame),
            Err(LiveScanError::FrameConversion(_))
        ));
    }

    #[test]
    fn empty_frame_is_rejected() {
        let frame = Frame::new(Vec::new(), 0, 10, PixelEncoding::Gray8);
        assert!(to_rgb_image(&frame).is_err());
    }
}
