// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Captured picture post-processing: decode the camera's bytes, bound the
// resolution, and rotate the result upright.

use std::path::Path;

use chrono::{DateTime, Utc};
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use livescan_core::config::CaptureConfig;
use livescan_core::error::{LiveScanError, Result};
use livescan_core::types::{CaptureId, SensorOrientation};
use tracing::{debug, info, instrument};

/// A delivered capture, decoded and ready for the consumer.
#[derive(Debug, Clone)]
pub struct CapturedPicture {
    id: CaptureId,
    captured_at: DateTime<Utc>,
    image: DynamicImage,
}

impl CapturedPicture {
    /// Decode raw camera bytes (JPEG, PNG, ...) into an upright picture no
    /// larger than `config.max_dimension` on either side.
    #[instrument(skip(data, config), fields(data_len = data.len(), %id))]
    pub fn decode(
        id: CaptureId,
        data: &[u8],
        config: &CaptureConfig,
        orientation: SensorOrientation,
    ) -> Result<Self> {
        let image = image::load_from_memory(data).map_err(|err| {
            LiveScanError::ImageError(format!("failed to decode captured picture: {err}"))
        })?;
        debug!(width = image.width(), height = image.height(), "capture decoded");

        let image = orient(downsample(image, config.max_dimension), orientation);
        info!(
            width = image.width(),
            height = image.height(),
            rotation = orientation.degrees(),
            "captured picture ready"
        );

        Ok(Self {
            id,
            captured_at: Utc::now(),
            image,
        })
    }

    /// Wrap an already upright image.
    pub fn from_dynamic(id: CaptureId, image: DynamicImage) -> Self {
        Self {
            id,
            captured_at: Utc::now(),
            image,
        }
    }

    pub fn id(&self) -> CaptureId {
        self.id
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode as JPEG with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| LiveScanError::ImageError(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// Save to `path`; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            LiveScanError::ImageError(format!(
                "failed to save picture to {}: {err}",
                path.as_ref().display()
            ))
        })
    }
}

/// Shrink so neither side exceeds `max_dimension`, keeping the aspect ratio.
fn downsample(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    if image.width() <= max_dimension && image.height() <= max_dimension {
        return image;
    }
    debug!(
        from_w = image.width(),
        from_h = image.height(),
        max_dimension,
        "downsampling capture"
    );
    image.resize(max_dimension, max_dimension, FilterType::Triangle)
}

fn orient(image: DynamicImage, orientation: SensorOrientation) -> DynamicImage {
    match orientation {
        SensorOrientation::Rotate0 => image,
        SensorOrientation::Rotate90 => image.rotate90(),
        SensorOrientation::Rotate180 => image.rotate180(),
        SensorOrientation::Rotate270 => image.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_pixel(width, height, Rgb([200, 180, 160]));
        CapturedPicture::from_dynamic(CaptureId::new(), DynamicImage::ImageRgb8(image))
            .to_jpeg_bytes(90)
            .expect("encode")
    }

    #[test]
    fn rotate90_swaps_dimensions() {
        let id = CaptureId::new();
        let picture = CapturedPicture::decode(
            id,
            &jpeg(64, 32),
            &CaptureConfig::default(),
            SensorOrientation::Rotate90,
        )
        .expect("decode");
        assert_eq!((picture.width(), picture.height()), (32, 64));
        assert_eq!(picture.id(), id);
    }

    #[test]
    fn large_pictures_are_bounded() {
        let config = CaptureConfig {
            max_dimension: 40,
            ..CaptureConfig::default()
        };
        let picture = CapturedPicture::decode(
            CaptureId::new(),
            &jpeg(160, 80),
            &config,
            SensorOrientation::Rotate0,
        )
        .expect("decode");
        assert_eq!((picture.width(), picture.height()), (40, 20));
    }

    #[test]
    fn garbage_bytes_are_image_errors() {
        let result = CapturedPicture::decode(
            CaptureId::new(),
            b"not a picture",
            &CaptureConfig::default(),
            SensorOrientation::Rotate90,
        );
        assert!(matches!(result, Err(LiveScanError::ImageError(_))));
    }

    #[test]
    fn jpeg_has_magic_bytes() {
        let bytes = jpeg(8, 8);
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
