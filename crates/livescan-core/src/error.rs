// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for livescan.

use thiserror::Error;

use crate::types::ErrorClass;

/// Top-level error type for all livescan operations.
#[derive(Debug, Error)]
pub enum LiveScanError {
    // -- Frame / detection errors --
    #[error("frame conversion failed: {0}")]
    FrameConversion(String),

    #[error("quadrilateral detection failed: {0}")]
    Detection(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Capture errors --
    #[error("capture failed: {0}")]
    CaptureFailed(String),

    #[error("capture was not delivered within {0} ms")]
    CaptureTimeout(u64),

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Host bridge --
    #[error("host bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl LiveScanError {
    /// Classify the error for recovery decisions.
    ///
    /// Frame-level failures are transient: the next frame is a fresh attempt.
    /// Capture failures need the operator to hold still and try again.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::FrameConversion(_)
            | Self::Detection(_)
            | Self::ImageError(_)
            | Self::CaptureTimeout(_) => ErrorClass::Transient,

            Self::CaptureFailed(_) => ErrorClass::UserAction,

            Self::Config(_)
            | Self::Serialization(_)
            | Self::Bridge(_)
            | Self::PlatformUnavailable => ErrorClass::Permanent,

            Self::Io(io_err) => match io_err.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    ErrorClass::UserAction
                }
                _ => ErrorClass::Transient,
            },
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LiveScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_errors_are_transient() {
        let err = LiveScanError::FrameConversion("short buffer".into());
        assert_eq!(err.class(), ErrorClass::Transient);
    }

    #[test]
    fn capture_failure_needs_user() {
        let err = LiveScanError::CaptureFailed("shutter jammed".into());
        assert_eq!(err.class(), ErrorClass::UserAction);
    }

    #[test]
    fn missing_config_file_is_user_action() {
        let err = LiveScanError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(err.class(), ErrorClass::UserAction);
    }
}
