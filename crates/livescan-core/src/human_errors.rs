// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the person holding the camera.
//
// Every technical error is mapped to plain English with a clear suggestion.

use crate::error::LiveScanError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A single frame went wrong; scanning carries on by itself.
    Transient,
    /// The operator has to do something (retake, hold still, change mode).
    ActionRequired,
    /// Cannot be fixed by retrying: bad configuration or missing hardware.
    Permanent,
}

/// A human-readable error with a plain message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the operator should try (shown as body text).
    pub suggestion: String,
    /// Whether scanning recovers without intervention.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `LiveScanError` into text the operator can act on.
pub fn humanize_error(err: &LiveScanError) -> HumanError {
    match err {
        LiveScanError::FrameConversion(_)
        | LiveScanError::Detection(_)
        | LiveScanError::ImageError(_) => HumanError {
            message: "Still looking for your document.".into(),
            suggestion: "Place the document on a contrasting surface with good lighting.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        LiveScanError::CaptureFailed(detail) => HumanError {
            message: "We couldn't take the picture.".into(),
            suggestion: format!("Hold the device steady and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LiveScanError::CaptureTimeout(_) => HumanError {
            message: "The camera took too long to take the picture.".into(),
            suggestion: "Scanning will resume in a moment. Keep the document in view.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        LiveScanError::Config(detail) => HumanError {
            message: "The scanner settings are invalid.".into(),
            suggestion: format!("Reset the scanner settings to their defaults. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        LiveScanError::Io(io_err) => HumanError {
            message: "A file couldn't be read or written.".into(),
            suggestion: format!("Check storage permissions and free space. ({io_err})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LiveScanError::Serialization(detail) => HumanError {
            message: "The scanner settings file is damaged.".into(),
            suggestion: format!("Delete the settings file to restore defaults. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        LiveScanError::Bridge(detail) => HumanError {
            message: "The camera stopped responding.".into(),
            suggestion: format!("Close other apps using the camera and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        LiveScanError::PlatformUnavailable => HumanError {
            message: "No camera is available on this device.".into(),
            suggestion: "Pick an existing photo of the document instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
