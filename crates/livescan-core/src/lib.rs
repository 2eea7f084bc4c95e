// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// livescan: Core types, configuration, and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod overlay;
pub mod types;

pub use config::ScanConfig;
pub use error::LiveScanError;
pub use overlay::{Overlay, OverlayStyle, Rgba};
pub use types::*;
