// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// livescan: Desktop replay harness for the live capture pipeline.
//
// Entry point. Initialises logging, loads configuration, and pushes image
// files through the frame pipeline at a fixed rate until a picture has been
// captured and saved.

mod replay;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use livescan_capture::{CaptureDisposition, FrameDisposition, FramePipeline};
use livescan_core::config::ScanConfig;
use livescan_core::error::Result;
use livescan_core::human_errors::humanize_error;
use livescan_core::types::SensorOrientation;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use replay::{ReplayEvent, ReplayFrame, ReplayHost};

/// Replay image files as a live camera feed and auto-capture the document.
#[derive(Parser)]
#[command(name = "livescan", version)]
struct Cli {
    /// Image files to use as preview frames, cycled in order.
    #[arg(long, required = true, num_args = 1..)]
    frames: Vec<PathBuf>,

    /// Frames pushed per second (the pipeline throttles internally).
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u32).range(1..=120))]
    fps: u32,

    /// Give up if nothing was captured after this many seconds.
    #[arg(long, default_value_t = 20)]
    duration_secs: u64,

    /// Rotation from the images' axes to the display. Defaults to the
    /// configured orientation.
    #[arg(long, value_enum)]
    orientation: Option<Orientation>,

    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the captured picture is written to.
    #[arg(long, default_value = ".")]
    output: PathBuf,

    /// Press the shutter right away instead of waiting for auto-capture.
    #[arg(long)]
    manual: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Orientation {
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl From<Orientation> for SensorOrientation {
    fn from(value: Orientation) -> Self {
        match value {
            Orientation::Rotate0 => Self::Rotate0,
            Orientation::Rotate90 => Self::Rotate90,
            Orientation::Rotate180 => Self::Rotate180,
            Orientation::Rotate270 => Self::Rotate270,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("livescan replay starting");

    match run(cli).await {
        Ok(Some(path)) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Ok(None) => {
            tracing::warn!("no picture captured before the time limit");
            ExitCode::from(2)
        }
        Err(err) => {
            let human = humanize_error(&err);
            tracing::error!(error = %err, "replay failed");
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<ScanConfig> {
    let mut config = match &cli.config {
        Some(path) => ScanConfig::load(path)?,
        None => ScanConfig::default(),
    };
    if let Some(orientation) = cli.orientation {
        config.orientation = orientation.into();
    }
    config.validate()?;
    Ok(config)
}

/// Returns the saved picture path, or `None` on timeout.
async fn run(cli: Cli) -> Result<Option<PathBuf>> {
    let config = load_config(&cli)?;
    let jpeg_quality = config.capture.jpeg_quality;
    let frames = cli
        .frames
        .iter()
        .map(ReplayFrame::open)
        .collect::<Result<Vec<_>>>()?;
    std::fs::create_dir_all(&cli.output)?;

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let host = Arc::new(ReplayHost::new(cli.output.clone(), events_tx));
    let pipeline = FramePipeline::start(config, host, &Handle::current())?;

    let mut ticks = time::interval(Duration::from_secs(1) / cli.fps);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let deadline = Instant::now() + Duration::from_secs(cli.duration_secs);
    let mut shown = 0usize;
    let mut manual_pending = cli.manual;

    let outcome = loop {
        tokio::select! {
            _ = ticks.tick() => {
                if Instant::now() >= deadline {
                    break Ok(None);
                }
                let current = &frames[shown % frames.len()];
                let disposition = pipeline.on_frame(current.frame.clone());
                tracing::trace!(frame = shown, ?disposition, "frame offered");
                if disposition == FrameDisposition::Closed {
                    break Ok(None);
                }
                shown += 1;

                if manual_pending {
                    manual_pending = false;
                    if let CaptureDisposition::Requested(id) = pipeline.request_capture() {
                        tracing::info!(%id, "manual capture requested");
                    }
                }
            }
            Some(event) = events.recv() => match event {
                ReplayEvent::CaptureRequested(id) => {
                    // The camera answers with whatever it is looking at.
                    let current = &frames[shown.saturating_sub(1) % frames.len()];
                    let bytes = current.to_jpeg(jpeg_quality)?;
                    tracing::debug!(%id, bytes = bytes.len(), "delivering capture");
                    pipeline.on_capture_complete(bytes);
                }
                ReplayEvent::PictureSaved(path) => break Ok(Some(path)),
                ReplayEvent::CaptureFailed(reason) => {
                    tracing::warn!(%reason, "capture failed, scanning continues");
                }
            },
        }
    };

    pipeline.shutdown();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_replay_arguments() {
        let cli = Cli::try_parse_from([
            "livescan",
            "--frames",
            "a.png",
            "b.png",
            "--fps",
            "10",
            "--orientation",
            "rotate0",
            "--manual",
        ])
        .expect("valid arguments");
        assert_eq!(cli.frames.len(), 2);
        assert_eq!(cli.fps, 10);
        assert!(cli.manual);
        assert_eq!(cli.output, PathBuf::from("."));

        let config = load_config(&cli).expect("default config");
        assert_eq!(config.orientation, SensorOrientation::Rotate0);
    }

    #[test]
    fn frames_are_required() {
        assert!(Cli::try_parse_from(["livescan"]).is_err());
    }

    #[test]
    fn zero_fps_is_rejected() {
        assert!(Cli::try_parse_from(["livescan", "--frames", "a.png", "--fps", "0"]).is_err());
    }
}
