// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Frame pipeline controller.
//
// The host pushes raw preview frames in from its camera thread. The
// controller throttles them, hands at most one to a background worker for
// conversion, detection, evaluation, and classification, and publishes the
// result as an immutable snapshot. A dispatcher task forwards snapshots to
// the host's guidance display; a ticker task drives the auto-capture
// countdown.
//
// Lock order: `control` before `scheduler`. Neither lock is held across an
// `.await` or a host callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use livescan_bridge::ScanHost;
use livescan_core::config::ScanConfig;
use livescan_core::error::{LiveScanError, Result};
use livescan_core::overlay::{Overlay, OverlayStyle};
use livescan_core::types::{
    AcquisitionMode, CaptureArmState, CaptureId, Frame, GuidanceState, Quadrilateral,
};
use livescan_vision::{CapturedPicture, FrameMetrics, QuadDetector, geometry, to_rgb_image};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::classify::{Classification, classify, classify_missing};
use crate::scheduler::{CaptureScheduler, SchedulerEvent};
use crate::throttle::FrameThrottle;

/// Everything learned from one analysed frame. Published whole; never
/// mutated after publication.
#[derive(Debug, Clone, Serialize)]
pub struct FrameAnalysis {
    /// Increases by one per published analysis.
    pub sequence: u64,
    pub classification: Classification,
    /// Display-space quadrilateral, if one was found.
    pub quadrilateral: Option<Quadrilateral>,
    pub metrics: Option<FrameMetrics>,
    pub overlay: Option<Overlay>,
}

impl FrameAnalysis {
    pub fn guidance(&self) -> GuidanceState {
        self.classification.state
    }
}

/// What happened to a frame handed to [`FramePipeline::on_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDisposition {
    /// Queued for analysis.
    Accepted,
    /// Arrived sooner than the frame interval allows.
    Throttled,
    /// A frame is already waiting for the worker.
    Busy,
    Ignored(IgnoreReason),
    /// The pipeline has been shut down.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Acquisition mode is not live detection.
    NotDetecting,
    /// A picture is being taken; the preview is paused until it arrives.
    CaptureInFlight,
}

/// Outcome of a manual capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureDisposition {
    Requested(CaptureId),
    /// Another capture is pending or cooling down.
    Dropped,
    /// Not in live detection mode.
    Ignored,
}

/// What the guidance display should currently show.
#[derive(Debug, Clone)]
enum Feedback {
    /// No hint and no overlay.
    Idle,
    Analysis(Arc<FrameAnalysis>),
}

struct Job {
    frame: Frame,
    epoch: u64,
}

/// A detection mapped into display space.
struct Detection {
    quad: Quadrilateral,
    metrics: FrameMetrics,
    preview_width: u32,
    preview_height: u32,
}

struct Control {
    mode: AcquisitionMode,
    throttle: FrameThrottle,
    /// Bumped whenever earlier analyses must no longer be shown.
    epoch: u64,
    closed: bool,
}

struct Shared {
    config: ScanConfig,
    detector: QuadDetector,
    host: Arc<dyn ScanHost>,
    control: Mutex<Control>,
    scheduler: Mutex<CaptureScheduler>,
    feedback: watch::Sender<Feedback>,
    sequence: AtomicU64,
}

/// Live document detection pipeline. See the module docs for the threading
/// model.
pub struct FramePipeline {
    shared: Arc<Shared>,
    jobs: mpsc::Sender<Job>,
    runtime: Handle,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl FramePipeline {
    /// Validate `config` and spawn the worker, feedback dispatcher, and
    /// scheduler ticker on `runtime`.
    pub fn start(config: ScanConfig, host: Arc<dyn ScanHost>, runtime: &Handle) -> Result<Self> {
        config.validate()?;

        let (jobs_tx, jobs_rx) = mpsc::channel(1);
        let (feedback_tx, feedback_rx) = watch::channel(Feedback::Idle);

        let shared = Arc::new(Shared {
            detector: QuadDetector::new(config.detection.clone()),
            control: Mutex::new(Control {
                mode: AcquisitionMode::DetectionMode,
                throttle: FrameThrottle::new(config.timing.frame_interval()),
                epoch: 0,
                closed: false,
            }),
            scheduler: Mutex::new(CaptureScheduler::new(&config.timing)),
            feedback: feedback_tx,
            sequence: AtomicU64::new(0),
            host: Arc::clone(&host),
            config,
        });

        let tasks = vec![
            runtime.spawn(run_worker(Arc::clone(&shared), jobs_rx)),
            runtime.spawn(dispatch_feedback(host, feedback_rx)),
            runtime.spawn(run_ticker(Arc::clone(&shared))),
        ];

        info!(
            platform = shared.host.platform_name(),
            orientation = ?shared.config.orientation,
            frame_interval_ms = shared.config.timing.frame_interval_ms,
            "frame pipeline started"
        );

        Ok(Self {
            shared,
            jobs: jobs_tx,
            runtime: runtime.clone(),
            tasks: Mutex::new(tasks),
        })
    }

    /// Offer a preview frame. Never blocks; safe to call from the camera
    /// thread at any rate.
    pub fn on_frame(&self, frame: Frame) -> FrameDisposition {
        let now = Instant::now();
        let epoch = {
            let mut control = self.shared.control();
            if control.closed {
                return FrameDisposition::Closed;
            }
            if control.mode != AcquisitionMode::DetectionMode {
                return FrameDisposition::Ignored(IgnoreReason::NotDetecting);
            }
            if self.shared.scheduler().pending_capture().is_some() {
                return FrameDisposition::Ignored(IgnoreReason::CaptureInFlight);
            }
            if !control.throttle.admit(now) {
                return FrameDisposition::Throttled;
            }
            control.epoch
        };

        match self.jobs.try_send(Job { frame, epoch }) {
            Ok(()) => FrameDisposition::Accepted,
            Err(TrySendError::Full(_)) => {
                trace!("worker busy, frame dropped");
                FrameDisposition::Busy
            }
            Err(TrySendError::Closed(_)) => FrameDisposition::Closed,
        }
    }

    /// Switch acquisition mode. Any change cancels an armed countdown,
    /// discards analyses still in flight, and clears the hint and overlay.
    pub fn set_acquisition_mode(&self, mode: AcquisitionMode) {
        let event = {
            let mut control = self.shared.control();
            if control.mode == mode {
                return;
            }
            info!(from = ?control.mode, to = ?mode, "acquisition mode changed");
            control.mode = mode;
            control.epoch += 1;
            control.throttle.reset();
            let event = self.shared.scheduler().cancel();
            self.shared.feedback.send_replace(Feedback::Idle);
            event
        };
        if let Some(event) = event {
            self.shared.handle_event(event);
        }
    }

    /// Manual shutter press, subject to the same one-capture-at-a-time guard
    /// as auto-capture.
    pub fn request_capture(&self) -> CaptureDisposition {
        let event = {
            let control = self.shared.control();
            if control.closed || control.mode != AcquisitionMode::DetectionMode {
                debug!(mode = ?control.mode, "manual capture ignored");
                return CaptureDisposition::Ignored;
            }
            self.shared.scheduler().fire_now(Instant::now())
        };
        match event {
            Some(SchedulerEvent::Fired { id, .. }) => {
                self.shared.issue_capture(id);
                CaptureDisposition::Requested(id)
            }
            _ => CaptureDisposition::Dropped,
        }
    }

    /// Raw bytes of the picture the camera took.
    ///
    /// Decoding happens on the runtime's blocking pool. Returns the capture
    /// the bytes were attributed to, or `None` if no capture was waiting for
    /// them (they are dropped).
    pub fn on_capture_complete(&self, data: Vec<u8>) -> Option<CaptureId> {
        let id = self.shared.claim_pending(true)?;
        debug!(%id, bytes = data.len(), "capture bytes received");

        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(async move {
            let decode = Arc::clone(&shared);
            let picture = task::spawn_blocking(move || {
                CapturedPicture::decode(
                    id,
                    &data,
                    &decode.config.capture,
                    decode.config.orientation,
                )
            })
            .await
            .unwrap_or_else(|err| {
                Err(LiveScanError::ImageError(format!("decode task failed: {err}")))
            });
            shared.deliver(id, picture);
        });
        Some(id)
    }

    /// The camera could not take the pending picture.
    pub fn on_capture_failed(&self, reason: impl Into<String>) -> Option<CaptureId> {
        let id = self.shared.claim_pending(false)?;
        let err = LiveScanError::CaptureFailed(reason.into());
        warn!(%id, error = %err, "capture failed");
        self.shared.host.on_capture_failed(Some(id), &err);
        self.shared.settle(id);
        Some(id)
    }

    /// Most recently published analysis, if any is current.
    pub fn latest(&self) -> Option<Arc<FrameAnalysis>> {
        match &*self.shared.feedback.borrow() {
            Feedback::Analysis(analysis) => Some(Arc::clone(analysis)),
            Feedback::Idle => None,
        }
    }

    pub fn capture_state(&self) -> CaptureArmState {
        self.shared.scheduler().state()
    }

    pub fn acquisition_mode(&self) -> AcquisitionMode {
        self.shared.control().mode
    }

    /// Stop all background tasks. Later frames report `Closed`.
    pub fn shutdown(&self) {
        {
            let mut control = self.shared.control();
            if control.closed {
                return;
            }
            control.closed = true;
            self.shared.scheduler().cancel();
        }
        self.abort_tasks();
        info!("frame pipeline shut down");
    }

    fn abort_tasks(&self) {
        for task in lock(&self.tasks).drain(..) {
            task.abort();
        }
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn control(&self) -> MutexGuard<'_, Control> {
        lock(&self.control)
    }

    fn scheduler(&self) -> MutexGuard<'_, CaptureScheduler> {
        lock(&self.scheduler)
    }

    /// Conversion, detection, and evaluation for one frame. Runs on the
    /// blocking pool.
    fn analyse(&self, frame: &Frame) -> Result<Option<Detection>> {
        let rgb = to_rgb_image(frame)?;
        let Some(native) = self.detector.detect(&rgb) else {
            return Ok(None);
        };

        let orientation = self.config.orientation;
        let (width, height) = (frame.width(), frame.height());
        let (preview_width, preview_height) = orientation.display_size(width, height);
        let quad = geometry::to_display(&native, orientation, width, height);
        let metrics = FrameMetrics::evaluate(&quad, preview_width, preview_height);
        Ok(Some(Detection {
            quad,
            metrics,
            preview_width,
            preview_height,
        }))
    }

    /// Classify an analysis, feed the scheduler, and publish the snapshot.
    fn publish(&self, epoch: u64, outcome: Result<Option<Detection>>) {
        let detection = outcome.unwrap_or_else(|err| {
            warn!(error = %err, "frame analysis failed, frame dropped");
            None
        });
        let classification = match &detection {
            Some(d) => classify(&d.metrics.assess(&self.config.thresholds)),
            None => classify_missing(),
        };

        let event = {
            let control = self.control();
            if control.closed
                || control.epoch != epoch
                || control.mode != AcquisitionMode::DetectionMode
            {
                debug!(epoch, current = control.epoch, "stale analysis discarded");
                return;
            }
            let event = {
                let mut scheduler = self.scheduler();
                if scheduler.pending_capture().is_some() {
                    debug!("capture in flight, analysis discarded");
                    return;
                }
                scheduler.on_state(classification.state, Instant::now())
            };

            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
            let overlay = detection.as_ref().map(|d| Overlay {
                corners: d.quad.corners,
                frame_width: d.preview_width,
                frame_height: d.preview_height,
                style: OverlayStyle::for_state(classification.state),
            });
            debug!(
                sequence,
                guidance = %classification.state,
                rule = classification.rule,
                area_ratio = detection.as_ref().map(|d| d.metrics.area_ratio()),
                "frame classified"
            );
            let (quadrilateral, metrics) = match detection {
                Some(d) => (Some(d.quad), Some(d.metrics)),
                None => (None, None),
            };
            self.feedback
                .send_replace(Feedback::Analysis(Arc::new(FrameAnalysis {
                    sequence,
                    classification,
                    quadrilateral,
                    metrics,
                    overlay,
                })));
            event
        };

        if let Some(event) = event {
            self.handle_event(event);
        }
    }

    fn handle_event(&self, event: SchedulerEvent) {
        match event {
            SchedulerEvent::Fired { id, .. } => self.issue_capture(id),
            SchedulerEvent::CaptureTimedOut { id, .. } => {
                let err = LiveScanError::CaptureTimeout(self.config.timing.capture_timeout_ms);
                self.host.on_capture_failed(Some(id), &err);
            }
            other => trace!(event = ?other, "scheduler transition"),
        }
    }

    /// Ask the host camera for a picture. A refused request counts as a
    /// failed capture and starts the cool-down straight away.
    fn issue_capture(&self, id: CaptureId) {
        if let Err(err) = self.host.request_capture(id) {
            warn!(%id, error = %err, "camera refused capture request");
            self.host.on_capture_failed(Some(id), &err);
            self.settle(id);
        }
    }

    /// The pending capture, if the camera has not answered it yet.
    /// `decoding` records that its bytes arrived, which stops the capture
    /// timeout and turns away any second answer.
    fn claim_pending(&self, decoding: bool) -> Option<CaptureId> {
        let mut scheduler = self.scheduler();
        let claimed = if decoding {
            scheduler.capture_received()
        } else {
            scheduler.awaiting_bytes()
        };
        if claimed.is_none() {
            debug!("no capture awaiting delivery, ignored");
        }
        claimed
    }

    fn deliver(&self, id: CaptureId, picture: Result<CapturedPicture>) {
        match picture {
            Ok(picture) => {
                {
                    let mut control = self.control();
                    control.epoch += 1;
                    self.feedback.send_replace(Feedback::Idle);
                }
                info!(%id, width = picture.width(), height = picture.height(), "capture delivered");
                self.host.on_picture(picture);
            }
            Err(err) => {
                warn!(%id, error = %err, "captured picture unusable");
                self.host.on_capture_failed(Some(id), &err);
            }
        }
        self.settle(id);
    }

    /// Start the cool-down for `id`.
    fn settle(&self, id: CaptureId) {
        let event = self.scheduler().capture_settled(id, Instant::now());
        if let Some(event) = event {
            self.handle_event(event);
        }
    }
}

async fn run_worker(shared: Arc<Shared>, mut jobs: mpsc::Receiver<Job>) {
    while let Some(job) = jobs.recv().await {
        if shared.control().epoch != job.epoch {
            trace!("frame from an earlier session skipped");
            continue;
        }
        let epoch = job.epoch;
        let analyser = Arc::clone(&shared);
        let outcome = task::spawn_blocking(move || analyser.analyse(&job.frame))
            .await
            .unwrap_or_else(|err| {
                Err(LiveScanError::Detection(format!("analysis task failed: {err}")))
            });
        shared.publish(epoch, outcome);
    }
    debug!("frame worker stopped");
}

async fn dispatch_feedback(host: Arc<dyn ScanHost>, mut feedback: watch::Receiver<Feedback>) {
    // Intermediate snapshots published while the host is busy are skipped;
    // only the newest is shown.
    while feedback.changed().await.is_ok() {
        let current = feedback.borrow_and_update().clone();
        match current {
            Feedback::Idle => {
                host.display_hint(GuidanceState::NoMessage);
                host.clear_overlay();
            }
            Feedback::Analysis(analysis) => {
                host.display_hint(analysis.guidance());
                match &analysis.overlay {
                    Some(overlay) => host.draw_overlay(overlay),
                    None => host.clear_overlay(),
                }
            }
        }
    }
}

async fn run_ticker(shared: Arc<Shared>) {
    let mut ticks = time::interval(shared.config.timing.tick());
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticks.tick().await;
        let event = shared.scheduler().tick(Instant::now());
        if let Some(event) = event {
            shared.handle_event(event);
        }
    }
}
