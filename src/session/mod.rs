//! Monitoring session pipeline
//!
//! Wires the core together for an embedding application:
//!
//! ```text
//! capture (external) -> FrameQueue -> analysis workers -> ReorderBuffer
//!                                   -> alert state machine -> event/result channels
//! ```
//!
//! Analysis is stateless and runs on a small worker pool; the alert state
//! machine and degradation controller live on a single sequential
//! consumer thread fed in timestamp order. Stopping the session closes
//! the intake, abandons queued frames, lets in-flight analyses finish
//! within one poll interval, and forces a final `Clear` if an alert was
//! active.

pub mod queue;
pub mod reorder;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};

use crate::alert::{AlertEvent, AlertState, AlertStateMachine};
use crate::audio::analyzer::{AnalysisResult, FrameAnalyzer};
use crate::audio::weighting::WeightingMode;
use crate::config::MonitorConfig;
use crate::degrade::{CaptureStatus, DegradationController, ResourcePressure};
use crate::stats::SessionStats;

pub use queue::{FrameQueue, FrameSender};
pub use reorder::ReorderBuffer;

/// Frames the intake queue holds before drop-oldest kicks in
pub const QUEUE_CAPACITY: usize = 32;

/// Analysis worker threads
pub const WORKER_COUNT: usize = 2;

/// How often idle workers re-check the running flag; also the shutdown
/// bound for abandoning queued frames (one frame duration)
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// A running monitoring session
///
/// Created with [`MonitorSession::start`]; stopped explicitly with
/// [`MonitorSession::stop`] or implicitly on drop.
#[derive(Debug)]
pub struct MonitorSession {
    queue: FrameQueue,
    workers: Vec<JoinHandle<()>>,
    consumer: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    force_fallback: Arc<AtomicBool>,
    controller: Arc<Mutex<DegradationController>>,
    alert: Arc<Mutex<AlertStateMachine>>,
    stats: Arc<Mutex<SessionStats>>,
    result_rx: Receiver<AnalysisResult>,
    event_rx: Receiver<AlertEvent>,
    stopped: bool,
}

impl MonitorSession {
    /// Validate the configuration and start the pipeline
    pub fn start(config: MonitorConfig) -> Result<Self> {
        config
            .validate()
            .context("invalid monitoring configuration")?;

        let queue = FrameQueue::new(QUEUE_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));
        let force_fallback = Arc::new(AtomicBool::new(false));
        let controller = Arc::new(Mutex::new(DegradationController::new(&config)));
        let alert = Arc::new(Mutex::new(AlertStateMachine::new(config.clone())));
        let stats = Arc::new(Mutex::new(SessionStats::new()));

        let (merge_tx, merge_rx) = unbounded::<AnalysisResult>();
        let (result_tx, result_rx) = unbounded::<AnalysisResult>();
        let (event_tx, event_rx) = unbounded::<AlertEvent>();

        let mut workers = Vec::with_capacity(WORKER_COUNT);
        for id in 0..WORKER_COUNT {
            let frame_rx = queue.receiver();
            let merge_tx = merge_tx.clone();
            let config = config.clone();
            let running = Arc::clone(&running);
            let force_fallback = Arc::clone(&force_fallback);
            let stats = Arc::clone(&stats);

            workers.push(
                std::thread::Builder::new()
                    .name(format!("noisewatch-worker-{}", id))
                    .spawn(move || {
                        let mut analyzer = FrameAnalyzer::new();
                        loop {
                            match frame_rx.recv_timeout(SHUTDOWN_POLL) {
                                Ok(frame) => {
                                    if !running.load(Ordering::Relaxed) {
                                        // Queued frames are abandoned on
                                        // shutdown; the frame drops here.
                                        break;
                                    }
                                    let mode = if force_fallback.load(Ordering::Relaxed) {
                                        WeightingMode::Fallback
                                    } else {
                                        WeightingMode::AWeighted
                                    };
                                    match analyzer.analyze(frame, &config, mode) {
                                        Ok(result) => {
                                            let _ = merge_tx.send(result);
                                        }
                                        Err(_) => {
                                            // Already logged by the analyzer
                                            if let Ok(mut s) = stats.lock() {
                                                s.frames_skipped += 1;
                                            }
                                        }
                                    }
                                }
                                Err(RecvTimeoutError::Timeout) => {
                                    if !running.load(Ordering::Relaxed) {
                                        break;
                                    }
                                }
                                Err(RecvTimeoutError::Disconnected) => break,
                            }
                        }
                    })
                    .context("failed to spawn analysis worker")?,
            );
        }
        drop(merge_tx);

        let consumer = {
            let controller = Arc::clone(&controller);
            let alert = Arc::clone(&alert);
            let stats = Arc::clone(&stats);
            let force_fallback = Arc::clone(&force_fallback);

            std::thread::Builder::new()
                .name("noisewatch-alert".to_string())
                .spawn(move || {
                    let mut reorder = ReorderBuffer::new(WORKER_COUNT + 1);

                    while let Ok(result) = merge_rx.recv() {
                        for ready in reorder.push(result) {
                            Self::deliver(
                                ready,
                                &controller,
                                &alert,
                                &stats,
                                &force_fallback,
                                &result_tx,
                                &event_tx,
                            );
                        }
                        if let Ok(mut s) = stats.lock() {
                            s.late_results_dropped = reorder.late_drops();
                        }
                    }

                    // Workers are gone; drain what is still buffered.
                    for ready in reorder.flush() {
                        Self::deliver(
                            ready,
                            &controller,
                            &alert,
                            &stats,
                            &force_fallback,
                            &result_tx,
                            &event_tx,
                        );
                    }

                    if let Ok(mut machine) = alert.lock() {
                        if let Some(event) = machine.reset() {
                            let _ = event_tx.send(event);
                        }
                    }
                    tracing::info!("alert_consumer_stopped");
                })
                .context("failed to spawn alert consumer")?
        };

        tracing::info!(
            workers = WORKER_COUNT,
            queue_capacity = QUEUE_CAPACITY,
            "session_started"
        );

        Ok(Self {
            queue,
            workers,
            consumer: Some(consumer),
            running,
            force_fallback,
            controller,
            alert,
            stats,
            result_rx,
            event_rx,
            stopped: false,
        })
    }

    /// Feed one delivered result through the controller, the alert
    /// machine, and the outbound channels
    fn deliver(
        result: AnalysisResult,
        controller: &Mutex<DegradationController>,
        alert: &Mutex<AlertStateMachine>,
        stats: &Mutex<SessionStats>,
        force_fallback: &AtomicBool,
        result_tx: &crossbeam_channel::Sender<AnalysisResult>,
        event_tx: &crossbeam_channel::Sender<AlertEvent>,
    ) {
        if let Ok(mut controller) = controller.lock() {
            controller.record_result(&result);
            force_fallback.store(
                controller.plan().mode == WeightingMode::Fallback,
                Ordering::Relaxed,
            );
        }

        let events = match alert.lock() {
            Ok(mut machine) => machine.on_result(&result),
            Err(_) => Vec::new(),
        };

        if let Ok(mut s) = stats.lock() {
            s.frames_analyzed += 1;
            if result.overrun {
                s.overruns += 1;
            }
            if result.degraded {
                s.degraded_results += 1;
            }
            for event in &events {
                match event {
                    AlertEvent::Activate { .. } => s.activations += 1,
                    AlertEvent::Vibrate { .. } => s.vibrations += 1,
                    _ => {}
                }
            }
        }

        let _ = result_tx.send(result);
        for event in events {
            let _ = event_tx.send(event);
        }
    }

    /// Producer handle for the external capture layer
    pub fn frame_sender(&self) -> FrameSender {
        self.queue.sender()
    }

    /// Ordered stream of analysis results for the UI layer
    pub fn results(&self) -> Receiver<AnalysisResult> {
        self.result_rx.clone()
    }

    /// Stream of alert side effects for the notification layer
    pub fn alert_events(&self) -> Receiver<AlertEvent> {
        self.event_rx.clone()
    }

    /// Snapshot of the current alert state
    pub fn alert_snapshot(&self) -> AlertState {
        self.alert
            .lock()
            .map(|machine| machine.snapshot())
            .unwrap_or_default()
    }

    /// Report an external resource pressure signal
    pub fn set_pressure(&self, pressure: ResourcePressure, asserted: bool) {
        if let Ok(mut controller) = self.controller.lock() {
            controller.set_pressure(pressure, asserted);
            self.force_fallback.store(
                controller.plan().mode == WeightingMode::Fallback,
                Ordering::Relaxed,
            );
        }
    }

    /// Report the capture status observed by the audio processor
    pub fn set_capture_status(&self, status: CaptureStatus) {
        if let Ok(mut controller) = self.controller.lock() {
            controller.set_capture_status(status);
        }
    }

    /// Frame duration the capture layer should currently use
    pub fn recommended_frame_duration_ms(&self) -> u64 {
        self.controller
            .lock()
            .map(|c| c.plan().frame_duration_ms)
            .unwrap_or(0)
    }

    /// Counter snapshot for this session
    pub fn stats(&self) -> SessionStats {
        let mut snapshot = self
            .stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();
        snapshot.frames_dropped = self.queue.dropped();
        snapshot
    }

    /// Stop the session
    ///
    /// Closes the intake, joins the workers (bounded by one poll
    /// interval), and drains the merge stage. The alert machine is forced
    /// to inactive; when an alert was showing, the final `Clear` event is
    /// delivered on the event channel before it disconnects.
    pub fn stop(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        self.queue.close();
        self.running.store(false, Ordering::Relaxed);

        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        if let Some(consumer) = self.consumer.take() {
            let _ = consumer.join();
        }

        if let Ok(stats) = self.stats.lock() {
            tracing::info!(
                frames_analyzed = stats.frames_analyzed,
                frames_dropped = self.queue.dropped(),
                frames_skipped = stats.frames_skipped,
                "session_stopped"
            );
        }
        Ok(())
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
