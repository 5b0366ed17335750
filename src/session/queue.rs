//! Bounded frame intake with drop-oldest backpressure
//!
//! The capture path must never stall: when analysis falls behind and the
//! queue fills, the oldest unanalyzed frame is dropped (counted and
//! logged) to make room for the new one. Dropped frames simply vanish
//! from the result stream; the alert machine sees a gap, never a stale
//! value.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::audio::frame::AudioFrame;

/// Bounded frame queue between the capture layer and the analysis workers
#[derive(Debug)]
pub struct FrameQueue {
    tx: Sender<AudioFrame>,
    rx: Receiver<AudioFrame>,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl FrameQueue {
    /// Create a queue holding at most `capacity` frames
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            tx,
            rx,
            dropped: Arc::new(AtomicU64::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Producer handle for the capture layer
    pub fn sender(&self) -> FrameSender {
        FrameSender {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            dropped: Arc::clone(&self.dropped),
            closed: Arc::clone(&self.closed),
        }
    }

    /// Consumer handle for the analysis workers
    pub fn receiver(&self) -> Receiver<AudioFrame> {
        self.rx.clone()
    }

    /// Stop accepting frames; queued frames still drain to the workers
    pub fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }

    /// Number of frames dropped to backpressure so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Producer side of the frame queue
///
/// `push` never blocks; the capture callback can call it directly.
#[derive(Clone)]
pub struct FrameSender {
    tx: Sender<AudioFrame>,
    rx: Receiver<AudioFrame>,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl FrameSender {
    /// Enqueue a frame, dropping the oldest queued frame when full
    ///
    /// # Returns
    /// `true` when the frame was enqueued, `false` when the session has
    /// been stopped.
    pub fn push(&self, frame: AudioFrame) -> bool {
        if self.closed.load(Ordering::Relaxed) {
            return false;
        }
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                if let Ok(oldest) = self.rx.try_recv() {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        timestamp_ms = oldest.timestamp_ms(),
                        "frame_dropped_backpressure"
                    );
                }
                self.tx.try_send(frame).is_ok()
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Number of frames dropped to backpressure so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
