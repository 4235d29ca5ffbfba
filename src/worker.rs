//! The dedicated detection worker: one thread pulls frames and runs the
//! whole pipeline synchronously per frame. All sliding state lives on
//! this thread; consumers see only the latest-score slot (last value
//! wins) and the ordered detection-event queue (delivered exactly once
//! per event, in order).

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{info, warn};

use crate::detector::KeywordDetector;
use crate::FRAME_SIZE;

/// One discrete keyword detection. `count` increases monotonically over
/// the life of the stream.
#[derive(Debug, Clone, Copy)]
pub struct Detection {
    pub count: u64,
    pub confidence: f32,
}

pub struct DetectionWorker {
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    score: Arc<Mutex<f32>>,
    events: Receiver<Detection>,
}

impl DetectionWorker {
    pub fn spawn(detector: KeywordDetector, frames: Receiver<Vec<f32>>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let score = Arc::new(Mutex::new(0.0f32));
        let (event_tx, event_rx) = unbounded();

        let handle = {
            let stop = stop.clone();
            let score = score.clone();
            std::thread::spawn(move || run(detector, frames, stop, score, event_tx))
        };

        Self {
            handle: Some(handle),
            stop,
            score,
            events: event_rx,
        }
    }

    /// Most recent smoothed confidence (last value wins).
    pub fn latest_score(&self) -> f32 {
        *self.score.lock()
    }

    /// Ordered detection-event queue.
    pub fn events(&self) -> &Receiver<Detection> {
        &self.events
    }

    /// Signal the worker to stop at the next frame boundary and wait for
    /// it to finish. In-flight inference completes; it is never aborted
    /// mid-stage.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(
    mut detector: KeywordDetector,
    frames: Receiver<Vec<f32>>,
    stop: Arc<AtomicBool>,
    score: Arc<Mutex<f32>>,
    events: Sender<Detection>,
) {
    let mut count = 0u64;

    // The timeout only bounds how long a stop request can go unnoticed
    // while the source is silent.
    while !stop.load(Ordering::Relaxed) {
        let frame = match frames.recv_timeout(Duration::from_millis(250)) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                info!("audio source closed, worker exiting");
                break;
            }
        };

        // A short read is a source fault: skip it without touching any
        // buffer and keep looping.
        if frame.len() != FRAME_SIZE {
            warn!(len = frame.len(), "malformed audio frame skipped");
            continue;
        }

        match detector.process(&frame) {
            Ok(output) => {
                *score.lock() = output.confidence;
                if output.detected {
                    count += 1;
                    info!(count, confidence = output.confidence, "keyword detected");
                    let _ = events.send(Detection {
                        count,
                        confidence: output.confidence,
                    });
                }
            }
            // Frame-level failure: no score, no event, next frame
            // proceeds from the prior valid buffer state.
            Err(err) => warn!(%err, "inference stage failed, frame skipped"),
        }
    }
}
