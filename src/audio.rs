//! Microphone capture: mono f32 at 16 kHz, chunked into 1280-sample
//! frames and handed over a bounded channel.
//!
//! The channel is the overrun policy: if the consumer falls behind, the
//! oldest queued frame is dropped to make room for the newest, so the
//! backlog is bounded at `QUEUE_FRAMES` (~1.3 s).

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

use crate::error::AudioError;
use crate::{FRAME_SIZE, SAMPLE_RATE};

const QUEUE_FRAMES: usize = 16;

pub struct AudioCapture {
    _stream: Stream,
    receiver: Receiver<Vec<f32>>,
    dropped: Arc<AtomicU64>,
}

impl AudioCapture {
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(AudioError::NoDevice)?;

        let supported = device
            .supported_input_configs()?
            .filter(|c| c.channels() == 1 && c.sample_format() == SampleFormat::F32)
            .find(|c| {
                c.min_sample_rate().0 <= SAMPLE_RATE && c.max_sample_rate().0 >= SAMPLE_RATE
            });

        let config = match supported {
            Some(c) => c.with_sample_rate(SampleRate(SAMPLE_RATE)).config(),
            // Some backends accept configs they do not advertise.
            None => StreamConfig {
                channels: 1,
                sample_rate: SampleRate(SAMPLE_RATE),
                buffer_size: cpal::BufferSize::Default,
            },
        };

        let (sender, receiver) = bounded(QUEUE_FRAMES);
        let dropped = Arc::new(AtomicU64::new(0));

        let stream = Self::build_stream(&device, &config, sender, receiver.clone(), dropped.clone())?;
        stream.play()?;

        Ok(Self {
            _stream: stream,
            receiver,
            dropped,
        })
    }

    fn build_stream(
        device: &cpal::Device,
        config: &StreamConfig,
        sender: Sender<Vec<f32>>,
        receiver: Receiver<Vec<f32>>,
        dropped: Arc<AtomicU64>,
    ) -> Result<Stream, AudioError> {
        let err_fn = |err| warn!("audio stream error: {}", err);
        let mut buffer: Vec<f32> = Vec::with_capacity(FRAME_SIZE * 2);

        let stream = device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                buffer.extend_from_slice(data);

                while buffer.len() >= FRAME_SIZE {
                    let frame: Vec<f32> = buffer.drain(..FRAME_SIZE).collect();
                    match sender.try_send(frame) {
                        Ok(()) => {}
                        Err(TrySendError::Full(frame)) => {
                            // Drop the oldest queued frame, keep the new one.
                            let _ = receiver.try_recv();
                            let n = dropped.fetch_add(1, Ordering::Relaxed) + 1;
                            warn!(dropped = n, "consumer behind, dropped oldest audio frame");
                            let _ = sender.try_send(frame);
                        }
                        Err(TrySendError::Disconnected(_)) => return,
                    }
                }
            },
            err_fn,
            None,
        )?;

        Ok(stream)
    }

    /// Frame stream for the detection worker.
    pub fn frames(&self) -> Receiver<Vec<f32>> {
        self.receiver.clone()
    }

    /// Read a frame (blocking).
    pub fn read(&self) -> Result<Vec<f32>, AudioError> {
        self.receiver.recv().map_err(|_| AudioError::ChannelClosed)
    }

    /// Read a frame without blocking.
    pub fn try_read(&self) -> Option<Vec<f32>> {
        self.receiver.try_recv().ok()
    }

    /// Frames discarded at the source boundary since capture started.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
