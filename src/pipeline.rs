//! The per-frame orchestrator: raw window → mel → embedding → classifier
//! → smoothing → debounce, with the optional verifier gating detections.

use tracing::debug;

use crate::buffer::{RawWindow, SlidingWindow};
use crate::debounce::{DebounceStep, Debouncer};
use crate::error::StageError;
use crate::smoother::ScoreSmoother;
use crate::stage::{ClassifierStage, Embedding, EmbeddingStage, MelFrame, MelStage, VerifierStage};
use crate::{EMBEDDING_DIM, EMBEDDING_WINDOW, FRAME_SIZE, MEL_BINS, MEL_WINDOW, RAW_WINDOW};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Multiplicative input gain, applied before the raw window update.
    /// Empirically tuned per keyword model (3 and 100 have both shipped).
    pub gain: f32,
    /// Smoothed-confidence level above which a detection candidate fires.
    pub threshold: f32,
    /// Frames of cooldown after each confirmed detection.
    pub max_patience: u32,
    /// Number of raw scores averaged into the published confidence.
    pub smoothing: usize,
    /// Index of the keyword channel in the classifier output vector.
    pub positive_index: usize,
    /// Verifier score required to confirm a candidate (when a verifier
    /// is configured).
    pub verifier_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gain: 3.0,
            threshold: 0.35,
            max_patience: 20,
            smoothing: 7,
            positive_index: 0,
            verifier_threshold: 0.35,
        }
    }
}

/// Result of one successfully processed frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameOutput {
    /// Smoothed confidence, for continuous display.
    pub confidence: f32,
    /// Raw classifier score for this frame.
    pub raw_score: f32,
    /// True exactly when a detection event fired on this frame.
    pub detected: bool,
}

/// Owns every sliding buffer and drives one frame through the cascade in
/// strict order. All state is created once and mutated in place; no stage
/// ever observes a partially updated buffer because window advances are
/// committed only after every fallible call of the frame has succeeded.
pub struct Pipeline {
    cfg: PipelineConfig,
    melspec: MelStage,
    embedding: EmbeddingStage,
    classifier: ClassifierStage,
    verifier: Option<VerifierStage>,
    raw_window: RawWindow,
    mel_window: SlidingWindow<MelFrame>,
    embedding_window: SlidingWindow<Embedding>,
    smoother: ScoreSmoother,
    debounce: Debouncer,
}

impl Pipeline {
    pub fn new(
        cfg: PipelineConfig,
        melspec: MelStage,
        embedding: EmbeddingStage,
        classifier: ClassifierStage,
        verifier: Option<VerifierStage>,
    ) -> Self {
        let smoother = ScoreSmoother::new(cfg.smoothing);
        let debounce = Debouncer::new(cfg.max_patience);
        Self {
            cfg,
            melspec,
            embedding,
            classifier,
            verifier,
            raw_window: RawWindow::new(RAW_WINDOW),
            mel_window: SlidingWindow::new(MEL_WINDOW, [0.0; MEL_BINS]),
            embedding_window: SlidingWindow::new(EMBEDDING_WINDOW, [0.0; EMBEDDING_DIM]),
            smoother,
            debounce,
        }
    }

    /// Run one 1280-sample frame through the full cascade.
    ///
    /// On `Err` no buffer has advanced and the debouncer has not ticked:
    /// the next frame proceeds from the prior valid state as if this one
    /// had never arrived.
    pub fn process_frame(&mut self, frame: &[f32]) -> Result<FrameOutput, StageError> {
        assert_eq!(frame.len(), FRAME_SIZE, "audio frame must be {} samples", FRAME_SIZE);

        // Staged raw window: retained overlap followed by the scaled frame.
        let mut staged_raw = Vec::with_capacity(RAW_WINDOW);
        staged_raw.extend_from_slice(&self.raw_window.as_slice()[frame.len()..]);
        staged_raw.extend(frame.iter().map(|&s| s * self.cfg.gain));

        let new_mels = self.melspec.infer(&staged_raw)?;

        // Post-advance mel window snapshot, flattened oldest-first.
        let mut mel_flat = Vec::with_capacity(MEL_WINDOW * MEL_BINS);
        for mel in self.mel_window.iter().skip(new_mels.len()) {
            mel_flat.extend_from_slice(mel);
        }
        for mel in &new_mels {
            mel_flat.extend_from_slice(mel);
        }

        let new_embedding = self.embedding.infer(&mel_flat)?;

        let mut emb_flat = Vec::with_capacity(EMBEDDING_WINDOW * EMBEDDING_DIM);
        for emb in self.embedding_window.iter().skip(1) {
            emb_flat.extend_from_slice(emb);
        }
        emb_flat.extend_from_slice(&new_embedding);

        let confidence = self.classifier.infer(&emb_flat)?;
        let raw_score = confidence
            .get(self.cfg.positive_index)
            .copied()
            .ok_or(StageError::BadOutputShape {
                stage: "classifier",
                actual: vec![confidence.len()],
            })?;

        // The verifier only runs when this frame would fire, and must run
        // before any state commits so its failure can void the frame.
        let smoothed = self.smoother.preview(raw_score);
        let verifier_score = if self.debounce.is_armed() && smoothed > self.cfg.threshold {
            match self.verifier.as_mut() {
                Some(verifier) => Some(verifier.infer(&emb_flat)?),
                None => None,
            }
        } else {
            None
        };

        // Commit phase: infallible from here on.
        self.raw_window.update(frame, self.cfg.gain);
        self.mel_window.advance(&new_mels);
        self.embedding_window.advance(std::slice::from_ref(&new_embedding));
        let smoothed = self.smoother.push(raw_score);

        let detected = match self.debounce.step(smoothed > self.cfg.threshold) {
            DebounceStep::Candidate => {
                let confirmed = verifier_score
                    .map_or(true, |score| score > self.cfg.verifier_threshold);
                if confirmed {
                    self.debounce.confirm();
                } else {
                    debug!(smoothed, ?verifier_score, "candidate rejected by verifier");
                }
                confirmed
            }
            _ => false,
        };

        Ok(FrameOutput {
            confidence: smoothed,
            raw_score,
            detected,
        })
    }

    /// Clear every buffer back to stream-start state. Stage sessions are
    /// kept.
    pub fn reset(&mut self) {
        self.raw_window = RawWindow::new(RAW_WINDOW);
        self.mel_window = SlidingWindow::new(MEL_WINDOW, [0.0; MEL_BINS]);
        self.embedding_window = SlidingWindow::new(EMBEDDING_WINDOW, [0.0; EMBEDDING_DIM]);
        self.smoother.reset();
        self.debounce.reset();
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Current raw window contents, oldest sample first.
    pub fn raw_window(&self) -> &[f32] {
        self.raw_window.as_slice()
    }

    /// Current mel window contents, oldest frame first.
    pub fn mel_window(&self) -> &[MelFrame] {
        self.mel_window.as_slice()
    }

    /// Current embedding window contents, oldest first.
    pub fn embedding_window(&self) -> &[Embedding] {
        self.embedding_window.as_slice()
    }
}
