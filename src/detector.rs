use std::path::Path;

use tracing::info;

use crate::error::{InitError, StageError};
use crate::pipeline::{FrameOutput, Pipeline, PipelineConfig};
use crate::stage::{ClassifierStage, EmbeddingStage, MelStage, OnnxStage, VerifierStage};

/// The assembled keyword detector: the three-model openWakeWord cascade
/// (plus optional verifier) behind a single per-frame call.
///
/// Model files expected under `model_dir`:
/// `melspectrogram.onnx`, `embedding_model.onnx`, `classifier.onnx`,
/// and `verifier.onnx` when the verifier is enabled.
pub struct KeywordDetector {
    pipeline: Pipeline,
}

impl KeywordDetector {
    pub fn new(
        model_dir: &Path,
        cfg: PipelineConfig,
        verifier_enabled: bool,
    ) -> Result<Self, InitError> {
        if cfg.smoothing == 0 {
            return Err(InitError::Config(
                "smoothing window must hold at least one score".into(),
            ));
        }

        let melspec = OnnxStage::load("melspectrogram", &model_dir.join("melspectrogram.onnx"))?;
        let embedding = OnnxStage::load("embedding", &model_dir.join("embedding_model.onnx"))?;
        let classifier = OnnxStage::load("classifier", &model_dir.join("classifier.onnx"))?;

        let verifier = if verifier_enabled {
            // The verifier model exports its class probabilities as the
            // second output (the first is the predicted label).
            let stage = OnnxStage::load("verifier", &model_dir.join("verifier.onnx"))?
                .with_output_index(1);
            Some(VerifierStage::new(Box::new(stage)))
        } else {
            None
        };

        info!(
            model_dir = %model_dir.display(),
            verifier = verifier.is_some(),
            "models loaded"
        );

        Ok(Self {
            pipeline: Pipeline::new(
                cfg,
                MelStage::new(Box::new(melspec)),
                EmbeddingStage::new(Box::new(embedding)),
                ClassifierStage::new(Box::new(classifier)),
                verifier,
            ),
        })
    }

    /// Process one 1280-sample frame of normalized mono audio.
    pub fn process(&mut self, frame: &[f32]) -> Result<FrameOutput, StageError> {
        self.pipeline.process_frame(frame)
    }

    /// Clear all sliding state back to stream start.
    pub fn reset(&mut self) {
        self.pipeline.reset();
    }

    pub fn config(&self) -> &PipelineConfig {
        self.pipeline.config()
    }
}
