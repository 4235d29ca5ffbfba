//! Opaque tensor-in/tensor-out inference stages.
//!
//! The pipeline only sees the [`InferenceStage`] trait; the ONNX Runtime
//! implementation and the per-stage shape handling live here. Each stage
//! is called once per frame on the single processing path.

use ndarray::{Array2, Array3, Array4, ArrayD};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;

use crate::error::{InitError, StageError};
use crate::{EMBEDDING_DIM, EMBEDDING_WINDOW, MEL_BINS, MEL_STEP, MEL_WINDOW, RAW_WINDOW};

pub type MelFrame = [f32; MEL_BINS];
pub type Embedding = [f32; EMBEDDING_DIM];

/// One black-box model call. Implementations may hold session state but
/// must be pure with respect to the pipeline's buffers.
pub trait InferenceStage: Send {
    fn infer(&mut self, input: ArrayD<f32>) -> Result<ArrayD<f32>, StageError>;
}

/// ONNX Runtime session behind the [`InferenceStage`] contract.
pub struct OnnxStage {
    name: &'static str,
    session: Session,
    output_index: usize,
}

impl OnnxStage {
    pub fn load(name: &'static str, path: &Path) -> Result<Self, InitError> {
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.with_inter_threads(1))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|source| InitError::ModelLoad {
                model: name,
                path: path.display().to_string(),
                source,
            })?;

        Ok(Self {
            name,
            session,
            output_index: 0,
        })
    }

    /// Read a different output of the model. The verifier exports its
    /// class probabilities as the second output.
    pub fn with_output_index(mut self, output_index: usize) -> Self {
        self.output_index = output_index;
        self
    }
}

impl InferenceStage for OnnxStage {
    fn infer(&mut self, input: ArrayD<f32>) -> Result<ArrayD<f32>, StageError> {
        let tensor = Tensor::from_array(input).map_err(|source| StageError::Backend {
            stage: self.name,
            source,
        })?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|source| StageError::Backend {
                stage: self.name,
                source,
            })?;

        let output: ndarray::ArrayViewD<f32> = outputs[self.output_index]
            .try_extract_array()
            .map_err(|source| StageError::Extract {
                stage: self.name,
                source,
            })?;

        Ok(output.to_owned())
    }
}

fn check_input(stage: &'static str, expected: usize, actual: usize) -> Result<(), StageError> {
    if actual != expected {
        return Err(StageError::BadInputShape {
            stage,
            expected: vec![expected],
            actual: vec![actual],
        });
    }
    Ok(())
}

/// Melspectrogram stage: full raw window in, a batch of `MEL_STEP` new
/// mel frames out, rescaled with the openWakeWord `x/10 + 2` transform.
pub struct MelStage {
    inner: Box<dyn InferenceStage>,
}

impl MelStage {
    pub fn new(inner: Box<dyn InferenceStage>) -> Self {
        Self { inner }
    }

    pub fn infer(&mut self, raw_window: &[f32]) -> Result<Vec<MelFrame>, StageError> {
        check_input("melspectrogram", RAW_WINDOW, raw_window.len())?;

        let input = Array2::from_shape_vec((1, RAW_WINDOW), raw_window.to_vec())
            .expect("shape checked above");
        let output = self.inner.infer(input.into_dyn())?;

        // The model reports [1, 1, 8, 32]; accept any layout with the
        // same element count.
        if output.len() != MEL_STEP * MEL_BINS {
            return Err(StageError::BadOutputShape {
                stage: "melspectrogram",
                actual: output.shape().to_vec(),
            });
        }

        let flat: Vec<f32> = output.iter().copied().collect();
        let mut frames = Vec::with_capacity(MEL_STEP);
        for chunk in flat.chunks_exact(MEL_BINS) {
            let mut frame = [0.0f32; MEL_BINS];
            for (dst, &v) in frame.iter_mut().zip(chunk) {
                *dst = v / 10.0 + 2.0;
            }
            frames.push(frame);
        }
        Ok(frames)
    }
}

/// Embedding stage: one full mel window (flattened, oldest frame first)
/// in, one 96-float embedding out.
pub struct EmbeddingStage {
    inner: Box<dyn InferenceStage>,
}

impl EmbeddingStage {
    pub fn new(inner: Box<dyn InferenceStage>) -> Self {
        Self { inner }
    }

    pub fn infer(&mut self, mel_window: &[f32]) -> Result<Embedding, StageError> {
        check_input("embedding", MEL_WINDOW * MEL_BINS, mel_window.len())?;

        let input = Array4::from_shape_vec((1, MEL_WINDOW, MEL_BINS, 1), mel_window.to_vec())
            .expect("shape checked above");
        let output = self.inner.infer(input.into_dyn())?;

        if output.len() != EMBEDDING_DIM {
            return Err(StageError::BadOutputShape {
                stage: "embedding",
                actual: output.shape().to_vec(),
            });
        }

        let mut embedding = [0.0f32; EMBEDDING_DIM];
        for (dst, &v) in embedding.iter_mut().zip(output.iter()) {
            *dst = v;
        }
        Ok(embedding)
    }
}

/// Classifier stage: one full embedding window in, a vector of confidence
/// channels out. Which channel is the keyword is model-specific and
/// chosen by the pipeline configuration.
pub struct ClassifierStage {
    inner: Box<dyn InferenceStage>,
}

impl ClassifierStage {
    pub fn new(inner: Box<dyn InferenceStage>) -> Self {
        Self { inner }
    }

    pub fn infer(&mut self, embedding_window: &[f32]) -> Result<Vec<f32>, StageError> {
        check_input(
            "classifier",
            EMBEDDING_WINDOW * EMBEDDING_DIM,
            embedding_window.len(),
        )?;

        let input = Array3::from_shape_vec(
            (1, EMBEDDING_WINDOW, EMBEDDING_DIM),
            embedding_window.to_vec(),
        )
        .expect("shape checked above");
        let output = self.inner.infer(input.into_dyn())?;

        if output.is_empty() {
            return Err(StageError::BadOutputShape {
                stage: "classifier",
                actual: output.shape().to_vec(),
            });
        }
        if output.iter().any(|v| !v.is_finite()) {
            return Err(StageError::NonFiniteOutput { stage: "classifier" });
        }

        Ok(output.iter().copied().collect())
    }
}

/// Verifier stage: re-consumes the flattened embedding window and yields
/// the positive-class probability. A two-channel output is read at
/// channel 1 (class "keyword"); a single scalar is taken as-is.
pub struct VerifierStage {
    inner: Box<dyn InferenceStage>,
}

impl VerifierStage {
    pub fn new(inner: Box<dyn InferenceStage>) -> Self {
        Self { inner }
    }

    pub fn infer(&mut self, embedding_window: &[f32]) -> Result<f32, StageError> {
        check_input(
            "verifier",
            EMBEDDING_WINDOW * EMBEDDING_DIM,
            embedding_window.len(),
        )?;

        let input = Array2::from_shape_vec(
            (1, EMBEDDING_WINDOW * EMBEDDING_DIM),
            embedding_window.to_vec(),
        )
        .expect("shape checked above");
        let output = self.inner.infer(input.into_dyn())?;

        if output.is_empty() {
            return Err(StageError::BadOutputShape {
                stage: "verifier",
                actual: output.shape().to_vec(),
            });
        }
        if output.iter().any(|v| !v.is_finite()) {
            return Err(StageError::NonFiniteOutput { stage: "verifier" });
        }

        let flat: Vec<f32> = output.iter().copied().collect();
        Ok(if flat.len() >= 2 { flat[1] } else { flat[0] })
    }
}
