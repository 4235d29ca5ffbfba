use thiserror::Error;

/// A single inference call failed. Frame-level: the pipeline skips the
/// frame's downstream updates and continues on the next one.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("{stage}: expected input shape {expected:?}, got {actual:?}")]
    BadInputShape {
        stage: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("{stage}: unexpected output shape {actual:?}")]
    BadOutputShape {
        stage: &'static str,
        actual: Vec<usize>,
    },

    #[error("{stage}: produced a non-finite confidence value")]
    NonFiniteOutput { stage: &'static str },

    #[error("{stage}: backend execution failed: {source}")]
    Backend {
        stage: &'static str,
        source: ort::Error,
    },

    #[error("{stage}: failed to extract output tensor: {source}")]
    Extract {
        stage: &'static str,
        source: ort::Error,
    },
}

/// Audio source failures. A malformed frame is skipped at the worker
/// loop; these variants surface during capture setup or teardown.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("no input device available")]
    NoDevice,

    #[error("audio channel closed")]
    ChannelClosed,

    #[error("build stream error: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("play stream error: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("supported stream configs error: {0}")]
    SupportedStreamConfigs(#[from] cpal::SupportedStreamConfigsError),
}

/// Model/session setup failed before the loop started. Fatal: the worker
/// never runs and the error is surfaced once to the caller.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("failed to load {model} model from {path}: {source}")]
    ModelLoad {
        model: &'static str,
        path: String,
        source: ort::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}
