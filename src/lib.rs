pub mod audio;
pub mod buffer;
pub mod debounce;
pub mod detector;
pub mod error;
pub mod pipeline;
pub mod smoother;
pub mod stage;
pub mod worker;

// Critical constants - must match the openWakeWord model cascade exactly
pub const SAMPLE_RATE: u32 = 16000;
pub const FRAME_SIZE: usize = 1280; // 80ms at 16kHz
pub const RAW_WINDOW: usize = 1760; // frame + 480 samples of overlap
pub const MEL_BINS: usize = 32;
pub const MEL_WINDOW: usize = 76; // mel frames seen by the embedding model
pub const MEL_STEP: usize = 8; // new mel frames per 1280-sample chunk
pub const EMBEDDING_DIM: usize = 96;
pub const EMBEDDING_WINDOW: usize = 16; // embeddings seen by the classifier

pub use detector::KeywordDetector;
pub use error::{AudioError, InitError, StageError};
pub use pipeline::{FrameOutput, Pipeline, PipelineConfig};
pub use worker::{Detection, DetectionWorker};
