pub mod audio;
pub mod config;
pub mod error;
pub mod predict;
pub mod session;

pub use audio::{
    finalize_samples, AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame,
    CoughDetector, SampleBuffer, DEFAULT_COUGH_THRESHOLD,
};
pub use config::Config;
pub use error::{CaptureError, PredictionFailure};
pub use predict::{PredictionClient, PredictionResult};
pub use session::{
    CaptureOutcome, RecordingSession, SessionConfig, SessionEvent, SessionState, SessionStats,
};
