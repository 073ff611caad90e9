pub mod backend;
pub mod buffer;
pub mod detector;
pub mod microphone;

pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame};
pub use buffer::{finalize_samples, SampleBuffer};
pub use detector::{CoughDetector, DEFAULT_COUGH_THRESHOLD};
pub use microphone::MicrophoneBackend;
