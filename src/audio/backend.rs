use tokio::sync::mpsc;

use crate::error::CaptureError;

/// Audio sample data (16-bit PCM, interleaved)
///
/// One frame corresponds to one block of samples delivered by a single
/// device read.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Peak amplitude of this frame, normalized to [0, 1].
    ///
    /// The maximum absolute sample value divided by 32768. An empty frame
    /// reports 0.0.
    pub fn peak_amplitude(&self) -> f32 {
        let max = self
            .samples
            .iter()
            .map(|&s| (s as i32).abs())
            .max()
            .unwrap_or(0);
        (max as f32 / 32768.0).clamp(0.0, 1.0)
    }
}

/// Configuration for the audio backend
#[derive(Debug, Clone)]
pub struct AudioBackendConfig {
    /// Target sample rate (frames are decimated downstream if the device
    /// delivers a higher rate)
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub target_channels: u16,
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
    /// Ask the host for input noise suppression when it offers any.
    /// Hosts without the capability capture unprocessed input; that is
    /// not an error.
    pub noise_suppression: bool,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // fixed wire format of the classifier
            target_channels: 1,        // Mono
            buffer_duration_ms: 100,   // 100ms buffers
            noise_suppression: true,
        }
    }
}

/// Audio capture backend trait
///
/// The only shipped implementation captures from the default microphone via
/// cpal; tests substitute scripted backends that replay fixed frames.
#[async_trait::async_trait]
pub trait AudioBackend: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Audio backend factory
pub struct AudioBackendFactory;

impl AudioBackendFactory {
    /// Create the platform microphone backend.
    pub fn create(config: AudioBackendConfig) -> Result<Box<dyn AudioBackend>, CaptureError> {
        let backend = super::microphone::MicrophoneBackend::new(config)?;
        Ok(Box::new(backend))
    }
}
