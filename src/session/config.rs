use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::audio::DEFAULT_COUGH_THRESHOLD;

/// Configuration for a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier
    pub session_id: String,

    /// Sample rate of the finalized buffer (the classifier expects 16kHz)
    pub sample_rate: u32,

    /// Number of audio channels (the classifier expects mono)
    pub channels: u16,

    /// Recording duration cap; samples beyond it are silently dropped
    pub max_duration: Duration,

    /// Peak amplitude threshold for the cough gate
    pub cough_threshold: f32,

    /// Ask the capture host for noise suppression when it offers any
    pub noise_suppression: bool,
}

impl SessionConfig {
    /// Buffer capacity in samples: `sample_rate * max_duration`.
    /// 20 seconds at 16kHz mono gives 320,000 samples.
    pub fn capacity_samples(&self) -> usize {
        (self.sample_rate as u64 * self.max_duration.as_secs()) as usize
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("cough-{}", uuid::Uuid::new_v4()),
            sample_rate: 16000,
            channels: 1,
            max_duration: Duration::from_secs(20),
            cough_threshold: DEFAULT_COUGH_THRESHOLD,
            noise_suppression: true,
        }
    }
}
