use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Whether recording is currently active
    pub is_recording: bool,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Samples accumulated so far (never exceeds the buffer capacity)
    pub samples_captured: usize,

    /// Whether any chunk crossed the cough threshold
    pub cough_detected: bool,
}
