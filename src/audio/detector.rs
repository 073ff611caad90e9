use tracing::debug;

/// Peak amplitude above 10% of full scale counts as "sound detected".
pub const DEFAULT_COUGH_THRESHOLD: f32 = 0.1;

/// Threshold-based cough gate.
///
/// A single global amplitude threshold; no spectral or temporal shape
/// analysis. The trigger latches for the lifetime of a session: once a
/// chunk crosses the threshold, later quiet chunks cannot clear it.
#[derive(Debug, Clone)]
pub struct CoughDetector {
    threshold: f32,
    triggered: bool,
}

impl CoughDetector {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            triggered: false,
        }
    }

    /// Stateless threshold check for a single chunk peak.
    pub fn detect(&self, peak: f32) -> bool {
        peak > self.threshold
    }

    /// Feed one chunk peak and return the (latched) session flag.
    pub fn observe(&mut self, peak: f32) -> bool {
        if !self.triggered && self.detect(peak) {
            debug!("cough threshold crossed (peak {:.3})", peak);
            self.triggered = true;
        }
        self.triggered
    }

    /// Whether any chunk in this session crossed the threshold.
    pub fn triggered(&self) -> bool {
        self.triggered
    }

    pub fn reset(&mut self) {
        self.triggered = false;
    }
}

impl Default for CoughDetector {
    fn default() -> Self {
        Self::new(DEFAULT_COUGH_THRESHOLD)
    }
}
