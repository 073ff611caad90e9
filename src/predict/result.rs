use serde::{Deserialize, Serialize};

/// Normalized three-class score distribution for one analyzed recording.
///
/// Held only for display; nothing is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub normal: f32,
    pub bronchitis: f32,
    pub pneumonia: f32,
}

impl PredictionResult {
    /// All-zero result; what callers display when the classifier could not
    /// be reached or returned nothing usable.
    pub fn zero() -> Self {
        Self {
            normal: 0.0,
            bronchitis: 0.0,
            pneumonia: 0.0,
        }
    }

    /// Sum-normalize raw scores into a probability-like distribution.
    ///
    /// With a positive total, each score is divided by it (ratios are
    /// preserved and the result sums to 1.0 within floating-point
    /// tolerance); an all-zero input stays all-zero instead of dividing
    /// by zero.
    pub fn from_raw(normal: f32, bronchitis: f32, pneumonia: f32) -> Self {
        let total = normal + bronchitis + pneumonia;
        if total > 0.0 {
            Self {
                normal: normal / total,
                bronchitis: bronchitis / total,
                pneumonia: pneumonia / total,
            }
        } else {
            Self::zero()
        }
    }
}
