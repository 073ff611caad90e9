//! Remote classification of finalized recordings
//!
//! One JSON-over-HTTPS exchange per analysis, plus sum-normalization of
//! the returned scores.

pub mod client;
pub mod result;

pub use client::{PredictionClient, DEFAULT_PREDICT_ENDPOINT};
pub use result::PredictionResult;
