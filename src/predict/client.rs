use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use super::result::PredictionResult;
use crate::error::PredictionFailure;

/// Inference endpoint of the remote classifier.
pub const DEFAULT_PREDICT_ENDPOINT: &str = "https://conectapi.click/api3/prever";

/// Request body: the finalized PCM buffer, base64-encoded without wrapping.
#[derive(Debug, Serialize)]
struct PredictRequest {
    audio_base64: String,
}

/// Raw response shape. Any subset of the fields may be absent, and a field
/// holding a non-number counts as absent — both read as 0.0.
#[derive(Debug, Deserialize)]
struct RawScores {
    #[serde(rename = "Normal", default, deserialize_with = "lenient_score")]
    normal: f32,
    #[serde(rename = "Bronquite", default, deserialize_with = "lenient_score")]
    bronquite: f32,
    #[serde(rename = "Pneumonia", default, deserialize_with = "lenient_score")]
    pneumonia: f32,
}

fn lenient_score<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(0.0) as f32)
}

/// Client for the remote cough classifier.
///
/// One POST per analysis: no retries, no caching, no timeout override
/// beyond the transport default.
pub struct PredictionClient {
    client: reqwest::Client,
    endpoint: String,
}

impl PredictionClient {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_PREDICT_ENDPOINT.to_string())
    }

    /// Create with a custom endpoint (configuration / mock servers).
    pub fn with_endpoint(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Submit one finalized PCM buffer for classification.
    ///
    /// Transport errors, non-2xx statuses, empty bodies and unparseable
    /// bodies all collapse into an opaque `PredictionFailure`; the cause
    /// is logged here and goes no further.
    pub async fn predict(&self, pcm_bytes: &[u8]) -> Result<PredictionResult, PredictionFailure> {
        let request = PredictRequest {
            audio_base64: base64::engine::general_purpose::STANDARD.encode(pcm_bytes),
        };
        let body = serde_json::to_vec(&request).map_err(|e| {
            warn!("Failed to encode prediction request: {}", e);
            PredictionFailure
        })?;

        info!(
            "Submitting recording for analysis ({} bytes of PCM)",
            pcm_bytes.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/json; charset=utf-8",
            )
            .body(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Prediction request failed: {}", e);
                PredictionFailure
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Prediction service returned HTTP {}", status);
            return Err(PredictionFailure);
        }

        let body = response.text().await.map_err(|e| {
            warn!("Failed to read prediction response: {}", e);
            PredictionFailure
        })?;
        if body.is_empty() {
            warn!("Prediction service returned an empty body");
            return Err(PredictionFailure);
        }

        let scores: RawScores = serde_json::from_str(&body).map_err(|e| {
            warn!("Unparseable prediction response: {}", e);
            PredictionFailure
        })?;

        let result = PredictionResult::from_raw(scores.normal, scores.bronquite, scores.pneumonia);

        info!(
            "Prediction: normal={:.3} bronchitis={:.3} pneumonia={:.3}",
            result.normal, result.bronchitis, result.pneumonia
        );

        Ok(result)
    }
}

impl Default for PredictionClient {
    fn default() -> Self {
        Self::new()
    }
}
