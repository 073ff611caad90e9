use anyhow::Result;
use serde::Deserialize;

use crate::audio::DEFAULT_COUGH_THRESHOLD;
use crate::predict::DEFAULT_PREDICT_ENDPOINT;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub inference: InferenceConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub max_duration_secs: u64,
    pub cough_threshold: f32,
    pub noise_suppression: bool,
}

#[derive(Debug, Deserialize)]
pub struct InferenceConfig {
    pub endpoint: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "coughscan".to_string(),
            },
            audio: AudioConfig {
                sample_rate: 16000,
                channels: 1,
                max_duration_secs: 20,
                cough_threshold: DEFAULT_COUGH_THRESHOLD,
                noise_suppression: true,
            },
            inference: InferenceConfig {
                endpoint: DEFAULT_PREDICT_ENDPOINT.to_string(),
            },
        }
    }
}
