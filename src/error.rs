use thiserror::Error;

/// Errors raised while setting up or tearing down audio capture.
///
/// Everything here is terminal for the session that hit it: the caller gets
/// the error, the session returns to idle, and nothing is retried.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no audio input device available")]
    DeviceUnavailable,

    #[error("microphone access denied by the platform")]
    PermissionDenied,

    #[error("capture already in progress")]
    AlreadyCapturing,

    #[error("unsupported sample format: {format}")]
    FormatNotSupported { format: String },

    #[error("audio backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error(transparent)]
    PlayStream(#[from] cpal::PlayStreamError),
}

/// The inference call failed: transport error, non-2xx status, empty body,
/// or a body that did not parse. The cause is logged at the call site; the
/// caller only needs to know the result is unusable and should render as
/// all-zero scores.
#[derive(Error, Debug)]
#[error("prediction request failed")]
pub struct PredictionFailure;
