// Microphone capture backend built on cpal.
//
// cpal streams are not Send, so the stream lives on a dedicated capture
// thread for the whole session. The thread reports setup success or failure
// once over a handshake channel, then parks until the running flag clears.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};
use crate::error::CaptureError;

/// Bounded frame channel; the audio callback drops frames instead of
/// blocking when the consumer falls behind.
const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Microphone backend
///
/// Captures from the host's default input device at the device's native
/// format; decimation and downmix to the target format happen downstream
/// in the session.
pub struct MicrophoneBackend {
    config: AudioBackendConfig,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    capturing: bool,
}

impl MicrophoneBackend {
    pub fn new(config: AudioBackendConfig) -> Result<Self, CaptureError> {
        info!(
            "Microphone backend initialized (target {}Hz, {} channel(s))",
            config.target_sample_rate, config.target_channels
        );

        Ok(Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
            capturing: false,
        })
    }
}

#[async_trait::async_trait]
impl AudioBackend for MicrophoneBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        if self.capturing {
            return Err(CaptureError::AlreadyCapturing);
        }

        info!("Starting microphone capture");

        if self.config.noise_suppression {
            debug!("noise suppression requested; host exposes no input processing, capturing raw");
        }

        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), CaptureError>>();

        let running = Arc::clone(&self.running);
        running.store(true, Ordering::SeqCst);

        let worker = thread::Builder::new()
            .name("mic-capture".to_string())
            .spawn(move || capture_thread(running, frame_tx, ready_tx))
            .map_err(|e| CaptureError::Backend(format!("failed to spawn capture thread: {e}")))?;

        // Wait for the thread to finish device setup before claiming success.
        let startup = tokio::task::spawn_blocking(move || {
            ready_rx.recv_timeout(Duration::from_secs(3))
        })
        .await
        .map_err(|e| CaptureError::Backend(format!("startup handshake task failed: {e}")))?;

        match startup {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = worker.join();
                return Err(e);
            }
            Err(_) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = worker.join();
                return Err(CaptureError::Backend(
                    "capture thread did not report readiness".to_string(),
                ));
            }
        }

        self.worker = Some(worker);
        self.capturing = true;

        info!("Microphone capture started successfully");

        Ok(frame_rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.capturing {
            return Ok(());
        }

        info!("Stopping microphone capture");

        // Teardown is best-effort: release the device, log anything odd,
        // never propagate.
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("microphone capture thread panicked during teardown");
            }
        }

        self.capturing = false;

        info!("Microphone capture stopped");

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "cpal microphone"
    }
}

/// Body of the dedicated capture thread: open the device, run the stream
/// until the running flag clears, then release it.
fn capture_thread(
    running: Arc<AtomicBool>,
    frame_tx: mpsc::Sender<AudioFrame>,
    ready_tx: std::sync::mpsc::Sender<Result<(), CaptureError>>,
) {
    let (stream, dropped_frames) = match build_input_stream(Arc::clone(&running), frame_tx) {
        Ok(parts) => parts,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(classify_play_error(e)));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    while running.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(50));
    }

    let dropped = dropped_frames.load(Ordering::Relaxed);
    if dropped > 0 {
        warn!("{} frame(s) dropped during capture (slow consumer)", dropped);
    }

    drop(stream);
    debug!("microphone capture thread exiting");
}

fn build_input_stream(
    running: Arc<AtomicBool>,
    frame_tx: mpsc::Sender<AudioFrame>,
) -> Result<(cpal::Stream, Arc<AtomicU64>), CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or(CaptureError::DeviceUnavailable)?;

    if let Ok(name) = device.name() {
        info!("Selected input device: {}", name);
    }

    let supported = device
        .default_input_config()
        .map_err(classify_config_error)?;
    let sample_format = supported.sample_format();
    let config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    };

    info!(
        "Input stream config: {}Hz, {} channel(s), {:?}",
        config.sample_rate.0, config.channels, sample_format
    );

    let dropped = Arc::new(AtomicU64::new(0));
    let sample_rate = config.sample_rate.0;
    let channels = config.channels;
    let started = Instant::now();

    let forward = {
        let dropped = Arc::clone(&dropped);
        move |samples: Vec<i16>| {
            if !running.load(Ordering::Relaxed) {
                return;
            }
            let frame = AudioFrame {
                samples,
                sample_rate,
                channels,
                timestamp_ms: started.elapsed().as_millis() as u64,
            };
            if frame_tx.try_send(frame).is_err() {
                dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    };

    let err_fn = |err: cpal::StreamError| {
        error!("Audio stream error: {}", err);
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &_| forward(data.to_vec()),
            err_fn,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &_| {
                // Clamp [-1.0, 1.0] and scale to i16
                let converted = data
                    .iter()
                    .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0).round() as i16)
                    .collect();
                forward(converted);
            },
            err_fn,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _: &_| {
                // Convert unsigned [0,65535] to signed [-32768,32767]
                let converted = data.iter().map(|&s| (s as i32 - 32768) as i16).collect();
                forward(converted);
            },
            err_fn,
            None,
        ),
        other => {
            return Err(CaptureError::FormatNotSupported {
                format: format!("{:?}", other),
            });
        }
    };

    let stream = stream.map_err(classify_build_error)?;

    Ok((stream, dropped))
}

/// Best-effort split between "no device" and "the platform said no".
/// cpal does not model permission denial uniformly across hosts, so this
/// inspects the backend's message.
fn looks_like_denial(description: &str) -> bool {
    let msg = description.to_ascii_lowercase();
    msg.contains("permission") || msg.contains("denied") || msg.contains("not permitted")
}

fn classify_build_error(err: cpal::BuildStreamError) -> CaptureError {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
        cpal::BuildStreamError::BackendSpecific { err } if looks_like_denial(&err.description) => {
            CaptureError::PermissionDenied
        }
        cpal::BuildStreamError::BackendSpecific { err } => CaptureError::Backend(err.description),
        other => CaptureError::BuildStream(other),
    }
}

fn classify_play_error(err: cpal::PlayStreamError) -> CaptureError {
    match err {
        cpal::PlayStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
        cpal::PlayStreamError::BackendSpecific { err } if looks_like_denial(&err.description) => {
            CaptureError::PermissionDenied
        }
        other => CaptureError::PlayStream(other),
    }
}

fn classify_config_error(err: cpal::DefaultStreamConfigError) -> CaptureError {
    match err {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => CaptureError::DeviceUnavailable,
        other => CaptureError::DeviceConfig(other),
    }
}
