use super::config::SessionConfig;
use super::events::{CaptureOutcome, SessionEvent};
use super::stats::SessionStats;
use crate::audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, CoughDetector, SampleBuffer,
};
use crate::error::CaptureError;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Lifecycle of a recording session. Valid transitions are
/// `Idle -> Recording -> Finalizing -> Idle`; anything else is ignored
/// with a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Finalizing,
}

/// Bounded event channel; amplitude updates are dropped rather than
/// stalling capture when the consumer falls behind.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A recording session that manages microphone capture, cough detection,
/// and finalization of the sample buffer
///
/// The audio backend is read by a single background task; the buffer it
/// accumulates is handed off exactly once, at finalize time, as part of
/// the `Finished` event.
pub struct RecordingSession {
    /// Session configuration
    config: SessionConfig,

    /// Audio backend to use on the next start; `None` means the platform
    /// microphone is created on demand
    backend: Mutex<Option<Box<dyn AudioBackend>>>,

    /// When the session was created
    started_at: chrono::DateTime<chrono::Utc>,

    /// Observable session state
    state_tx: watch::Sender<SessionState>,
    state_rx: watch::Receiver<SessionState>,

    /// Samples accumulated by the read task (capped at buffer capacity)
    samples_captured: Arc<AtomicUsize>,

    /// Whether any chunk crossed the cough threshold
    cough_detected: Arc<AtomicBool>,

    /// Handle for the background read task
    read_task: Mutex<Option<JoinHandle<()>>>,
}

impl RecordingSession {
    /// Create a session that captures from the platform microphone.
    pub fn new(config: SessionConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a session with a custom audio backend (for tests and
    /// alternative input sources).
    pub fn with_backend(config: SessionConfig, backend: Box<dyn AudioBackend>) -> Self {
        Self::build(config, Some(backend))
    }

    fn build(config: SessionConfig, backend: Option<Box<dyn AudioBackend>>) -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        Self {
            config,
            backend: Mutex::new(backend),
            started_at: Utc::now(),
            state_tx,
            state_rx,
            samples_captured: Arc::new(AtomicUsize::new(0)),
            cough_detected: Arc::new(AtomicBool::new(false)),
            read_task: Mutex::new(None),
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Watch channel for state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Start recording.
    ///
    /// Valid only from `Idle`. Requires the microphone capability to be
    /// granted already; a device that cannot be initialized leaves the
    /// session idle and reports `DeviceUnavailable` or `PermissionDenied`.
    /// On success the returned channel carries amplitude updates followed
    /// by exactly one `Finished` event.
    pub async fn start(&self) -> Result<mpsc::Receiver<SessionEvent>, CaptureError> {
        if self.state() != SessionState::Idle {
            warn!("Recording already in progress");
            return Err(CaptureError::AlreadyCapturing);
        }

        info!("Starting recording session: {}", self.config.session_id);

        let mut backend = match self.backend.lock().await.take() {
            Some(backend) => backend,
            None => AudioBackendFactory::create(AudioBackendConfig {
                target_sample_rate: self.config.sample_rate,
                target_channels: self.config.channels,
                noise_suppression: self.config.noise_suppression,
                ..AudioBackendConfig::default()
            })?,
        };

        // Session stays idle if the device cannot be initialized.
        let audio_rx = match backend.start().await {
            Ok(rx) => rx,
            Err(e) => {
                error!("Failed to start audio backend: {}", e);
                return Err(e);
            }
        };

        // Fresh counters for this session; any previous buffer is gone.
        self.samples_captured.store(0, Ordering::SeqCst);
        self.cough_detected.store(false, Ordering::SeqCst);
        Self::transition(&self.state_tx, SessionState::Recording);

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        // Spawn the background read task
        let session_id = self.config.session_id.clone();
        let sample_rate = self.config.sample_rate;
        let channels = self.config.channels;
        let capacity = self.config.capacity_samples();
        let mut detector = CoughDetector::new(self.config.cough_threshold);
        let samples_captured = Arc::clone(&self.samples_captured);
        let cough_detected = Arc::clone(&self.cough_detected);
        let state_tx = self.state_tx.clone();
        let mut state_rx = self.state_rx.clone();

        let read_task = tokio::spawn(async move {
            info!("Audio read task started");

            let mut audio_rx = audio_rx;
            let mut buffer = SampleBuffer::new(capacity);

            while *state_rx.borrow() == SessionState::Recording && !buffer.is_full() {
                let frame = tokio::select! {
                    maybe_frame = audio_rx.recv() => match maybe_frame {
                        Some(frame) => frame,
                        None => {
                            warn!("Audio stream ended unexpectedly");
                            break;
                        }
                    },
                    // A manual stop flips the state while we wait for the
                    // next chunk; re-check the loop condition.
                    changed = state_rx.changed() => {
                        if changed.is_err() {
                            warn!("Session dropped while recording");
                            break;
                        }
                        continue;
                    }
                };

                // Convert to the target format, then: append, meter, detect.
                let frame = Self::process_frame(frame, sample_rate, channels);
                buffer.append(&frame.samples);
                samples_captured.store(buffer.len(), Ordering::SeqCst);

                let peak = frame.peak_amplitude();
                // Amplitude updates are advisory; drop rather than stall.
                let _ = event_tx.try_send(SessionEvent::Amplitude(peak));

                if detector.observe(peak) {
                    cough_detected.store(true, Ordering::SeqCst);
                }
            }

            // Finalization runs exactly once, on the same path for manual
            // stop and for hitting the duration cap.
            Self::transition(&state_tx, SessionState::Finalizing);

            if let Err(e) = backend.stop().await {
                error!("Failed to stop audio backend: {}", e);
            }

            let outcome = if detector.triggered() {
                info!(
                    "Session {} captured {} samples with a cough-like chunk",
                    session_id,
                    buffer.len()
                );
                CaptureOutcome::CoughCaptured(buffer.finalize())
            } else {
                info!("No cough detected in session {}; discarding buffer", session_id);
                CaptureOutcome::NoCoughDetected
            };

            if event_tx.send(SessionEvent::Finished(outcome)).await.is_err() {
                warn!("Session event receiver dropped before finalization");
            }

            Self::transition(&state_tx, SessionState::Idle);

            info!("Audio read task stopped");
        });

        *self.read_task.lock().await = Some(read_task);

        info!("Recording session started successfully");

        Ok(event_rx)
    }

    /// Stop recording manually.
    ///
    /// Signals the read task and waits for it to finalize, so the
    /// `Finished` event has been emitted by the time this returns. Stopping
    /// an idle session is a no-op that returns current stats.
    pub async fn stop(&self) -> SessionStats {
        if self.state() == SessionState::Idle {
            warn!("Recording not active");
            return self.stats();
        }

        info!("Stopping recording session: {}", self.config.session_id);

        Self::transition(&self.state_tx, SessionState::Finalizing);

        if let Some(task) = self.read_task.lock().await.take() {
            if let Err(e) = task.await {
                error!("Audio read task panicked: {}", e);
            }
        }

        info!("Recording session stopped");

        self.stats()
    }

    /// Current session statistics.
    pub fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);

        SessionStats {
            is_recording: self.state() == SessionState::Recording,
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            samples_captured: self.samples_captured.load(Ordering::SeqCst),
            cough_detected: self.cough_detected.load(Ordering::SeqCst),
        }
    }

    /// Apply a state transition, ignoring invalid ones. Concurrent stop
    /// requests and the duration cap can race; whichever loses the race is
    /// dropped here instead of corrupting the machine.
    fn transition(state_tx: &watch::Sender<SessionState>, to: SessionState) {
        let from = *state_tx.borrow();
        let valid = matches!(
            (from, to),
            (SessionState::Idle, SessionState::Recording)
                | (SessionState::Recording, SessionState::Finalizing)
                | (SessionState::Finalizing, SessionState::Idle)
        );

        if !valid {
            warn!("Ignoring state transition: {:?} -> {:?}", from, to);
            return;
        }

        info!("Session state: {:?} -> {:?}", from, to);
        let _ = state_tx.send(to);
    }

    /// Process audio frame: downsample and convert to target format
    fn process_frame(frame: AudioFrame, target_sample_rate: u32, target_channels: u16) -> AudioFrame {
        let mut processed = frame;

        // Downsample if needed
        if processed.sample_rate != target_sample_rate {
            processed = Self::downsample_frame(processed, target_sample_rate);
        }

        // Convert to mono if needed
        if processed.channels != target_channels && target_channels == 1 {
            processed = Self::stereo_to_mono(processed);
        }

        processed
    }

    /// Downsample audio frame by decimation
    fn downsample_frame(frame: AudioFrame, target_rate: u32) -> AudioFrame {
        if frame.sample_rate == target_rate {
            return frame;
        }

        let ratio = frame.sample_rate / target_rate;
        if ratio <= 1 {
            return frame; // Can't upsample
        }

        // Decimate: take every Nth sample
        let downsampled: Vec<i16> = frame
            .samples
            .iter()
            .step_by(ratio as usize)
            .copied()
            .collect();

        AudioFrame {
            samples: downsampled,
            sample_rate: target_rate,
            channels: frame.channels,
            timestamp_ms: frame.timestamp_ms,
        }
    }

    /// Convert stereo to mono by summing channels
    fn stereo_to_mono(frame: AudioFrame) -> AudioFrame {
        if frame.channels == 1 {
            return frame;
        }

        if frame.channels != 2 {
            return frame; // Only support stereo -> mono
        }

        let mut mono_samples = Vec::with_capacity(frame.samples.len() / 2);

        for chunk in frame.samples.chunks_exact(2) {
            let left = chunk[0] as i32;
            let right = chunk[1] as i32;
            let sum = left + right;
            let mono = sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
            mono_samples.push(mono);
        }

        AudioFrame {
            samples: mono_samples,
            sample_rate: frame.sample_rate,
            channels: 1,
            timestamp_ms: frame.timestamp_ms,
        }
    }
}
