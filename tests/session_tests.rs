// End-to-end recording session tests driven by a scripted audio backend.

use async_trait::async_trait;
use coughscan::{
    AudioBackend, AudioFrame, CaptureError, CaptureOutcome, RecordingSession, SessionConfig,
    SessionEvent, SessionState,
};
use std::time::Duration;
use tokio::sync::mpsc;

/// Replays a fixed list of frames, then stays silent (channel open) until
/// stopped — like a microphone nobody is coughing into anymore.
struct ScriptedBackend {
    frames: Vec<AudioFrame>,
    keep_alive: Option<mpsc::Sender<AudioFrame>>,
    capturing: bool,
}

impl ScriptedBackend {
    fn new(frames: Vec<AudioFrame>) -> Self {
        Self {
            frames,
            keep_alive: None,
            capturing: false,
        }
    }
}

#[async_trait]
impl AudioBackend for ScriptedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        let (tx, rx) = mpsc::channel(self.frames.len().max(1));
        for frame in self.frames.drain(..) {
            let _ = tx.send(frame).await;
        }
        self.keep_alive = Some(tx);
        self.capturing = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        self.keep_alive = None;
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A backend that refuses to start, standing in for a broken device.
struct UnavailableBackend;

#[async_trait]
impl AudioBackend for UnavailableBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, CaptureError> {
        Err(CaptureError::DeviceUnavailable)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// Tiny capacity so tests fill the buffer quickly: 100 samples per second
/// for one second.
fn test_config(id: &str) -> SessionConfig {
    SessionConfig {
        session_id: id.to_string(),
        sample_rate: 100,
        channels: 1,
        max_duration: Duration::from_secs(1),
        cough_threshold: 0.1,
        noise_suppression: false,
    }
}

fn frame(samples: Vec<i16>) -> AudioFrame {
    AudioFrame {
        samples,
        sample_rate: 100,
        channels: 1,
        timestamp_ms: 0,
    }
}

async fn wait_for_finished(events: &mut mpsc::Receiver<SessionEvent>) -> CaptureOutcome {
    loop {
        match events.recv().await {
            Some(SessionEvent::Finished(outcome)) => break outcome,
            Some(SessionEvent::Amplitude(_)) => continue,
            None => panic!("event channel closed without a finalization event"),
        }
    }
}

#[tokio::test]
async fn quiet_session_discards_buffer_without_analysis() {
    let config = test_config("quiet");
    // Both chunks peak just under 10% of full scale
    let frames = vec![frame(vec![3276; 10]), frame(vec![-3276; 10])];
    let session = RecordingSession::with_backend(config, Box::new(ScriptedBackend::new(frames)));

    let mut events = session.start().await.expect("start should succeed");

    // Wait until both chunks were metered before stopping
    let mut amplitudes = 0;
    while amplitudes < 2 {
        match events.recv().await {
            Some(SessionEvent::Amplitude(peak)) => {
                assert!(peak < 0.1);
                amplitudes += 1;
            }
            Some(SessionEvent::Finished(_)) => panic!("finished before manual stop"),
            None => panic!("event channel closed early"),
        }
    }

    let stats = session.stop().await;
    assert!(!stats.cough_detected);
    assert_eq!(stats.samples_captured, 20);

    // The buffer is discarded; the caller is told to skip the network call
    assert!(matches!(
        wait_for_finished(&mut events).await,
        CaptureOutcome::NoCoughDetected
    ));
}

#[tokio::test]
async fn session_auto_stops_at_exactly_capacity() {
    let config = test_config("full");
    // 10 chunks of 10 loud samples reach the 100-sample capacity exactly
    let frames = (0..10).map(|_| frame(vec![8000; 10])).collect();
    let session = RecordingSession::with_backend(config, Box::new(ScriptedBackend::new(frames)));

    let mut events = session.start().await.expect("start should succeed");

    // No manual stop: the duration cap finalizes on its own
    let outcome = wait_for_finished(&mut events).await;
    let CaptureOutcome::CoughCaptured(bytes) = outcome else {
        panic!("expected a captured buffer");
    };

    assert_eq!(bytes.len(), 200);
    assert!(bytes
        .chunks_exact(2)
        .all(|c| i16::from_le_bytes([c[0], c[1]]) == 8000));

    let mut state_rx = session.subscribe_state();
    state_rx
        .wait_for(|s| *s == SessionState::Idle)
        .await
        .expect("state channel should stay open");

    let stats = session.stats();
    assert!(stats.cough_detected);
    assert_eq!(stats.samples_captured, 100);
    assert!(!stats.is_recording);
}

#[tokio::test]
async fn excess_samples_are_dropped_and_capture_still_finalizes_once() {
    let config = test_config("overfull");
    // 120 samples offered against a capacity of 100
    let frames = (0..12).map(|_| frame(vec![5000; 10])).collect();
    let session = RecordingSession::with_backend(config, Box::new(ScriptedBackend::new(frames)));

    let mut events = session.start().await.expect("start should succeed");

    let CaptureOutcome::CoughCaptured(bytes) = wait_for_finished(&mut events).await else {
        panic!("expected a captured buffer");
    };
    assert_eq!(bytes.len(), 200);

    // Exactly one finalization event; afterwards the channel drains
    assert!(events.recv().await.is_none());
    assert_eq!(session.stats().samples_captured, 100);
}

#[tokio::test]
async fn cough_flag_latches_for_the_whole_session() {
    let config = test_config("latch");
    // One loud chunk followed by silence
    let frames = vec![
        frame(vec![10000; 10]),
        frame(vec![0; 10]),
        frame(vec![0; 10]),
    ];
    let session = RecordingSession::with_backend(config, Box::new(ScriptedBackend::new(frames)));

    let mut events = session.start().await.expect("start should succeed");

    let mut amplitudes = 0;
    while amplitudes < 3 {
        if let Some(SessionEvent::Amplitude(_)) = events.recv().await {
            amplitudes += 1;
        }
    }

    let stats = session.stop().await;
    assert!(stats.cough_detected);
    assert!(matches!(
        wait_for_finished(&mut events).await,
        CaptureOutcome::CoughCaptured(_)
    ));
}

#[tokio::test]
async fn amplitude_updates_arrive_in_capture_order() {
    let config = test_config("order");
    let frames = vec![
        frame(vec![1000; 10]),
        frame(vec![2000; 10]),
        frame(vec![4000; 10]),
    ];
    let session = RecordingSession::with_backend(config, Box::new(ScriptedBackend::new(frames)));

    let mut events = session.start().await.expect("start should succeed");

    let mut peaks = Vec::new();
    while peaks.len() < 3 {
        if let Some(SessionEvent::Amplitude(peak)) = events.recv().await {
            peaks.push(peak);
        }
    }

    let expected: Vec<f32> = [1000.0, 2000.0, 4000.0]
        .iter()
        .map(|p| p / 32768.0)
        .collect();
    for (got, want) in peaks.iter().zip(&expected) {
        assert!((got - want).abs() < 1e-6);
    }

    session.stop().await;
}

#[tokio::test]
async fn frames_are_decimated_to_the_target_rate() {
    let config = test_config("decimate");
    // Device delivers 200Hz; the session stores every other sample
    let frames = vec![AudioFrame {
        samples: vec![6000; 20],
        sample_rate: 200,
        channels: 1,
        timestamp_ms: 0,
    }];
    let session = RecordingSession::with_backend(config, Box::new(ScriptedBackend::new(frames)));

    let mut events = session.start().await.expect("start should succeed");

    loop {
        if let Some(SessionEvent::Amplitude(_)) = events.recv().await {
            break;
        }
    }

    let stats = session.stop().await;
    assert_eq!(stats.samples_captured, 10);
}

#[tokio::test]
async fn concurrent_start_is_rejected() {
    let config = test_config("busy");
    let frames = vec![frame(vec![0; 10])];
    let session = RecordingSession::with_backend(config, Box::new(ScriptedBackend::new(frames)));

    let _events = session.start().await.expect("first start should succeed");
    assert!(matches!(
        session.start().await,
        Err(CaptureError::AlreadyCapturing)
    ));

    session.stop().await;
}

#[tokio::test]
async fn failed_device_leaves_the_session_idle() {
    let config = test_config("no-device");
    let session = RecordingSession::with_backend(config, Box::new(UnavailableBackend));

    assert!(matches!(
        session.start().await,
        Err(CaptureError::DeviceUnavailable)
    ));
    assert_eq!(session.state(), SessionState::Idle);

    // Stopping an idle session is a harmless no-op
    let stats = session.stop().await;
    assert!(!stats.is_recording);
    assert_eq!(stats.samples_captured, 0);
}
