// Tests for frame peak computation and the amplitude threshold gate.

use coughscan::{AudioFrame, CoughDetector, DEFAULT_COUGH_THRESHOLD};

fn frame(samples: Vec<i16>) -> AudioFrame {
    AudioFrame {
        samples,
        sample_rate: 16000,
        channels: 1,
        timestamp_ms: 0,
    }
}

#[test]
fn detection_requires_exceeding_the_threshold() {
    let detector = CoughDetector::default();

    assert!(!detector.detect(0.0));
    assert!(!detector.detect(DEFAULT_COUGH_THRESHOLD)); // reaching is not exceeding
    assert!(detector.detect(DEFAULT_COUGH_THRESHOLD + 0.001));
    assert!(detector.detect(1.0));
}

#[test]
fn trigger_latches_across_quiet_chunks() {
    let mut detector = CoughDetector::new(DEFAULT_COUGH_THRESHOLD);

    assert!(!detector.observe(0.05));
    assert!(detector.observe(0.4));
    // Quiet chunks after the trigger cannot clear it
    assert!(detector.observe(0.01));
    assert!(detector.observe(0.0));
    assert!(detector.triggered());

    detector.reset();
    assert!(!detector.triggered());
}

#[test]
fn peak_amplitude_uses_absolute_values() {
    let f = frame(vec![100, -8000, 300]);
    assert!((f.peak_amplitude() - 8000.0 / 32768.0).abs() < 1e-6);
}

#[test]
fn peak_amplitude_handles_extremes() {
    assert_eq!(frame(vec![]).peak_amplitude(), 0.0);
    // |-32768| / 32768 lands exactly on full scale
    assert_eq!(frame(vec![i16::MIN]).peak_amplitude(), 1.0);
    assert!(frame(vec![i16::MAX]).peak_amplitude() < 1.0);
}

#[test]
fn ten_percent_of_full_scale_is_the_gate() {
    let detector = CoughDetector::default();

    // 3276 / 32768 is just under 10%
    let quiet = frame(vec![3276, -3276]);
    assert!(!detector.detect(quiet.peak_amplitude()));

    let loud = frame(vec![3300]);
    assert!(detector.detect(loud.peak_amplitude()));
}
