// Tests for the bounded sample buffer and its fixed-length wire
// serialization.

use coughscan::{finalize_samples, SampleBuffer, SessionConfig};

fn decode(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect()
}

#[test]
fn finalize_pads_short_recordings_with_zeros() {
    let capacity = 8;
    let samples: Vec<i16> = vec![1, -2, 3];

    let bytes = finalize_samples(&samples, capacity);

    assert_eq!(bytes.len(), capacity * 2);
    assert_eq!(&bytes[..6], &[0x01, 0x00, 0xFE, 0xFF, 0x03, 0x00]);
    assert!(bytes[6..].iter().all(|&b| b == 0));
}

#[test]
fn finalize_truncates_past_capacity() {
    let capacity = 4;
    let samples: Vec<i16> = (1..=10).collect();

    let bytes = finalize_samples(&samples, capacity);

    assert_eq!(bytes.len(), capacity * 2);
    assert_eq!(decode(&bytes), vec![1, 2, 3, 4]);
}

#[test]
fn finalize_with_no_samples_is_all_zero() {
    let bytes = finalize_samples(&[], 16);

    assert_eq!(bytes.len(), 32);
    assert!(bytes.iter().all(|&b| b == 0));
}

#[test]
fn finalize_at_exact_capacity_round_trips() {
    let samples = vec![i16::MIN, -1, 0, 1, i16::MAX];

    let bytes = finalize_samples(&samples, samples.len());

    assert_eq!(bytes.len(), samples.len() * 2);
    assert_eq!(decode(&bytes), samples);
}

#[test]
fn output_length_is_fixed_for_every_fill_level() {
    let capacity = 100;
    for k in [0usize, 1, 50, 99, 100] {
        let samples = vec![7i16; k];
        let bytes = finalize_samples(&samples, capacity);

        assert_eq!(bytes.len(), capacity * 2, "k={k}");
        let decoded = decode(&bytes);
        assert!(decoded[..k].iter().all(|&s| s == 7), "k={k}");
        assert!(decoded[k..].iter().all(|&s| s == 0), "k={k}");
    }
}

#[test]
fn append_never_grows_past_capacity() {
    let mut buffer = SampleBuffer::new(10);

    buffer.append(&[1; 6]);
    assert_eq!(buffer.len(), 6);
    assert!(!buffer.is_full());

    buffer.append(&[2; 6]);
    assert_eq!(buffer.len(), 10);
    assert!(buffer.is_full());

    // Further appends are silently dropped
    buffer.append(&[3; 4]);
    assert_eq!(buffer.len(), 10);

    let decoded = decode(&buffer.finalize());
    assert_eq!(decoded, vec![1, 1, 1, 1, 1, 1, 2, 2, 2, 2]);
}

#[test]
fn default_session_wire_buffer_is_640_kb() {
    // 20 seconds of 16kHz mono i16 PCM
    let config = SessionConfig::default();
    assert_eq!(config.capacity_samples(), 320_000);

    let bytes = finalize_samples(&[], config.capacity_samples());
    assert_eq!(bytes.len(), 640_000);
}
