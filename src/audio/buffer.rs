/// Fixed-capacity accumulation buffer for one recording session.
///
/// Capacity is `sample_rate * max_duration_secs` samples; `append` never
/// grows the buffer past it, so a session that keeps recording simply stops
/// accumulating once the duration cap is reached.
#[derive(Debug)]
pub struct SampleBuffer {
    samples: Vec<i16>,
    capacity: usize,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a chunk, keeping at most the remaining space. Excess samples
    /// are silently dropped (bounded-duration cap, not an error).
    pub fn append(&mut self, chunk: &[i16]) {
        let remaining = self.capacity - self.samples.len();
        let take = chunk.len().min(remaining);
        self.samples.extend_from_slice(&chunk[..take]);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Convert the accumulated samples into the fixed-length wire buffer.
    pub fn finalize(self) -> Vec<u8> {
        finalize_samples(&self.samples, self.capacity)
    }
}

/// Serialize `samples` as signed 16-bit little-endian PCM, zero-padded or
/// truncated to exactly `capacity` samples. The output is always
/// `capacity * 2` bytes, including the degenerate case of no samples at all
/// (an all-zero buffer).
pub fn finalize_samples(samples: &[i16], capacity: usize) -> Vec<u8> {
    let len = samples.len().min(capacity);
    samples[..len]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .chain(std::iter::repeat(0u8).take((capacity - len) * 2))
        .collect()
}
