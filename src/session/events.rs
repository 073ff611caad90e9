/// Events emitted by a recording session.
///
/// Everything the presentation layer sees crosses this channel; the
/// background read task never mutates caller-visible state directly.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Normalized peak amplitude of the latest chunk, for level metering.
    /// Delivered in capture order; a slow consumer may miss updates.
    Amplitude(f32),

    /// The session finished, by manual stop or by hitting the duration cap.
    /// Emitted exactly once per session.
    Finished(CaptureOutcome),
}

/// Terminal outcome of a completed session.
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// At least one chunk crossed the cough threshold. The payload is the
    /// fixed-length little-endian PCM buffer, ready for the classifier.
    CoughCaptured(Vec<u8>),

    /// No chunk crossed the threshold. The recording is discarded and no
    /// network call should be made.
    NoCoughDetected,
}
