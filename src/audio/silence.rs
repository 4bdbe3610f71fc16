// Silence compensation for per-speaker capture
//
// The platform only delivers frames while a speaker is audible, so a
// track's timeline drifts ahead of wall clock whenever frames go missing
// (network loss or plain silence). This module computes how many synthetic
// zero frames to insert between two arrivals to keep the track aligned.

/// Default frame duration used by the voice codec (ms)
pub const DEFAULT_FRAME_DURATION_MS: u64 = 20;

/// Default frame size: 48kHz, 2 channels, 16-bit samples, 20ms
pub const DEFAULT_FRAME_SIZE_BYTES: usize = 3840;

/// Default ceiling on synthetic frames per gap: 5 minutes at 20ms frames.
/// Gaps beyond this degrade to a single bounded silence block instead of
/// exact-length fill.
pub const DEFAULT_MAX_GAP_FRAMES: usize = 15_000;

/// Pure gap-fill calculator. Deterministic, no clock access of its own:
/// callers feed it the arrival timestamps they observed.
#[derive(Debug, Clone)]
pub struct SilenceCompensator {
    frame_duration_ms: u64,
    frame_size_bytes: usize,
    max_gap_frames: usize,
}

impl SilenceCompensator {
    pub fn new(frame_duration_ms: u64, frame_size_bytes: usize, max_gap_frames: usize) -> Self {
        Self {
            frame_duration_ms: frame_duration_ms.max(1),
            frame_size_bytes,
            max_gap_frames,
        }
    }

    pub fn frame_size_bytes(&self) -> usize {
        self.frame_size_bytes
    }

    /// Number of synthetic frames needed between two arrivals.
    ///
    /// `previous_ms` is `None` for the very first frame of a track, which
    /// never produces fill. Gaps at or below one frame duration are normal
    /// jitter and produce nothing. Capped at `max_gap_frames`.
    pub fn missing_frames(&self, previous_ms: Option<u64>, current_ms: u64) -> usize {
        let Some(previous_ms) = previous_ms else {
            return 0;
        };
        let elapsed = current_ms.saturating_sub(previous_ms);
        let missing = (elapsed / self.frame_duration_ms).saturating_sub(1) as usize;
        missing.min(self.max_gap_frames)
    }

    /// Zero bytes to write before the current frame: `missing_frames`
    /// frames of `frame_size_bytes` each. Empty when no fill is needed.
    pub fn compensate(&self, previous_ms: Option<u64>, current_ms: u64) -> Vec<u8> {
        let missing = self.missing_frames(previous_ms, current_ms);
        vec![0u8; missing * self.frame_size_bytes]
    }
}

impl Default for SilenceCompensator {
    fn default() -> Self {
        Self::new(
            DEFAULT_FRAME_DURATION_MS,
            DEFAULT_FRAME_SIZE_BYTES,
            DEFAULT_MAX_GAP_FRAMES,
        )
    }
}
