//! Frame geometry shared by encoder and decoder sessions.

use std::fmt;
use std::time::Duration;

/// Duration of one Opus frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameDuration {
    Duration2500us,
    Duration5ms,
    Duration10ms,
    Duration20ms,
    Duration40ms,
    Duration60ms,
}

/// Frame duration every session is created with.
pub const SESSION_FRAME_DURATION: FrameDuration = FrameDuration::Duration60ms;

impl FrameDuration {
    pub const fn micros(self) -> u32 {
        match self {
            Self::Duration2500us => 2_500,
            Self::Duration5ms => 5_000,
            Self::Duration10ms => 10_000,
            Self::Duration20ms => 20_000,
            Self::Duration40ms => 40_000,
            Self::Duration60ms => 60_000,
        }
    }

    /// Whole milliseconds, rounded down (2.5ms reports 2).
    pub const fn millis(self) -> u32 {
        self.micros() / 1_000
    }

    pub fn duration(self) -> Duration {
        Duration::from_micros(self.micros() as u64)
    }

    /// Samples per channel in one frame at `sample_rate`.
    pub const fn samples(self, sample_rate: i32) -> usize {
        (sample_rate as i64 * self.micros() as i64 / 1_000_000) as usize
    }
}

impl fmt::Display for FrameDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duration2500us => write!(f, "2.5ms"),
            other => write!(f, "{}ms", other.millis()),
        }
    }
}

/// Samples per channel in one session frame at `sample_rate`.
pub const fn frame_samples(sample_rate: i32) -> usize {
    SESSION_FRAME_DURATION.samples(sample_rate)
}

/// Presentation timestamp in microseconds after `samples` samples per channel.
pub fn pts_us_from_samples(samples: u64, sample_rate: i32) -> u64 {
    if sample_rate <= 0 {
        return 0;
    }
    samples * 1_000_000 / sample_rate as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_frame_samples() {
        assert_eq!(frame_samples(8000), 480);
        assert_eq!(frame_samples(16000), 960);
        assert_eq!(frame_samples(48000), 2880);
    }

    #[test]
    fn test_frame_duration_samples() {
        assert_eq!(FrameDuration::Duration2500us.samples(48000), 120);
        assert_eq!(FrameDuration::Duration20ms.samples(16000), 320);
        assert_eq!(FrameDuration::Duration40ms.samples(24000), 960);
    }

    #[test]
    fn test_frame_duration_display() {
        assert_eq!(FrameDuration::Duration2500us.to_string(), "2.5ms");
        assert_eq!(SESSION_FRAME_DURATION.to_string(), "60ms");
        assert_eq!(SESSION_FRAME_DURATION.duration(), Duration::from_millis(60));
    }

    #[test]
    fn test_pts_from_samples() {
        assert_eq!(pts_us_from_samples(960, 16000), 60_000);
        assert_eq!(pts_us_from_samples(48000 * 3, 48000), 3_000_000);
        assert_eq!(pts_us_from_samples(100, 0), 0);
    }
}
