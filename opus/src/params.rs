//! Session creation parameters.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};
use crate::ffi::MAX_PACKET_BYTES;

/// Sample rates libopus accepts.
pub const SUPPORTED_SAMPLE_RATES: [i32; 5] = [8000, 12000, 16000, 24000, 48000];

/// Encoder tuning knobs.
///
/// Deserializes from YAML/JSON with every field optional:
///
/// ```yaml
/// sample_rate: 16000
/// channels: 1
/// target_bytes: 180
/// bitrate: 24000
/// cbr: true
/// dtx: false
/// complexity: 5
/// signal_voice: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderParams {
    pub sample_rate: i32,
    pub channels: i32,
    /// Every encoded packet is exactly this many bytes.
    pub target_bytes: usize,
    /// Bits per second.
    pub bitrate: i32,
    /// Constant bitrate; variable (constrained) bitrate when false.
    pub cbr: bool,
    /// Discontinuous transmission during silence.
    pub dtx: bool,
    /// 0 (fastest) to 10 (best).
    pub complexity: i32,
    /// Voice signal hint; music when false.
    pub signal_voice: bool,
}

impl Default for EncoderParams {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            target_bytes: 180,
            bitrate: 24000,
            cbr: true,
            dtx: false,
            complexity: 5,
            signal_voice: true,
        }
    }
}

impl EncoderParams {
    /// Default tuning for the given stream format.
    pub fn new(sample_rate: i32, channels: i32) -> Self {
        Self {
            sample_rate,
            channels,
            ..Self::default()
        }
    }

    /// Sets the fixed on-wire packet size.
    pub fn target_bytes(mut self, target_bytes: usize) -> Self {
        self.target_bytes = target_bytes;
        self
    }

    /// Sets the target bitrate in bits per second.
    pub fn bitrate(mut self, bitrate: i32) -> Self {
        self.bitrate = bitrate;
        self
    }

    /// Selects constant (`true`) or variable bitrate.
    pub fn cbr(mut self, cbr: bool) -> Self {
        self.cbr = cbr;
        self
    }

    /// Enables discontinuous transmission.
    pub fn dtx(mut self, dtx: bool) -> Self {
        self.dtx = dtx;
        self
    }

    /// Sets encoder complexity, 0 to 10.
    pub fn complexity(mut self, complexity: i32) -> Self {
        self.complexity = complexity;
        self
    }

    /// Hints voice (`true`) or music content.
    pub fn signal_voice(mut self, signal_voice: bool) -> Self {
        self.signal_voice = signal_voice;
        self
    }

    /// Rejects settings libopus or the fixed packet size cannot honor.
    pub fn validate(&self) -> Result<()> {
        validate_format(self.sample_rate, self.channels)?;
        if !(0..=10).contains(&self.complexity) {
            return Err(CodecError::InvalidParams(format!(
                "complexity {} outside 0..=10",
                self.complexity
            )));
        }
        if self.target_bytes == 0 || self.target_bytes > MAX_PACKET_BYTES {
            return Err(CodecError::InvalidParams(format!(
                "target bytes {} outside 1..={}",
                self.target_bytes, MAX_PACKET_BYTES
            )));
        }
        if self.bitrate <= 0 {
            return Err(CodecError::InvalidParams(format!(
                "bitrate {} must be positive",
                self.bitrate
            )));
        }
        Ok(())
    }
}

/// Decoder output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderParams {
    pub sample_rate: i32,
    pub channels: i32,
}

impl Default for DecoderParams {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
        }
    }
}

impl DecoderParams {
    /// Output format for a decoder.
    pub fn new(sample_rate: i32, channels: i32) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Checks the sample rate and channel count.
    pub fn validate(&self) -> Result<()> {
        validate_format(self.sample_rate, self.channels)
    }
}

fn validate_format(sample_rate: i32, channels: i32) -> Result<()> {
    if !SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
        return Err(CodecError::InvalidParams(format!(
            "unexpected sample rate: {}",
            sample_rate
        )));
    }
    if channels != 1 && channels != 2 {
        return Err(CodecError::InvalidParams(format!(
            "unexpected channels: {}",
            channels
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = EncoderParams::default();
        assert_eq!(p.sample_rate, 16000);
        assert_eq!(p.channels, 1);
        assert_eq!(p.target_bytes, 180);
        assert_eq!(p.bitrate, 24000);
        assert!(p.cbr);
        assert!(!p.dtx);
        assert_eq!(p.complexity, 5);
        assert!(p.signal_voice);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let p = EncoderParams::new(48000, 2)
            .target_bytes(240)
            .bitrate(32000)
            .cbr(false)
            .dtx(true)
            .complexity(10)
            .signal_voice(false);
        assert_eq!(p.sample_rate, 48000);
        assert_eq!(p.channels, 2);
        assert_eq!(p.target_bytes, 240);
        assert!(!p.cbr);
        assert!(p.dtx);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects() {
        assert!(EncoderParams::new(44100, 1).validate().is_err());
        assert!(EncoderParams::new(16000, 3).validate().is_err());
        assert!(EncoderParams::default().complexity(11).validate().is_err());
        assert!(EncoderParams::default().target_bytes(0).validate().is_err());
        assert!(EncoderParams::default().target_bytes(MAX_PACKET_BYTES + 1).validate().is_err());
        assert!(EncoderParams::default().bitrate(0).validate().is_err());
        assert!(DecoderParams::new(22050, 1).validate().is_err());
        assert!(DecoderParams::new(48000, 2).validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let p: EncoderParams =
            serde_json::from_str(r#"{"sample_rate": 48000, "target_bytes": 120}"#).unwrap();
        assert_eq!(p.sample_rate, 48000);
        assert_eq!(p.target_bytes, 120);
        assert_eq!(p.bitrate, 24000);
        assert!(p.cbr);
    }
}
