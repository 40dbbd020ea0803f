//! Read-only inspection of Opus packet headers (RFC 6716 section 3.1).
//!
//! The sessions treat packets as opaque bytes. This module only looks at the
//! TOC byte and, for code 3 packets, the frame count byte, which is enough to
//! tell how much audio a packet carries and whether it was padded.
//!
//! ```text
//!          0 1 2 3 4 5 6 7
//!         +-+-+-+-+-+-+-+-+
//!         | config  |s| c |
//!         +-+-+-+-+-+-+-+-+
//! ```

use std::fmt;
use std::time::Duration;

use crate::frame::FrameDuration;

/// Coding mode selected by the TOC configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Silk,
    Hybrid,
    Celt,
}

/// Audio bandwidth selected by the TOC configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bandwidth {
    Narrowband,
    Mediumband,
    Wideband,
    SuperWideband,
    Fullband,
}

/// Packet framing from the two low TOC bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCode {
    One,
    TwoEqual,
    TwoDifferent,
    Arbitrary,
}

/// Header fields of one Opus packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketInfo {
    pub config: u8,
    pub stereo: bool,
    pub frame_code: FrameCode,
    /// Number of frames in the packet.
    pub frame_count: u8,
    /// Only meaningful for code 3 packets.
    pub vbr: bool,
    /// Code 3 packets with the padding flag set.
    pub padded: bool,
}

impl PacketInfo {
    /// Parses the packet header. Returns `None` for an empty packet or a
    /// code 3 packet missing its frame count byte.
    pub fn parse(packet: &[u8]) -> Option<Self> {
        let toc = *packet.first()?;
        let frame_code = match toc & 0b11 {
            0 => FrameCode::One,
            1 => FrameCode::TwoEqual,
            2 => FrameCode::TwoDifferent,
            _ => FrameCode::Arbitrary,
        };

        let (frame_count, vbr, padded) = match frame_code {
            FrameCode::One => (1, false, false),
            FrameCode::TwoEqual | FrameCode::TwoDifferent => (2, false, false),
            FrameCode::Arbitrary => {
                let count = *packet.get(1)?;
                (count & 0b0011_1111, count & 0b1000_0000 != 0, count & 0b0100_0000 != 0)
            }
        };

        Some(Self {
            config: toc >> 3,
            stereo: toc & 0b100 != 0,
            frame_code,
            frame_count,
            vbr,
            padded,
        })
    }

    pub fn mode(&self) -> Mode {
        match self.config {
            0..=11 => Mode::Silk,
            12..=15 => Mode::Hybrid,
            _ => Mode::Celt,
        }
    }

    pub fn bandwidth(&self) -> Bandwidth {
        match self.config {
            0..=3 | 16..=19 => Bandwidth::Narrowband,
            4..=7 => Bandwidth::Mediumband,
            8..=11 | 20..=23 => Bandwidth::Wideband,
            12..=13 | 24..=27 => Bandwidth::SuperWideband,
            _ => Bandwidth::Fullband,
        }
    }

    /// Duration of each frame in the packet.
    pub fn frame_duration(&self) -> FrameDuration {
        match self.mode() {
            Mode::Silk => match self.config % 4 {
                0 => FrameDuration::Duration10ms,
                1 => FrameDuration::Duration20ms,
                2 => FrameDuration::Duration40ms,
                _ => FrameDuration::Duration60ms,
            },
            Mode::Hybrid => match self.config % 2 {
                0 => FrameDuration::Duration10ms,
                _ => FrameDuration::Duration20ms,
            },
            Mode::Celt => match self.config % 4 {
                0 => FrameDuration::Duration2500us,
                1 => FrameDuration::Duration5ms,
                2 => FrameDuration::Duration10ms,
                _ => FrameDuration::Duration20ms,
            },
        }
    }

    /// Total audio carried by the packet.
    pub fn duration(&self) -> Duration {
        self.frame_duration().duration() * self.frame_count as u32
    }
}

impl fmt::Display for PacketInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "config={} mode={:?} bw={:?} stereo={} frames={}x{} padded={}",
            self.config,
            self.mode(),
            self.bandwidth(),
            self.stereo,
            self.frame_count,
            self.frame_duration(),
            self.padded,
        )
    }
}
