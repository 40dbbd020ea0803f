//! Fixed-size Opus packets for voice links.
//!
//! This crate wraps libopus in two owned sessions:
//!
//! - [`EncoderSession`]: one 60ms PCM frame in, one packet of exactly
//!   `target_bytes` out (short packets are grown with Opus padding)
//! - [`DecoderSession`]: one packet in, up to one frame of PCM out, with
//!   optional FEC recovery and packet loss concealment
//!
//! Hosts that can only carry integers use [`OpusBridge`], which maps
//! generational tokens to sessions and reports failures as sentinels.
//!
//! # Example
//!
//! ```ignore
//! use twetalk_opus::{DecoderParams, DecoderSession, EncoderParams, EncoderSession};
//!
//! let params = EncoderParams::new(16000, 1).target_bytes(40).bitrate(16000);
//! let mut encoder = EncoderSession::new(&params)?;
//! let packet = encoder.encode(&vec![0i16; encoder.frame_len()])?;
//! assert_eq!(packet.len(), 40);
//!
//! let mut decoder = DecoderSession::new(&DecoderParams::new(16000, 1))?;
//! let mut pcm = vec![0i16; decoder.frame_len()];
//! let n = decoder.decode(&packet, &mut pcm, false)?;
//! assert_eq!(n, 960);
//! ```

mod bridge;
mod decoder;
mod encoder;
pub mod error;
mod ffi;
pub mod frame;
pub mod logger;
pub mod packet;
mod params;
pub mod pcm;
mod registry;

pub use bridge::{DecoderHandle, EncoderHandle, OpusBridge};
pub use decoder::DecoderSession;
pub use encoder::EncoderSession;
pub use error::{CodecError, Result};
pub use ffi::MAX_PACKET_BYTES;
pub use frame::{FrameDuration, SESSION_FRAME_DURATION};
pub use logger::Logger;
pub use packet::PacketInfo;
pub use params::{DecoderParams, EncoderParams, SUPPORTED_SAMPLE_RATES};
