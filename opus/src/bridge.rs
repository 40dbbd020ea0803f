//! Token-based session API for hosts that can only hold integers.
//!
//! Every call fails with a sentinel instead of an error value: a null
//! handle from `create_*`, `None` from `encode`, a negative code from
//! `decode` and the frame accessors. Details go to the logger.

use std::fmt;
use std::sync::Arc;

use crate::decoder::DecoderSession;
use crate::encoder::EncoderSession;
use crate::error::ERR_INVALID_HANDLE;
use crate::logger::{self, Logger};
use crate::params::{DecoderParams, EncoderParams};
use crate::registry::Registry;
use crate::{log_debug, log_error};

const COMPONENT: &str = "opus_bridge";

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(u64);

        impl $name {
            pub const NULL: Self = Self(0);

            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn into_raw(self) -> u64 {
                self.0
            }

            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:#x})"), self.0)
            }
        }
    };
}

handle_type!(
    /// Token for an encoder session owned by an [`OpusBridge`].
    EncoderHandle
);

handle_type!(
    /// Token for a decoder session owned by an [`OpusBridge`].
    DecoderHandle
);

/// Owns encoder and decoder sessions on behalf of token-holding callers.
///
/// Handles are only meaningful for the bridge that issued them. A released
/// handle never resolves again, even when its slot is reused.
pub struct OpusBridge {
    encoders: Registry<EncoderSession>,
    decoders: Registry<DecoderSession>,
    encoder_logger: Arc<dyn Logger>,
    decoder_logger: Arc<dyn Logger>,
    logger: Arc<dyn Logger>,
}

impl Default for OpusBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl OpusBridge {
    /// Creates a bridge whose sessions log through `tracing`.
    pub fn new() -> Self {
        Self::with_loggers(
            logger::default_logger("opus_encoder"),
            logger::default_logger("opus_decoder"),
            logger::default_logger(COMPONENT),
        )
    }

    /// Creates a bridge that sends all diagnostics to `logger`.
    pub fn with_logger(logger: Arc<dyn Logger>) -> Self {
        Self::with_loggers(Arc::clone(&logger), Arc::clone(&logger), logger)
    }

    /// Creates a bridge with separate sinks for encoder sessions, decoder
    /// sessions and handle bookkeeping.
    pub fn with_loggers(
        encoder_logger: Arc<dyn Logger>,
        decoder_logger: Arc<dyn Logger>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            encoders: Registry::new(),
            decoders: Registry::new(),
            encoder_logger,
            decoder_logger,
            logger,
        }
    }

    /// Returns [`EncoderHandle::NULL`] if the encoder cannot be created.
    pub fn create_encoder(&self, params: &EncoderParams) -> EncoderHandle {
        match EncoderSession::with_logger(params, Arc::clone(&self.encoder_logger)) {
            Ok(session) => {
                let handle = EncoderHandle(self.encoders.insert(session));
                log_debug!(self.logger, "issued {:?}", handle);
                handle
            }
            Err(_) => EncoderHandle::NULL,
        }
    }

    /// Returns [`DecoderHandle::NULL`] if the decoder cannot be created.
    pub fn create_decoder(&self, sample_rate: i32, channels: i32) -> DecoderHandle {
        let params = DecoderParams::new(sample_rate, channels);
        match DecoderSession::with_logger(&params, Arc::clone(&self.decoder_logger)) {
            Ok(session) => {
                let handle = DecoderHandle(self.decoders.insert(session));
                log_debug!(self.logger, "issued {:?}", handle);
                handle
            }
            Err(_) => DecoderHandle::NULL,
        }
    }

    /// Encodes one frame into a packet of exactly the session's target size.
    pub fn encode(&self, handle: EncoderHandle, pcm: &[i16]) -> Option<Vec<u8>> {
        let Some(session) = self.encoders.get(handle.0) else {
            log_error!(self.logger, "encode: invalid encoder handle {:?}", handle);
            return None;
        };
        let mut session = session.lock();
        session.encode(pcm).ok()
    }

    /// Decodes one packet into `out`.
    ///
    /// Returns samples per channel, [`ERR_INVALID_HANDLE`] for a null or
    /// released handle, [`ERR_BUFFER_TOO_SMALL`](crate::error::ERR_BUFFER_TOO_SMALL)
    /// when `out` cannot hold a frame, or the libopus error code.
    pub fn decode(&self, handle: DecoderHandle, packet: &[u8], out: &mut [i16], fec: bool) -> i32 {
        let Some(session) = self.decoders.get(handle.0) else {
            log_error!(self.logger, "decode: invalid decoder handle {:?}", handle);
            return ERR_INVALID_HANDLE;
        };
        let mut session = session.lock();
        match session.decode(packet, out, fec) {
            Ok(n) => n as i32,
            Err(err) => err.code(),
        }
    }

    /// Releases an encoder. Null and already-released handles are ignored.
    pub fn release_encoder(&self, handle: EncoderHandle) {
        if let Some(session) = self.encoders.remove(handle.0) {
            session.lock().close();
            log_debug!(self.logger, "released {:?}", handle);
        }
    }

    /// Releases a decoder. Null and already-released handles are ignored.
    pub fn release_decoder(&self, handle: DecoderHandle) {
        if let Some(session) = self.decoders.remove(handle.0) {
            session.lock().close();
            log_debug!(self.logger, "released {:?}", handle);
        }
    }

    /// Samples per channel per frame, or -1 for an invalid handle.
    pub fn encoder_frame_samples(&self, handle: EncoderHandle) -> i32 {
        self.encoders
            .get(handle.0)
            .map_or(ERR_INVALID_HANDLE, |s| s.lock().frame_sample_count() as i32)
    }

    /// Samples per channel per frame, or -1 for an invalid handle.
    pub fn decoder_frame_samples(&self, handle: DecoderHandle) -> i32 {
        self.decoders
            .get(handle.0)
            .map_or(ERR_INVALID_HANDLE, |s| s.lock().frame_sample_count() as i32)
    }

    /// Number of live encoder and decoder sessions.
    pub fn live_sessions(&self) -> (usize, usize) {
        (self.encoders.len(), self.decoders.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ERR_BUFFER_TOO_SMALL;
    use crate::logger::testing::CapturingLogger;

    fn scenario_params() -> EncoderParams {
        EncoderParams::new(16000, 1)
            .target_bytes(40)
            .bitrate(16000)
            .cbr(true)
            .dtx(false)
            .complexity(5)
            .signal_voice(true)
    }

    #[test]
    fn test_encoder_scenario() {
        let bridge = OpusBridge::new();
        let enc = bridge.create_encoder(&scenario_params());
        assert!(!enc.is_null());
        assert_eq!(bridge.encoder_frame_samples(enc), 960);

        let packet = bridge.encode(enc, &[0i16; 960]).unwrap();
        assert_eq!(packet.len(), 40);
        bridge.release_encoder(enc);
    }

    #[test]
    fn test_encode_undersized_frame() {
        let bridge = OpusBridge::new();
        let enc = bridge.create_encoder(&scenario_params());
        assert!(bridge.encode(enc, &[0i16; 100]).is_none());
        assert_eq!(bridge.encode(enc, &[0i16; 960]).unwrap().len(), 40);
    }

    #[test]
    fn test_decoder_rejects_small_buffer() {
        let bridge = OpusBridge::new();
        let dec = bridge.create_decoder(16000, 1);
        assert_eq!(bridge.decoder_frame_samples(dec), 960);

        let mut out = vec![0i16; 959];
        let ret = bridge.decode(dec, &[0x58, 0x00], &mut out, false);
        assert!(ret < 0);
        assert_eq!(ret, ERR_BUFFER_TOO_SMALL);
    }

    #[test]
    fn test_roundtrip_through_handles() {
        let bridge = OpusBridge::new();
        let enc = bridge.create_encoder(&EncoderParams::new(48000, 2).target_bytes(240).bitrate(32000));
        let dec = bridge.create_decoder(48000, 2);

        let pcm: Vec<i16> = (0..5760).map(|i| ((i * 37) % 2000) as i16 - 1000).collect();
        let packet = bridge.encode(enc, &pcm).unwrap();
        assert_eq!(packet.len(), 240);

        let mut out = vec![0i16; 5760];
        assert_eq!(bridge.decode(dec, &packet, &mut out, false), 2880);
    }

    #[test]
    fn test_null_handles() {
        let logger = CapturingLogger::new();
        let bridge = OpusBridge::with_logger(logger.clone());
        let mut out = vec![0i16; 960];

        assert_eq!(bridge.encoder_frame_samples(EncoderHandle::NULL), -1);
        assert_eq!(bridge.decoder_frame_samples(DecoderHandle::NULL), -1);
        assert!(bridge.encode(EncoderHandle::NULL, &[0i16; 960]).is_none());
        assert_eq!(bridge.decode(DecoderHandle::NULL, &[0x58], &mut out, false), ERR_INVALID_HANDLE);
        bridge.release_encoder(EncoderHandle::NULL);
        bridge.release_decoder(DecoderHandle::NULL);
        assert_eq!(logger.errors().len(), 2);
    }

    #[test]
    fn test_handle_errors_use_bridge_logger() {
        let encoder_logger = CapturingLogger::new();
        let decoder_logger = CapturingLogger::new();
        let bridge_logger = CapturingLogger::new();
        let bridge = OpusBridge::with_loggers(
            encoder_logger.clone(),
            decoder_logger.clone(),
            bridge_logger.clone(),
        );
        let mut out = vec![0i16; 960];

        assert!(bridge.encode(EncoderHandle::NULL, &[0i16; 960]).is_none());
        assert_eq!(bridge.decode(DecoderHandle::NULL, &[0x58], &mut out, false), ERR_INVALID_HANDLE);
        assert_eq!(
            bridge_logger.errors(),
            vec![
                "encode: invalid encoder handle EncoderHandle(0x0)",
                "decode: invalid decoder handle DecoderHandle(0x0)",
            ]
        );

        let dec = bridge.create_decoder(16000, 1);
        let mut short = vec![0i16; 10];
        assert_eq!(bridge.decode(dec, &[0x58], &mut short, false), ERR_BUFFER_TOO_SMALL);
        assert_eq!(decoder_logger.errors(), vec!["decode: pcm out too small: 10 < 960"]);
        assert!(encoder_logger.errors().is_empty());
        assert_eq!(bridge_logger.errors().len(), 2);
    }

    #[test]
    fn test_release_twice_is_noop() {
        let bridge = OpusBridge::new();
        let enc = bridge.create_encoder(&scenario_params());
        let dec = bridge.create_decoder(16000, 1);
        assert_eq!(bridge.live_sessions(), (1, 1));

        bridge.release_encoder(enc);
        bridge.release_encoder(enc);
        bridge.release_decoder(dec);
        bridge.release_decoder(dec);
        assert_eq!(bridge.live_sessions(), (0, 0));

        assert_eq!(bridge.encoder_frame_samples(enc), -1);
        assert!(bridge.encode(enc, &[0i16; 960]).is_none());
        let mut out = vec![0i16; 960];
        assert_eq!(bridge.decode(dec, &[0x58], &mut out, false), ERR_INVALID_HANDLE);
    }

    #[test]
    fn test_stale_handle_does_not_alias_new_session() {
        let bridge = OpusBridge::new();
        let old = bridge.create_decoder(16000, 1);
        bridge.release_decoder(old);
        let new = bridge.create_decoder(48000, 2);

        assert_eq!(bridge.decoder_frame_samples(old), -1);
        assert_eq!(bridge.decoder_frame_samples(new), 2880);
    }

    #[test]
    fn test_create_failure_returns_null() {
        let bridge = OpusBridge::with_logger(Arc::new(crate::logger::NopLogger));
        assert!(bridge.create_encoder(&EncoderParams::new(44100, 1)).is_null());
        assert!(bridge.create_decoder(16000, 5).is_null());
        assert_eq!(bridge.live_sessions(), (0, 0));
    }

    #[test]
    fn test_handle_raw_roundtrip() {
        let bridge = OpusBridge::new();
        let enc = bridge.create_encoder(&scenario_params());
        let raw = enc.into_raw();
        assert_eq!(EncoderHandle::from_raw(raw), enc);
        assert!(format!("{:?}", enc).starts_with("EncoderHandle(0x"));
    }

    #[test]
    fn test_sessions_on_separate_threads() {
        let bridge = Arc::new(OpusBridge::new());
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let bridge = Arc::clone(&bridge);
                std::thread::spawn(move || {
                    let enc = bridge.create_encoder(&EncoderParams::default());
                    let dec = bridge.create_decoder(16000, 1);
                    let mut out = vec![0i16; 960];
                    for _ in 0..5 {
                        let packet = bridge.encode(enc, &[0i16; 960]).unwrap();
                        assert_eq!(packet.len(), 180);
                        assert_eq!(bridge.decode(dec, &packet, &mut out, false), 960);
                    }
                    bridge.release_encoder(enc);
                    bridge.release_decoder(dec);
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(bridge.live_sessions(), (0, 0));
    }
}
