//! Decoder session: one packet in, one PCM frame out.

use std::os::raw::c_int;
use std::ptr;
use std::sync::Arc;

use crate::error::{CodecError, Result};
use crate::ffi::{self, OpusDecoder as OpusDecoderHandle};
use crate::frame::{FrameDuration, SESSION_FRAME_DURATION};
use crate::logger::{self, Logger};
use crate::params::DecoderParams;
use crate::{log_debug, log_error};

const COMPONENT: &str = "opus_decoder";

/// Owns one libopus decoder.
///
/// Decoding never writes more than
/// [`frame_sample_count`](Self::frame_sample_count) samples per channel.
pub struct DecoderSession {
    handle: *mut OpusDecoderHandle,
    sample_rate: i32,
    channels: i32,
    frame_duration: FrameDuration,
    frame_samples: usize,
    logger: Arc<dyn Logger>,
}

// Safety: the decoder state is only touched through &mut self.
unsafe impl Send for DecoderSession {}

impl Drop for DecoderSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for DecoderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderSession")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("frame_duration", &self.frame_duration)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl DecoderSession {
    /// Creates a decoder that logs through `tracing`.
    pub fn new(params: &DecoderParams) -> Result<Self> {
        Self::with_logger(params, logger::default_logger(COMPONENT))
    }

    /// Creates a decoder that reports to `logger`.
    pub fn with_logger(params: &DecoderParams, logger: Arc<dyn Logger>) -> Result<Self> {
        if let Err(err) = params.validate() {
            log_error!(logger, "create: {}", err);
            return Err(err);
        }

        let mut error: c_int = 0;
        let handle =
            unsafe { ffi::opus_decoder_create(params.sample_rate, params.channels, &mut error) };

        if handle.is_null() || error != ffi::OPUS_OK {
            if !handle.is_null() {
                unsafe { ffi::opus_decoder_destroy(handle) };
            }
            log_error!(logger, "opus_decoder_create failed: {}", error);
            return Err(CodecError::native(error, |code, msg| CodecError::CreateFailed {
                what: "decoder",
                code,
                msg,
            }));
        }

        let frame_duration = SESSION_FRAME_DURATION;
        let session = Self {
            handle,
            sample_rate: params.sample_rate,
            channels: params.channels,
            frame_duration,
            frame_samples: frame_duration.samples(params.sample_rate),
            logger,
        };
        log_debug!(
            session.logger,
            "decoder created: rate={} channels={} frame={}",
            session.sample_rate,
            session.channels,
            session.frame_duration,
        );
        Ok(session)
    }

    /// Returns the output sample rate in Hz.
    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    /// Returns the number of interleaved output channels.
    pub fn channels(&self) -> i32 {
        self.channels
    }

    /// Returns the frame duration, always [`SESSION_FRAME_DURATION`].
    pub fn frame_duration(&self) -> FrameDuration {
        self.frame_duration
    }

    /// Upper bound on samples per channel returned by one decode call.
    pub fn frame_sample_count(&self) -> usize {
        self.frame_samples
    }

    /// Minimum output buffer length, in interleaved samples.
    pub fn frame_len(&self) -> usize {
        self.frame_samples * self.channels as usize
    }

    /// Reports whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.handle.is_null()
    }

    /// Releases the native decoder. Safe to call more than once.
    pub fn close(&mut self) {
        if !self.handle.is_null() {
            unsafe { ffi::opus_decoder_destroy(self.handle) };
            self.handle = ptr::null_mut();
            log_debug!(self.logger, "decoder closed");
        }
    }

    /// Decodes `packet` into `out` and returns samples per channel.
    ///
    /// With `fec` set, the decoder reconstructs the frame *before* `packet`
    /// from the redundancy carried in it; pass the packet that followed the
    /// lost one.
    pub fn decode(&mut self, packet: &[u8], out: &mut [i16], fec: bool) -> Result<usize> {
        let (data, len) = if packet.is_empty() {
            (ptr::null(), 0)
        } else {
            (packet.as_ptr(), packet.len() as ffi::OpusInt32)
        };
        self.decode_raw(data, len, out, fec)
    }

    /// Synthesizes one frame for a lost packet when no FEC data is at hand.
    pub fn conceal(&mut self, out: &mut [i16]) -> Result<usize> {
        self.decode_raw(ptr::null(), 0, out, false)
    }

    fn decode_raw(
        &mut self,
        data: *const u8,
        len: ffi::OpusInt32,
        out: &mut [i16],
        fec: bool,
    ) -> Result<usize> {
        if self.handle.is_null() {
            log_error!(self.logger, "decode: decoder is closed");
            return Err(CodecError::Closed);
        }

        let want = self.frame_len();
        if out.len() < want {
            log_error!(self.logger, "decode: pcm out too small: {} < {}", out.len(), want);
            return Err(CodecError::OutputTooSmall {
                got: out.len(),
                want,
            });
        }

        let n = unsafe {
            ffi::opus_decode(
                self.handle,
                data,
                len,
                out.as_mut_ptr(),
                self.frame_samples as c_int,
                c_int::from(fec),
            )
        };

        if n < 0 {
            log_error!(self.logger, "opus decode error: {}", n);
            return Err(CodecError::native(n, |code, msg| CodecError::DecodeFailed {
                code,
                msg,
            }));
        }

        Ok(n as usize)
    }
}
