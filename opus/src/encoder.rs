//! Encoder session: one PCM frame in, one fixed-size packet out.

use std::os::raw::c_int;
use std::ptr;
use std::sync::Arc;

use crate::error::{CodecError, Result};
use crate::ffi::{self, OpusEncoder as OpusEncoderHandle};
use crate::frame::{FrameDuration, SESSION_FRAME_DURATION};
use crate::logger::{self, Logger};
use crate::params::EncoderParams;
use crate::pcm;
use crate::{log_debug, log_error};

const COMPONENT: &str = "opus_encoder";

/// Owns one libopus encoder and its scratch packet buffer.
///
/// Every successful [`encode`](Self::encode) returns exactly
/// [`target_bytes`](Self::target_bytes) bytes. Shorter packets are grown
/// with Opus padding so a decoder still parses them.
///
/// Release the native encoder with [`close`](Self::close). Dropping the
/// session closes it too.
pub struct EncoderSession {
    handle: *mut OpusEncoderHandle,
    sample_rate: i32,
    channels: i32,
    target_bytes: usize,
    frame_duration: FrameDuration,
    frame_samples: usize,
    buf: Vec<u8>,
    logger: Arc<dyn Logger>,
}

// Safety: the encoder state is only touched through &mut self.
unsafe impl Send for EncoderSession {}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for EncoderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderSession")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("target_bytes", &self.target_bytes)
            .field("frame_duration", &self.frame_duration)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl EncoderSession {
    /// Creates an encoder that logs through `tracing`.
    pub fn new(params: &EncoderParams) -> Result<Self> {
        Self::with_logger(params, logger::default_logger(COMPONENT))
    }

    /// Creates an encoder configured for VoIP with the given tuning knobs.
    pub fn with_logger(params: &EncoderParams, logger: Arc<dyn Logger>) -> Result<Self> {
        if let Err(err) = params.validate() {
            log_error!(logger, "create: {}", err);
            return Err(err);
        }

        let mut error: c_int = 0;
        let handle = unsafe {
            ffi::opus_encoder_create(
                params.sample_rate,
                params.channels,
                ffi::OPUS_APPLICATION_VOIP,
                &mut error,
            )
        };

        if handle.is_null() || error != ffi::OPUS_OK {
            if !handle.is_null() {
                unsafe { ffi::opus_encoder_destroy(handle) };
            }
            log_error!(logger, "opus_encoder_create failed: {}", error);
            return Err(CodecError::native(error, |code, msg| CodecError::CreateFailed {
                what: "encoder",
                code,
                msg,
            }));
        }

        let frame_duration = SESSION_FRAME_DURATION;
        let mut session = Self {
            handle,
            sample_rate: params.sample_rate,
            channels: params.channels,
            target_bytes: params.target_bytes,
            frame_duration,
            frame_samples: frame_duration.samples(params.sample_rate),
            buf: vec![0u8; ffi::MAX_PACKET_BYTES],
            logger,
        };
        session.configure(params)?;

        log_debug!(
            session.logger,
            "encoder created: rate={} channels={} target={}B bitrate={} cbr={} dtx={} complexity={} frame={}",
            session.sample_rate,
            session.channels,
            session.target_bytes,
            params.bitrate,
            params.cbr,
            params.dtx,
            params.complexity,
            session.frame_duration,
        );
        Ok(session)
    }

    fn configure(&mut self, params: &EncoderParams) -> Result<()> {
        let signal = if params.signal_voice {
            ffi::OPUS_SIGNAL_VOICE
        } else {
            ffi::OPUS_SIGNAL_MUSIC
        };

        let requests = [
            ("signal", ffi::OPUS_SET_SIGNAL_REQUEST, signal),
            ("bitrate", ffi::OPUS_SET_BITRATE_REQUEST, params.bitrate),
            ("vbr", ffi::OPUS_SET_VBR_REQUEST, i32::from(!params.cbr)),
            ("vbr constraint", ffi::OPUS_SET_VBR_CONSTRAINT_REQUEST, 1),
            ("dtx", ffi::OPUS_SET_DTX_REQUEST, i32::from(params.dtx)),
            ("complexity", ffi::OPUS_SET_COMPLEXITY_REQUEST, params.complexity),
        ];

        for (request, code, value) in requests {
            let ret = unsafe { ffi::encoder_set(self.handle, code, value) };
            if ret != ffi::OPUS_OK {
                log_error!(self.logger, "set {}={} failed: {}", request, value, ret);
                return Err(CodecError::native(ret, |code, msg| CodecError::CtlFailed {
                    request,
                    code,
                    msg,
                }));
            }
        }
        Ok(())
    }

    /// Returns the input sample rate in Hz.
    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    /// Returns the number of interleaved input channels.
    pub fn channels(&self) -> i32 {
        self.channels
    }

    /// Fixed size of every packet this session produces.
    pub fn target_bytes(&self) -> usize {
        self.target_bytes
    }

    /// Returns the frame duration, always [`SESSION_FRAME_DURATION`].
    pub fn frame_duration(&self) -> FrameDuration {
        self.frame_duration
    }

    /// Samples per channel consumed by each encode call.
    pub fn frame_sample_count(&self) -> usize {
        self.frame_samples
    }

    /// Interleaved samples consumed by each encode call.
    pub fn frame_len(&self) -> usize {
        self.frame_samples * self.channels as usize
    }

    /// Reports whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.handle.is_null()
    }

    /// Releases the native encoder. Safe to call more than once.
    pub fn close(&mut self) {
        if !self.handle.is_null() {
            unsafe { ffi::opus_encoder_destroy(self.handle) };
            self.handle = ptr::null_mut();
            log_debug!(self.logger, "encoder closed");
        }
    }

    /// Encodes one frame of interleaved PCM.
    ///
    /// `pcm` must hold at least [`frame_len`](Self::frame_len) samples;
    /// anything past that is ignored.
    pub fn encode(&mut self, pcm: &[i16]) -> Result<Vec<u8>> {
        let n = self.encode_frame(pcm)?;
        Ok(self.buf[..n].to_vec())
    }

    /// Encodes one frame given as s16le bytes.
    pub fn encode_bytes(&mut self, pcm: &[u8]) -> Result<Vec<u8>> {
        let samples = pcm::bytes_to_samples(pcm).inspect_err(|err| {
            log_error!(self.logger, "encode: {}", err);
        })?;
        self.encode(&samples)
    }

    fn encode_frame(&mut self, pcm: &[i16]) -> Result<usize> {
        if self.handle.is_null() {
            log_error!(self.logger, "encode: encoder is closed");
            return Err(CodecError::Closed);
        }

        let want = self.frame_len();
        if pcm.len() < want {
            log_error!(self.logger, "encode: input pcm size {} < expected {}", pcm.len(), want);
            return Err(CodecError::FrameTooShort {
                got: pcm.len(),
                want,
            });
        }

        // The encoder's byte budget is the target size, so CBR lands on it
        // and VBR never overshoots it.
        let n = unsafe {
            ffi::opus_encode(
                self.handle,
                pcm.as_ptr(),
                self.frame_samples as c_int,
                self.buf.as_mut_ptr(),
                self.target_bytes as ffi::OpusInt32,
            )
        };

        if n < 0 {
            log_error!(self.logger, "opus encode error: {}", n);
            return Err(CodecError::native(n, |code, msg| CodecError::EncodeFailed {
                code,
                msg,
            }));
        }

        pad_to_target(&mut self.buf, n as usize, self.target_bytes).inspect_err(|err| match err {
            CodecError::PacketTooLarge { size, target } => log_error!(
                self.logger,
                "encoded {} > target {}. Lower bitrate/complexity.",
                size,
                target
            ),
            other => log_error!(self.logger, "{}", other),
        })
    }
}

/// Grows the packet in `buf[..len]` to exactly `target` bytes.
///
/// Packets already larger than `target` are rejected untouched; truncating
/// would corrupt the bitstream.
pub(crate) fn pad_to_target(buf: &mut [u8], len: usize, target: usize) -> Result<usize> {
    if len > target {
        return Err(CodecError::PacketTooLarge { size: len, target });
    }
    if len < target {
        debug_assert!(buf.len() >= target);
        let ret = unsafe {
            ffi::opus_packet_pad(
                buf.as_mut_ptr(),
                len as ffi::OpusInt32,
                target as ffi::OpusInt32,
            )
        };
        if ret != ffi::OPUS_OK {
            return Err(CodecError::native(ret, |code, msg| CodecError::PadFailed {
                code,
                msg,
            }));
        }
    }
    Ok(target)
}
