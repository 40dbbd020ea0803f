//! Error types for the Opus sessions.

use thiserror::Error;

use crate::ffi;

/// Sentinel returned by the handle API for a null or stale handle.
pub const ERR_INVALID_HANDLE: i32 = -1;

/// Sentinel returned by the handle API when a caller buffer is too small.
pub const ERR_BUFFER_TOO_SMALL: i32 = -2;

/// Errors produced by encoder and decoder sessions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("opus: invalid parameters: {0}")]
    InvalidParams(String),

    #[error("opus: {what} create failed: {msg} ({code})")]
    CreateFailed {
        what: &'static str,
        code: i32,
        msg: String,
    },

    #[error("opus: set {request} failed: {msg} ({code})")]
    CtlFailed {
        request: &'static str,
        code: i32,
        msg: String,
    },

    #[error("opus: session is closed")]
    Closed,

    #[error("opus: input pcm size {got} < expected {want}")]
    FrameTooShort { got: usize, want: usize },

    #[error("opus: output pcm size {got} < expected {want}")]
    OutputTooSmall { got: usize, want: usize },

    #[error("opus: encode failed: {msg} ({code})")]
    EncodeFailed { code: i32, msg: String },

    #[error("opus: packet pad failed: {msg} ({code})")]
    PadFailed { code: i32, msg: String },

    #[error("opus: encoded {size} > target {target}, lower bitrate/complexity")]
    PacketTooLarge { size: usize, target: usize },

    #[error("opus: decode failed: {msg} ({code})")]
    DecodeFailed { code: i32, msg: String },

    #[error("opus: pcm byte length {0} is odd")]
    OddByteLength(usize),
}

impl CodecError {
    pub(crate) fn native(code: i32, make: impl FnOnce(i32, String) -> Self) -> Self {
        make(code, ffi::error_string(code))
    }

    /// Maps the error to the integer sentinel used by the handle API.
    ///
    /// Native failures keep their libopus code; everything else collapses to
    /// [`ERR_INVALID_HANDLE`] or [`ERR_BUFFER_TOO_SMALL`].
    pub fn code(&self) -> i32 {
        match self {
            Self::CreateFailed { code, .. }
            | Self::CtlFailed { code, .. }
            | Self::EncodeFailed { code, .. }
            | Self::PadFailed { code, .. }
            | Self::DecodeFailed { code, .. } => *code,
            Self::FrameTooShort { .. } | Self::OutputTooSmall { .. } => ERR_BUFFER_TOO_SMALL,
            Self::Closed => ERR_INVALID_HANDLE,
            Self::InvalidParams(_) | Self::OddByteLength(_) => ffi::OPUS_BAD_ARG,
            Self::PacketTooLarge { .. } => ffi::OPUS_BUFFER_TOO_SMALL,
        }
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, CodecError>;
