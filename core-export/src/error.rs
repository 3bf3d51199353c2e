//! # Export Error Types
//!
//! Error types for every stage of the AudioClip export pipeline.
//!
//! Each stage has its own enum so callers can tell which step failed:
//! [`LocatorError`] for fetching the compressed payload, [`DecodeError`] for the
//! decoding session, [`EngineError`] for raw engine calls. [`ExportError`]
//! wraps them at the exporter boundary.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors returned by a [`SoundEngine`](crate::decoder::SoundEngine) call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Handle does not refer to a live object of the expected kind.
    #[error("Invalid handle: {0}")]
    InvalidHandle(u64),

    /// System was used before `init` succeeded.
    #[error("Engine system not initialized")]
    NotInitialized,

    /// Data is not in a format the engine can open.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Requested sub-sound index does not exist.
    #[error("Sub-sound index {index} out of range ({count} available)")]
    SubSoundIndex { index: u32, count: u32 },

    /// Payload could be opened but not decoded.
    #[error("Decode failure: {0}")]
    Decode(String),

    /// Lock range lies outside the decoded sample data.
    #[error("Lock range {offset}+{length} exceeds {available} bytes")]
    LockRange {
        offset: u32,
        length: u32,
        available: usize,
    },

    /// Sound already has an outstanding lock.
    #[error("Sound is already locked")]
    AlreadyLocked,

    /// Unlock was called on a sound that is not locked.
    #[error("Sound is not locked")]
    NotLocked,

    /// Any other engine failure.
    #[error("Engine error: {0}")]
    Other(String),
}

/// Result type for engine calls.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors raised while constructing an [`AudioClip`](crate::clip::AudioClip).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipError {
    /// Payload storage mode does not match what the container version encodes.
    #[error("AudioClip '{clip}' from version {version} must store its data {expected}")]
    PayloadModeMismatch {
        clip: String,
        version: String,
        expected: &'static str,
    },

    /// Version string could not be parsed.
    #[error("Invalid container version '{0}'")]
    InvalidVersion(String),
}

/// Errors raised while locating the compressed payload of a clip.
#[derive(Error, Debug)]
pub enum LocatorError {
    /// Sibling resource file is not known to the resolver.
    #[error("Can't export '{clip}' because resources file '{resource}' wasn't found")]
    ResourceNotFound { clip: String, resource: String },

    /// Container version does not encode the payload length.
    #[error("Can't export '{clip}' because unknown raw data size")]
    UnknownPayloadSize { clip: String },

    /// Stored length does not fit in memory on this platform.
    #[error("Can't export '{clip}' because payload size {size} is too large")]
    PayloadTooLarge { clip: String, size: u64 },

    /// Reading the resource file failed.
    #[error("Can't read payload of '{clip}' from '{resource}': {source}")]
    Read {
        clip: String,
        resource: String,
        source: BridgeError,
    },
}

/// Errors raised by a [`DecodeSession`](crate::decoder::DecodeSession).
///
/// Every variant except [`DecodeError::UnlockFailed`] aborts the current clip.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Can't create or init engine for AudioClip {clip}: {source}")]
    EngineInitFailed { clip: String, source: EngineError },

    #[error("Can't create sound for AudioClip {clip}: {source}")]
    SoundCreateFailed { clip: String, source: EngineError },

    #[error("Can't get subsound for AudioClip {clip}: {source}")]
    SubStreamFailed { clip: String, source: EngineError },

    #[error("Can't get format for AudioClip {clip}: {source}")]
    FormatQueryFailed { clip: String, source: EngineError },

    #[error("Can't get length for AudioClip {clip}: {source}")]
    LengthQueryFailed { clip: String, source: EngineError },

    #[error("Can't lock for AudioClip {clip}: {source}")]
    LockFailed { clip: String, source: EngineError },

    #[error("Can't unlock for AudioClip {clip}: {source}")]
    UnlockFailed { clip: String, source: EngineError },

    /// Engine reported values that cannot describe a PCM stream.
    #[error("Invalid stream format for AudioClip {clip}: {reason}")]
    InvalidStream { clip: String, reason: String },

    /// Writing the waveform to the output failed.
    #[error("Can't write waveform for AudioClip {clip}: {source}")]
    Write {
        clip: String,
        source: std::io::Error,
    },
}

impl DecodeError {
    /// Short name of the failing step, used as a structured log field.
    pub fn step(&self) -> &'static str {
        match self {
            DecodeError::EngineInitFailed { .. } => "engine_init",
            DecodeError::SoundCreateFailed { .. } => "create_sound",
            DecodeError::SubStreamFailed { .. } => "sub_sound",
            DecodeError::FormatQueryFailed { .. } => "format",
            DecodeError::LengthQueryFailed { .. } => "length",
            DecodeError::LockFailed { .. } => "lock",
            DecodeError::UnlockFailed { .. } => "unlock",
            DecodeError::InvalidStream { .. } => "stream_info",
            DecodeError::Write { .. } => "write",
        }
    }

    /// Returns `true` if this error aborts the clip.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DecodeError::UnlockFailed { .. })
    }
}

/// Errors surfaced by the exporter.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Clip(#[from] ClipError),

    /// Invalid export settings.
    #[error("Invalid export settings: {0}")]
    Settings(String),

    /// Output directory or file could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Returns `true` if the error only affects a single clip.
    pub fn is_clip_local(&self) -> bool {
        matches!(
            self,
            ExportError::Locator(_) | ExportError::Decode(_) | ExportError::Clip(_)
        )
    }
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
