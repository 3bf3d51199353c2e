//! # AudioClip Export Module
//!
//! Extracts the audio payload of AudioClip assets and writes it to disk,
//! transcoding to PCM waveform files where the decoding engine supports the
//! format.
//!
//! ## Overview
//!
//! This module handles:
//! - Version-aware classification of the clip's compression tag
//! - Locating the payload inline or in a sibling resource file
//! - Decoding through a handle-based [`SoundEngine`](decoder::SoundEngine)
//!   with guaranteed handle release
//! - Writing canonical 44-byte-header waveform files
//! - Raw fallback for formats the engine cannot decode
//!
//! The built-in `SymphoniaEngine` is behind the `symphonia-engine` feature
//! (enabled by default).

pub mod classifier;
pub mod clip;
pub mod config;
pub mod decoder;
pub mod diagnostics;
pub mod error;
pub mod exporter;
pub mod locator;
pub mod naming;
pub mod wav;

pub use classifier::{FormatClassifier, WAVE_EXTENSION};
pub use clip::{
    AudioClip, AudioCompressionFormat, ClipPayload, CompressionTag, FmodSoundType,
    StreamedResource, UnityVersion,
};
pub use config::{ExportSettings, TranscodeFailurePolicy};
pub use decoder::{DecodeSession, DecodedStreamInfo, SoundEngine};
pub use error::{ClipError, DecodeError, EngineError, ExportError, LocatorError, Result};
pub use exporter::{ClipExporter, ClipReport, ExportOutcome, ExportSummary};
pub use locator::{CompressedPayload, RawPayloadLocator};
pub use wav::WaveformWriter;

#[cfg(feature = "symphonia-engine")]
pub use decoder::SymphoniaEngine;
