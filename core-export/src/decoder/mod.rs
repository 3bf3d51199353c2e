//! # Decoder Module
//!
//! Turns a compressed clip payload into PCM through a native-style sound
//! engine.
//!
//! ## Overview
//!
//! - [`SoundEngine`]: handle-based engine interface (system, sound,
//!   sub-sound, lock/unlock, release)
//! - [`DecodeSession`]: owns the handles for one clip and releases them on
//!   every path
//! - [`DecodedStreamInfo`]: validated PCM layout handed to the waveform writer
//! - `SymphoniaEngine` (feature `symphonia-engine`): pure-Rust engine that
//!   decodes FSB5 banks and the containers Symphonia understands
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! let mut session = DecodeSession::open(&mut engine, logger, "theme", &payload, 1)?;
//! let info = session.stream_info()?;
//! session.with_locked_pcm(&info, |lock| writer.write(&mut file, &info, &lock.first))?;
//! ```

mod engine;
mod session;
mod stream_info;

#[cfg(feature = "symphonia-engine")]
mod format_detector;

#[cfg(feature = "symphonia-engine")]
pub mod fsb5;

#[cfg(feature = "symphonia-engine")]
mod sample_converter;

#[cfg(feature = "symphonia-engine")]
mod symphonia;

pub use engine::{PcmLock, SoundEngine, SoundFormat, SoundHandle, SystemHandle};
pub use session::{DecodeResult, DecodeSession, EXPORTED_SUB_SOUND};
pub use stream_info::DecodedStreamInfo;

#[cfg(feature = "symphonia-engine")]
pub use self::symphonia::SymphoniaEngine;

#[cfg(feature = "symphonia-engine")]
pub use format_detector::{ContainerKind, FormatDetector};

#[cfg(feature = "symphonia-engine")]
pub use sample_converter::SampleConverter;
