//! # Decoding Engine Abstraction
//!
//! Handle-based interface over a native sound engine (FMOD-style).
//!
//! ## Architecture
//!
//! The engine hands out opaque handles and expects every one of them to be
//! released explicitly:
//!
//! ```text
//! create_system → init → create_sound(payload) → sub_sound(0)
//!     → format / default_frequency / pcm_length → lock → unlock
//!     → release_sound(sub) → release_sound(sound) → release_system
//! ```
//!
//! Callers should not drive this trait directly; [`DecodeSession`] pairs each
//! acquisition with its release.
//!
//! [`DecodeSession`]: super::DecodeSession

use crate::error::EngineResult;
use bytes::Bytes;

/// Engine system instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemHandle(pub u64);

/// Loaded sound or sub-sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u64);

/// Sample layout of a decoded sub-sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundFormat {
    /// Number of interleaved channels
    pub channels: u16,
    /// Bits per sample of the PCM data handed out by `lock`
    pub bits_per_sample: u16,
}

impl SoundFormat {
    pub fn new(channels: u16, bits_per_sample: u16) -> Self {
        Self {
            channels,
            bits_per_sample,
        }
    }
}

/// PCM regions returned by [`SoundEngine::lock`].
///
/// The engine may wrap around an internal ring buffer, in which case the
/// requested range is split in two. For fully decoded sounds the second
/// region is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PcmLock {
    pub first: Bytes,
    pub second: Bytes,
}

impl PcmLock {
    pub fn new(first: Bytes, second: Bytes) -> Self {
        Self { first, second }
    }

    /// Lock covering a single contiguous region.
    pub fn contiguous(data: Bytes) -> Self {
        Self {
            first: data,
            second: Bytes::new(),
        }
    }

    pub fn first_len(&self) -> usize {
        self.first.len()
    }

    pub fn second_len(&self) -> usize {
        self.second.len()
    }

    /// Combined length of both regions.
    pub fn total_len(&self) -> usize {
        self.first.len() + self.second.len()
    }
}

/// Native decoding engine.
///
/// One engine object may serve many sessions in sequence, but it is not
/// assumed to be thread-safe: concurrent exports need one engine each.
pub trait SoundEngine {
    /// Create an engine system instance.
    fn create_system(&mut self) -> EngineResult<SystemHandle>;

    /// Initialize `system` for synchronous in-memory decoding.
    fn init(&mut self, system: SystemHandle, max_voices: u32) -> EngineResult<()>;

    /// Load `data` as an in-memory sound of exactly `data.len()` bytes.
    fn create_sound(&mut self, system: SystemHandle, data: &[u8]) -> EngineResult<SoundHandle>;

    /// Open sub-sound `index` of a loaded sound.
    fn sub_sound(&mut self, sound: SoundHandle, index: u32) -> EngineResult<SoundHandle>;

    /// Channel count and bit depth of a sub-sound's PCM data.
    fn format(&mut self, sound: SoundHandle) -> EngineResult<SoundFormat>;

    /// Default playback frequency (sample rate) in Hz.
    fn default_frequency(&mut self, sound: SoundHandle) -> EngineResult<f32>;

    /// Total decoded length in PCM bytes.
    fn pcm_length(&mut self, sound: SoundHandle) -> EngineResult<u32>;

    /// Lock `length` PCM bytes starting at `offset` for reading.
    fn lock(&mut self, sound: SoundHandle, offset: u32, length: u32) -> EngineResult<PcmLock>;

    /// Release a lock obtained from [`SoundEngine::lock`], with both regions.
    fn unlock(&mut self, sound: SoundHandle, lock: &PcmLock) -> EngineResult<()>;

    /// Release a sound or sub-sound.
    fn release_sound(&mut self, sound: SoundHandle) -> EngineResult<()>;

    /// Release a system instance.
    fn release_system(&mut self, system: SystemHandle) -> EngineResult<()>;
}

impl<E: SoundEngine + ?Sized> SoundEngine for Box<E> {
    fn create_system(&mut self) -> EngineResult<SystemHandle> {
        (**self).create_system()
    }

    fn init(&mut self, system: SystemHandle, max_voices: u32) -> EngineResult<()> {
        (**self).init(system, max_voices)
    }

    fn create_sound(&mut self, system: SystemHandle, data: &[u8]) -> EngineResult<SoundHandle> {
        (**self).create_sound(system, data)
    }

    fn sub_sound(&mut self, sound: SoundHandle, index: u32) -> EngineResult<SoundHandle> {
        (**self).sub_sound(sound, index)
    }

    fn format(&mut self, sound: SoundHandle) -> EngineResult<SoundFormat> {
        (**self).format(sound)
    }

    fn default_frequency(&mut self, sound: SoundHandle) -> EngineResult<f32> {
        (**self).default_frequency(sound)
    }

    fn pcm_length(&mut self, sound: SoundHandle) -> EngineResult<u32> {
        (**self).pcm_length(sound)
    }

    fn lock(&mut self, sound: SoundHandle, offset: u32, length: u32) -> EngineResult<PcmLock> {
        (**self).lock(sound, offset, length)
    }

    fn unlock(&mut self, sound: SoundHandle, lock: &PcmLock) -> EngineResult<()> {
        (**self).unlock(sound, lock)
    }

    fn release_sound(&mut self, sound: SoundHandle) -> EngineResult<()> {
        (**self).release_sound(sound)
    }

    fn release_system(&mut self, system: SystemHandle) -> EngineResult<()> {
        (**self).release_system(system)
    }
}
