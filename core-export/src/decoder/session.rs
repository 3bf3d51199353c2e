//! # Decode Session
//!
//! Scoped ownership of every engine handle used to decode one clip.
//!
//! ## Lifecycle
//!
//! [`DecodeSession::open`] runs the acquisition steps (system, init, sound,
//! sub-sound 0) and records each handle as soon as it is obtained. If any step
//! fails, the partially built session is dropped on the spot and its `Drop`
//! implementation releases exactly the handles that were acquired, in
//! reverse order: sub-sound, sound, system.
//!
//! A session holds at most one PCM lock, and only for the duration of
//! [`DecodeSession::with_locked_pcm`]. The lock is always released before
//! that method returns, including when the consumer fails.

use crate::decoder::engine::{PcmLock, SoundEngine, SoundHandle, SystemHandle};
use crate::decoder::stream_info::DecodedStreamInfo;
use crate::diagnostics::report;
use crate::error::{DecodeError, EngineError};
use crate::locator::CompressedPayload;
use bridge_traits::diagnostics::{LogLevel, LoggerSink};
use std::io;
use tracing::{debug, error, instrument, warn};

/// Result type for session operations.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Index of the only sub-stream that gets exported.
pub const EXPORTED_SUB_SOUND: u32 = 0;

/// Decoding session over a single clip payload.
pub struct DecodeSession<'a, E: SoundEngine + ?Sized> {
    engine: &'a mut E,
    logger: &'a dyn LoggerSink,
    clip: String,
    system: Option<SystemHandle>,
    sound: Option<SoundHandle>,
    sub_sound: Option<SoundHandle>,
}

impl<'a, E: SoundEngine + ?Sized> DecodeSession<'a, E> {
    /// Create and initialize an engine system, load `payload` and open its
    /// first sub-sound.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::EngineInitFailed`] - system creation or init failed
    /// - [`DecodeError::SoundCreateFailed`] - the engine rejected the payload
    /// - [`DecodeError::SubStreamFailed`] - sub-sound 0 is unavailable
    ///
    /// Every failure is logged; handles acquired before it are released.
    #[instrument(skip(engine, logger, payload), fields(size = payload.len()))]
    pub fn open(
        engine: &'a mut E,
        logger: &'a dyn LoggerSink,
        clip: &str,
        payload: &CompressedPayload,
        max_voices: u32,
    ) -> DecodeResult<Self> {
        let mut session = Self {
            engine,
            logger,
            clip: clip.to_string(),
            system: None,
            sound: None,
            sub_sound: None,
        };

        let system = session
            .engine
            .create_system()
            .map_err(|source| session.fail(DecodeError::EngineInitFailed {
                clip: session.clip.clone(),
                source,
            }))?;
        session.system = Some(system);

        session
            .engine
            .init(system, max_voices)
            .map_err(|source| session.fail(DecodeError::EngineInitFailed {
                clip: session.clip.clone(),
                source,
            }))?;

        let sound = session
            .engine
            .create_sound(system, payload.as_bytes())
            .map_err(|source| session.fail(DecodeError::SoundCreateFailed {
                clip: session.clip.clone(),
                source,
            }))?;
        session.sound = Some(sound);

        let sub_sound = session
            .engine
            .sub_sound(sound, EXPORTED_SUB_SOUND)
            .map_err(|source| session.fail(DecodeError::SubStreamFailed {
                clip: session.clip.clone(),
                source,
            }))?;
        session.sub_sound = Some(sub_sound);

        debug!(?system, ?sound, ?sub_sound, "Decode session opened");
        Ok(session)
    }

    /// Name of the clip this session decodes.
    pub fn clip(&self) -> &str {
        &self.clip
    }

    /// Query the sub-sound's format, default frequency and PCM length.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::FormatQueryFailed`] - format or defaults unavailable
    /// - [`DecodeError::LengthQueryFailed`] - length unavailable
    /// - [`DecodeError::InvalidStream`] - values do not describe PCM
    pub fn stream_info(&mut self) -> DecodeResult<DecodedStreamInfo> {
        let sub_sound = self.active_sub_sound()?;

        let format = self.engine.format(sub_sound).map_err(|source| {
            self.fail(DecodeError::FormatQueryFailed {
                clip: self.clip.clone(),
                source,
            })
        })?;

        let frequency = self.engine.default_frequency(sub_sound).map_err(|source| {
            self.fail(DecodeError::FormatQueryFailed {
                clip: self.clip.clone(),
                source,
            })
        })?;

        let pcm_length = self.engine.pcm_length(sub_sound).map_err(|source| {
            self.fail(DecodeError::LengthQueryFailed {
                clip: self.clip.clone(),
                source,
            })
        })?;

        if !frequency.is_finite() || frequency < 1.0 || frequency >= u32::MAX as f32 {
            return Err(self.fail(DecodeError::InvalidStream {
                clip: self.clip.clone(),
                reason: format!("default frequency {} is not a sample rate", frequency),
            }));
        }
        // Truncation matches how the engine's float frequency is usually read back.
        let sample_rate = frequency as u32;

        let info = DecodedStreamInfo::new(
            format.bits_per_sample,
            format.channels,
            sample_rate,
            pcm_length,
        )
        .map_err(|reason| {
            self.fail(DecodeError::InvalidStream {
                clip: self.clip.clone(),
                reason,
            })
        })?;

        debug!(
            channels = info.channels(),
            bits = info.bits_per_sample(),
            sample_rate = info.sample_rate(),
            pcm_length = info.pcm_length(),
            "Queried stream info"
        );
        Ok(info)
    }

    /// Lock the full PCM range described by `info`, hand it to `consume`, and
    /// unlock.
    ///
    /// The unlock is attempted whenever the lock succeeded, with both region
    /// lengths, regardless of what `consume` returned. An unlock failure is
    /// logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::LockFailed`] - the engine refused the lock
    /// - [`DecodeError::Write`] - `consume` failed
    pub fn with_locked_pcm<T, F>(&mut self, info: &DecodedStreamInfo, consume: F) -> DecodeResult<T>
    where
        F: FnOnce(&PcmLock) -> io::Result<T>,
    {
        let sub_sound = self.active_sub_sound()?;

        let lock = self
            .engine
            .lock(sub_sound, 0, info.pcm_length())
            .map_err(|source| {
                self.fail(DecodeError::LockFailed {
                    clip: self.clip.clone(),
                    source,
                })
            })?;

        if lock.second_len() > 0 {
            warn!(
                clip = %self.clip,
                first = lock.first_len(),
                second = lock.second_len(),
                "Lock returned a wrapped PCM range"
            );
            report(
                self.logger,
                LogLevel::Warn,
                &self.clip,
                "lock",
                format!(
                    "AudioClip {} PCM lock wrapped: {} + {} bytes",
                    self.clip,
                    lock.first_len(),
                    lock.second_len()
                ),
            );
        }

        let consumed = consume(&lock);

        if let Err(source) = self.engine.unlock(sub_sound, &lock) {
            // Logged only; the data has already been consumed.
            self.fail(DecodeError::UnlockFailed {
                clip: self.clip.clone(),
                source,
            });
        }

        consumed.map_err(|source| {
            self.fail(DecodeError::Write {
                clip: self.clip.clone(),
                source,
            })
        })
    }

    /// Release all handles now instead of at end of scope.
    pub fn close(self) {}

    fn active_sub_sound(&self) -> DecodeResult<SoundHandle> {
        self.sub_sound.ok_or_else(|| DecodeError::SubStreamFailed {
            clip: self.clip.clone(),
            source: EngineError::Other("session has no open sub-sound".to_string()),
        })
    }

    fn fail(&self, err: DecodeError) -> DecodeError {
        let level = if err.is_fatal() {
            error!(clip = %self.clip, step = err.step(), error = %err, "Decode step failed");
            LogLevel::Error
        } else {
            warn!(clip = %self.clip, step = err.step(), error = %err, "Decode step failed");
            LogLevel::Warn
        };
        report(self.logger, level, &self.clip, err.step(), err.to_string());
        err
    }
}

impl<'a, E: SoundEngine + ?Sized> Drop for DecodeSession<'a, E> {
    fn drop(&mut self) {
        if let Some(sub_sound) = self.sub_sound.take() {
            if let Err(e) = self.engine.release_sound(sub_sound) {
                warn!(clip = %self.clip, error = %e, "Failed to release sub-sound");
            }
        }

        if let Some(sound) = self.sound.take() {
            if let Err(e) = self.engine.release_sound(sound) {
                warn!(clip = %self.clip, error = %e, "Failed to release sound");
            }
        }

        if let Some(system) = self.system.take() {
            if let Err(e) = self.engine.release_system(system) {
                warn!(clip = %self.clip, error = %e, "Failed to release engine system");
            }
        }

        debug!(clip = %self.clip, "Decode session closed");
    }
}
