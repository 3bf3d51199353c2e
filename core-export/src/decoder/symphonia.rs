//! # Symphonia Engine
//!
//! [`SoundEngine`] implementation that decodes in memory with Symphonia.
//!
//! ## Handles
//!
//! Systems and sounds live in handle tables. A sound created from a payload
//! is a *bank*: it holds the encoded streams found in the payload. Opening a
//! sub-sound decodes one of those streams completely into 16-bit PCM (or the
//! bank's native PCM width for FSB5 PCM banks) and registers it as a
//! *stream*. Releasing a bank releases its streams; releasing a system
//! releases every bank created on it.
//!
//! ## Payloads
//!
//! - FSB5 banks are parsed natively. PCM samples are handed out as stored
//!   (8-bit data converted to unsigned, float converted to 16-bit); MPEG
//!   samples are decoded with Symphonia's MP3 decoder.
//! - Anything else is sniffed by Symphonia (Ogg Vorbis, WAV, AIFF, FLAC, MP3,
//!   AAC in MP4/ADTS). Every decodable track becomes one sub-sound.

use crate::decoder::engine::{PcmLock, SoundEngine, SoundFormat, SoundHandle, SystemHandle};
use crate::decoder::format_detector::{ContainerKind, FormatDetector};
use crate::decoder::fsb5::{self, Fsb5Mode};
use crate::decoder::sample_converter::SampleConverter;
use crate::error::{EngineError, EngineResult};
use bytes::Bytes;
use std::collections::HashMap;
use std::io::Cursor;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use tracing::{debug, error, info, instrument, warn};

const MAX_CONSECUTIVE_ERRORS: usize = 10;

#[derive(Debug, Default)]
struct SystemState {
    initialized: bool,
}

/// An encoded stream inside a bank.
#[derive(Debug, Clone)]
enum EncodedStream {
    /// Already PCM; only needs copying out.
    Pcm {
        data: Bytes,
        format: SoundFormat,
        frequency: u32,
    },
    /// Needs a Symphonia decode.
    Container {
        data: Bytes,
        kind: ContainerKind,
        track_id: Option<u32>,
    },
}

#[derive(Debug)]
enum SoundState {
    Bank {
        system: u64,
        streams: Vec<EncodedStream>,
    },
    Stream {
        bank: u64,
        pcm: Bytes,
        format: SoundFormat,
        frequency: f32,
        locked: bool,
    },
}

/// Fully decoded stream.
struct DecodedPcm {
    pcm: Vec<u8>,
    channels: u16,
    sample_rate: u32,
}

/// In-memory decoding engine backed by Symphonia.
#[derive(Debug, Default)]
pub struct SymphoniaEngine {
    next_handle: u64,
    systems: HashMap<u64, SystemState>,
    sounds: HashMap<u64, SoundState>,
}

impl SymphoniaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live system handles.
    pub fn live_systems(&self) -> usize {
        self.systems.len()
    }

    /// Number of live sound handles, banks and streams together.
    pub fn live_sounds(&self) -> usize {
        self.sounds.len()
    }

    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn stream_mut(&mut self, sound: SoundHandle) -> EngineResult<&mut SoundState> {
        match self.sounds.get_mut(&sound.0) {
            Some(state) if matches!(state, SoundState::Stream { .. }) => Ok(state),
            _ => Err(EngineError::InvalidHandle(sound.0)),
        }
    }

    fn open_streams(data: &Bytes) -> EngineResult<Vec<EncodedStream>> {
        let kind = FormatDetector::detect(data);
        if kind == ContainerKind::Fsb5 {
            return Self::open_fsb5(data);
        }

        let reader = Self::open_reader(data.clone(), kind)?;
        let streams: Vec<EncodedStream> = reader
            .tracks()
            .iter()
            .filter(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .map(|t| EncodedStream::Container {
                data: data.clone(),
                kind,
                track_id: Some(t.id),
            })
            .collect();

        if streams.is_empty() {
            error!("No supported audio tracks found");
            return Err(EngineError::UnsupportedFormat(
                "no supported audio tracks".to_string(),
            ));
        }

        Ok(streams)
    }

    fn open_fsb5(data: &Bytes) -> EngineResult<Vec<EncodedStream>> {
        let bank = fsb5::parse(data)?;

        bank.samples
            .into_iter()
            .map(|sample| match bank.mode {
                Fsb5Mode::Pcm8 => Ok(EncodedStream::Pcm {
                    data: Bytes::from(SampleConverter::pcm8_signed_to_unsigned(&sample.data)),
                    format: SoundFormat::new(sample.channels, 8),
                    frequency: sample.frequency,
                }),
                Fsb5Mode::Pcm16 | Fsb5Mode::Pcm24 | Fsb5Mode::Pcm32 => {
                    let width = bank.mode.pcm_width().unwrap_or(2) as u16;
                    Ok(EncodedStream::Pcm {
                        data: sample.data,
                        format: SoundFormat::new(sample.channels, width * 8),
                        frequency: sample.frequency,
                    })
                }
                Fsb5Mode::PcmFloat => Ok(EncodedStream::Pcm {
                    data: Bytes::from(SampleConverter::f32le_to_s16le(&sample.data)),
                    format: SoundFormat::new(sample.channels, 16),
                    frequency: sample.frequency,
                }),
                Fsb5Mode::Mpeg => Ok(EncodedStream::Container {
                    data: sample.data,
                    kind: ContainerKind::Mpeg,
                    track_id: None,
                }),
                other => Err(EngineError::UnsupportedFormat(format!(
                    "FSB5 mode {:?} cannot be decoded",
                    other
                ))),
            })
            .collect()
    }

    fn open_reader(data: Bytes, kind: ContainerKind) -> EngineResult<Box<dyn FormatReader>> {
        let hint = FormatDetector::hint_for(kind);
        let cursor = Cursor::new(data.to_vec());
        let media_source = Box::new(cursor) as Box<dyn MediaSource>;
        let mss = MediaSourceStream::new(media_source, Default::default());

        let opened = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                debug!("Format detection failed: {}", e);
                EngineError::UnsupportedFormat(format!("unrecognized container: {}", e))
            })?;

        Ok(opened.format)
    }

    #[instrument(skip(data), fields(size = data.len()), level = "debug")]
    fn decode_container(
        data: &Bytes,
        kind: ContainerKind,
        track_id: Option<u32>,
    ) -> EngineResult<DecodedPcm> {
        let mut reader = Self::open_reader(data.clone(), kind)?;

        let track = reader
            .tracks()
            .iter()
            .find(|t| match track_id {
                Some(id) => t.id == id,
                None => t.codec_params.codec != CODEC_TYPE_NULL,
            })
            .ok_or_else(|| EngineError::Decode("track disappeared after reopening".to_string()))?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count() as u16);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| {
                error!("Failed to create decoder: {}", e);
                EngineError::UnsupportedFormat(format!("failed to create codec decoder: {}", e))
            })?;

        let mut pcm = Vec::new();
        let mut consecutive_errors = 0;

        loop {
            let packet = match reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    // Chained streams: everything after the first link is ignored.
                    warn!("Track list changed mid-stream, stopping decode");
                    break;
                }
                Err(e) => {
                    error!("Fatal format reader error: {}", e);
                    return Err(EngineError::Decode(format!("failed to read packet: {}", e)));
                }
            };

            while !reader.metadata().is_latest() {
                reader.metadata().pop();
            }

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    consecutive_errors = 0;
                    let spec = decoded.spec();
                    sample_rate.get_or_insert(spec.rate);
                    let decoded_channels = spec.channels.count() as u16;
                    if channels != Some(decoded_channels) {
                        debug!(
                            "Updating channel count from {:?} to {}",
                            channels, decoded_channels
                        );
                        channels = Some(decoded_channels);
                    }
                    SampleConverter::append_s16le(&decoded, &mut pcm);
                }
                Err(err @ (SymphoniaError::IoError(_) | SymphoniaError::DecodeError(_)))
                    if consecutive_errors < MAX_CONSECUTIVE_ERRORS =>
                {
                    consecutive_errors += 1;
                    warn!(
                        "Skipping undecodable packet (attempt {}/{}): {}",
                        consecutive_errors, MAX_CONSECUTIVE_ERRORS, err
                    );
                }
                Err(e) => {
                    error!("Fatal decode error: {}", e);
                    return Err(EngineError::Decode(format!("failed to decode packet: {}", e)));
                }
            }
        }

        let sample_rate =
            sample_rate.ok_or_else(|| EngineError::Decode("missing sample rate".to_string()))?;
        let channels =
            channels.ok_or_else(|| EngineError::Decode("missing channel layout".to_string()))?;

        Ok(DecodedPcm {
            pcm,
            channels,
            sample_rate,
        })
    }
}

impl SoundEngine for SymphoniaEngine {
    fn create_system(&mut self) -> EngineResult<SystemHandle> {
        let id = self.allocate();
        self.systems.insert(id, SystemState::default());
        Ok(SystemHandle(id))
    }

    fn init(&mut self, system: SystemHandle, max_voices: u32) -> EngineResult<()> {
        let state = self
            .systems
            .get_mut(&system.0)
            .ok_or(EngineError::InvalidHandle(system.0))?;
        state.initialized = true;
        // Decoding is synchronous; voices are never mixed.
        debug!(system = system.0, max_voices, "Initialized engine system");
        Ok(())
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    fn create_sound(&mut self, system: SystemHandle, data: &[u8]) -> EngineResult<SoundHandle> {
        match self.systems.get(&system.0) {
            Some(state) if state.initialized => {}
            Some(_) => return Err(EngineError::NotInitialized),
            None => return Err(EngineError::InvalidHandle(system.0)),
        }
        if data.is_empty() {
            return Err(EngineError::UnsupportedFormat("empty payload".to_string()));
        }

        let streams = Self::open_streams(&Bytes::copy_from_slice(data))?;
        info!(streams = streams.len(), "Loaded sound");

        let id = self.allocate();
        self.sounds.insert(
            id,
            SoundState::Bank {
                system: system.0,
                streams,
            },
        );
        Ok(SoundHandle(id))
    }

    fn sub_sound(&mut self, sound: SoundHandle, index: u32) -> EngineResult<SoundHandle> {
        let stream = match self.sounds.get(&sound.0) {
            Some(SoundState::Bank { streams, .. }) => streams
                .get(index as usize)
                .cloned()
                .ok_or(EngineError::SubSoundIndex {
                    index,
                    count: streams.len() as u32,
                })?,
            _ => return Err(EngineError::InvalidHandle(sound.0)),
        };

        let (pcm, format, frequency) = match stream {
            EncodedStream::Pcm {
                data,
                format,
                frequency,
            } => (data, format, frequency),
            EncodedStream::Container {
                data,
                kind,
                track_id,
            } => {
                let decoded = Self::decode_container(&data, kind, track_id)?;
                (
                    Bytes::from(decoded.pcm),
                    SoundFormat::new(decoded.channels, 16),
                    decoded.sample_rate,
                )
            }
        };

        debug!(
            index,
            bytes = pcm.len(),
            channels = format.channels,
            frequency,
            "Decoded sub-sound"
        );

        let id = self.allocate();
        self.sounds.insert(
            id,
            SoundState::Stream {
                bank: sound.0,
                pcm,
                format,
                frequency: frequency as f32,
                locked: false,
            },
        );
        Ok(SoundHandle(id))
    }

    fn format(&mut self, sound: SoundHandle) -> EngineResult<SoundFormat> {
        match self.stream_mut(sound)? {
            SoundState::Stream { format, .. } => Ok(*format),
            SoundState::Bank { .. } => Err(EngineError::InvalidHandle(sound.0)),
        }
    }

    fn default_frequency(&mut self, sound: SoundHandle) -> EngineResult<f32> {
        match self.stream_mut(sound)? {
            SoundState::Stream { frequency, .. } => Ok(*frequency),
            SoundState::Bank { .. } => Err(EngineError::InvalidHandle(sound.0)),
        }
    }

    fn pcm_length(&mut self, sound: SoundHandle) -> EngineResult<u32> {
        match self.stream_mut(sound)? {
            SoundState::Stream { pcm, .. } => u32::try_from(pcm.len())
                .map_err(|_| EngineError::Other(format!("PCM length {} exceeds 4 GiB", pcm.len()))),
            SoundState::Bank { .. } => Err(EngineError::InvalidHandle(sound.0)),
        }
    }

    fn lock(&mut self, sound: SoundHandle, offset: u32, length: u32) -> EngineResult<PcmLock> {
        match self.stream_mut(sound)? {
            SoundState::Stream { pcm, locked, .. } => {
                if *locked {
                    return Err(EngineError::AlreadyLocked);
                }
                let start = offset as usize;
                let end = start
                    .checked_add(length as usize)
                    .filter(|end| *end <= pcm.len())
                    .ok_or(EngineError::LockRange {
                        offset,
                        length,
                        available: pcm.len(),
                    })?;
                *locked = true;
                Ok(PcmLock::contiguous(pcm.slice(start..end)))
            }
            SoundState::Bank { .. } => Err(EngineError::InvalidHandle(sound.0)),
        }
    }

    fn unlock(&mut self, sound: SoundHandle, _lock: &PcmLock) -> EngineResult<()> {
        match self.stream_mut(sound)? {
            SoundState::Stream { locked, .. } if *locked => {
                *locked = false;
                Ok(())
            }
            _ => Err(EngineError::NotLocked),
        }
    }

    fn release_sound(&mut self, sound: SoundHandle) -> EngineResult<()> {
        match self.sounds.remove(&sound.0) {
            Some(SoundState::Bank { .. }) => {
                self.sounds.retain(|_, state| {
                    !matches!(state, SoundState::Stream { bank, .. } if *bank == sound.0)
                });
                Ok(())
            }
            Some(SoundState::Stream { .. }) => Ok(()),
            None => Err(EngineError::InvalidHandle(sound.0)),
        }
    }

    fn release_system(&mut self, system: SystemHandle) -> EngineResult<()> {
        if self.systems.remove(&system.0).is_none() {
            return Err(EngineError::InvalidHandle(system.0));
        }

        let banks: Vec<u64> = self
            .sounds
            .iter()
            .filter_map(|(id, state)| match state {
                SoundState::Bank { system: owner, .. } if *owner == system.0 => Some(*id),
                _ => None,
            })
            .collect();

        self.sounds.retain(|id, state| match state {
            SoundState::Bank { .. } => !banks.contains(id),
            SoundState::Stream { bank, .. } => !banks.contains(bank),
        });
        Ok(())
    }
}
