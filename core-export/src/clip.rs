//! # AudioClip Model
//!
//! The read-only view of an AudioClip asset the export pipeline works on.
//!
//! The container parser decides two things from the serialized file version:
//!
//! - which enumeration the compression tag comes from (the pre-5.0 FMOD sound
//!   type, or the 5.0+ compression format)
//! - where the compressed bytes live (inline in the asset, or in a sibling
//!   resource file at an offset)
//!
//! Both decisions are made once, in [`AudioClip::new`], and captured in the
//! [`CompressionTag`] and [`ClipPayload`] variants. Nothing downstream
//! re-derives them from the version.

use crate::error::ClipError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Container Version
// ============================================================================

/// Version of the engine that wrote the asset container (`5.6.1f1` etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnityVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl UnityVersion {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Clips before 5.0 store an FMOD sound type instead of a compression format.
    pub fn uses_legacy_sound_type(&self) -> bool {
        self.major < 5
    }

    /// Clips from 5.0 on keep their data in a sibling resource file.
    pub fn uses_streamed_resource(&self) -> bool {
        self.major >= 5
    }
}

impl PartialOrd for UnityVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UnityVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl fmt::Display for UnityVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for UnityVersion {
    type Err = ClipError;

    /// Parses `major.minor.patch` with an optional build suffix
    /// (`2019.4.31f1`, `5.6.1p3`, `4.7.2`). Missing components default to 0.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || ClipError::InvalidVersion(s.to_string());

        let mut parts = s.trim().splitn(3, '.');
        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(invalid)?
            .parse::<u16>()
            .map_err(|_| invalid())?;

        let component = |part: Option<&str>| -> std::result::Result<u16, ClipError> {
            match part {
                None => Ok(0),
                Some(part) => {
                    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
                    if digits.is_empty() {
                        return Err(invalid());
                    }
                    digits.parse::<u16>().map_err(|_| invalid())
                }
            }
        };

        let minor = component(parts.next())?;
        let patch = component(parts.next())?;

        Ok(Self::new(major, minor, patch))
    }
}

// ============================================================================
// Compression Tags
// ============================================================================

/// FMOD sound type stored by pre-5.0 containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FmodSoundType {
    Unknown,
    Acc,
    Aiff,
    Asf,
    At3,
    Cdda,
    Dls,
    Flac,
    Fsb,
    GcAdpcm,
    It,
    Midi,
    Mod,
    Mpeg,
    OggVorbis,
    Playlist,
    Raw,
    S3m,
    Sf2,
    User,
    Wav,
    Xm,
    Xma,
    Vag,
    AudioQueue,
    Xwma,
    Bcwav,
    At9,
    Vorbis,
    MediaFoundation,
    /// Value outside the known enumeration.
    Unrecognized(i32),
}

impl FmodSoundType {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Unknown,
            1 => Self::Acc,
            2 => Self::Aiff,
            3 => Self::Asf,
            4 => Self::At3,
            5 => Self::Cdda,
            6 => Self::Dls,
            7 => Self::Flac,
            8 => Self::Fsb,
            9 => Self::GcAdpcm,
            10 => Self::It,
            11 => Self::Midi,
            12 => Self::Mod,
            13 => Self::Mpeg,
            14 => Self::OggVorbis,
            15 => Self::Playlist,
            16 => Self::Raw,
            17 => Self::S3m,
            18 => Self::Sf2,
            19 => Self::User,
            20 => Self::Wav,
            21 => Self::Xm,
            22 => Self::Xma,
            23 => Self::Vag,
            24 => Self::AudioQueue,
            25 => Self::Xwma,
            26 => Self::Bcwav,
            27 => Self::At9,
            28 => Self::Vorbis,
            29 => Self::MediaFoundation,
            other => Self::Unrecognized(other),
        }
    }

    /// Whether FMOD can open and decode this type to PCM.
    pub fn is_transcodable(&self) -> bool {
        matches!(
            self,
            Self::Acc
                | Self::Aiff
                | Self::It
                | Self::Mod
                | Self::Mpeg
                | Self::OggVorbis
                | Self::S3m
                | Self::Wav
                | Self::Xm
                | Self::Xma
                | Self::Vag
                | Self::AudioQueue
        )
    }

    /// Extension used when the data is dumped unmodified.
    pub fn raw_extension(&self) -> &'static str {
        match self {
            Self::Acc => "m4a",
            Self::Aiff => "aif",
            Self::It => "it",
            Self::Mod => "mod",
            Self::Mpeg => "mp3",
            Self::OggVorbis => "ogg",
            Self::S3m => "s3m",
            Self::Wav | Self::Xma => "wav",
            Self::Xm => "xm",
            Self::Vag => "vag",
            Self::Flac => "flac",
            Self::Fsb => "fsb",
            _ => "bytes",
        }
    }
}

impl fmt::Display for FmodSoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::Acc => "ACC",
            Self::Aiff => "AIFF",
            Self::Asf => "ASF",
            Self::At3 => "AT3",
            Self::Cdda => "CDDA",
            Self::Dls => "DLS",
            Self::Flac => "FLAC",
            Self::Fsb => "FSB",
            Self::GcAdpcm => "GCADPCM",
            Self::It => "IT",
            Self::Midi => "MIDI",
            Self::Mod => "MOD",
            Self::Mpeg => "MPEG",
            Self::OggVorbis => "OGGVORBIS",
            Self::Playlist => "PLAYLIST",
            Self::Raw => "RAW",
            Self::S3m => "S3M",
            Self::Sf2 => "SF2",
            Self::User => "USER",
            Self::Wav => "WAV",
            Self::Xm => "XM",
            Self::Xma => "XMA",
            Self::Vag => "VAG",
            Self::AudioQueue => "AUDIOQUEUE",
            Self::Xwma => "XWMA",
            Self::Bcwav => "BCWAV",
            Self::At9 => "AT9",
            Self::Vorbis => "VORBIS",
            Self::MediaFoundation => "MEDIA_FOUNDATION",
            Self::Unrecognized(raw) => return write!(f, "FMODSoundType({})", raw),
        };
        f.write_str(name)
    }
}

/// Compression format stored by 5.0+ containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCompressionFormat {
    Pcm,
    Vorbis,
    Adpcm,
    Mp3,
    Vag,
    Hevag,
    Xma,
    Aac,
    GcAdpcm,
    Atrac9,
    /// Value outside the known enumeration.
    Unrecognized(i32),
}

impl AudioCompressionFormat {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Pcm,
            1 => Self::Vorbis,
            2 => Self::Adpcm,
            3 => Self::Mp3,
            4 => Self::Vag,
            5 => Self::Hevag,
            6 => Self::Xma,
            7 => Self::Aac,
            8 => Self::GcAdpcm,
            9 => Self::Atrac9,
            other => Self::Unrecognized(other),
        }
    }

    /// Whether FMOD can open and decode this format to PCM.
    pub fn is_transcodable(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// 5.0+ payloads are FSB5 banks regardless of codec.
    pub fn raw_extension(&self) -> &'static str {
        match self {
            Self::Unrecognized(_) => "bytes",
            _ => "fsb",
        }
    }
}

impl fmt::Display for AudioCompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pcm => "PCM",
            Self::Vorbis => "Vorbis",
            Self::Adpcm => "ADPCM",
            Self::Mp3 => "MP3",
            Self::Vag => "VAG",
            Self::Hevag => "HEVAG",
            Self::Xma => "XMA",
            Self::Aac => "AAC",
            Self::GcAdpcm => "GCADPCM",
            Self::Atrac9 => "ATRAC9",
            Self::Unrecognized(raw) => return write!(f, "AudioCompressionFormat({})", raw),
        };
        f.write_str(name)
    }
}

/// Compression tag of a clip, tagged with the enumeration it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionTag {
    Legacy(FmodSoundType),
    Modern(AudioCompressionFormat),
}

impl CompressionTag {
    /// Interpret a raw serialized value using the enumeration `version` stores.
    pub fn from_raw(version: &UnityVersion, raw: i32) -> Self {
        if version.uses_legacy_sound_type() {
            Self::Legacy(FmodSoundType::from_raw(raw))
        } else {
            Self::Modern(AudioCompressionFormat::from_raw(raw))
        }
    }

    pub fn is_transcodable(&self) -> bool {
        match self {
            Self::Legacy(kind) => kind.is_transcodable(),
            Self::Modern(format) => format.is_transcodable(),
        }
    }

    pub fn raw_extension(&self) -> &'static str {
        match self {
            Self::Legacy(kind) => kind.raw_extension(),
            Self::Modern(format) => format.raw_extension(),
        }
    }
}

impl fmt::Display for CompressionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy(kind) => kind.fmt(f),
            Self::Modern(format) => format.fmt(f),
        }
    }
}

// ============================================================================
// Payload Location
// ============================================================================

/// Reference to clip data stored in a sibling resource file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamedResource {
    /// Identifier of the resource file (`archive:/CAB-.../CAB-....resS`)
    pub source: String,
    /// Byte offset of the payload inside the resource file
    pub offset: u64,
    /// Payload length, when the container version encodes it
    pub size: Option<u64>,
}

impl StreamedResource {
    pub fn new(source: impl Into<String>, offset: u64, size: Option<u64>) -> Self {
        Self {
            source: source.into(),
            offset,
            size,
        }
    }
}

/// Where a clip's compressed bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipPayload {
    /// Bytes serialized inside the asset itself.
    Inline(Bytes),
    /// Bytes in a sibling resource file.
    External(StreamedResource),
}

impl ClipPayload {
    pub fn is_inline(&self) -> bool {
        matches!(self, ClipPayload::Inline(_))
    }
}

// ============================================================================
// AudioClip
// ============================================================================

/// One AudioClip asset, as handed over by the container parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    name: String,
    version: UnityVersion,
    tag: CompressionTag,
    payload: ClipPayload,
}

impl AudioClip {
    /// Build a clip from raw parsed values.
    ///
    /// `raw_format` is interpreted with the enumeration `version` uses, and
    /// `payload` must use the storage mode `version` encodes.
    pub fn new(
        name: impl Into<String>,
        version: UnityVersion,
        raw_format: i32,
        payload: ClipPayload,
    ) -> std::result::Result<Self, ClipError> {
        let name = name.into();
        let expects_external = version.uses_streamed_resource();

        if expects_external == payload.is_inline() {
            return Err(ClipError::PayloadModeMismatch {
                clip: name,
                version: version.to_string(),
                expected: if expects_external {
                    "in a resource file"
                } else {
                    "inline"
                },
            });
        }

        Ok(Self {
            name,
            version,
            tag: CompressionTag::from_raw(&version, raw_format),
            payload,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> UnityVersion {
        self.version
    }

    pub fn compression_tag(&self) -> CompressionTag {
        self.tag
    }

    pub fn payload(&self) -> &ClipPayload {
        &self.payload
    }
}
