//! # FSB5 Sample Banks
//!
//! Parser for FMOD's FSB5 container, the format most streamed clips are
//! stored in.
//!
//! ```text
//! header   "FSB5" version samples sample_headers_size name_table_size data_size mode
//!          [u32 if version 0] zero[8] hash[16] dummy[8]
//! samples  u64 bitfield per sample, followed by optional chunks
//! names    (skipped)
//! data     sample data, each sample at its 16-byte aligned offset
//! ```
//!
//! Only the parts needed to hand sample data to a decoder are read.

use crate::error::{EngineError, EngineResult};
use byteorder::{LittleEndian, ReadBytesExt};
use bytes::Bytes;
use std::io::{Cursor, Read};
use tracing::debug;

pub const FSB5_MAGIC: &[u8; 4] = b"FSB5";

const CHUNK_CHANNELS: u32 = 1;
const CHUNK_FREQUENCY: u32 = 2;

/// Codec of every sample in a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fsb5Mode {
    Pcm8,
    Pcm16,
    Pcm24,
    Pcm32,
    PcmFloat,
    Mpeg,
    Vorbis,
    Other(u32),
}

impl Fsb5Mode {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Fsb5Mode::Pcm8,
            2 => Fsb5Mode::Pcm16,
            3 => Fsb5Mode::Pcm24,
            4 => Fsb5Mode::Pcm32,
            5 => Fsb5Mode::PcmFloat,
            11 => Fsb5Mode::Mpeg,
            15 => Fsb5Mode::Vorbis,
            other => Fsb5Mode::Other(other),
        }
    }

    /// Bytes per sample for the PCM modes.
    pub fn pcm_width(&self) -> Option<usize> {
        match self {
            Fsb5Mode::Pcm8 => Some(1),
            Fsb5Mode::Pcm16 => Some(2),
            Fsb5Mode::Pcm24 => Some(3),
            Fsb5Mode::Pcm32 | Fsb5Mode::PcmFloat => Some(4),
            _ => None,
        }
    }
}

/// One sample (sub-sound) of a bank.
#[derive(Debug, Clone, PartialEq)]
pub struct Fsb5Sample {
    pub frequency: u32,
    pub channels: u16,
    /// Length in frames
    pub frames: u64,
    /// Encoded data, trimmed to the exact PCM length for PCM modes
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fsb5Bank {
    pub version: u32,
    pub mode: Fsb5Mode,
    pub samples: Vec<Fsb5Sample>,
}

struct SampleHeader {
    frequency: u32,
    channels: u16,
    frames: u64,
    data_offset: usize,
}

pub fn is_fsb5(data: &[u8]) -> bool {
    data.starts_with(FSB5_MAGIC)
}

fn frequency_from_index(index: u64) -> Option<u32> {
    match index {
        1 => Some(8000),
        2 => Some(11000),
        3 => Some(11025),
        4 => Some(16000),
        5 => Some(22050),
        6 => Some(24000),
        7 => Some(32000),
        8 => Some(44100),
        9 => Some(48000),
        _ => None,
    }
}

fn truncated(what: &str) -> EngineError {
    EngineError::Decode(format!("FSB5 bank truncated in {}", what))
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> EngineResult<u32> {
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| truncated("header"))
}

/// Parse an FSB5 bank held in memory.
///
/// # Errors
///
/// Returns [`EngineError::UnsupportedFormat`] if the magic is missing and
/// [`EngineError::Decode`] if the bank is malformed.
pub fn parse(data: &Bytes) -> EngineResult<Fsb5Bank> {
    if !is_fsb5(data) {
        return Err(EngineError::UnsupportedFormat("not an FSB5 bank".to_string()));
    }

    let mut cursor = Cursor::new(&data[..]);
    cursor.set_position(4);
    let version = read_u32(&mut cursor)?;
    let sample_count = read_u32(&mut cursor)?;
    let sample_headers_size = read_u32(&mut cursor)? as usize;
    let name_table_size = read_u32(&mut cursor)? as usize;
    let data_size = read_u32(&mut cursor)? as usize;
    let mode = Fsb5Mode::from_raw(read_u32(&mut cursor)?);

    if version == 0 {
        read_u32(&mut cursor)?;
    }
    // zero[8] hash[16] dummy[8]
    let header_size = cursor.position() as usize + 32;

    let data_start = header_size
        .checked_add(sample_headers_size)
        .and_then(|n| n.checked_add(name_table_size))
        .ok_or_else(|| truncated("section sizes"))?;
    let data_end = data_start
        .checked_add(data_size)
        .ok_or_else(|| truncated("section sizes"))?;
    if data_end > data.len() {
        return Err(truncated("sample data"));
    }

    // Every sample header is at least 8 bytes.
    let max_samples = sample_headers_size / 8;
    if sample_count as usize > max_samples {
        return Err(EngineError::Decode(format!(
            "FSB5 bank claims {} samples but its header section holds at most {}",
            sample_count, max_samples
        )));
    }

    cursor.set_position(header_size as u64);
    let mut headers = Vec::with_capacity(sample_count as usize);
    for _ in 0..sample_count {
        headers.push(read_sample_header(&mut cursor)?);
    }

    let mut samples = Vec::with_capacity(headers.len());
    for (index, header) in headers.iter().enumerate() {
        let start = data_start + header.data_offset;
        let end = headers
            .get(index + 1)
            .map(|next| data_start + next.data_offset)
            .unwrap_or(data_end);
        if start > end || end > data_end {
            return Err(EngineError::Decode(format!(
                "FSB5 sample {} has invalid data range {}..{}",
                index, start, end
            )));
        }

        let mut sample_data = data.slice(start..end);
        if let Some(width) = mode.pcm_width() {
            let exact = (header.frames as usize)
                .checked_mul(usize::from(header.channels))
                .and_then(|n| n.checked_mul(width));
            let Some(exact) = exact.filter(|exact| *exact <= sample_data.len()) else {
                return Err(truncated("PCM sample data"));
            };
            // PCM samples are padded up to the next 32-byte boundary.
            sample_data.truncate(exact);
        }

        samples.push(Fsb5Sample {
            frequency: header.frequency,
            channels: header.channels,
            frames: header.frames,
            data: sample_data,
        });
    }

    debug!(version, ?mode, samples = samples.len(), "Parsed FSB5 bank");

    Ok(Fsb5Bank {
        version,
        mode,
        samples,
    })
}

fn read_sample_header(cursor: &mut Cursor<&[u8]>) -> EngineResult<SampleHeader> {
    let bits = cursor
        .read_u64::<LittleEndian>()
        .map_err(|_| truncated("sample headers"))?;

    let mut has_chunk = bits & 1 == 1;
    let frequency_index = (bits >> 1) & 0xF;
    let mut channels = (((bits >> 5) & 1) + 1) as u16;
    let data_offset = (((bits >> 6) & 0x0FFF_FFFF) * 16) as usize;
    let frames = (bits >> 34) & 0x3FFF_FFFF;

    let mut frequency = frequency_from_index(frequency_index);

    while has_chunk {
        let chunk = cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| truncated("sample chunks"))?;
        has_chunk = chunk & 1 == 1;
        let size = ((chunk >> 1) & 0x00FF_FFFF) as usize;
        let kind = (chunk >> 25) & 0x7F;

        let mut payload = vec![0u8; size];
        cursor
            .read_exact(&mut payload)
            .map_err(|_| truncated("sample chunks"))?;

        match kind {
            CHUNK_CHANNELS if size >= 1 => channels = u16::from(payload[0]),
            CHUNK_FREQUENCY if size >= 4 => {
                frequency = Some(u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]));
            }
            _ => {}
        }
    }

    let frequency = frequency.ok_or_else(|| {
        EngineError::Decode(format!("unknown FSB5 frequency index {}", frequency_index))
    })?;

    Ok(SampleHeader {
        frequency,
        channels,
        frames,
        data_offset,
    })
}
