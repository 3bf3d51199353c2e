//! # Waveform Writer
//!
//! Serializes decoded PCM as a canonical RIFF/WAVE file.
//!
//! ```text
//! offset  size  field
//!  0      4     "RIFF"
//!  4      4     data_len + 36 (+1 when padded)
//!  8      8     "WAVEfmt "
//! 16      4     16 (fmt chunk size)
//! 20      2     1 (integer PCM)
//! 22      2     channels
//! 24      4     sample rate
//! 28      4     byte rate
//! 32      2     block align
//! 34      2     bits per sample
//! 36      4     "data"
//! 40      4     data_len
//! 44            PCM bytes
//! ```
//!
//! All integers are little-endian.

use crate::decoder::DecodedStreamInfo;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

/// Size of the header preceding the PCM bytes.
pub const WAVE_HEADER_LEN: u64 = 44;

const FORMAT_PCM: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveformWriter {
    pad_odd_data_chunk: bool,
}

impl WaveformWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a zero byte after odd-length data, as RIFF chunk alignment asks.
    pub fn with_odd_padding(mut self, pad: bool) -> Self {
        self.pad_odd_data_chunk = pad;
        self
    }

    /// Write a complete file for a single PCM region.
    ///
    /// Returns the number of bytes written.
    pub fn write<W: Write>(&self, sink: &mut W, info: &DecodedStreamInfo, pcm: &[u8]) -> io::Result<u64> {
        self.write_regions(sink, info, &[pcm])
    }

    /// Write a complete file whose data chunk is `regions` concatenated.
    ///
    /// The header fields come from `info`; the length fields from the regions
    /// actually written.
    pub fn write_regions<W: Write>(
        &self,
        sink: &mut W,
        info: &DecodedStreamInfo,
        regions: &[&[u8]],
    ) -> io::Result<u64> {
        let data_len: usize = regions.iter().map(|r| r.len()).sum();
        let data_len = u32::try_from(data_len)
            .ok()
            .filter(|len| *len <= u32::MAX - 37)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("PCM data of {} bytes does not fit a RIFF file", data_len),
                )
            })?;
        let pad = self.pad_odd_data_chunk && data_len % 2 == 1;
        let riff_len = data_len + 36 + u32::from(pad);

        sink.write_all(b"RIFF")?;
        sink.write_u32::<LittleEndian>(riff_len)?;
        sink.write_all(b"WAVEfmt ")?;
        sink.write_u32::<LittleEndian>(FMT_CHUNK_LEN)?;
        sink.write_u16::<LittleEndian>(FORMAT_PCM)?;
        sink.write_u16::<LittleEndian>(info.channels())?;
        sink.write_u32::<LittleEndian>(info.sample_rate())?;
        sink.write_u32::<LittleEndian>(info.byte_rate())?;
        sink.write_u16::<LittleEndian>(info.block_align())?;
        sink.write_u16::<LittleEndian>(info.bits_per_sample())?;
        sink.write_all(b"data")?;
        sink.write_u32::<LittleEndian>(data_len)?;

        for region in regions {
            sink.write_all(region)?;
        }
        if pad {
            sink.write_u8(0)?;
        }
        sink.flush()?;

        Ok(WAVE_HEADER_LEN + u64::from(data_len) + u64::from(pad))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    #[test]
    fn test_header_layout() {
        let info = DecodedStreamInfo::new(16, 2, 44100, 8).unwrap();
        let pcm = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut out = Vec::new();

        let written = WaveformWriter::new().write(&mut out, &info, &pcm).unwrap();

        assert_eq!(written, 52);
        assert_eq!(out.len(), 52);
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(u32_at(&out, 4), 44);
        assert_eq!(&out[8..16], b"WAVEfmt ");
        assert_eq!(u32_at(&out, 16), 16);
        assert_eq!(u16_at(&out, 20), 1);
        assert_eq!(u16_at(&out, 22), 2);
        assert_eq!(u32_at(&out, 24), 44100);
        assert_eq!(u32_at(&out, 28), 176_400);
        assert_eq!(u16_at(&out, 32), 4);
        assert_eq!(u16_at(&out, 34), 16);
        assert_eq!(&out[36..40], b"data");
        assert_eq!(u32_at(&out, 40), 8);
        assert_eq!(&out[44..], &pcm);
    }

    #[test]
    fn test_odd_length_is_byte_exact_by_default() {
        let info = DecodedStreamInfo::new(8, 1, 8000, 3).unwrap();
        let mut out = Vec::new();

        WaveformWriter::new().write(&mut out, &info, &[0x80, 0x81, 0x82]).unwrap();

        assert_eq!(out.len(), 47);
        assert_eq!(u32_at(&out, 4), 39);
        assert_eq!(u32_at(&out, 40), 3);
    }

    #[test]
    fn test_odd_length_padding() {
        let info = DecodedStreamInfo::new(8, 1, 8000, 3).unwrap();
        let mut out = Vec::new();

        let written = WaveformWriter::new()
            .with_odd_padding(true)
            .write(&mut out, &info, &[0x80, 0x81, 0x82])
            .unwrap();

        assert_eq!(written, 48);
        assert_eq!(out.len(), 48);
        assert_eq!(u32_at(&out, 4), 40);
        assert_eq!(u32_at(&out, 40), 3);
        assert_eq!(out[47], 0);
    }

    #[test]
    fn test_regions_are_concatenated() {
        let info = DecodedStreamInfo::new(16, 1, 22050, 6).unwrap();
        let mut out = Vec::new();

        WaveformWriter::new()
            .write_regions(&mut out, &info, &[&[1, 2, 3, 4], &[5, 6]])
            .unwrap();

        assert_eq!(u32_at(&out, 40), 6);
        assert_eq!(&out[44..], &[1, 2, 3, 4, 5, 6]);
    }
}
