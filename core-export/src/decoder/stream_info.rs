//! Decoded stream description shared by the session and the waveform writer.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Layout of the PCM data produced by a decode session.
///
/// Constructed only through [`DecodedStreamInfo::new`], which guarantees the
/// derived header fields (`block_align`, `byte_rate`) fit their on-disk
/// widths and that `pcm_length` is a whole number of frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedStreamInfo {
    bits_per_sample: u16,
    channels: u16,
    sample_rate: u32,
    pcm_length: u32,
}

impl DecodedStreamInfo {
    pub fn new(
        bits_per_sample: u16,
        channels: u16,
        sample_rate: u32,
        pcm_length: u32,
    ) -> Result<Self, String> {
        if channels == 0 {
            return Err("channel count is zero".to_string());
        }
        if bits_per_sample == 0 || bits_per_sample % 8 != 0 {
            return Err(format!("unsupported bit depth {}", bits_per_sample));
        }
        if sample_rate == 0 {
            return Err("sample rate is zero".to_string());
        }

        let block_align = u32::from(channels) * u32::from(bits_per_sample) / 8;
        if block_align > u32::from(u16::MAX) {
            return Err(format!(
                "block align {} does not fit in 16 bits ({} channels x {} bits)",
                block_align, channels, bits_per_sample
            ));
        }

        let byte_rate = u64::from(sample_rate) * u64::from(block_align);
        if byte_rate > u64::from(u32::MAX) {
            return Err(format!("byte rate {} does not fit in 32 bits", byte_rate));
        }

        if pcm_length % block_align != 0 {
            return Err(format!(
                "PCM length {} is not a multiple of the {}-byte frame size",
                pcm_length, block_align
            ));
        }

        Ok(Self {
            bits_per_sample,
            channels,
            sample_rate,
            pcm_length,
        })
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Decoded length in bytes, as reported by the engine.
    pub fn pcm_length(&self) -> u32 {
        self.pcm_length
    }

    /// Bytes per frame: `channels * bits / 8`.
    pub fn block_align(&self) -> u16 {
        // Range checked in `new`.
        (u32::from(self.channels) * u32::from(self.bits_per_sample) / 8) as u16
    }

    /// Bytes per second: `sample_rate * channels * bits / 8`.
    pub fn byte_rate(&self) -> u32 {
        // Range checked in `new`.
        (u64::from(self.sample_rate) * u64::from(self.block_align())) as u32
    }

    pub fn frames(&self) -> u32 {
        self.pcm_length / u32::from(self.block_align())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(f64::from(self.frames()) / f64::from(self.sample_rate))
    }
}
