//! # Sample Format Converter
//!
//! Converts decoded audio into the little-endian integer PCM a waveform file
//! stores.

use byteorder::{ByteOrder, LittleEndian};
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;
use tracing::warn;

/// Sample converter producing interleaved 16-bit little-endian PCM.
///
/// Symphonia outputs planar buffers in whatever sample type the codec
/// produces. Everything is reduced to interleaved `i16` here, which is what
/// the engine reports as the stream's bit depth.
pub struct SampleConverter;

impl SampleConverter {
    /// Append a decoded buffer to `out` as interleaved s16le bytes.
    pub fn append_s16le(buffer: &AudioBufferRef<'_>, out: &mut Vec<u8>) {
        let samples = match buffer {
            AudioBufferRef::S16(buf) => Self::convert_and_interleave(&**buf, |s: i16| s),
            AudioBufferRef::F32(buf) => Self::convert_and_interleave(&**buf, |s: f32| s.into_sample()),
            AudioBufferRef::F64(buf) => Self::convert_and_interleave(&**buf, |s: f64| s.into_sample()),
            AudioBufferRef::S32(buf) => Self::convert_and_interleave(&**buf, |s: i32| s.into_sample()),
            AudioBufferRef::S24(buf) => {
                Self::convert_and_interleave(&**buf, |s| IntoSample::<i16>::into_sample(s))
            }
            AudioBufferRef::S8(buf) => Self::convert_and_interleave(&**buf, |s: i8| s.into_sample()),
            AudioBufferRef::U32(buf) => Self::convert_and_interleave(&**buf, |s: u32| s.into_sample()),
            AudioBufferRef::U24(buf) => {
                Self::convert_and_interleave(&**buf, |s| IntoSample::<i16>::into_sample(s))
            }
            AudioBufferRef::U16(buf) => Self::convert_and_interleave(&**buf, |s: u16| s.into_sample()),
            AudioBufferRef::U8(buf) => Self::convert_and_interleave(&**buf, |s: u8| s.into_sample()),
        };

        let start = out.len();
        out.resize(start + samples.len() * 2, 0);
        LittleEndian::write_i16_into(&samples, &mut out[start..]);
    }

    /// Signed 8-bit PCM to the unsigned 8-bit PCM waveform files use.
    pub fn pcm8_signed_to_unsigned(data: &[u8]) -> Vec<u8> {
        data.iter().map(|b| b ^ 0x80).collect()
    }

    /// 32-bit float PCM (little-endian) to s16le.
    ///
    /// Out-of-range samples are clamped; the count is logged.
    pub fn f32le_to_s16le(data: &[u8]) -> Vec<u8> {
        let count = data.len() / 4;
        let mut floats = vec![0f32; count];
        LittleEndian::read_f32_into(&data[..count * 4], &mut floats);

        let clipped = Self::clamp_samples(&mut floats);
        if clipped > 0 {
            warn!(
                "Clamped {} float samples ({:.2}% of total)",
                clipped,
                (clipped as f64 / count as f64) * 100.0
            );
        }

        let samples: Vec<i16> = floats.into_iter().map(|s| s.into_sample()).collect();
        let mut out = vec![0u8; samples.len() * 2];
        LittleEndian::write_i16_into(&samples, &mut out);
        out
    }

    /// Clamp samples to [-1.0, 1.0], returning how many were out of range.
    pub fn clamp_samples(samples: &mut [f32]) -> usize {
        let mut clipped = 0;
        for sample in samples.iter_mut() {
            if !(-1.0..=1.0).contains(sample) {
                clipped += 1;
                *sample = sample.clamp(-1.0, 1.0);
            }
        }
        clipped
    }

    fn convert_and_interleave<T>(buf: &AudioBuffer<T>, convert: fn(T) -> i16) -> Vec<i16>
    where
        T: Sample + Copy,
    {
        let num_channels = buf.spec().channels.count();
        let num_frames = buf.frames();
        let mut interleaved = Vec::with_capacity(num_frames * num_channels);

        for frame_idx in 0..num_frames {
            for chan_idx in 0..num_channels {
                interleaved.push(convert(buf.chan(chan_idx)[frame_idx]));
            }
        }

        interleaved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::audio::{AsAudioBufferRef, Channels, SignalSpec};

    #[test]
    fn test_pcm8_sign_flip() {
        assert_eq!(
            SampleConverter::pcm8_signed_to_unsigned(&[0x00, 0x7F, 0x80, 0xFF]),
            vec![0x80, 0xFF, 0x00, 0x7F]
        );
    }

    #[test]
    fn test_float_conversion_clamps() {
        let mut data = Vec::new();
        for sample in [0.0f32, 1.0, -1.0, 2.5] {
            data.extend_from_slice(&sample.to_le_bytes());
        }

        let out = SampleConverter::f32le_to_s16le(&data);

        assert_eq!(out.len(), 8);
        let samples: Vec<i16> = out
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(samples[0], 0);
        assert_eq!(samples[1], i16::MAX);
        assert!(samples[2] <= -i16::MAX);
        assert_eq!(samples[3], i16::MAX);
    }

    #[test]
    fn test_clamp_samples() {
        let mut samples = vec![0.0, 1.5, -1.5, 0.5];
        assert_eq!(SampleConverter::clamp_samples(&mut samples), 2);
        assert_eq!(samples, vec![0.0, 1.0, -1.0, 0.5]);
    }

    #[test]
    fn test_interleaves_planar_buffer() {
        let spec = SignalSpec::new(44100, Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
        let mut buffer = AudioBuffer::<i16>::new(2, spec);
        buffer.render_reserved(Some(2));
        buffer.chan_mut(0).copy_from_slice(&[1, 2]);
        buffer.chan_mut(1).copy_from_slice(&[-1, -2]);

        let mut out = Vec::new();
        SampleConverter::append_s16le(&buffer.as_audio_buffer_ref(), &mut out);

        assert_eq!(
            out,
            vec![1, 0, 0xFF, 0xFF, 2, 0, 0xFE, 0xFF]
        );
    }
}
