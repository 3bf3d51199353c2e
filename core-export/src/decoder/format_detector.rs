//! # Container Detection
//!
//! Identifies the container of an in-memory payload from its leading bytes
//! and turns it into a format hint for Symphonia.

use crate::decoder::fsb5;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Container recognised from a payload's magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// FMOD sample bank, parsed natively
    Fsb5,
    Ogg,
    Riff,
    Aiff,
    Flac,
    /// MPEG audio, with or without an ID3 tag
    Mpeg,
    /// Anything else; Symphonia detects it without a hint
    Unknown,
}

impl ContainerKind {
    /// Extension passed to Symphonia as a format hint.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ContainerKind::Fsb5 => Some("fsb"),
            ContainerKind::Ogg => Some("ogg"),
            ContainerKind::Riff => Some("wav"),
            ContainerKind::Aiff => Some("aiff"),
            ContainerKind::Flac => Some("flac"),
            ContainerKind::Mpeg => Some("mp3"),
            ContainerKind::Unknown => None,
        }
    }
}

pub struct FormatDetector;

impl FormatDetector {
    /// Detect the container of `data`.
    pub fn detect(data: &[u8]) -> ContainerKind {
        let kind = if fsb5::is_fsb5(data) {
            ContainerKind::Fsb5
        } else if data.starts_with(b"OggS") {
            ContainerKind::Ogg
        } else if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WAVE" {
            ContainerKind::Riff
        } else if data.len() >= 12 && data.starts_with(b"FORM") && matches!(&data[8..12], b"AIFF" | b"AIFC") {
            ContainerKind::Aiff
        } else if data.starts_with(b"fLaC") {
            ContainerKind::Flac
        } else if data.starts_with(b"ID3") || Self::is_mpeg_frame_sync(data) {
            ContainerKind::Mpeg
        } else {
            ContainerKind::Unknown
        };

        debug!(?kind, size = data.len(), "Detected payload container");
        kind
    }

    /// Format hint for a container.
    pub fn hint_for(kind: ContainerKind) -> Hint {
        let mut hint = Hint::new();
        if let Some(extension) = kind.extension() {
            hint.with_extension(extension);
        }
        hint
    }

    // 11 set sync bits followed by a non-reserved layer.
    fn is_mpeg_frame_sync(data: &[u8]) -> bool {
        data.len() >= 2 && data[0] == 0xFF && (data[1] & 0xE0) == 0xE0 && (data[1] & 0x06) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_common_containers() {
        assert_eq!(FormatDetector::detect(b"OggS\0\x02rest"), ContainerKind::Ogg);
        assert_eq!(FormatDetector::detect(b"RIFF\x24\0\0\0WAVEfmt "), ContainerKind::Riff);
        assert_eq!(FormatDetector::detect(b"FORM\0\0\0\0AIFFCOMM"), ContainerKind::Aiff);
        assert_eq!(FormatDetector::detect(b"fLaC\0\0\0\x22"), ContainerKind::Flac);
        assert_eq!(FormatDetector::detect(b"ID3\x03\0"), ContainerKind::Mpeg);
        assert_eq!(FormatDetector::detect(&[0xFF, 0xFB, 0x90, 0x00]), ContainerKind::Mpeg);
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(FormatDetector::detect(&[]), ContainerKind::Unknown);
        assert_eq!(FormatDetector::detect(b"RIFF\0\0\0\0AVI "), ContainerKind::Unknown);
        assert_eq!(FormatDetector::detect(&[0xFF, 0xE0]), ContainerKind::Unknown);
        assert_eq!(ContainerKind::Unknown.extension(), None);
    }
}
