//! # Format Classification
//!
//! Decides whether a clip's compression format can be transcoded to PCM.

use crate::clip::{AudioClip, CompressionTag};
use tracing::debug;

/// Extension of the canonical waveform output.
pub const WAVE_EXTENSION: &str = "wav";

/// Format classifier for AudioClips.
///
/// Classification is a pure function of the clip's [`CompressionTag`]; the
/// version gate was already applied when the tag was built.
pub struct FormatClassifier;

impl FormatClassifier {
    /// Returns `true` if the decoding engine can turn this clip into PCM.
    pub fn is_transcodable(clip: &AudioClip) -> bool {
        let tag = clip.compression_tag();
        let transcodable = tag.is_transcodable();
        debug!(clip = clip.name(), format = %tag, transcodable, "Classified clip");
        transcodable
    }

    /// Human-readable name of the clip's compression format.
    pub fn describe_format(clip: &AudioClip) -> String {
        clip.compression_tag().to_string()
    }

    /// Extension the exported file will get.
    pub fn output_extension(clip: &AudioClip) -> &'static str {
        Self::extension_for(&clip.compression_tag())
    }

    pub fn extension_for(tag: &CompressionTag) -> &'static str {
        if tag.is_transcodable() {
            WAVE_EXTENSION
        } else {
            tag.raw_extension()
        }
    }
}
