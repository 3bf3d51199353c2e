//! # Export Configuration
//!
//! Settings that control where clips are written and how failures are
//! handled.

use serde::{Deserialize, Serialize};

/// What to do with a partially written `.wav` when transcoding fails after
/// the output file was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeFailurePolicy {
    /// Leave the partial file in place.
    Keep,
    /// Remove the partial file.
    Delete,
    /// Remove the partial file and dump the compressed payload instead.
    #[default]
    RawFallback,
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Folder under the output directory that receives every clip.
    ///
    /// Default: `AudioClip`.
    #[serde(default = "default_sub_folder")]
    pub sub_folder: String,

    /// Handling of partial output after a mid-transcode failure.
    ///
    /// Default: [`TranscodeFailurePolicy::RawFallback`].
    #[serde(default)]
    pub failure_policy: TranscodeFailurePolicy,

    /// Append a zero pad byte after odd-length PCM data (and count it in the
    /// RIFF size).
    ///
    /// Default: false, so data chunks are byte-exact.
    #[serde(default)]
    pub pad_odd_data_chunk: bool,

    /// Write the second region of a wrapped PCM lock after the first.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub write_second_lock_region: bool,

    /// Run the meta exporter after each clip.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub export_meta: bool,

    /// Voices requested when initializing an engine system.
    ///
    /// Default: 1.
    #[serde(default = "default_max_voices")]
    pub max_voices: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            sub_folder: default_sub_folder(),
            failure_policy: TranscodeFailurePolicy::default(),
            pad_odd_data_chunk: false,
            write_second_lock_region: default_true(),
            export_meta: default_true(),
            max_voices: default_max_voices(),
        }
    }
}

impl ExportSettings {
    /// Load settings from JSON; absent fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| format!("invalid export settings JSON: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.sub_folder.trim().is_empty() {
            return Err("sub_folder must not be empty".to_string());
        }

        if self.sub_folder.contains(['/', '\\']) || self.sub_folder == ".." || self.sub_folder == "." {
            return Err(format!(
                "sub_folder must be a single folder name, got '{}'",
                self.sub_folder
            ));
        }

        if self.max_voices == 0 {
            return Err("max_voices must be > 0".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_sub_folder() -> String {
    "AudioClip".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_voices() -> u32 {
    1
}
