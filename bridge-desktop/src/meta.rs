//! Sidecar `.meta` file emission

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::storage::MetaExporter;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Writes a minimal `.meta` file next to each exported asset.
///
/// The file carries a freshly generated GUID so the exported asset can be
/// dropped into an editor project and referenced. Existing meta files are
/// left untouched.
#[derive(Debug, Clone, Default)]
pub struct MetaFileWriter;

impl MetaFileWriter {
    pub fn new() -> Self {
        Self
    }

    /// Path of the meta file for `asset_path` (`clip.wav` -> `clip.wav.meta`).
    pub fn meta_path(asset_path: &Path) -> PathBuf {
        let mut name = OsString::from(asset_path.as_os_str());
        name.push(".meta");
        PathBuf::from(name)
    }

    fn render(guid: &Uuid) -> String {
        format!(
            "fileFormatVersion: 2\nguid: {}\nAudioImporter:\n  serializedVersion: 6\n  userData: \n  assetBundleName: \n  assetBundleVariant: \n",
            guid.simple()
        )
    }
}

impl MetaExporter for MetaFileWriter {
    fn export_meta(&self, asset_name: &str, asset_path: &Path) -> Result<()> {
        let meta_path = Self::meta_path(asset_path);
        if meta_path.exists() {
            debug!(asset = asset_name, path = ?meta_path, "Meta file already present");
            return Ok(());
        }

        let guid = Uuid::new_v4();
        fs::write(&meta_path, Self::render(&guid)).map_err(|e| {
            BridgeError::OperationFailed(format!(
                "Failed to write meta file {}: {}",
                meta_path.display(),
                e
            ))
        })?;

        debug!(asset = asset_name, path = ?meta_path, %guid, "Wrote meta file");
        Ok(())
    }
}
