//! Resource file resolution backed by the local filesystem

use bridge_traits::storage::{ResourceFile, ResourceResolver};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves resource identifiers to files under a root directory.
///
/// Identifiers come straight from the serialized clip and usually look like
/// `archive:/CAB-1f2e.../CAB-1f2e....resS` for bundles or
/// `sharedassets0.resource` for standalone builds. Resolution tries, in order:
///
/// - the identifier as a path relative to the root (archive prefix removed)
/// - the identifier's file name directly under the root
///
/// Every file is opened at most once; later lookups share the same handle, so
/// reads from different clips are serialized on that handle.
pub struct DirectoryResourceResolver {
    root: PathBuf,
    open_files: Mutex<HashMap<String, Arc<ResourceFile>>>,
}

impl DirectoryResourceResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            open_files: Mutex::new(HashMap::new()),
        }
    }

    /// Directory resource identifiers are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of distinct files opened so far.
    pub fn open_file_count(&self) -> usize {
        self.open_files.lock().len()
    }

    fn candidates(&self, source: &str) -> Vec<PathBuf> {
        let relative = source
            .strip_prefix("archive:/")
            .unwrap_or(source)
            .trim_start_matches('/');

        let mut paths = vec![self.root.join(relative)];
        if let Some(file_name) = Path::new(relative).file_name() {
            let flat = self.root.join(file_name);
            if !paths.contains(&flat) {
                paths.push(flat);
            }
        }
        paths
    }

    fn open(&self, source: &str) -> Option<ResourceFile> {
        for path in self.candidates(source) {
            if !path.is_file() {
                continue;
            }

            match File::open(&path) {
                Ok(file) => {
                    debug!(source, path = ?path, "Opened resource file");
                    return Some(ResourceFile::new(source, BufReader::new(file)));
                }
                Err(e) => {
                    warn!(source, path = ?path, error = %e, "Failed to open resource file");
                }
            }
        }

        debug!(source, root = ?self.root, "Resource file not found");
        None
    }
}

impl ResourceResolver for DirectoryResourceResolver {
    fn find_resource_file(&self, source: &str) -> Option<Arc<ResourceFile>> {
        let mut open_files = self.open_files.lock();
        if let Some(file) = open_files.get(source) {
            return Some(Arc::clone(file));
        }

        let file = Arc::new(self.open(source)?);
        open_files.insert(source.to_string(), Arc::clone(&file));
        Some(file)
    }
}
