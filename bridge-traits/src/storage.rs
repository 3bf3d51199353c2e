//! Storage Abstractions
//!
//! Provides the traits the exporter uses to reach bytes that live outside the
//! clip record (sibling resource files) and to emit per-asset sidecar files.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::platform::{PlatformSend, PlatformSendSync};

/// Seekable byte stream backing a [`ResourceFile`].
pub trait ReadSeek: Read + Seek + PlatformSend {}

impl<T> ReadSeek for T where T: Read + Seek + PlatformSend {}

/// A shared sibling resource file (e.g. a `.resS` or `.resource` blob).
///
/// The stream position is a single mutable cursor shared by every clip that
/// references this file. It is only moved inside [`ResourceFile::read_at`],
/// which holds the lock for the whole seek + read, so callers must never
/// assume any particular position between reads.
pub struct ResourceFile {
    name: String,
    stream: Mutex<Box<dyn ReadSeek>>,
    reads: AtomicU64,
}

impl ResourceFile {
    /// Wrap an already opened stream.
    pub fn new(name: impl Into<String>, stream: impl ReadSeek + 'static) -> Self {
        Self {
            name: name.into(),
            stream: Mutex::new(Box::new(stream)),
            reads: AtomicU64::new(0),
        }
    }

    /// Wrap an in-memory buffer.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::new(name, Cursor::new(data.into()))
    }

    /// Identifier this file was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Fails with an I/O error if the file is shorter than `offset + len`.
    pub fn read_at(&self, offset: u64, len: usize) -> Result<Bytes> {
        let mut stream = self.stream.lock();
        self.reads.fetch_add(1, Ordering::Relaxed);

        let file_len = stream.seek(SeekFrom::End(0))?;
        let end = u64::try_from(len).ok().and_then(|len| offset.checked_add(len));
        if end.map_or(true, |end| end > file_len) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "'{}' is {} bytes, can't read {} bytes at offset {}",
                    self.name, file_len, len, offset
                ),
            )
            .into());
        }

        stream.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; len];
        stream.read_exact(&mut buffer)?;

        Ok(Bytes::from(buffer))
    }

    /// Number of reads issued against this file so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ResourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceFile")
            .field("name", &self.name)
            .field("reads", &self.read_count())
            .finish()
    }
}

/// Resolves a clip's resource source identifier to a shared resource file.
///
/// Implementations look files up; they never create them. A `None` return
/// means the container collection has no file under that identifier.
pub trait ResourceResolver: PlatformSendSync {
    fn find_resource_file(&self, source: &str) -> Option<Arc<ResourceFile>>;
}

/// Resolver over resource files the host already holds in memory.
#[derive(Debug, Default)]
pub struct InMemoryResourceResolver {
    files: HashMap<String, Arc<ResourceFile>>,
}

impl InMemoryResourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file under `source`, replacing any previous entry.
    pub fn with_file(mut self, source: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        let source = source.into();
        let file = ResourceFile::from_bytes(source.clone(), data);
        self.files.insert(source, Arc::new(file));
        self
    }

    /// Registered file, for inspecting read counts in tests.
    pub fn file(&self, source: &str) -> Option<Arc<ResourceFile>> {
        self.files.get(source).cloned()
    }
}

impl ResourceResolver for InMemoryResourceResolver {
    fn find_resource_file(&self, source: &str) -> Option<Arc<ResourceFile>> {
        self.files.get(source).cloned()
    }
}

/// Emits the sidecar/meta file for an exported asset.
///
/// Called once per clip after the primary file has been written, with the
/// final path of that file.
pub trait MetaExporter: PlatformSendSync {
    fn export_meta(&self, asset_name: &str, asset_path: &Path) -> Result<()>;
}
