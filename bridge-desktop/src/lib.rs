//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `ResourceResolver` using sibling files under a game data directory
//! - `MetaExporter` writing `.meta` sidecars with generated GUIDs
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DirectoryResourceResolver, MetaFileWriter};
//! use std::sync::Arc;
//!
//! let resolver = Arc::new(DirectoryResourceResolver::new("/games/demo/Data"));
//! let meta = Arc::new(MetaFileWriter::new());
//! // Hand both to `ExporterConfig::builder()`
//! ```

mod meta;
mod resources;

pub use meta::MetaFileWriter;
pub use resources::DirectoryResourceResolver;
