//! # Host Bridge Traits
//!
//! Capabilities the export core needs from its host but does not implement
//! itself.
//!
//! ## Overview
//!
//! The export pipeline runs inside a larger asset-ripping tool. That tool owns
//! the container collection, the output conventions and the user-facing log.
//! This crate defines the narrow contract between the two:
//!
//! - [`ResourceResolver`](storage::ResourceResolver) - look up sibling resource
//!   files by their source identifier
//! - [`ResourceFile`](storage::ResourceFile) - shared, seekable resource stream
//! - [`MetaExporter`](storage::MetaExporter) - emit sidecar files after export
//! - [`LoggerSink`](diagnostics::LoggerSink) - receive `(severity, category,
//!   message)` diagnostics
//!
//! Desktop implementations live in `bridge-desktop`.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep messages actionable
//! (include the file path or identifier involved).
//!
//! ## Thread Safety
//!
//! Traits carry `Send + Sync` bounds on native targets (see
//! [`platform`]) so a host can run independent clips on separate workers.

pub mod diagnostics;
pub mod error;
pub mod platform;
pub mod storage;

pub use error::BridgeError;

pub use diagnostics::{ConsoleLogger, LogEntry, LogLevel, LoggerSink, NoopLogger};
pub use storage::{InMemoryResourceResolver, MetaExporter, ResourceFile, ResourceResolver};
