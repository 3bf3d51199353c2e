//! Workspace facade crate.
//!
//! Re-exports the export pipeline (`core-export`), the capability wiring and
//! logging setup (`core-runtime`) and the host bridge traits so a host can
//! depend on `audioclip-export` alone and pick features here:
//!
//! - `symphonia-engine` (default): built-in pure-Rust decoding engine
//! - `desktop-shims` (default): filesystem resource resolver and `.meta`
//!   sidecar writer, exposed through `ExporterConfig::desktop`

pub use bridge_traits as bridge;
pub use core_export as export;
pub use core_runtime as runtime;

pub use core_export::{
    AudioClip, ClipExporter, ClipPayload, ExportError, ExportOutcome, ExportSettings,
    ExportSummary, StreamedResource, TranscodeFailurePolicy, UnityVersion,
};
pub use core_runtime::config::ExporterConfig;
pub use core_runtime::logging::{init_logging, LoggingConfig};

#[cfg(feature = "symphonia-engine")]
pub use core_export::SymphoniaEngine;
