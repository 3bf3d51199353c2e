//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the export core:
//! - Logging and tracing infrastructure
//! - Capability configuration
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the export crates depend on.
//! It establishes the logging conventions and the fail-fast wiring of host
//! capabilities used throughout the workspace.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ExporterConfig, ExporterConfigBuilder};
pub use error::{Error, Result};
