//! # Exporter Configuration Module
//!
//! Collects the host capabilities an exporter needs.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an
//! `ExporterConfig` holding every injected dependency. It enforces fail-fast
//! validation so that a missing required bridge is reported when the config
//! is built, not halfway through a batch.
//!
//! ## Required Dependencies
//!
//! - `ResourceResolver` - Required to read clips stored in sibling resource files
//!
//! ## Optional Dependencies
//!
//! - `LoggerSink` - Host diagnostics (default: [`NoopLogger`])
//! - `MetaExporter` - Sidecar metadata writer (default: none, no sidecars)
//!
//! When the `desktop-shims` feature is enabled, `ExporterConfig::desktop`
//! wires the filesystem-backed resolver and meta writer from `bridge-desktop`.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ExporterConfig;
//! use std::sync::Arc;
//!
//! let config = ExporterConfig::builder()
//!     .resource_resolver(Arc::new(MyResolver))
//!     .logger(Arc::new(ConsoleLogger::default()))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::ExporterConfig;
//!
//! // This will panic with an actionable error message
//! let config = ExporterConfig::builder()
//!     .build()
//!     .expect("Should fail - missing resource resolver");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{LoggerSink, MetaExporter, NoopLogger, ResourceResolver};
use std::sync::Arc;

/// Capabilities injected into an exporter.
///
/// Use [`ExporterConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct ExporterConfig {
    /// Resolves sibling resource files (required)
    pub resource_resolver: Arc<dyn ResourceResolver>,

    /// Receives diagnostics (defaults to [`NoopLogger`])
    pub logger: Arc<dyn LoggerSink>,

    /// Writes the sidecar for each exported file (optional)
    pub meta_exporter: Option<Arc<dyn MetaExporter>>,
}

impl std::fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterConfig")
            .field("resource_resolver", &"ResourceResolver { ... }")
            .field("logger", &"LoggerSink { ... }")
            .field(
                "meta_exporter",
                &self
                    .meta_exporter
                    .as_ref()
                    .map(|_| "MetaExporter { ... }"),
            )
            .finish()
    }
}

impl ExporterConfig {
    /// Creates a new builder for constructing an `ExporterConfig`.
    pub fn builder() -> ExporterConfigBuilder {
        ExporterConfigBuilder::default()
    }

    /// Desktop configuration: resource files are looked up under
    /// `resource_root` and `.meta` sidecars are written next to exports.
    #[cfg(feature = "desktop-shims")]
    pub fn desktop(resource_root: impl Into<std::path::PathBuf>) -> Result<Self> {
        use bridge_desktop::{DirectoryResourceResolver, MetaFileWriter};

        Self::builder()
            .resource_resolver(Arc::new(DirectoryResourceResolver::new(resource_root)))
            .meta_exporter(Arc::new(MetaFileWriter::new()))
            .build()
    }
}

fn resource_resolver_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "ResourceResolver".to_string(),
        message: "ResourceResolver implementation is required to read clips stored in \
                  sibling resource files. \
                  Desktop: enable the 'desktop-shims' feature and use DirectoryResourceResolver. \
                  Tests and in-memory hosts: use InMemoryResourceResolver."
            .to_string(),
    }
}

/// Builder for constructing [`ExporterConfig`] instances.
///
/// Use this builder to set capabilities and then call
/// [`build()`](ExporterConfigBuilder::build) to create the final config.
#[derive(Default)]
pub struct ExporterConfigBuilder {
    resource_resolver: Option<Arc<dyn ResourceResolver>>,
    logger: Option<Arc<dyn LoggerSink>>,
    meta_exporter: Option<Arc<dyn MetaExporter>>,
}

impl ExporterConfigBuilder {
    /// Sets the resource resolver implementation (required).
    pub fn resource_resolver(mut self, resolver: Arc<dyn ResourceResolver>) -> Self {
        self.resource_resolver = Some(resolver);
        self
    }

    /// Sets the diagnostics sink (optional).
    ///
    /// If not provided, diagnostics are discarded.
    pub fn logger(mut self, logger: Arc<dyn LoggerSink>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Sets the sidecar meta exporter (optional).
    pub fn meta_exporter(mut self, exporter: Arc<dyn MetaExporter>) -> Self {
        self.meta_exporter = Some(exporter);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] if no `ResourceResolver` was set.
    pub fn build(self) -> Result<ExporterConfig> {
        let resource_resolver = self
            .resource_resolver
            .ok_or_else(resource_resolver_missing_error)?;

        let logger = self
            .logger
            .unwrap_or_else(|| Arc::new(NoopLogger) as Arc<dyn LoggerSink>);

        Ok(ExporterConfig {
            resource_resolver,
            logger,
            meta_exporter: self.meta_exporter,
        })
    }
}
