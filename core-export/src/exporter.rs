//! # Clip Exporter
//!
//! Drives one clip (or a batch) from asset record to file on disk.
//!
//! ## Flow
//!
//! ```text
//! classify ──transcodable──▶ locate ─▶ <name>.wav ─▶ DecodeSession ─▶ WaveformWriter
//!    │                          │                        │ failure
//!    │                          ▼                        ▼
//!    │                       Failed               failure policy
//!    └──otherwise──▶ locate ─▶ <name>.<raw ext> (verbatim bytes) ─▶ Fallback
//! ```
//!
//! After a file is written the meta exporter runs with its path.
//!
//! Clip-level problems (missing resource, engine refusal, corrupt stream)
//! become an [`ExportOutcome`]; only output-side I/O errors are returned as
//! `Err`.

use crate::classifier::{FormatClassifier, WAVE_EXTENSION};
use crate::clip::AudioClip;
use crate::config::{ExportSettings, TranscodeFailurePolicy};
use crate::decoder::{DecodeSession, SoundEngine};
use crate::diagnostics::report;
use crate::error::{DecodeError, ExportError, Result};
use crate::locator::{CompressedPayload, RawPayloadLocator};
use crate::naming::create_unique_file;
use crate::wav::WaveformWriter;
use bridge_traits::diagnostics::{LogLevel, LoggerSink, NoopLogger};
use bridge_traits::storage::{MetaExporter, ResourceResolver};
use core_runtime::config::ExporterConfig;
use core_runtime::logging::strip_path;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Result of exporting a single clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Decoded and written as a waveform file.
    Supported { path: PathBuf },
    /// Compressed bytes written verbatim; `format` names the compression.
    Fallback { path: PathBuf, format: String },
    /// Nothing usable was produced. `path` is set when a partial file was
    /// kept.
    Failed {
        path: Option<PathBuf>,
        reason: String,
    },
}

impl ExportOutcome {
    /// Only a completed transcode counts as success.
    pub fn is_success(&self) -> bool {
        matches!(self, ExportOutcome::Supported { .. })
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ExportOutcome::Supported { path } | ExportOutcome::Fallback { path, .. } => Some(path),
            ExportOutcome::Failed { path, .. } => path.as_deref(),
        }
    }
}

/// Per-clip line of an [`ExportSummary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipReport {
    pub clip: String,
    pub outcome: ExportOutcome,
}

/// Totals for a batch export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub supported: usize,
    pub fallback: usize,
    pub failed: usize,
    pub reports: Vec<ClipReport>,
}

impl ExportSummary {
    fn record(&mut self, clip: &str, outcome: ExportOutcome) {
        match &outcome {
            ExportOutcome::Supported { .. } => self.supported += 1,
            ExportOutcome::Fallback { .. } => self.fallback += 1,
            ExportOutcome::Failed { .. } => self.failed += 1,
        }
        self.reports.push(ClipReport {
            clip: clip.to_string(),
            outcome,
        });
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn all_supported(&self) -> bool {
        self.supported == self.total()
    }
}

/// Exports AudioClips through a [`SoundEngine`].
///
/// The exporter owns its engine; clips are processed one at a time, each in
/// its own [`DecodeSession`].
pub struct ClipExporter<E: SoundEngine> {
    engine: E,
    locator: RawPayloadLocator,
    logger: Arc<dyn LoggerSink>,
    meta_exporter: Option<Arc<dyn MetaExporter>>,
    settings: ExportSettings,
    writer: WaveformWriter,
}

impl<E: SoundEngine> ClipExporter<E> {
    pub fn new(engine: E, resolver: Arc<dyn ResourceResolver>) -> Self {
        let settings = ExportSettings::default();
        Self {
            engine,
            locator: RawPayloadLocator::new(resolver),
            logger: Arc::new(NoopLogger),
            meta_exporter: None,
            writer: WaveformWriter::new().with_odd_padding(settings.pad_odd_data_chunk),
            settings,
        }
    }

    /// Build an exporter from injected capabilities.
    pub fn from_config(engine: E, config: &ExporterConfig, settings: ExportSettings) -> Result<Self> {
        let mut exporter = Self::new(engine, Arc::clone(&config.resource_resolver))
            .with_logger(Arc::clone(&config.logger))
            .with_settings(settings)?;
        exporter.meta_exporter = config.meta_exporter.clone();
        Ok(exporter)
    }

    pub fn with_logger(mut self, logger: Arc<dyn LoggerSink>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_meta_exporter(mut self, meta_exporter: Arc<dyn MetaExporter>) -> Self {
        self.meta_exporter = Some(meta_exporter);
        self
    }

    /// Replace the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Settings`] if the settings do not validate.
    pub fn with_settings(mut self, settings: ExportSettings) -> Result<Self> {
        settings.validate().map_err(ExportError::Settings)?;
        self.writer = WaveformWriter::new().with_odd_padding(settings.pad_odd_data_chunk);
        self.settings = settings;
        Ok(self)
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Export one clip into `<output_dir>/<sub_folder>/`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the output folder or file cannot be
    /// created or written. Everything else is reported in the outcome.
    #[instrument(
        skip(self, clip, output_dir),
        fields(clip = clip.name(), format = %clip.compression_tag())
    )]
    pub fn export(&mut self, clip: &AudioClip, output_dir: &Path) -> Result<ExportOutcome> {
        let dir = output_dir.join(&self.settings.sub_folder);
        fs::create_dir_all(&dir)?;

        let outcome = if FormatClassifier::is_transcodable(clip) {
            self.export_transcoded(clip, &dir)?
        } else {
            self.export_unsupported(clip, &dir)?
        };

        self.export_meta(clip, &outcome);
        Ok(outcome)
    }

    /// Export every clip, stopping only on output-side I/O errors.
    pub fn export_all<'c, I>(&mut self, clips: I, output_dir: &Path) -> Result<ExportSummary>
    where
        I: IntoIterator<Item = &'c AudioClip>,
    {
        let mut summary = ExportSummary::default();
        for clip in clips {
            let outcome = self.export(clip, output_dir)?;
            summary.record(clip.name(), outcome);
        }

        info!(
            supported = summary.supported,
            fallback = summary.fallback,
            failed = summary.failed,
            "Batch export finished"
        );
        Ok(summary)
    }

    fn export_transcoded(&mut self, clip: &AudioClip, dir: &Path) -> Result<ExportOutcome> {
        let payload = match self.locate(clip) {
            Ok(payload) => payload,
            Err(outcome) => return Ok(outcome),
        };

        let (path, file) = create_unique_file(dir, clip.name(), WAVE_EXTENSION)?;

        match self.transcode(clip, &payload, file) {
            Ok(()) => {
                info!(path = %strip_path(&path.to_string_lossy()), "Exported clip as waveform");
                Ok(ExportOutcome::Supported { path })
            }
            Err(err) => self.handle_transcode_failure(clip, &payload, dir, path, err),
        }
    }

    fn export_unsupported(&mut self, clip: &AudioClip, dir: &Path) -> Result<ExportOutcome> {
        let format = FormatClassifier::describe_format(clip);
        let message = format!("AudioClip type {} isn't supported", format);
        warn!(clip = clip.name(), format = %format, "{}", message);
        report(self.logger.as_ref(), LogLevel::Warn, clip.name(), "classify", message);

        let payload = match self.locate(clip) {
            Ok(payload) => payload,
            Err(outcome) => return Ok(outcome),
        };

        let path = self.write_raw(clip, &payload, dir)?;
        Ok(ExportOutcome::Fallback { path, format })
    }

    fn locate(&self, clip: &AudioClip) -> std::result::Result<CompressedPayload, ExportOutcome> {
        self.locator.locate(clip).map_err(|err| {
            error!(clip = clip.name(), step = "locate", error = %err, "Can't locate payload");
            report(self.logger.as_ref(), LogLevel::Error, clip.name(), "locate", err.to_string());
            ExportOutcome::Failed {
                path: None,
                reason: err.to_string(),
            }
        })
    }

    fn transcode(
        &mut self,
        clip: &AudioClip,
        payload: &CompressedPayload,
        file: File,
    ) -> std::result::Result<(), DecodeError> {
        let mut sink = BufWriter::new(file);
        let writer = self.writer;
        let write_second = self.settings.write_second_lock_region;

        let mut session = DecodeSession::open(
            &mut self.engine,
            self.logger.as_ref(),
            clip.name(),
            payload,
            self.settings.max_voices,
        )?;
        let info = session.stream_info()?;

        session.with_locked_pcm(&info, |lock| {
            if write_second {
                writer.write_regions(&mut sink, &info, &[&lock.first[..], &lock.second[..]])
            } else {
                writer.write(&mut sink, &info, &lock.first)
            }
        })?;

        session.close();
        Ok(())
    }

    fn handle_transcode_failure(
        &mut self,
        clip: &AudioClip,
        payload: &CompressedPayload,
        dir: &Path,
        partial: PathBuf,
        err: DecodeError,
    ) -> Result<ExportOutcome> {
        let reason = err.to_string();

        match self.settings.failure_policy {
            TranscodeFailurePolicy::Keep => {
                warn!(path = %partial.display(), "Keeping partial waveform file");
                Ok(ExportOutcome::Failed {
                    path: Some(partial),
                    reason,
                })
            }
            TranscodeFailurePolicy::Delete => {
                self.remove_partial(clip, &partial);
                Ok(ExportOutcome::Failed { path: None, reason })
            }
            TranscodeFailurePolicy::RawFallback => {
                self.remove_partial(clip, &partial);
                let format = FormatClassifier::describe_format(clip);
                let path = self.write_raw(clip, payload, dir)?;
                let message = format!(
                    "AudioClip {} couldn't be transcoded ({}); wrote {} payload as is",
                    clip.name(),
                    reason,
                    format
                );
                warn!(clip = clip.name(), path = %path.display(), "{}", message);
                report(self.logger.as_ref(), LogLevel::Warn, clip.name(), "fallback", message);
                Ok(ExportOutcome::Fallback { path, format })
            }
        }
    }

    fn remove_partial(&self, clip: &AudioClip, partial: &Path) {
        if let Err(e) = fs::remove_file(partial) {
            warn!(clip = clip.name(), path = %partial.display(), error = %e, "Failed to remove partial file");
        }
    }

    fn write_raw(&self, clip: &AudioClip, payload: &CompressedPayload, dir: &Path) -> Result<PathBuf> {
        let extension = clip.compression_tag().raw_extension();
        let (path, mut file) = create_unique_file(dir, clip.name(), extension)?;
        file.write_all(payload.as_bytes())?;
        file.flush()?;

        info!(
            path = %strip_path(&path.to_string_lossy()),
            size = payload.len(),
            "Wrote raw payload"
        );
        Ok(path)
    }

    fn export_meta(&self, clip: &AudioClip, outcome: &ExportOutcome) {
        if !self.settings.export_meta {
            return;
        }
        let (Some(meta_exporter), Some(path)) = (self.meta_exporter.as_ref(), outcome.path()) else {
            return;
        };

        if let Err(e) = meta_exporter.export_meta(clip.name(), path) {
            warn!(clip = clip.name(), error = %e, "Meta export failed");
            report(
                self.logger.as_ref(),
                LogLevel::Warn,
                clip.name(),
                "meta",
                format!("Can't export meta for AudioClip {}: {}", clip.name(), e),
            );
        }
    }
}
