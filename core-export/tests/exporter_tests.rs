//! End-to-end tests for ClipExporter
//!
//! This test suite verifies:
//! - Supported clips become waveform files with the engine's layout
//! - Unsupported clips are dumped verbatim with a warning
//! - Transcode failure policies
//! - Missing resource files, unique naming and meta export
//! - The built-in Symphonia engine on a real payload

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    BridgeError, InMemoryResourceResolver, LogEntry, LogLevel, LoggerSink, MetaExporter,
};
use bytes::Bytes;
use core_export::decoder::{PcmLock, SoundEngine, SoundFormat, SoundHandle, SystemHandle};
use core_export::error::{EngineError, EngineResult};
use core_export::{
    AudioClip, ClipExporter, ClipPayload, ExportError, ExportOutcome, ExportSettings,
    StreamedResource, TranscodeFailurePolicy, UnityVersion,
};
use core_runtime::config::ExporterConfig;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Test Doubles
// ============================================================================

/// Engine that serves one pre-decoded stream per sound and can be told to
/// fail at a given call.
#[derive(Default)]
struct ScriptedEngine {
    format: Option<SoundFormat>,
    frequency: f32,
    first: Bytes,
    second: Bytes,
    fail_on: Option<&'static str>,
    next: u64,
    live_systems: usize,
    live_sounds: usize,
    unlocks: usize,
}

impl ScriptedEngine {
    fn pcm16_stereo(frequency: f32, pcm: Vec<u8>) -> Self {
        Self {
            format: Some(SoundFormat::new(2, 16)),
            frequency,
            first: Bytes::from(pcm),
            ..Default::default()
        }
    }

    fn failing_on(mut self, call: &'static str) -> Self {
        self.fail_on = Some(call);
        self
    }

    fn with_second_region(mut self, second: Vec<u8>) -> Self {
        self.second = Bytes::from(second);
        self
    }

    fn check(&self, call: &'static str) -> EngineResult<()> {
        if self.fail_on == Some(call) {
            Err(EngineError::Other(format!("{} refused", call)))
        } else {
            Ok(())
        }
    }

    fn allocate(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

impl SoundEngine for ScriptedEngine {
    fn create_system(&mut self) -> EngineResult<SystemHandle> {
        self.check("create_system")?;
        self.live_systems += 1;
        Ok(SystemHandle(self.allocate()))
    }

    fn init(&mut self, _system: SystemHandle, _max_voices: u32) -> EngineResult<()> {
        self.check("init")
    }

    fn create_sound(&mut self, _system: SystemHandle, _data: &[u8]) -> EngineResult<SoundHandle> {
        self.check("create_sound")?;
        self.live_sounds += 1;
        Ok(SoundHandle(self.allocate()))
    }

    fn sub_sound(&mut self, _sound: SoundHandle, _index: u32) -> EngineResult<SoundHandle> {
        self.check("sub_sound")?;
        self.live_sounds += 1;
        Ok(SoundHandle(self.allocate()))
    }

    fn format(&mut self, _sound: SoundHandle) -> EngineResult<SoundFormat> {
        self.check("format")?;
        self.format.ok_or(EngineError::NotInitialized)
    }

    fn default_frequency(&mut self, _sound: SoundHandle) -> EngineResult<f32> {
        Ok(self.frequency)
    }

    fn pcm_length(&mut self, _sound: SoundHandle) -> EngineResult<u32> {
        Ok((self.first.len() + self.second.len()) as u32)
    }

    fn lock(&mut self, _sound: SoundHandle, _offset: u32, _length: u32) -> EngineResult<PcmLock> {
        self.check("lock")?;
        Ok(PcmLock::new(self.first.clone(), self.second.clone()))
    }

    fn unlock(&mut self, _sound: SoundHandle, _lock: &PcmLock) -> EngineResult<()> {
        self.unlocks += 1;
        Ok(())
    }

    fn release_sound(&mut self, _sound: SoundHandle) -> EngineResult<()> {
        self.live_sounds -= 1;
        Ok(())
    }

    fn release_system(&mut self, _system: SystemHandle) -> EngineResult<()> {
        self.live_systems -= 1;
        Ok(())
    }
}

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl CollectingSink {
    fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.level == level)
            .map(|e| e.message.clone())
            .collect()
    }
}

impl LoggerSink for CollectingSink {
    fn log(&self, entry: LogEntry) {
        self.entries.lock().push(entry);
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

#[derive(Default)]
struct RecordingMeta {
    calls: Mutex<Vec<(String, PathBuf)>>,
    fail: bool,
}

impl MetaExporter for RecordingMeta {
    fn export_meta(&self, asset_name: &str, asset_path: &Path) -> BridgeResult<()> {
        self.calls
            .lock()
            .push((asset_name.to_string(), asset_path.to_path_buf()));
        if self.fail {
            return Err(BridgeError::OperationFailed("meta disabled".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

const RESOURCE: &str = "archive:/CAB-6d1f/CAB-6d1f.resS";
const MODERN: UnityVersion = UnityVersion::new(2019, 4, 0);
const LEGACY: UnityVersion = UnityVersion::new(4, 7, 2);

/// Modern clip whose bytes sit at offset 16 of the shared resource file.
fn modern_clip(name: &str, raw_format: i32, payload: &[u8]) -> (AudioClip, Arc<InMemoryResourceResolver>) {
    let mut resource = vec![0xEEu8; 16];
    resource.extend_from_slice(payload);
    resource.extend_from_slice(&[0xEE; 8]);

    let resolver = Arc::new(InMemoryResourceResolver::new().with_file(RESOURCE, resource));
    let clip = AudioClip::new(
        name,
        MODERN,
        raw_format,
        ClipPayload::External(StreamedResource::new(RESOURCE, 16, Some(payload.len() as u64))),
    )
    .unwrap();
    (clip, resolver)
}

fn legacy_clip(name: &str, raw_format: i32, payload: &[u8]) -> AudioClip {
    AudioClip::new(
        name,
        LEGACY,
        raw_format,
        ClipPayload::Inline(Bytes::copy_from_slice(payload)),
    )
    .unwrap()
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

fn settings_with(policy: TranscodeFailurePolicy) -> ExportSettings {
    ExportSettings {
        failure_policy: policy,
        ..Default::default()
    }
}

// ============================================================================
// Supported Clips
// ============================================================================

#[test]
fn test_modern_pcm_clip_exports_waveform() {
    let out = TempDir::new().unwrap();
    let pcm_len = 4 * 44_100 * 4;
    let pcm: Vec<u8> = (0..pcm_len).map(|i| (i % 251) as u8).collect();
    let (clip, resolver) = modern_clip("theme", 0, b"FSB5 bank bytes");

    let engine = ScriptedEngine::pcm16_stereo(44_100.0, pcm.clone());
    let mut exporter = ClipExporter::new(engine, resolver);

    let outcome = exporter.export(&clip, out.path()).unwrap();

    let expected = out.path().join("AudioClip").join("theme.wav");
    assert_eq!(outcome, ExportOutcome::Supported { path: expected.clone() });
    assert!(outcome.is_success());

    let reader = hound::WavReader::open(&expected).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 44_100);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    assert_eq!(reader.len() as usize, pcm_len / 2);
    assert_eq!(reader.duration(), 4 * 44_100);

    let bytes = fs::read(&expected).unwrap();
    assert_eq!(bytes.len(), 44 + pcm_len);
    assert_eq!(&bytes[44..], &pcm[..]);

    let engine = exporter.into_engine();
    assert_eq!(engine.live_systems, 0);
    assert_eq!(engine.live_sounds, 0);
    assert_eq!(engine.unlocks, 1);
}

#[test]
fn test_wrapped_lock_regions_are_concatenated() {
    let out = TempDir::new().unwrap();
    let (clip, resolver) = modern_clip("wrap", 1, b"vorbis bank");
    let engine =
        ScriptedEngine::pcm16_stereo(22_050.0, vec![1; 8]).with_second_region(vec![2; 4]);

    let mut exporter = ClipExporter::new(engine, resolver);
    let outcome = exporter.export(&clip, out.path()).unwrap();

    let bytes = fs::read(outcome.path().unwrap()).unwrap();
    assert_eq!(&bytes[44..], &[1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2]);
}

#[test]
fn test_second_region_can_be_skipped() {
    let out = TempDir::new().unwrap();
    let (clip, resolver) = modern_clip("wrap", 1, b"vorbis bank");
    let engine =
        ScriptedEngine::pcm16_stereo(22_050.0, vec![1; 8]).with_second_region(vec![2; 4]);
    let settings = ExportSettings {
        write_second_lock_region: false,
        ..Default::default()
    };

    let mut exporter = ClipExporter::new(engine, resolver).with_settings(settings).unwrap();
    let outcome = exporter.export(&clip, out.path()).unwrap();

    let reader = hound::WavReader::open(outcome.path().unwrap()).unwrap();
    assert_eq!(reader.len(), 4);
}

#[test]
fn test_same_name_gets_unique_file() {
    let out = TempDir::new().unwrap();
    let (clip, resolver) = modern_clip("hit", 0, b"bank");
    let mut exporter =
        ClipExporter::new(ScriptedEngine::pcm16_stereo(8_000.0, vec![0; 4]), resolver);

    let first = exporter.export(&clip, out.path()).unwrap();
    let second = exporter.export(&clip, out.path()).unwrap();

    assert_ne!(first.path(), second.path());
    assert_eq!(
        files_in(&out.path().join("AudioClip")),
        vec!["hit.wav".to_string(), "hit_1.wav".to_string()]
    );
}

// ============================================================================
// Unsupported Clips
// ============================================================================

#[test]
fn test_unrecognized_codec_is_dumped_raw() {
    let out = TempDir::new().unwrap();
    let payload = b"\x01\x02opaque codec bytes\xff";
    let clip = legacy_clip("voice", 99, payload);
    let sink = Arc::new(CollectingSink::default());

    let engine = ScriptedEngine::default().failing_on("create_system");
    let mut exporter = ClipExporter::new(engine, Arc::new(InMemoryResourceResolver::new()))
        .with_logger(sink.clone());

    let outcome = exporter.export(&clip, out.path()).unwrap();

    let expected = out.path().join("AudioClip").join("voice.bytes");
    assert_eq!(
        outcome,
        ExportOutcome::Fallback {
            path: expected.clone(),
            format: "FMODSoundType(99)".to_string(),
        }
    );
    assert!(!outcome.is_success());
    assert_eq!(fs::read(&expected).unwrap(), payload.to_vec());

    let warnings = sink.messages_at(LogLevel::Warn);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("FMODSoundType(99)"));
    assert!(warnings[0].contains("isn't supported"));
}

#[test]
fn test_legacy_fsb_keeps_container_extension() {
    let out = TempDir::new().unwrap();
    let clip = legacy_clip("bank", 8, b"FSB4 data");
    let mut exporter = ClipExporter::new(
        ScriptedEngine::default(),
        Arc::new(InMemoryResourceResolver::new()),
    );

    let outcome = exporter.export(&clip, out.path()).unwrap();

    assert_eq!(
        outcome.path(),
        Some(out.path().join("AudioClip").join("bank.fsb").as_path())
    );
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_missing_resource_file_fails_without_output() {
    let out = TempDir::new().unwrap();
    let (clip, _) = modern_clip("theme", 0, b"bank");
    let sink = Arc::new(CollectingSink::default());
    let meta = Arc::new(RecordingMeta::default());

    let mut exporter = ClipExporter::new(
        ScriptedEngine::pcm16_stereo(44_100.0, vec![0; 4]),
        Arc::new(InMemoryResourceResolver::new()),
    )
    .with_logger(sink.clone())
    .with_meta_exporter(meta.clone());

    let outcome = exporter.export(&clip, out.path()).unwrap();

    match outcome {
        ExportOutcome::Failed { path, reason } => {
            assert!(path.is_none());
            assert!(reason.contains("wasn't found"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(files_in(&out.path().join("AudioClip")).is_empty());
    assert_eq!(sink.messages_at(LogLevel::Error).len(), 1);
    assert!(meta.calls.lock().is_empty());
}

#[test]
fn test_failure_policy_raw_fallback() {
    let out = TempDir::new().unwrap();
    let payload = b"FSB5 vorbis bank";
    let (clip, resolver) = modern_clip("music", 1, payload);
    let engine = ScriptedEngine::pcm16_stereo(44_100.0, vec![0; 8]).failing_on("lock");

    let mut exporter = ClipExporter::new(engine, resolver);
    let outcome = exporter.export(&clip, out.path()).unwrap();

    let expected = out.path().join("AudioClip").join("music.fsb");
    assert_eq!(
        outcome,
        ExportOutcome::Fallback {
            path: expected.clone(),
            format: "Vorbis".to_string(),
        }
    );
    assert_eq!(fs::read(&expected).unwrap(), payload.to_vec());
    assert_eq!(files_in(&out.path().join("AudioClip")), vec!["music.fsb".to_string()]);

    let engine = exporter.into_engine();
    assert_eq!(engine.live_systems, 0);
    assert_eq!(engine.live_sounds, 0);
    assert_eq!(engine.unlocks, 0);
}

#[test]
fn test_failure_policy_keep() {
    let out = TempDir::new().unwrap();
    let (clip, resolver) = modern_clip("music", 1, b"bank");
    let engine = ScriptedEngine::pcm16_stereo(44_100.0, vec![0; 8]).failing_on("sub_sound");

    let mut exporter = ClipExporter::new(engine, resolver)
        .with_settings(settings_with(TranscodeFailurePolicy::Keep))
        .unwrap();
    let outcome = exporter.export(&clip, out.path()).unwrap();

    let partial = out.path().join("AudioClip").join("music.wav");
    match outcome {
        ExportOutcome::Failed { path, reason } => {
            assert_eq!(path, Some(partial.clone()));
            assert!(reason.contains("Can't get subsound for AudioClip music"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(partial.exists());
}

#[test]
fn test_failure_policy_delete() {
    let out = TempDir::new().unwrap();
    let (clip, resolver) = modern_clip("music", 1, b"bank");
    let engine = ScriptedEngine::pcm16_stereo(44_100.0, vec![0; 8]).failing_on("create_sound");

    let mut exporter = ClipExporter::new(engine, resolver)
        .with_settings(settings_with(TranscodeFailurePolicy::Delete))
        .unwrap();
    let outcome = exporter.export(&clip, out.path()).unwrap();

    assert!(matches!(outcome, ExportOutcome::Failed { path: None, .. }));
    assert!(files_in(&out.path().join("AudioClip")).is_empty());
}

#[test]
fn test_invalid_settings_are_rejected() {
    let (_, resolver) = modern_clip("x", 0, b"");
    let settings = ExportSettings {
        max_voices: 0,
        ..Default::default()
    };

    let err = ClipExporter::new(ScriptedEngine::default(), resolver)
        .with_settings(settings)
        .err()
        .unwrap();
    assert!(matches!(err, ExportError::Settings(_)));
    assert!(!err.is_clip_local());
}

#[test]
fn test_unwritable_output_dir_is_an_error() {
    let out = TempDir::new().unwrap();
    let blocker = out.path().join("not-a-dir");
    fs::write(&blocker, b"file").unwrap();
    let clip = legacy_clip("voice", 99, b"bytes");

    let mut exporter = ClipExporter::new(
        ScriptedEngine::default(),
        Arc::new(InMemoryResourceResolver::new()),
    );
    let err = exporter.export(&clip, &blocker).unwrap_err();

    assert!(matches!(err, ExportError::Io(_)));
}

// ============================================================================
// Meta Export & Batches
// ============================================================================

#[test]
fn test_meta_exporter_receives_final_path() {
    let out = TempDir::new().unwrap();
    let (clip, resolver) = modern_clip("theme", 0, b"bank");
    let meta = Arc::new(RecordingMeta::default());

    let config = ExporterConfig::builder()
        .resource_resolver(resolver)
        .meta_exporter(meta.clone())
        .build()
        .unwrap();
    let mut exporter = ClipExporter::from_config(
        ScriptedEngine::pcm16_stereo(44_100.0, vec![0; 4]),
        &config,
        ExportSettings::default(),
    )
    .unwrap();

    let outcome = exporter.export(&clip, out.path()).unwrap();

    let calls = meta.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "theme");
    assert_eq!(Some(calls[0].1.as_path()), outcome.path());
}

#[test]
fn test_meta_failure_is_only_a_warning() {
    let out = TempDir::new().unwrap();
    let clip = legacy_clip("voice", 99, b"bytes");
    let sink = Arc::new(CollectingSink::default());
    let meta = Arc::new(RecordingMeta {
        fail: true,
        ..Default::default()
    });

    let mut exporter = ClipExporter::new(
        ScriptedEngine::default(),
        Arc::new(InMemoryResourceResolver::new()),
    )
    .with_logger(sink.clone())
    .with_meta_exporter(meta);

    let outcome = exporter.export(&clip, out.path()).unwrap();

    assert!(matches!(outcome, ExportOutcome::Fallback { .. }));
    let warnings = sink.messages_at(LogLevel::Warn);
    assert_eq!(warnings.len(), 2);
    assert!(warnings[1].contains("Can't export meta for AudioClip voice"));
}

#[test]
fn test_meta_export_can_be_disabled() {
    let out = TempDir::new().unwrap();
    let clip = legacy_clip("voice", 99, b"bytes");
    let meta = Arc::new(RecordingMeta::default());
    let settings = ExportSettings {
        export_meta: false,
        ..Default::default()
    };

    let mut exporter = ClipExporter::new(
        ScriptedEngine::default(),
        Arc::new(InMemoryResourceResolver::new()),
    )
    .with_meta_exporter(meta.clone())
    .with_settings(settings)
    .unwrap();
    exporter.export(&clip, out.path()).unwrap();

    assert!(meta.calls.lock().is_empty());
}

#[test]
fn test_export_all_summary() {
    let out = TempDir::new().unwrap();
    let (supported, resolver) = modern_clip("theme", 0, b"bank");
    let unsupported = legacy_clip("voice", 99, b"bytes");
    let missing = AudioClip::new(
        "ghost",
        MODERN,
        0,
        ClipPayload::External(StreamedResource::new("archive:/missing.resS", 0, Some(4))),
    )
    .unwrap();

    let mut exporter =
        ClipExporter::new(ScriptedEngine::pcm16_stereo(44_100.0, vec![0; 4]), resolver);
    let summary = exporter
        .export_all([&supported, &unsupported, &missing], out.path())
        .unwrap();

    assert_eq!(summary.total(), 3);
    assert_eq!(summary.supported, 1);
    assert_eq!(summary.fallback, 1);
    assert_eq!(summary.failed, 1);
    assert!(!summary.all_supported());
    assert_eq!(summary.reports[2].clip, "ghost");
}

// ============================================================================
// Symphonia Engine
// ============================================================================

#[cfg(feature = "symphonia-engine")]
#[test]
fn test_symphonia_engine_transcodes_wav_payload() {
    use core_export::SymphoniaEngine;
    use std::io::Cursor;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let samples: Vec<i16> = (0..800).map(|i| ((i * 37) % 2000 - 1000) as i16).collect();

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for sample in &samples {
            writer.write_sample(*sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    let payload = cursor.into_inner();

    // FMOD sound type 20 is WAV.
    let clip = legacy_clip("tone", 20, &payload);
    let out = TempDir::new().unwrap();
    let mut exporter = ClipExporter::new(
        SymphoniaEngine::new(),
        Arc::new(InMemoryResourceResolver::new()),
    );

    let outcome = exporter.export(&clip, out.path()).unwrap();
    assert!(outcome.is_success());

    let mut reader = hound::WavReader::open(outcome.path().unwrap()).unwrap();
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.spec().sample_rate, 8_000);
    assert_eq!(reader.spec().bits_per_sample, 16);
    let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(decoded, samples);

    let engine = exporter.into_engine();
    assert_eq!(engine.live_systems(), 0);
    assert_eq!(engine.live_sounds(), 0);
}

#[cfg(feature = "symphonia-engine")]
#[test]
fn test_symphonia_engine_rejects_garbage_with_raw_fallback() {
    use core_export::SymphoniaEngine;

    // FMOD sound type 14 is Ogg Vorbis; the bytes are not.
    let clip = legacy_clip("broken", 14, b"definitely not an ogg stream");
    let out = TempDir::new().unwrap();
    let mut exporter = ClipExporter::new(
        SymphoniaEngine::new(),
        Arc::new(InMemoryResourceResolver::new()),
    );

    let outcome = exporter.export(&clip, out.path()).unwrap();

    assert_eq!(
        outcome,
        ExportOutcome::Fallback {
            path: out.path().join("AudioClip").join("broken.ogg"),
            format: "OGGVORBIS".to_string(),
        }
    );
    assert_eq!(exporter.engine().live_systems(), 0);
}

#[cfg(feature = "symphonia-engine")]
#[test]
fn test_symphonia_engine_survives_corrupt_fsb5_header() {
    use core_export::SymphoniaEngine;

    // FSB5 v1 header claiming u32::MAX samples with empty sections.
    let mut bank = b"FSB5".to_vec();
    bank.extend_from_slice(&1u32.to_le_bytes());
    bank.extend_from_slice(&u32::MAX.to_le_bytes());
    bank.extend_from_slice(&[0u8; 16]);
    bank.extend_from_slice(&[0u8; 32]);

    let (clip, resolver) = modern_clip("corrupt", 0, &bank);
    let sink = Arc::new(CollectingSink::default());
    let out = TempDir::new().unwrap();
    let mut exporter = ClipExporter::new(SymphoniaEngine::new(), resolver).with_logger(sink.clone());

    let outcome = exporter.export(&clip, out.path()).unwrap();

    let expected = out.path().join("AudioClip").join("corrupt.fsb");
    assert_eq!(
        outcome,
        ExportOutcome::Fallback {
            path: expected.clone(),
            format: "PCM".to_string(),
        }
    );
    assert_eq!(fs::read(&expected).unwrap(), bank);
    assert!(sink
        .messages_at(LogLevel::Error)
        .iter()
        .any(|m| m.contains("Can't create sound for AudioClip corrupt")));
    assert_eq!(exporter.engine().live_systems(), 0);
}
