//! Export a local audio file as if it were an inline pre-5.0 AudioClip
//!
//! Run with:
//! ```bash
//! # Decode a WAV/Ogg/MP3 file (FMOD type defaults to 20 = WAV)
//! cargo run --example export_clip -- path/to/clip.ogg ./out 14
//!
//! # JSON logs
//! RUST_LOG_FORMAT=json cargo run --example export_clip -- clip.wav ./out
//! ```

use bridge_traits::{ConsoleLogger, InMemoryResourceResolver, LogLevel};
use bytes::Bytes;
use core_export::{AudioClip, ClipExporter, ClipPayload, SymphoniaEngine, UnityVersion};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: export_clip <input> <output-dir> [fmod-sound-type]");
        std::process::exit(2);
    }

    let format = match env::var("RUST_LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        Ok("compact") => LogFormat::Compact,
        _ => LogFormat::Pretty,
    };
    init_logging(
        LoggingConfig::default()
            .with_format(format)
            .with_level(LogLevel::Debug),
    )
    .expect("Failed to initialize logging");

    let input = PathBuf::from(&args[1]);
    let output = PathBuf::from(&args[2]);
    let sound_type: i32 = args
        .get(3)
        .map(|raw| raw.parse().expect("sound type must be an integer"))
        .unwrap_or(20);

    let data = std::fs::read(&input).expect("Failed to read input file");
    let name = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("clip");

    let clip = AudioClip::new(
        name,
        UnityVersion::new(4, 7, 2),
        sound_type,
        ClipPayload::Inline(Bytes::from(data)),
    )
    .expect("Inline payload is valid for a 4.x clip");

    let mut exporter = ClipExporter::new(
        SymphoniaEngine::new(),
        Arc::new(InMemoryResourceResolver::new()),
    )
    .with_logger(Arc::new(ConsoleLogger::default()));

    let outcome = exporter
        .export(&clip, Path::new(&output))
        .expect("Output directory is not writable");

    info!(?outcome, "Done");
}
