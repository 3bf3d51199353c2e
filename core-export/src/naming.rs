//! Output file naming.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Stem used when a clip name sanitizes to nothing.
pub const FALLBACK_STEM: &str = "AudioClip";

const MAX_SUFFIX: u32 = 10_000;

/// Replace characters that are not allowed in file names.
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Create a new file `<dir>/<stem>.<ext>`, appending `_1`, `_2`, ... to the
/// stem until the name is free.
///
/// The file is created with `create_new`, so an existing file is never
/// overwritten.
pub fn create_unique_file(dir: &Path, stem: &str, extension: &str) -> io::Result<(PathBuf, File)> {
    let stem = sanitize_file_stem(stem);

    for suffix in 0..MAX_SUFFIX {
        let file_name = if suffix == 0 {
            format!("{}.{}", stem, extension)
        } else {
            format!("{}_{}.{}", stem, suffix, extension)
        };
        let path = dir.join(file_name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free file name for '{}.{}' in {}", stem, extension, dir.display()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_file_stem("music/theme:01"), "music_theme_01");
        assert_eq!(sanitize_file_stem("a\tb"), "a_b");
        assert_eq!(sanitize_file_stem("  "), FALLBACK_STEM);
        assert_eq!(sanitize_file_stem("..."), FALLBACK_STEM);
        assert_eq!(sanitize_file_stem("hit."), "hit");
    }

    #[test]
    fn test_unique_names() {
        let dir = TempDir::new().unwrap();

        let (first, _) = create_unique_file(dir.path(), "hit", "wav").unwrap();
        let (second, _) = create_unique_file(dir.path(), "hit", "wav").unwrap();
        let (other_ext, _) = create_unique_file(dir.path(), "hit", "ogg").unwrap();

        assert_eq!(first, dir.path().join("hit.wav"));
        assert_eq!(second, dir.path().join("hit_1.wav"));
        assert_eq!(other_ext, dir.path().join("hit.ogg"));
    }
}
