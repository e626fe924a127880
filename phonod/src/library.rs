//! Music folder scanning
//!
//! Populates the initial playlist: a recursive walk of the configured music
//! folder, keeping files with a known audio extension. Unreadable directories
//! are skipped, not fatal.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Extensions accepted into the playlist (case-insensitive).
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["mp3", "flac", "ogg", "wav", "m4a", "aac"];

/// Whether `path` looks like a playable audio file.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Collect every audio file under `root`, recursively, sorted by path.
pub fn scan(root: &Path) -> Vec<PathBuf> {
    let mut pending = vec![root.to_path_buf()];
    let mut tracks = Vec::new();

    while let Some(directory) = pending.pop() {
        let entries = match std::fs::read_dir(&directory) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("failed to read directory {}: {}", directory.display(), err);
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!("failed to read an entry in {}: {}", directory.display(), err);
                    continue;
                }
            };

            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => {
                    debug!("failed to inspect {}: {}", path.display(), err);
                    continue;
                }
            };

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && is_audio_file(&path) {
                tracks.push(path);
            }
        }
    }

    tracks.sort_unstable();
    tracks
}
