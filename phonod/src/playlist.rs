//! Playlist: the ordered track list behind the player
//!
//! Built once at startup (bulk append), optionally shuffled once, and from
//! then on only read by index.

use std::path::{Path, PathBuf};

use rand::Rng;

/// Ordered sequence of track locations.
#[derive(Debug, Default)]
pub struct Playlist {
    tracks: Vec<PathBuf>,
}

impl Playlist {
    pub fn new() -> Self {
        Self { tracks: Vec::new() }
    }

    /// Append a single track. Existence is not checked here; a missing file
    /// surfaces as a load failure when the track is played.
    pub fn push(&mut self, path: PathBuf) {
        self.tracks.push(path);
    }

    /// Append a batch of tracks in order.
    pub fn extend<I: IntoIterator<Item = PathBuf>>(&mut self, paths: I) {
        self.tracks.extend(paths);
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.tracks.get(index).map(PathBuf::as_path)
    }

    /// Display name of the track at `index`: the last path segment.
    pub fn display_name(&self, index: usize) -> Option<&str> {
        self.tracks
            .get(index)
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
    }

    /// Rebuild the playlist as a random permutation.
    ///
    /// Draws uniformly without replacement from a shrinking pool; a candidate
    /// already present in the output is discarded rather than re-queued, so
    /// the pass always terminates and the result holds no duplicates. A list
    /// of unique entries comes out as an exact permutation; duplicate entries
    /// collapse to one.
    pub fn shuffle(&mut self) {
        let mut rng = rand::thread_rng();
        let mut pool = std::mem::take(&mut self.tracks);
        let mut shuffled: Vec<PathBuf> = Vec::with_capacity(pool.len());

        while !pool.is_empty() {
            let idx = rng.gen_range(0..pool.len());
            let candidate = pool.swap_remove(idx);
            if !shuffled.contains(&candidate) {
                shuffled.push(candidate);
            }
        }

        self.tracks = shuffled;
    }
}
