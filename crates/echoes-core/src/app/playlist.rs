//! GalleryPlaylist - gallery 画面の再生順
//!
//! Shows the newest `window` contributions and cycles through their audio
//! tracks with a pause between them. Pure state; the caller owns the timers.

use std::time::Duration;

use super::gallery::GalleryEntry;

pub const DEFAULT_WINDOW: usize = 3;
pub const DEFAULT_TRACK_GAP: Duration = Duration::from_secs(2);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct GalleryPlaylist {
    window: usize,
    track_gap: Duration,
    refresh_interval: Duration,
    entries: Vec<GalleryEntry>,
    cursor: usize,
}

impl Default for GalleryPlaylist {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_TRACK_GAP)
    }
}

impl GalleryPlaylist {
    /// `window` is raised to 1 if 0 is passed.
    pub fn new(window: usize, track_gap: Duration) -> Self {
        Self {
            window: window.max(1),
            track_gap,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            entries: Vec::new(),
            cursor: 0,
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Take the newest entries from a fresh listing (newest first).
    ///
    /// Returns `false` and keeps everything as is when the visible window did
    /// not change. Otherwise the cursor stays on the same folder if it is
    /// still visible, and is clamped into range if not.
    pub fn refresh(&mut self, listing: &[GalleryEntry]) -> bool {
        let next = &listing[..listing.len().min(self.window)];
        if next == self.entries.as_slice() {
            return false;
        }

        let playing = self.current().map(|e| e.folder_key);
        self.entries = next.to_vec();
        self.cursor = playing
            .and_then(|key| self.entries.iter().position(|e| e.folder_key == key))
            .unwrap_or_else(|| self.cursor.min(self.entries.len().saturating_sub(1)));
        true
    }

    pub fn current(&self) -> Option<&GalleryEntry> {
        self.entries.get(self.cursor)
    }

    /// Move to the next track, wrapping around.
    pub fn advance(&mut self) -> Option<&GalleryEntry> {
        if self.entries.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.entries.len();
        self.current()
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Silence between the end of one track and the start of the next.
    pub fn track_gap(&self) -> Duration {
        self.track_gap
    }

    /// How often the player should re-list the gallery and call `refresh`.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }
}
