//! Playback helpers for the watch view
//!
//! Classifies a resolved stream URL, walks the episode list of the anime
//! being watched, and maps calendar weekdays onto upstream schedule keys.

use chrono::{Datelike, Weekday};

use crate::models::{day_name, Episode};

/// How a resolved stream URL should be played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// A hosted player page, shown in a frame
    Embed,
    /// A media file or playlist the video element can load directly
    Direct,
}

const EMBED_MARKERS: [&str; 3] = ["embed", "player", "iframe"];
const MEDIA_EXTENSIONS: [&str; 3] = [".mp4", ".m3u8", ".webm"];

impl StreamKind {
    pub fn classify(url: &str) -> Self {
        let marked = EMBED_MARKERS.iter().any(|marker| url.contains(marker));
        let media = MEDIA_EXTENSIONS.iter().any(|ext| url.contains(ext));

        if marked || !media {
            StreamKind::Embed
        } else {
            StreamKind::Direct
        }
    }

    pub fn is_embed(&self) -> bool {
        matches!(self, StreamKind::Embed)
    }
}

/// Whether a stream URL is absolute http(s)
pub fn is_valid_stream_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Whether a direct stream is an HLS playlist
pub fn is_hls(url: &str) -> bool {
    url.contains(".m3u8")
}

/// Position of the current episode within a sorted episode list
#[derive(Debug, Clone, Copy)]
pub struct EpisodeNavigator<'a> {
    episodes: &'a [Episode],
    current: Option<usize>,
}

impl<'a> EpisodeNavigator<'a> {
    /// `episodes` must already be sorted ascending by number
    pub fn new(episodes: &'a [Episode], current_id: &str) -> Self {
        let current = episodes.iter().position(|episode| episode.id == current_id);
        Self { episodes, current }
    }

    pub fn index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&'a Episode> {
        self.current.and_then(|i| self.episodes.get(i))
    }

    pub fn previous(&self) -> Option<&'a Episode> {
        let i = self.current?;
        i.checked_sub(1).and_then(|p| self.episodes.get(p))
    }

    pub fn next(&self) -> Option<&'a Episode> {
        let i = self.current?;
        self.episodes.get(i + 1)
    }

    /// Number shown for the current episode
    pub fn display_number(&self) -> Option<String> {
        let i = self.current?;
        self.episodes.get(i).map(|episode| episode.display_number(i))
    }
}

/// Upstream schedule key for a weekday (1 = Sunday .. 7 = Saturday)
pub fn api_day_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_sunday() as u8 + 1
}

/// Schedule key and display name for a calendar date
pub fn schedule_day<D: Datelike>(date: &D) -> (u8, &'static str) {
    let key = api_day_index(date.weekday());
    (key, day_name(key).unwrap_or_default())
}
