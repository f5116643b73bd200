//! "Now Playing" notification decisions
//!
//! The consumer feeds each snapshot it reads into a [`TrackChangeDetector`]
//! together with the visibility reported by its [`ToastClock`]. Nothing here
//! touches global state; the caller owns both values.

use crate::config::ToastConfig;
use crate::models::TrackSnapshot;
use serde::Serialize;
use std::time::{Duration, Instant};

pub const NOW_PLAYING_HEADING: &str = "Now Playing";
const ELLIPSIS: &str = "...";

/// Text of one notification, already truncated for display
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Toast {
    pub heading: String,
    pub title: String,
    pub artist: String,
    /// Id of the track this toast announces, empty for placeholders
    pub track_id: String,
}

impl Toast {
    fn for_track(snapshot: &TrackSnapshot, config: &ToastConfig) -> Self {
        Self {
            heading: NOW_PLAYING_HEADING.to_string(),
            title: truncate_text(snapshot.title(), config.title_max_chars),
            artist: truncate_text(snapshot.artist(), config.artist_max_chars),
            track_id: snapshot.track_id().to_string(),
        }
    }

    fn nothing_playing(config: &ToastConfig) -> Self {
        Self {
            heading: NOW_PLAYING_HEADING.to_string(),
            title: truncate_text("No music playing", config.title_max_chars),
            artist: truncate_text("Start playing music to see info", config.artist_max_chars),
            track_id: String::new(),
        }
    }
}

/// Shorten `text` to at most `max_chars` characters, ending in "..." when cut.
/// Empty text becomes "Unknown". Limits too small for the ellipsis cut hard.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let text = if text.is_empty() { "Unknown" } else { text };
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= ELLIPSIS.len() {
        return text.chars().take(max_chars).collect();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Tracks the lifetime of the toast currently on screen
#[derive(Clone, Debug)]
pub struct ToastClock {
    display: Duration,
    fade_out: Duration,
    shown_at: Option<Instant>,
}

impl ToastClock {
    pub fn new(config: &ToastConfig) -> Self {
        Self {
            display: Duration::from_millis(config.display_ms),
            fade_out: Duration::from_millis(config.fade_out_ms),
            shown_at: None,
        }
    }

    pub fn show(&mut self, now: Instant) {
        self.shown_at = Some(now);
    }

    /// True while the toast is fully displayed
    pub fn is_showing(&self, now: Instant) -> bool {
        self.elapsed(now).is_some_and(|e| e < self.display)
    }

    /// True until the fade-out after the display time has finished
    pub fn is_visible(&self, now: Instant) -> bool {
        self.elapsed(now).is_some_and(|e| e < self.display + self.fade_out)
    }

    fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.shown_at.map(|shown| now.saturating_duration_since(shown))
    }
}

/// Decides when a snapshot deserves a notification
#[derive(Clone, Debug)]
pub struct TrackChangeDetector {
    config: ToastConfig,
    last_track_id: String,
}

impl TrackChangeDetector {
    pub fn new(config: ToastConfig) -> Self {
        Self {
            config,
            last_track_id: String::new(),
        }
    }

    pub fn last_track_id(&self) -> &str {
        &self.last_track_id
    }

    /// Returns a toast when a different track started playing and no toast
    /// is on screen. The track is only marked as seen once a toast is issued.
    pub fn observe(&mut self, snapshot: Option<&TrackSnapshot>, toast_visible: bool) -> Option<Toast> {
        let snapshot = snapshot.filter(|s| s.is_playing())?;
        if toast_visible || snapshot.track_id() == self.last_track_id {
            return None;
        }

        self.last_track_id = snapshot.track_id().to_string();
        tracing::info!("Now playing: {}", snapshot.display_name());
        Some(Toast::for_track(snapshot, &self.config))
    }

    /// Toast requested explicitly by the user. Marks the current track as seen
    /// so the automatic path does not announce it again.
    pub fn on_demand(&mut self, snapshot: Option<&TrackSnapshot>) -> Toast {
        match snapshot.filter(|s| s.is_playing()) {
            Some(snapshot) => {
                self.last_track_id = snapshot.track_id().to_string();
                tracing::debug!("Manually showing current track: {}", snapshot.display_name());
                Toast::for_track(snapshot, &self.config)
            }
            None => Toast::nothing_playing(&self.config),
        }
    }
}
