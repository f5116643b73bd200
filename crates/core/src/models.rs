use serde::Serialize;

/// Artist shown when a playing track carries no artist
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// One immutable record of what the OS reports as playing right now.
///
/// A snapshot is either the canonical "nothing playing" value (all text empty,
/// `is_playing == false`) or a playing track with a non-empty title. Fields are
/// private so those two shapes are the only ones that can exist.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TrackSnapshot {
    track_id: String,
    title: String,
    artist: String,
    album: String,
    is_playing: bool,
}

impl TrackSnapshot {
    /// The canonical "nothing playing" snapshot
    pub fn nothing_playing() -> Self {
        Self::default()
    }

    /// Build a playing snapshot.
    ///
    /// Returns `None` when the title is empty after trimming: a player that
    /// claims to be playing without a title is not trusted. When `native_id`
    /// is missing or blank the id is derived from title and artist.
    pub fn playing(native_id: Option<&str>, title: &str, artist: &str, album: &str) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let artist = artist.trim();

        let track_id = match native_id.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => fallback_track_id(title, artist),
        };

        let artist = if artist.is_empty() { UNKNOWN_ARTIST } else { artist };

        Some(Self {
            track_id,
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.trim().to_string(),
            is_playing: true,
        })
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn album(&self) -> &str {
        &self.album
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Display form used in logs ("Artist - Title")
    pub fn display_name(&self) -> String {
        if self.is_playing {
            format!("{} - {}", self.artist, self.title)
        } else {
            "nothing playing".to_string()
        }
    }
}

/// Deterministic id for players that do not publish one.
///
/// Distinct recordings sharing title and artist collide; change detection
/// tolerates that.
pub fn fallback_track_id(title: &str, artist: &str) -> String {
    format!("{:08x}", crc32fast::hash(format!("{}-{}", title, artist).as_bytes()))
}
