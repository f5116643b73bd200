//! Linux now-playing detection via MPRIS (Media Player Remote Interfacing Specification)
//!
//! Two strategies:
//! - [`PlayerctlFetcher`] asks `playerctl` one value per invocation
//! - [`DbusFetcher`] talks to the session bus with `dbus-send` and parses the
//!   printed reply. Used inside Flatpak, where playerctl cannot see the host
//!   players.

use crate::command::CommandRunner;
use crate::error::{CommandError, FetchError};
use crate::parser::{self, KEY_ALBUM, KEY_ARTIST, KEY_TITLE, KEY_TRACK_ID, PLAYING};
use crate::TrackFetcher;
use nowtoast_core::TrackSnapshot;
use std::sync::Arc;
use tracing::debug;

const PLAYERCTL: &str = "playerctl";
const DBUS_SEND: &str = "dbus-send";
const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";
const BROWSER_HINTS: [&str; 3] = ["firefox", "chrome", "chromium"];

pub struct PlayerctlFetcher {
    runner: Arc<dyn CommandRunner>,
}

impl PlayerctlFetcher {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// One playerctl call, output joined into a single value
    fn query(&self, args: &[&str]) -> Result<String, CommandError> {
        self.runner.run(PLAYERCTL, args).map(|lines| lines.concat())
    }

    fn metadata(&self, key: &str) -> Result<String, CommandError> {
        self.query(&["metadata", key])
    }
}

impl TrackFetcher for PlayerctlFetcher {
    fn name(&self) -> &'static str {
        "playerctl"
    }

    fn fetch_current_track(&self) -> Result<TrackSnapshot, FetchError> {
        let status = match self.query(&["status"]) {
            Ok(status) => status,
            // playerctl exits non-zero with "No players found"
            Err(e) if player_unreachable(&e) => {
                debug!("No player reachable through playerctl: {}", e);
                return Ok(TrackSnapshot::nothing_playing());
            }
            Err(e) => return Err(e.into()),
        };

        if !status.trim().eq_ignore_ascii_case(PLAYING) {
            debug!("playerctl status: {}", status.trim());
            return Ok(TrackSnapshot::nothing_playing());
        }

        let title = self.metadata("title")?;
        let artist = self.metadata("artist").unwrap_or_default();
        let album = self.metadata("album").unwrap_or_default();
        let track_id = self.metadata(KEY_TRACK_ID).unwrap_or_default();

        TrackSnapshot::playing(Some(&track_id), &title, &artist, &album).ok_or(FetchError::MissingTitle)
    }
}

pub struct DbusFetcher {
    runner: Arc<dyn CommandRunner>,
}

impl DbusFetcher {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// MPRIS bus names, dedicated players before browsers
    fn list_players(&self) -> Result<Vec<String>, CommandError> {
        let lines = self.runner.run(
            DBUS_SEND,
            &[
                "--session",
                "--dest=org.freedesktop.DBus",
                "--type=method_call",
                "--print-reply",
                "/org/freedesktop/DBus",
                "org.freedesktop.DBus.ListNames",
            ],
        )?;

        let mut browser_players = Vec::new();
        let mut other_players = Vec::new();

        for line in &lines {
            let Some(start) = line.find(MPRIS_PREFIX) else {
                continue;
            };
            let name = &line[start..];
            let name = name.split('"').next().unwrap_or(name).trim();

            // Browsers expose every video tab, so they only win when nothing else plays
            if BROWSER_HINTS.iter().any(|hint| name.contains(hint)) {
                browser_players.push(name.to_string());
            } else {
                other_players.push(name.to_string());
            }
        }

        other_players.extend(browser_players);
        Ok(other_players)
    }

    /// Raw `--print-reply` output of an `org.mpris.MediaPlayer2.Player` property
    fn get_property(&self, player: &str, property: &str) -> Result<String, CommandError> {
        let lines = self.runner.run(
            DBUS_SEND,
            &[
                "--session",
                &format!("--dest={}", player),
                "--type=method_call",
                "--print-reply",
                "/org/mpris/MediaPlayer2",
                "org.freedesktop.DBus.Properties.Get",
                "string:org.mpris.MediaPlayer2.Player",
                &format!("string:{}", property),
            ],
        )?;
        Ok(lines.join("\n"))
    }

    fn is_playing(&self, player: &str) -> bool {
        match self.get_property(player, "PlaybackStatus") {
            Ok(raw) => parser::extract_property(&raw, "variant").as_deref() == Some(PLAYING),
            Err(e) => {
                debug!("Failed to read PlaybackStatus of {}: {}", player, e);
                false
            }
        }
    }
}

impl TrackFetcher for DbusFetcher {
    fn name(&self) -> &'static str {
        "dbus-send"
    }

    fn fetch_current_track(&self) -> Result<TrackSnapshot, FetchError> {
        let players = match self.list_players() {
            Ok(players) => players,
            Err(e) if player_unreachable(&e) => {
                debug!("Cannot list MPRIS players: {}", e);
                return Ok(TrackSnapshot::nothing_playing());
            }
            Err(e) => return Err(e.into()),
        };

        let Some(player) = players.iter().find(|p| self.is_playing(p)) else {
            debug!("No playing MPRIS player among {:?}", players);
            return Ok(TrackSnapshot::nothing_playing());
        };
        debug!("Found playing player: {}", player);

        let metadata = self.get_property(player, "Metadata")?;
        let title = parser::extract_property(&metadata, KEY_TITLE).unwrap_or_default();
        let artist = parser::extract_property(&metadata, KEY_ARTIST).unwrap_or_default();
        let album = parser::extract_property(&metadata, KEY_ALBUM).unwrap_or_default();
        let track_id = parser::extract_property(&metadata, KEY_TRACK_ID);

        TrackSnapshot::playing(track_id.as_deref(), &title, &artist, &album).ok_or(FetchError::MissingTitle)
    }
}

/// The helper is missing or refused to answer. Either way no player can be
/// reached, which is not the same as a poll that broke halfway.
fn player_unreachable(e: &CommandError) -> bool {
    matches!(e, CommandError::Launch { .. } | CommandError::Exit { .. })
}
