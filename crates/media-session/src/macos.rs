//! macOS now-playing detection via AppleScript
//!
//! Each configured app (Spotify, then Music by default) is asked through
//! `osascript` for its `player state` and `current track`. The first app that
//! is playing wins; when none is, the last app's answer is returned.

use crate::command::CommandRunner;
use crate::error::FetchError;
use crate::parser;
use crate::TrackFetcher;
use nowtoast_core::TrackSnapshot;
use std::sync::Arc;
use tracing::debug;

const OSASCRIPT: &str = "osascript";

pub struct AppleScriptFetcher {
    runner: Arc<dyn CommandRunner>,
    apps: Vec<String>,
}

impl AppleScriptFetcher {
    /// `apps` in priority order; an empty list falls back to Spotify, Music
    pub fn new(runner: Arc<dyn CommandRunner>, apps: Vec<String>) -> Self {
        let apps = if apps.is_empty() {
            vec!["Spotify".to_string(), "Music".to_string()]
        } else {
            apps
        };
        Self { runner, apps }
    }

    pub fn apps(&self) -> &[String] {
        &self.apps
    }

    fn fetch_app(&self, app: &str) -> Result<TrackSnapshot, FetchError> {
        let script = track_script(app);
        let mut args = Vec::with_capacity(script.len() * 2);
        for line in &script {
            args.push("-e");
            args.push(line.as_str());
        }

        let lines = self.runner.run(OSASCRIPT, &args)?;
        if lines.is_empty() {
            return Err(FetchError::EmptyOutput(OSASCRIPT));
        }
        parser::parse_lines(&lines).ok_or(FetchError::MissingTitle)
    }
}

impl TrackFetcher for AppleScriptFetcher {
    fn name(&self) -> &'static str {
        "osascript"
    }

    fn fetch_current_track(&self) -> Result<TrackSnapshot, FetchError> {
        let mut result = Ok(TrackSnapshot::nothing_playing());
        for app in &self.apps {
            result = self.fetch_app(app);
            match &result {
                Ok(snapshot) if snapshot.is_playing() => break,
                Ok(_) => debug!("{} is not playing", app),
                Err(e) => debug!("Failed to query {}: {}", app, e),
            }
        }
        result
    }
}

/// AppleScript lines, one `-e` argument each. Answers in `KEY:value` lines.
fn track_script(app: &str) -> Vec<String> {
    let app = app.replace('\\', "\\\\").replace('"', "\\\"");
    vec![
        format!("tell application \"{}\"", app),
        "  if it is running then".to_string(),
        "    set playerState to player state as string".to_string(),
        "    if playerState is \"playing\" then".to_string(),
        "      set trackName to name of current track".to_string(),
        "      set trackArtist to artist of current track".to_string(),
        "      set trackAlbum to album of current track".to_string(),
        "      return \"STATUS:Playing\" & linefeed & \"TITLE:\" & trackName & linefeed & \"ARTIST:\" & trackArtist & linefeed & \"ALBUM:\" & trackAlbum".to_string(),
        "    else".to_string(),
        "      return \"STATUS:\" & playerState".to_string(),
        "    end if".to_string(),
        "  else".to_string(),
        "    return \"STATUS:NotRunning\"".to_string(),
        "  end if".to_string(),
        "end tell".to_string(),
    ]
}
