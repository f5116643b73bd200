//! Windows now-playing detection via System Media Transport Controls (SMTC)
//!
//! The WinRT session manager is reached through a PowerShell one-liner that
//! awaits the async calls and prints `KEY:value` lines. One process launch per
//! poll.
//!
//! Requires Windows 10 version 1809 or later.

use crate::command::CommandRunner;
use crate::error::FetchError;
use crate::parser;
use crate::TrackFetcher;
use nowtoast_core::TrackSnapshot;
use std::sync::Arc;

const POWERSHELL: &str = "powershell.exe";

const SMTC_SCRIPT: &str = concat!(
    "[Console]::OutputEncoding = [System.Text.Encoding]::UTF8;",
    "Add-Type -AssemblyName System.Runtime.WindowsRuntime;",
    "$asTaskGeneric = ([System.WindowsRuntimeSystemExtensions].GetMethods() | Where-Object { ",
    "$_.Name -eq 'AsTask' -and $_.GetParameters().Count -eq 1 -and ",
    "$_.GetParameters()[0].ParameterType.Name -eq 'IAsyncOperation`1' })[0];",
    "Function Await($WinRtTask, $ResultType) { ",
    "$asTask = $asTaskGeneric.MakeGenericMethod($ResultType); ",
    "$netTask = $asTask.Invoke($null, @($WinRtTask)); ",
    "$netTask.Wait(-1) | Out-Null; $netTask.Result };",
    "$null = [Windows.Media.Control.GlobalSystemMediaTransportControlsSessionManager, Windows.Media.Control, ContentType = WindowsRuntime];",
    "$manager = Await ([Windows.Media.Control.GlobalSystemMediaTransportControlsSessionManager]::RequestAsync()) ",
    "([Windows.Media.Control.GlobalSystemMediaTransportControlsSessionManager]);",
    "$session = $manager.GetCurrentSession();",
    "if ($session) {",
    "  $null = [Windows.Media.Control.GlobalSystemMediaTransportControlsSessionMediaProperties, Windows.Media.Control, ContentType = WindowsRuntime];",
    "  $status = $session.GetPlaybackInfo().PlaybackStatus;",
    "  if ($status -eq 'Playing') {",
    "    $props = Await ($session.TryGetMediaPropertiesAsync()) ",
    "([Windows.Media.Control.GlobalSystemMediaTransportControlsSessionMediaProperties]);",
    "    Write-Output 'STATUS:Playing';",
    "    Write-Output ('ARTIST:' + $props.Artist);",
    "    Write-Output ('TITLE:' + $props.Title);",
    "    Write-Output ('ALBUM:' + $props.AlbumTitle);",
    "  } else {",
    "    Write-Output ('STATUS:' + $status);",
    "  }",
    "} else {",
    "  Write-Output 'STATUS:NoSession';",
    "}"
);

pub struct PowerShellFetcher {
    runner: Arc<dyn CommandRunner>,
}

impl PowerShellFetcher {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl TrackFetcher for PowerShellFetcher {
    fn name(&self) -> &'static str {
        "powershell"
    }

    fn fetch_current_track(&self) -> Result<TrackSnapshot, FetchError> {
        let lines = self.runner.run(
            POWERSHELL,
            &[
                "-NoProfile",
                "-NonInteractive",
                "-ExecutionPolicy",
                "Bypass",
                "-Command",
                SMTC_SCRIPT,
            ],
        )?;

        if lines.is_empty() {
            return Err(FetchError::EmptyOutput(POWERSHELL));
        }
        parser::parse_lines(&lines).ok_or(FetchError::MissingTitle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;

    fn fetcher(output: &str) -> PowerShellFetcher {
        let runner = ScriptedRunner::new().ok_containing(POWERSHELL, "GlobalSystemMediaTransportControlsSessionManager", output);
        PowerShellFetcher::new(Arc::new(runner))
    }

    #[test]
    fn test_playing_session() {
        let snapshot = fetcher("STATUS:Playing\r\nARTIST:Daft Punk\r\nTITLE:Digital Love\r\nALBUM:Discovery\r\n")
            .fetch_current_track()
            .unwrap();
        assert!(snapshot.is_playing());
        assert_eq!(snapshot.title(), "Digital Love");
        assert_eq!(snapshot.artist(), "Daft Punk");
        assert_eq!(snapshot.album(), "Discovery");
    }

    #[test]
    fn test_no_session() {
        assert_eq!(
            fetcher("STATUS:NoSession").fetch_current_track().unwrap(),
            TrackSnapshot::nothing_playing()
        );
        assert_eq!(
            fetcher("STATUS:Paused").fetch_current_track().unwrap(),
            TrackSnapshot::nothing_playing()
        );
    }

    #[test]
    fn test_playing_without_title() {
        assert!(matches!(
            fetcher("STATUS:Playing\nARTIST:Someone\nTITLE:\nALBUM:").fetch_current_track(),
            Err(FetchError::MissingTitle)
        ));
    }

    #[test]
    fn test_empty_output_is_failed_poll() {
        assert!(matches!(fetcher("").fetch_current_track(), Err(FetchError::EmptyOutput(_))));
    }

    #[test]
    fn test_script_failure_is_failed_poll() {
        let runner = ScriptedRunner::new().fail_containing(POWERSHELL, "RequestAsync");
        let fetcher = PowerShellFetcher::new(Arc::new(runner));
        assert!(matches!(fetcher.fetch_current_track(), Err(FetchError::Command(_))));
    }

    #[test]
    fn test_script_writes_all_prefixes() {
        for key in ["'STATUS:Playing'", "'ARTIST:'", "'TITLE:'", "'ALBUM:'", "'STATUS:NoSession'"] {
            assert!(SMTC_SCRIPT.contains(key), "missing {}", key);
        }
    }
}
