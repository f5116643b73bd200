//! Cross-platform now-playing detection
//!
//! This crate reads what the host OS reports as currently playing:
//! - Linux: MPRIS through `playerctl`, or `dbus-send` inside a Flatpak sandbox
//! - Windows: System Media Transport Controls (SMTC) through PowerShell
//! - macOS: AppleScript against Spotify and Music
//!
//! One backend is chosen when the [`MediaListener`] is built and polled on a
//! background thread from then on.

use nowtoast_core::{ListenerConfig, TrackSnapshot};
use std::sync::Arc;
use tracing::info;

pub mod command;
pub mod error;
pub mod linux;
pub mod listener;
pub mod macos;
pub mod parser;
pub mod platform;
pub mod windows;

#[cfg(test)]
mod testing;

pub use command::{CommandRunner, SystemCommandRunner};
pub use error::{CommandError, FetchError, SessionError};
pub use listener::{MediaListener, SnapshotReader};
pub use platform::{Backend, OsFamily};

/// One way of asking the OS what is playing
pub trait TrackFetcher: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Take one snapshot.
    ///
    /// `Err` means the poll failed and the previous snapshot should be kept;
    /// "nothing playing" is a successful answer.
    fn fetch_current_track(&self) -> Result<TrackSnapshot, FetchError>;
}

/// Pick the backend for the running host and build it
pub fn create_fetcher(config: &ListenerConfig) -> Result<Box<dyn TrackFetcher>, SessionError> {
    let os = OsFamily::detect()?;
    let sandboxed = os == OsFamily::Linux && platform::is_sandboxed();
    if sandboxed {
        info!("Flatpak environment detected, using D-Bus for MPRIS access");
    }

    let backend = Backend::select(os, sandboxed, config.linux_backend);
    info!("{:?} detected, using {} for media info", os, backend.as_str());

    Ok(create_fetcher_for(backend, config, Arc::new(SystemCommandRunner::new())))
}

/// Build a specific backend on top of `runner`
pub fn create_fetcher_for(
    backend: Backend,
    config: &ListenerConfig,
    runner: Arc<dyn CommandRunner>,
) -> Box<dyn TrackFetcher> {
    match backend {
        Backend::Playerctl => Box::new(linux::PlayerctlFetcher::new(runner)),
        Backend::DbusSend => Box::new(linux::DbusFetcher::new(runner)),
        Backend::PowerShell => Box::new(windows::PowerShellFetcher::new(runner)),
        Backend::AppleScript => Box::new(macos::AppleScriptFetcher::new(runner, config.mac_players.clone())),
    }
}
