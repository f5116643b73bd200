//! Host detection and backend selection
//!
//! Selection happens once, when a listener is built. There is no fallback
//! from one backend to another at runtime.

use crate::error::SessionError;
use nowtoast_core::LinuxBackend;
use std::path::Path;

const FLATPAK_ENV: &str = "FLATPAK_ID";
const FLATPAK_MARKER: &str = "/.flatpak-info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OsFamily {
    /// Linux and the BSDs, anything with MPRIS on a session bus
    Linux,
    Windows,
    MacOs,
}

impl OsFamily {
    /// Family of the running host
    pub fn detect() -> Result<Self, SessionError> {
        let os = std::env::consts::OS;
        Self::from_os_name(os).ok_or_else(|| SessionError::UnsupportedOs(os.to_string()))
    }

    /// Map a `std::env::consts::OS` value to a family
    pub fn from_os_name(os: &str) -> Option<Self> {
        match os {
            "linux" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" => Some(OsFamily::Linux),
            "windows" => Some(OsFamily::Windows),
            "macos" => Some(OsFamily::MacOs),
            _ => None,
        }
    }
}

/// The concrete strategy used to read the now-playing state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Playerctl,
    DbusSend,
    PowerShell,
    AppleScript,
}

impl Backend {
    pub fn select(os: OsFamily, sandboxed: bool, linux: LinuxBackend) -> Self {
        match os {
            OsFamily::Windows => Backend::PowerShell,
            OsFamily::MacOs => Backend::AppleScript,
            OsFamily::Linux => match linux {
                LinuxBackend::Playerctl => Backend::Playerctl,
                LinuxBackend::Dbus => Backend::DbusSend,
                LinuxBackend::Auto if sandboxed => Backend::DbusSend,
                LinuxBackend::Auto => Backend::Playerctl,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Playerctl => "playerctl",
            Backend::DbusSend => "dbus-send",
            Backend::PowerShell => "powershell",
            Backend::AppleScript => "osascript",
        }
    }
}

/// True inside a Flatpak sandbox, where playerctl cannot reach the host bus
pub fn is_sandboxed() -> bool {
    sandbox_markers_present(std::env::var_os(FLATPAK_ENV).is_some(), Path::new(FLATPAK_MARKER))
}

fn sandbox_markers_present(env_set: bool, marker: &Path) -> bool {
    env_set || marker.exists()
}
