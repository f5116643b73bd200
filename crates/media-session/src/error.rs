use std::process::ExitStatus;
use thiserror::Error;

/// Failure of a single external program invocation
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}")]
    Exit { program: String, status: ExitStatus },
    #[error("i/o error while running `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Why a poll produced no snapshot. The listener keeps the previous one.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("player reports playing but no title")]
    MissingTitle,
    #[error("`{0}` produced no output")]
    EmptyOutput(&'static str),
    #[error("fetcher panicked: {0}")]
    Panicked(String),
}

/// Errors visible to the owner of a listener
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unsupported operating system: {0}")]
    UnsupportedOs(String),
    #[error("failed to spawn media listener thread: {0}")]
    Spawn(#[source] std::io::Error),
}
