//! External program execution
//!
//! Every backend talks to the OS through a helper program. Output of stdout
//! and stderr is captured through one pipe, so lines keep the order the
//! program wrote them in.

use crate::error::CommandError;
use std::io::Read;
use std::process::{Command, Stdio};
use tracing::debug;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Runs a program and returns its output lines.
///
/// A non-zero exit is an error and discards whatever was printed.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> Result<Vec<String>, CommandError>;
}

/// [`CommandRunner`] backed by real child processes
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<Vec<String>, CommandError> {
        let result = run_merged(program, args);
        if let Err(e) = &result {
            debug!("Command failed: {}", e);
        }
        result
    }
}

fn run_merged(program: &str, args: &[&str]) -> Result<Vec<String>, CommandError> {
    let io_error = |source| CommandError::Io {
        program: program.to_string(),
        source,
    };

    let (mut reader, writer) = std::io::pipe().map_err(io_error)?;

    // The command holds its copies of the write end until dropped; reading
    // to EOF below would never finish otherwise.
    let mut child = {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(writer.try_clone().map_err(io_error)?)
            .stderr(writer);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        command.spawn().map_err(|source| CommandError::Launch {
            program: program.to_string(),
            source,
        })?
    };

    let mut raw = Vec::new();
    let read = reader.read_to_end(&mut raw);
    let status = child.wait().map_err(io_error)?;
    read.map_err(io_error)?;

    if !status.success() {
        return Err(CommandError::Exit {
            program: program.to_string(),
            status,
        });
    }

    Ok(String::from_utf8_lossy(&raw)
        .lines()
        .map(str::to_string)
        .collect())
}
