//! Scripted [`CommandRunner`] for backend tests

use crate::command::CommandRunner;
use crate::error::CommandError;
use std::process::ExitStatus;
use std::sync::Mutex;

enum Matcher {
    Exact(Vec<String>),
    Contains(String),
}

impl Matcher {
    fn matches(&self, args: &[&str]) -> bool {
        match self {
            Matcher::Exact(expected) => expected.iter().map(String::as_str).eq(args.iter().copied()),
            Matcher::Contains(needle) => args.iter().any(|a| a.contains(needle.as_str())),
        }
    }
}

enum Response {
    Output(Vec<String>),
    Exit,
}

/// Answers calls from a fixed script; anything unscripted exits non-zero
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    script: Vec<(String, Matcher, Response)>,
    missing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, program: &str, matcher: Matcher, response: Response) -> Self {
        self.script.push((program.to_string(), matcher, response));
        self
    }

    pub fn ok(self, program: &str, args: &[&str], output: &str) -> Self {
        self.ok_args(program, args.iter().map(|a| a.to_string()).collect(), output)
    }

    pub fn ok_args(self, program: &str, args: Vec<String>, output: &str) -> Self {
        self.push(program, Matcher::Exact(args), Response::Output(lines(output)))
    }

    pub fn ok_containing(self, program: &str, needle: &str, output: &str) -> Self {
        self.push(program, Matcher::Contains(needle.to_string()), Response::Output(lines(output)))
    }

    pub fn fail(self, program: &str, args: &[&str]) -> Self {
        self.fail_args(program, args.iter().map(|a| a.to_string()).collect())
    }

    pub fn fail_args(self, program: &str, args: Vec<String>) -> Self {
        self.push(program, Matcher::Exact(args), Response::Exit)
    }

    pub fn fail_containing(self, program: &str, needle: &str) -> Self {
        self.push(program, Matcher::Contains(needle.to_string()), Response::Exit)
    }

    /// Every call to `program` fails to launch
    pub fn missing(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    /// Calls made so far, as `program arg arg ...`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<Vec<String>, CommandError> {
        let mut call = program.to_string();
        for arg in args {
            call.push(' ');
            call.push_str(arg);
        }
        self.calls.lock().unwrap().push(call);

        if self.missing.iter().any(|p| p == program) {
            return Err(CommandError::Launch {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }

        let scripted = self
            .script
            .iter()
            .find(|(p, matcher, _)| p == program && matcher.matches(args));

        match scripted {
            Some((_, _, Response::Output(lines))) => Ok(lines.clone()),
            _ => Err(CommandError::Exit {
                program: program.to_string(),
                status: failed_status(),
            }),
        }
    }
}

fn lines(output: &str) -> Vec<String> {
    output.lines().map(str::to_string).collect()
}

#[cfg(unix)]
fn failed_status() -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(1 << 8)
}

#[cfg(windows)]
fn failed_status() -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(1)
}
