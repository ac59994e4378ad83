//! Invocation of the vault CLI.
//!
//! Operations describe what to run as an [`OpCommand`] (verb, resource noun,
//! positional arguments and `--flag=value` options) and hand it to a
//! [`CommandRunner`]. [`OpCli`] is the production runner: it spawns the
//! binary once per call, optionally feeds bytes on stdin, and turns a
//! nonzero exit into a [`CommandFailure`].
//!
//! Arguments added with [`OpCommand::secret`] or [`OpCommand::secret_flag`]
//! are passed to the process but never rendered in logs or errors.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use tracing::{debug, warn};

use crate::config::CliConfig;
use crate::error::{CommandFailure, OpError, Result};

/// Placeholder argument telling the CLI to read the payload from stdin.
pub const STDIN: &str = "-";

const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Create,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Create => "create",
            Verb::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Item,
    Document,
    Vault,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Item => "item",
            Resource::Document => "document",
            Resource::Vault => "vault",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Arg {
    value: String,
    secret: bool,
}

/// Argument vector for one CLI call: `<verb> <resource> [args...] [--flags...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpCommand {
    verb: Verb,
    resource: Resource,
    args: Vec<Arg>,
}

impl OpCommand {
    pub fn new(verb: Verb, resource: Resource) -> Self {
        Self {
            verb,
            resource,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg {
            value: value.into(),
            secret: false,
        });
        self
    }

    /// Positional argument whose value must not appear in logs or errors.
    pub fn secret(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg {
            value: value.into(),
            secret: true,
        });
        self
    }

    /// `--name=value`, always emitted.
    pub fn flag(self, name: &str, value: &str) -> Self {
        self.arg(format!("--{}={}", name, value))
    }

    /// `--name=value`, skipped when `value` is empty.
    pub fn flag_if_set(self, name: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.flag(name, value)
        }
    }

    pub fn secret_flag(self, name: &str, value: &str) -> Self {
        self.secret(format!("--{}={}", name, value))
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// Everything after the verb and resource noun, secrets included.
    pub fn operands(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(|a| a.value.as_str())
    }

    /// Full argument vector as passed to the process.
    pub fn to_args(&self) -> Vec<String> {
        [self.verb.as_str(), self.resource.as_str()]
            .into_iter()
            .chain(self.operands())
            .map(str::to_string)
            .collect()
    }
}

/// Renders the argument vector with secret values replaced.
impl fmt::Display for OpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb.as_str(), self.resource.as_str())?;
        for arg in &self.args {
            if !arg.secret {
                write!(f, " {}", arg.value)?;
            } else if let (true, Some((name, _))) =
                (arg.value.starts_with("--"), arg.value.split_once('='))
            {
                write!(f, " {}={}", name, REDACTED)?;
            } else {
                write!(f, " {}", REDACTED)?;
            }
        }
        Ok(())
    }
}

/// Executes vault CLI commands.
///
/// Returns the command's stdout on success. A nonzero exit is reported as
/// [`OpError::Command`]; callers decide whether it is a soft miss via
/// [`CommandFailure::is_not_found`].
pub trait CommandRunner {
    fn run(&self, command: &OpCommand, stdin: Option<&[u8]>) -> Result<Vec<u8>>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command: &OpCommand, stdin: Option<&[u8]>) -> Result<Vec<u8>> {
        (**self).run(command, stdin)
    }
}

/// Runs the real `op` binary as a subprocess.
#[derive(Debug, Clone)]
pub struct OpCli {
    binary: PathBuf,
    session: Option<String>,
}

impl OpCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            session: None,
        }
    }

    /// Session token passed as `--session=<token>` on every call.
    pub fn with_session(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.session = (!token.is_empty()).then_some(token);
        self
    }

    pub fn from_config(config: &CliConfig) -> Self {
        let cli = Self::new(&config.binary);
        match config.session_token() {
            Some(token) => cli.with_session(token),
            None => cli,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn binary_label(&self) -> String {
        self.binary.display().to_string()
    }
}

impl CommandRunner for OpCli {
    fn run(&self, command: &OpCommand, stdin: Option<&[u8]>) -> Result<Vec<u8>> {
        let command = match &self.session {
            Some(token) => command.clone().secret_flag("session", token),
            None => command.clone(),
        };
        let rendered = format!("{} {}", self.binary_label(), command);
        debug!(command = %rendered, stdin_bytes = ?stdin.map(<[u8]>::len), "running vault CLI");

        let mut child = Command::new(&self.binary)
            .args(command.to_args())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| OpError::Spawn {
                binary: self.binary_label(),
                source,
            })?;

        // stdin is written on its own thread while stdout/stderr drain here.
        let writer = match (stdin, child.stdin.take()) {
            (Some(bytes), Some(mut pipe)) => {
                let bytes = bytes.to_vec();
                Some(thread::spawn(move || pipe.write_all(&bytes)))
            }
            _ => None,
        };

        let output = child.wait_with_output().map_err(|source| OpError::Pipe {
            binary: self.binary_label(),
            source,
        })?;
        let written = writer.map(|handle| {
            handle
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")))
        });

        debug!(exit_code = ?output.status.code(), stdout_bytes = output.stdout.len(), "vault CLI finished");

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stdout));
            return Err(CommandFailure {
                exit_code: output.status.code(),
                output: text,
                command: rendered,
            }
            .into());
        }

        // Exit status decides the outcome once the process has exited.
        if let Some(Err(error)) = written {
            warn!(command = %rendered, error = %error, "stdin write failed after a successful command");
        }

        Ok(output.stdout)
    }
}
