//! Launch description for one supervised process.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use narada_core::ProcessKind;
use tokio::process::Command;

/// How a process's stdout is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Decode line records and publish them as events.
    #[default]
    Protocol,
    /// Accumulate raw text and hand it back in the exit report.
    Capture,
}

/// Everything needed to spawn a [`ProcessKind`].
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub kind: ProcessKind,
    /// Executable path, or a bare command name looked up on `PATH`.
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Variables added on top of the inherited environment.
    pub env: Vec<(String, String)>,
    pub output: OutputMode,
}

impl LaunchSpec {
    pub fn new(kind: ProcessKind, program: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
            output: OutputMode::Protocol,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub const fn output(mut self, mode: OutputMode) -> Self {
        self.output = mode;
        self
    }

    /// Whether `program` is a bare name rather than a path.
    pub fn is_bare_command(&self) -> bool {
        self.program.components().count() == 1 && !self.program.is_absolute()
    }

    /// Build the command for an already-resolved executable.
    pub(crate) fn command(&self, executable: &Path) -> Command {
        let mut cmd = Command::new(executable);
        cmd.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}
