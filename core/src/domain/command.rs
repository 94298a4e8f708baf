//! External command invocation models.

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

/// A program plus its structured argument list.
///
/// Arguments are passed to the OS verbatim; nothing is interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends a path argument.
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    /// Appends an argument only when `condition` holds.
    pub fn arg_if(self, condition: bool, arg: impl Into<String>) -> Self {
        if condition {
            self.arg(arg)
        } else {
            self
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> impl Iterator<Item = &OsStr> {
        self.args.iter().map(OsStr::new)
    }

    /// True if `argv`, the argument vector of a running process, is an
    /// invocation of this command.
    ///
    /// The program matches by file name, so `/usr/local/bin/minikube` and a
    /// bare `minikube` are the same program. Every argument must follow it
    /// in order.
    pub fn matches_argv<S: AsRef<str>>(&self, argv: &[S]) -> bool {
        let program = file_name(&self.program);
        let Some(start) = argv.iter().position(|arg| file_name(arg.as_ref()) == program) else {
            return false;
        };

        let rest = &argv[start + 1..];
        rest.len() >= self.args.len()
            && rest.iter().zip(&self.args).all(|(actual, expected)| actual.as_ref() == expected)
    }
}

fn file_name(program: &str) -> &str {
    Path::new(program)
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or(program)
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a single invocation is run and judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Buffer stdout/stderr instead of streaming them to the terminal.
    pub capture: bool,
    /// Turn a non-zero exit into `Error::CommandFailed`.
    pub must_succeed: bool,
}

impl RunOptions {
    /// Streamed output, non-zero exit is an error.
    pub const fn checked() -> Self {
        Self {
            capture: false,
            must_succeed: true,
        }
    }

    /// Streamed output, non-zero exit is reported but not raised.
    pub const fn unchecked() -> Self {
        Self {
            capture: false,
            must_succeed: false,
        }
    }

    /// Captured output, non-zero exit is reported but not raised.
    pub const fn captured() -> Self {
        Self {
            capture: true,
            must_succeed: false,
        }
    }
}

/// Outcome of one external invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output (empty when streamed).
    pub stdout: String,
    /// Captured standard error (empty when streamed).
    pub stderr: String,
}

impl CommandResult {
    /// A streamed run that exited with the given code.
    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    /// A captured run that exited with the given code and output.
    pub fn captured(code: Option<i32>, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
