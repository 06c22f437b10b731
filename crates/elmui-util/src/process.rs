use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::errors::ElmUiError;

/// Builder for constructing and executing external processes.
///
/// Provides a fluent API for setting the program, its arguments and the working directory.
pub struct CommandBuilder {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct Captured {
    pub success: bool,
    /// stdout followed by stderr, lossily decoded.
    pub text: String,
}

impl CommandBuilder {
    /// Create a new builder for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set the working directory for the child process.
    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Execute the command and return its output.
    pub fn exec(&self) -> Result<Output, ElmUiError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }
        tracing::debug!("running {} {}", self.program, self.args.join(" "));
        cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ElmUiError::Generic {
                    message: format!("Executable '{}' not found on PATH", self.program),
                }
            } else {
                ElmUiError::from(e)
            }
        })
    }

    /// Execute the command and merge stdout and stderr into one string.
    pub fn exec_captured(&self) -> Result<Captured, ElmUiError> {
        let output = self.exec()?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(Captured {
            success: output.status.success(),
            text,
        })
    }
}
