//! External tool invocation
//!
//! The GLSL minifier, the JS compressor and the archiver are separate programs.
//! They run synchronously; a missing program or an abnormal exit aborts the build.

use crate::error::{PackError, Result};
use serde::{Deserialize, Deserializer};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// A program plus the leading arguments it is always invoked with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Locates the program on `PATH`, or relative to `cwd` when it contains a path separator
    pub fn resolve(&self, cwd: &Path) -> Result<PathBuf> {
        which::which_in(&self.program, std::env::var_os("PATH"), cwd).map_err(|e| PackError::ToolUnavailable {
            tool: self.program.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, e),
        })
    }

    /// Runs the tool to completion in `cwd` with `extra` appended to the configured arguments
    ///
    /// # Errors
    /// `ToolUnavailable` if the program cannot be found or spawned, `ToolFailed` if it exits
    /// with a non-zero status.
    pub fn run<I, S>(&self, cwd: &Path, extra: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = self.resolve(cwd)?;
        let output = Command::new(&program)
            .args(&self.args)
            .args(extra)
            .current_dir(cwd)
            .output()
            .map_err(|source| PackError::ToolUnavailable { tool: self.program.clone(), source })?;

        if !output.status.success() {
            return Err(PackError::ToolFailed {
                tool: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }
}

impl<'de> Deserialize<'de> for ToolCommand {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut parts = Vec::<String>::deserialize(deserializer)?.into_iter();
        let program = parts.next().ok_or_else(|| serde::de::Error::custom("tool command cannot be empty"))?;
        Ok(Self { program, args: parts.collect() })
    }
}
