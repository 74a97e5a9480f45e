//! Drives the external build tool.
//!
//! The tool writes into a fixed output directory; each variant's output is moved
//! aside under its own label before the next build starts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::config::BenchConfig;
use crate::error::{BenchError, Result};

/// Which build target to invoke.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BuildMode {
    /// Minified production bundle.
    #[default]
    Ship,
    /// Unminified, source-mapped, module-preserving output.
    Inspect,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Ship => "ship",
            BuildMode::Inspect => "inspect",
        }
    }
}

impl From<crate::Mode> for BuildMode {
    fn from(mode: crate::Mode) -> Self {
        match mode {
            crate::Mode::Benchmark => BuildMode::Ship,
            crate::Mode::Inspect => BuildMode::Inspect,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BuildDriver {
    cfg: BenchConfig,
    out_dir: PathBuf,
}

/// Remove a directory tree, treating "already gone" as success.
fn remove_dir_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl BuildDriver {
    pub fn new(cfg: &BenchConfig) -> Self {
        Self {
            cfg: cfg.clone(),
            out_dir: cfg.out_dir_path(),
        }
    }

    /// Arguments passed to the build program for `mode`.
    fn args(&self, mode: BuildMode) -> Vec<String> {
        let mut args = self.cfg.build_args.clone();
        if mode == BuildMode::Inspect {
            args.push("--inspect".to_string());
        }
        args
    }

    fn command_line(&self, args: &[String]) -> String {
        std::iter::once(self.cfg.build_program.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Remove the build output directory. Idempotent.
    pub fn clean(&self) -> Result<()> {
        remove_dir_if_present(&self.out_dir)?;
        debug!(dir = %self.out_dir.display(), "cleaned build output");
        Ok(())
    }

    /// Run the build tool to completion with inherited stdio.
    pub fn build(&self, mode: BuildMode) -> Result<()> {
        let args = self.args(mode);
        let command = self.command_line(&args);
        info!(mode = mode.as_str(), %command, "building");

        let status = Command::new(&self.cfg.build_program)
            .args(&args)
            .current_dir(&self.cfg.project_root)
            .status()
            .map_err(|source| BenchError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !status.success() {
            return Err(BenchError::Build {
                command,
                status: status.to_string(),
            });
        }
        Ok(())
    }

    /// Move the build output to the artifact directory for `label`, replacing
    /// whatever a previous run left there. Returns the artifact path.
    pub fn capture(&self, label: &str) -> Result<PathBuf> {
        let dest = self.cfg.artifact_dir(label);
        remove_dir_if_present(&dest)?;
        fs::rename(&self.out_dir, &dest)?;
        debug!(from = %self.out_dir.display(), to = %dest.display(), "captured build output");
        Ok(dest)
    }
}
