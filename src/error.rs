//! Error types and exit codes for vapor-size-bench

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("tracked file {path}: {source}")]
    TrackedFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("build command `{command}` exited with {status}")]
    Build { command: String, status: String },

    #[error("install of {package}@{version} failed: {message}")]
    Install {
        package: String,
        version: String,
        message: String,
    },

    #[error("registry query for {package} failed: {message}")]
    Registry { package: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Process exit code for a fatal error:
    /// - 1: I/O or tracked file failure
    /// - 2: build tool failure
    /// - 3: package manager / registry failure
    /// - 4: serialization failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::TrackedFile { .. } | Self::Io(_) => ExitCode::from(1),
            Self::Spawn { .. } | Self::Build { .. } => ExitCode::from(2),
            Self::Install { .. } | Self::Registry { .. } => ExitCode::from(3),
            Self::Json(_) => ExitCode::from(4),
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
