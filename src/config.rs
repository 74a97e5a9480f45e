use std::path::{Path, PathBuf};

use crate::transform::TrackedFiles;

/// Paths and external commands for one benchmark workspace.
///
/// All relative paths resolve against `project_root`.
#[derive(Clone, Debug)]
pub struct BenchConfig {
    pub project_root: PathBuf,
    /// Persisted `{ "benchmarks": [...] }` file.
    pub history_file: PathBuf,
    /// Regenerated on every run.
    pub report_file: PathBuf,
    /// Where the build tool writes its output. Captured artifacts land in
    /// `<out_dir>-<label>`.
    pub out_dir: PathBuf,
    pub tracked: TrackedFiles,
    pub build_program: String,
    pub build_args: Vec<String>,
    /// Subject library package name.
    pub package: String,
    /// Release family considered by backfill.
    pub prerelease_prefix: String,
    pub package_manager: String,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            history_file: PathBuf::from("bench/history.json"),
            report_file: PathBuf::from("bench/report.md"),
            out_dir: PathBuf::from("dist"),
            tracked: TrackedFiles::default(),
            build_program: "node".to_string(),
            build_args: vec!["scripts/build.mjs".to_string()],
            package: "vue".to_string(),
            prerelease_prefix: "3.6.0-alpha.".to_string(),
            package_manager: "npm".to_string(),
        }
    }
}

impl BenchConfig {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.resolve(&self.history_file)
    }

    pub fn report_path(&self) -> PathBuf {
        self.resolve(&self.report_file)
    }

    pub fn out_dir_path(&self) -> PathBuf {
        self.resolve(&self.out_dir)
    }

    pub fn artifact_dir(&self, label: &str) -> PathBuf {
        let mut name = self.out_dir.as_os_str().to_os_string();
        name.push("-");
        name.push(label);
        self.resolve(Path::new(&name))
    }

    /// `package.json` of the installed subject library.
    pub fn subject_manifest_path(&self) -> PathBuf {
        self.project_root
            .join("node_modules")
            .join(&self.package)
            .join("package.json")
    }
}
