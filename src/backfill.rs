//! Replays the benchmark for every published release missing from history.

use serde::Deserialize;
use std::path::PathBuf;
use std::process::Command;
use tracing::{info, warn};

use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::history::HistoryStore;
use crate::schema::{BenchmarkEntry, BenchmarkHistory};
use crate::version;

/// Read-only listing of published versions.
pub trait Registry {
    fn versions(&self, package: &str) -> Result<Vec<String>>;
}

/// Makes one exact version the active dependency.
pub trait Installer {
    fn install(&self, package: &str, version: &str) -> Result<()>;
}

/// `npm view <package> versions --json`.
#[derive(Clone, Debug)]
pub struct NpmRegistry {
    program: String,
    root: PathBuf,
}

impl NpmRegistry {
    pub fn new(cfg: &BenchConfig) -> Self {
        Self {
            program: cfg.package_manager.clone(),
            root: cfg.project_root.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionList {
    Many(Vec<String>),
    One(String),
}

/// npm prints a bare string instead of an array when only one version exists.
pub fn parse_versions_json(text: &str) -> Result<Vec<String>> {
    Ok(match serde_json::from_str::<VersionList>(text)? {
        VersionList::Many(v) => v,
        VersionList::One(v) => vec![v],
    })
}

impl Registry for NpmRegistry {
    fn versions(&self, package: &str) -> Result<Vec<String>> {
        let output = Command::new(&self.program)
            .args(["view", package, "versions", "--json"])
            .current_dir(&self.root)
            .output()
            .map_err(|e| BenchError::Registry {
                package: package.to_string(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(BenchError::Registry {
                package: package.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        parse_versions_json(&String::from_utf8_lossy(&output.stdout))
    }
}

/// `npm install <package>@<version> --save-exact`.
#[derive(Clone, Debug)]
pub struct NpmInstaller {
    program: String,
    root: PathBuf,
}

impl NpmInstaller {
    pub fn new(cfg: &BenchConfig) -> Self {
        Self {
            program: cfg.package_manager.clone(),
            root: cfg.project_root.clone(),
        }
    }
}

impl Installer for NpmInstaller {
    fn install(&self, package: &str, version: &str) -> Result<()> {
        let target = format!("{package}@{version}");
        info!(%target, "installing");
        let status = Command::new(&self.program)
            .args(["install", target.as_str(), "--save-exact"])
            .current_dir(&self.root)
            .status();
        let failure = match status {
            Ok(s) if s.success() => return Ok(()),
            Ok(s) => s.to_string(),
            Err(e) => e.to_string(),
        };
        Err(BenchError::Install {
            package: package.to_string(),
            version: version.to_string(),
            message: failure,
        })
    }
}

/// Published versions starting with `prefix`, ascending.
pub fn discover_candidates<R: Registry + ?Sized>(
    registry: &R,
    package: &str,
    prefix: &str,
) -> Result<Vec<String>> {
    let mut candidates: Vec<String> = registry
        .versions(package)?
        .into_iter()
        .filter(|v| v.starts_with(prefix))
        .collect();
    version::sort_versions(&mut candidates);
    Ok(candidates)
}

/// Candidates without a history entry, keeping candidate order.
pub fn missing_versions(candidates: &[String], history: &BenchmarkHistory) -> Vec<String> {
    candidates
        .iter()
        .filter(|v| !history.contains_version(v))
        .cloned()
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    pub succeeded: Vec<String>,
    /// `(version, reason)` for each version that could not be benchmarked.
    pub failed: Vec<(String, String)>,
}

impl BackfillSummary {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Benchmark every candidate release that history does not know yet.
///
/// `run` performs one benchmark against whatever version is installed. A failed
/// install or run for one version is recorded and skipped. Once all versions
/// are processed the latest candidate is reinstalled; that last install is fatal
/// on failure.
pub fn backfill<R, I, F>(
    cfg: &BenchConfig,
    registry: &R,
    installer: &I,
    mut run: F,
) -> Result<BackfillSummary>
where
    R: Registry + ?Sized,
    I: Installer + ?Sized,
    F: FnMut(&str) -> Result<BenchmarkEntry>,
{
    let candidates = discover_candidates(registry, &cfg.package, &cfg.prerelease_prefix)?;
    let Some(latest) = candidates.last().cloned() else {
        info!(prefix = %cfg.prerelease_prefix, "no published versions match");
        return Ok(BackfillSummary::default());
    };

    let history = HistoryStore::new(cfg.history_path()).read();
    let missing = missing_versions(&candidates, &history);
    info!(
        candidates = candidates.len(),
        recorded = history.benchmarks.len(),
        missing = missing.len(),
        "backfill plan"
    );
    if missing.is_empty() {
        info!("history is up to date");
        return Ok(BackfillSummary::default());
    }

    let mut summary = BackfillSummary::default();
    for (i, version) in missing.iter().enumerate() {
        info!(%version, step = i + 1, of = missing.len(), "benchmarking");

        if let Err(e) = installer.install(&cfg.package, version) {
            warn!(%version, error = %e, "install failed, skipping");
            summary.failed.push((version.clone(), e.to_string()));
            continue;
        }

        match run(version) {
            Ok(entry) => {
                if entry.subject_version != *version {
                    warn!(
                        %version,
                        recorded = %entry.subject_version,
                        "benchmark recorded a different version than installed"
                    );
                }
                summary.succeeded.push(version.clone());
            }
            Err(e) => {
                warn!(%version, error = %e, "benchmark failed, skipping");
                summary.failed.push((version.clone(), e.to_string()));
            }
        }
    }

    info!(%latest, "restoring latest version");
    installer.install(&cfg.package, &latest)?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SizePair;
    use crate::Mode;
    use std::cell::RefCell;
    use tempfile::tempdir;

    struct FakeRegistry(Vec<&'static str>);

    impl Registry for FakeRegistry {
        fn versions(&self, _package: &str) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    #[derive(Default)]
    struct FakeInstaller {
        installed: RefCell<Vec<String>>,
        broken: Option<&'static str>,
    }

    impl Installer for FakeInstaller {
        fn install(&self, package: &str, version: &str) -> Result<()> {
            if self.broken == Some(version) {
                return Err(BenchError::Install {
                    package: package.to_string(),
                    version: version.to_string(),
                    message: "exit status: 1".to_string(),
                });
            }
            self.installed.borrow_mut().push(version.to_string());
            Ok(())
        }
    }

    fn entry(version: &str) -> BenchmarkEntry {
        BenchmarkEntry::new(
            Mode::Benchmark,
            SizePair { raw: 58_000, gzipped: 21_000 },
            SizePair { raw: 65_000, gzipped: 26_000 },
            version.to_string(),
        )
    }

    #[test]
    fn parses_npm_output() {
        assert_eq!(
            parse_versions_json(r#"["3.5.0", "3.6.0-alpha.1"]"#).unwrap(),
            vec!["3.5.0", "3.6.0-alpha.1"]
        );
        assert_eq!(parse_versions_json(r#""3.6.0-alpha.1""#).unwrap(), vec!["3.6.0-alpha.1"]);
        assert!(parse_versions_json("npm ERR!").is_err());
    }

    #[test]
    fn candidates_are_filtered_and_sorted() {
        let registry = FakeRegistry(vec![
            "3.5.17",
            "3.6.0-alpha.10",
            "3.6.0-alpha.2",
            "3.6.0-beta.1",
            "3.6.0-alpha.1",
        ]);
        let found = discover_candidates(&registry, "vue", "3.6.0-alpha.").unwrap();
        assert_eq!(found, vec!["3.6.0-alpha.1", "3.6.0-alpha.2", "3.6.0-alpha.10"]);
    }

    #[test]
    fn replays_missing_versions_and_tallies() {
        let dir = tempdir().unwrap();
        let cfg = BenchConfig::new(dir.path());
        let store = HistoryStore::new(cfg.history_path());
        store.write(entry("3.6.0-alpha.1")).unwrap();

        let registry = FakeRegistry(vec![
            "3.6.0-alpha.3",
            "3.6.0-alpha.1",
            "3.6.0-alpha.2",
            "3.6.0-alpha.4",
        ]);
        let installer = FakeInstaller {
            broken: Some("3.6.0-alpha.2"),
            ..Default::default()
        };

        let mut ran = Vec::new();
        let summary = backfill(&cfg, &registry, &installer, |v| {
            ran.push(v.to_string());
            if v == "3.6.0-alpha.3" {
                return Err(BenchError::Build {
                    command: "node scripts/build.mjs".to_string(),
                    status: "exit status: 1".to_string(),
                });
            }
            store.write(entry(v))?;
            Ok(entry(v))
        })
        .unwrap();

        assert_eq!(ran, vec!["3.6.0-alpha.3", "3.6.0-alpha.4"]);
        assert_eq!(summary.succeeded, vec!["3.6.0-alpha.4"]);
        let failed: Vec<&str> = summary.failed.iter().map(|(v, _)| v.as_str()).collect();
        assert_eq!(failed, vec!["3.6.0-alpha.2", "3.6.0-alpha.3"]);
        assert_eq!(summary.attempted(), 3);

        // Latest candidate is reinstalled last.
        assert_eq!(
            *installer.installed.borrow(),
            vec!["3.6.0-alpha.3", "3.6.0-alpha.4", "3.6.0-alpha.4"]
        );
        let recorded: Vec<String> = store
            .read()
            .benchmarks
            .into_iter()
            .map(|e| e.subject_version)
            .collect();
        assert_eq!(recorded, vec!["3.6.0-alpha.1", "3.6.0-alpha.4"]);
    }

    #[test]
    fn up_to_date_history_does_nothing() {
        let dir = tempdir().unwrap();
        let cfg = BenchConfig::new(dir.path());
        HistoryStore::new(cfg.history_path())
            .write(entry("3.6.0-alpha.1"))
            .unwrap();

        let registry = FakeRegistry(vec!["3.6.0-alpha.1"]);
        let installer = FakeInstaller::default();
        let summary = backfill(&cfg, &registry, &installer, |_| panic!("nothing to run")).unwrap();

        assert_eq!(summary, BackfillSummary::default());
        assert!(installer.installed.borrow().is_empty());
    }

    #[test]
    fn final_reinstall_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let cfg = BenchConfig::new(dir.path());
        let registry = FakeRegistry(vec!["3.6.0-alpha.1", "3.6.0-alpha.2"]);
        let installer = FakeInstaller {
            broken: Some("3.6.0-alpha.2"),
            ..Default::default()
        };
        let err = backfill(&cfg, &registry, &installer, |v| Ok(entry(v))).unwrap_err();
        assert!(matches!(err, BenchError::Install { .. }), "{err}");
    }
}
