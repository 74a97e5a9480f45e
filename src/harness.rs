//! One benchmark run: build both variants, measure, record, report.
//!
//! Tracked sources are put back and a clean ship build is redone on every exit
//! path, including build or measurement failures and panics.

use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

use crate::build::{BuildDriver, BuildMode};
use crate::config::BenchConfig;
use crate::error::Result;
use crate::history::HistoryStore;
use crate::measure;
use crate::report;
use crate::schema::{BenchmarkEntry, BenchmarkHistory, SizePair};
use crate::transform::{self, Snapshot};
use crate::{Mode, Variant};

/// Version label used when the installed subject library cannot be read.
pub const UNKNOWN_VERSION: &str = "unknown";

#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub entry: BenchmarkEntry,
    /// History as of the end of the run (includes `entry` for benchmark runs).
    pub history: BenchmarkHistory,
    pub report: String,
}

/// Restores tracked files and rebuilds unless disarmed by [`RestoreGuard::finish`].
struct RestoreGuard<'a> {
    snapshot: &'a Snapshot,
    driver: &'a BuildDriver,
    armed: bool,
}

impl<'a> RestoreGuard<'a> {
    fn new(snapshot: &'a Snapshot, driver: &'a BuildDriver) -> Self {
        Self {
            snapshot,
            driver,
            armed: true,
        }
    }

    /// Success path: restore and rebuild, propagating failures.
    fn finish(mut self) -> Result<()> {
        self.armed = false;
        restore_and_rebuild(self.snapshot, self.driver)
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("run aborted, restoring tracked files");
        if let Err(e) = restore_and_rebuild(self.snapshot, self.driver) {
            error!(error = %e, "cleanup after aborted run failed");
        }
    }
}

fn restore_and_rebuild(snapshot: &Snapshot, driver: &BuildDriver) -> Result<()> {
    transform::restore(snapshot)?;
    for path in snapshot.verify()? {
        warn!(path = %path.display(), "tracked file differs from snapshot after restore");
    }
    driver.clean()?;
    driver.build(BuildMode::Ship)
}

fn build_variant(
    snapshot: &Snapshot,
    driver: &BuildDriver,
    variant: Variant,
    mode: BuildMode,
) -> Result<SizePair> {
    info!(variant = variant.as_str(), "preparing variant");
    transform::apply_variant(snapshot, variant)?;
    driver.clean()?;
    driver.build(mode)?;
    let artifact = driver.capture(variant.as_str())?;
    let sizes = measure::measure_dir(&artifact)?;
    info!(
        variant = variant.as_str(),
        raw = sizes.raw,
        gzipped = sizes.gzipped,
        "measured"
    );
    Ok(sizes)
}

/// Version of the installed subject library, or [`UNKNOWN_VERSION`].
pub fn subject_version(cfg: &BenchConfig) -> String {
    let path = cfg.subject_manifest_path();
    let version = fs::read_to_string(&path)
        .ok()
        .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
        .and_then(|manifest| manifest.get("version")?.as_str().map(str::to_string));
    match version {
        Some(v) => v,
        None => {
            warn!(path = %path.display(), "could not read subject version");
            UNKNOWN_VERSION.to_string()
        }
    }
}

fn write_report(path: &Path, report: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, report)?;
    Ok(())
}

/// Run both variant builds and record the result.
///
/// Benchmark-mode entries are written to history; inspect-mode entries only
/// reach the report.
pub fn run_benchmark(cfg: &BenchConfig, mode: Mode) -> Result<RunOutcome> {
    let snapshot = Snapshot::capture(&cfg.project_root, &cfg.tracked)?;
    let driver = BuildDriver::new(cfg);
    let build_mode = BuildMode::from(mode);

    let guard = RestoreGuard::new(&snapshot, &driver);
    let vapor = build_variant(&snapshot, &driver, Variant::Vapor, build_mode)?;
    let classic = build_variant(&snapshot, &driver, Variant::Classic, build_mode)?;
    guard.finish()?;

    let entry = BenchmarkEntry::new(mode, vapor, classic, subject_version(cfg));
    let store = HistoryStore::new(cfg.history_path());
    let history = match mode {
        Mode::Benchmark => {
            let history = store.write(entry.clone())?;
            info!(
                path = %store.path().display(),
                entries = history.benchmarks.len(),
                "history updated"
            );
            history
        }
        Mode::Inspect => store.read(),
    };

    let report = report::render(&entry, &history);
    let report_path = cfg.report_path();
    write_report(&report_path, &report)?;
    info!(path = %report_path.display(), "report written");

    Ok(RunOutcome {
        entry,
        history,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use tempfile::tempdir;

    /// Vapor-form project whose build writes `dist/out.txt`.
    fn demo_project(root: &Path) -> BenchConfig {
        let mut cfg = BenchConfig::new(root);
        fs::create_dir_all(root.join("src/components")).unwrap();
        fs::write(root.join(&cfg.tracked.entry), "import { createVaporApp } from 'vue'\n").unwrap();
        for component in &cfg.tracked.components {
            fs::write(root.join(component), "<script setup vapor>\n</script>\n").unwrap();
        }
        cfg.build_program = "sh".to_string();
        cfg.build_args = vec![
            "-c".to_string(),
            "mkdir -p dist && cp src/main.ts dist/out.txt".to_string(),
        ];
        cfg
    }

    #[test]
    fn subject_version_from_manifest() {
        let dir = tempdir().unwrap();
        let cfg = BenchConfig::new(dir.path());
        let manifest = cfg.subject_manifest_path();
        fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        fs::write(&manifest, r#"{ "name": "vue", "version": "3.6.0-alpha.4" }"#).unwrap();
        assert_eq!(subject_version(&cfg), "3.6.0-alpha.4");
    }

    #[test]
    fn subject_version_falls_back_to_unknown() {
        let dir = tempdir().unwrap();
        let cfg = BenchConfig::new(dir.path());
        assert_eq!(subject_version(&cfg), UNKNOWN_VERSION);

        let manifest = cfg.subject_manifest_path();
        fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        fs::write(&manifest, r#"{ "name": "vue" }"#).unwrap();
        assert_eq!(subject_version(&cfg), UNKNOWN_VERSION);
    }

    #[cfg(unix)]
    #[test]
    fn dropped_guard_restores_and_rebuilds() {
        let dir = tempdir().unwrap();
        let cfg = demo_project(dir.path());
        let snapshot = Snapshot::capture(&cfg.project_root, &cfg.tracked).unwrap();
        let driver = BuildDriver::new(&cfg);

        let guard = RestoreGuard::new(&snapshot, &driver);
        transform::apply_variant(&snapshot, Variant::Classic).unwrap();
        assert!(!snapshot.verify().unwrap().is_empty());
        drop(guard);

        assert!(snapshot.verify().unwrap().is_empty());
        let rebuilt = fs::read_to_string(dir.path().join("dist/out.txt")).unwrap();
        assert!(rebuilt.contains("createVaporApp"));
    }

    #[cfg(unix)]
    #[test]
    fn panic_mid_run_restores_sources() {
        let dir = tempdir().unwrap();
        let cfg = demo_project(dir.path());
        let snapshot = Snapshot::capture(&cfg.project_root, &cfg.tracked).unwrap();
        let driver = BuildDriver::new(&cfg);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _guard = RestoreGuard::new(&snapshot, &driver);
            transform::apply_variant(&snapshot, Variant::Classic).unwrap();
            panic!("measurement blew up");
        }));
        assert!(result.is_err());
        assert!(snapshot.verify().unwrap().is_empty());
    }

    #[test]
    fn missing_tracked_files_fail_before_building() {
        let dir = tempdir().unwrap();
        let mut cfg = BenchConfig::new(dir.path());
        cfg.build_program = "definitely-not-a-build-tool-xyz".to_string();
        let err = run_benchmark(&cfg, Mode::Benchmark).unwrap_err();
        assert!(matches!(err, crate::error::BenchError::TrackedFile { .. }), "{err}");
    }
}
