use serde::{Deserialize, Serialize};

/// Kind of run. Inspect runs are never persisted to history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Benchmark,
    Inspect,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Benchmark => "benchmark",
            Mode::Inspect => "inspect",
        }
    }
}

/// Aggregate size of one build output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizePair {
    pub raw: u64,
    pub gzipped: u64,
}

impl SizePair {
    /// raw / gzipped, `None` when nothing was compressed.
    pub fn compression_ratio(&self) -> Option<f64> {
        if self.gzipped == 0 {
            None
        } else {
            Some(self.raw as f64 / self.gzipped as f64)
        }
    }
}

/// Vapor minus Classic; negative means Vapor is smaller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeDelta {
    pub raw: i64,
    pub gzipped: i64,
}

impl SizeDelta {
    pub fn between(vapor: SizePair, classic: SizePair) -> Self {
        Self {
            raw: vapor.raw as i64 - classic.raw as i64,
            gzipped: vapor.gzipped as i64 - classic.gzipped as i64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkEntry {
    pub timestamp: String,
    pub mode: Mode,
    pub vapor: SizePair,
    pub classic: SizePair,
    pub delta: SizeDelta,
    pub subject_version: String,
}

impl BenchmarkEntry {
    /// Build an entry stamped with the current UTC time.
    pub fn new(mode: Mode, vapor: SizePair, classic: SizePair, subject_version: String) -> Self {
        Self {
            timestamp: now_utc_rfc3339(),
            mode,
            vapor,
            classic,
            delta: SizeDelta::between(vapor, classic),
            subject_version,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkHistory {
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkEntry>,
}

impl BenchmarkHistory {
    pub fn contains_version(&self, version: &str) -> bool {
        self.benchmarks.iter().any(|e| e.subject_version == version)
    }
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2025-07-01T12:00:00.000Z`.
pub fn now_utc_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
