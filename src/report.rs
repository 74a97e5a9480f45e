//! Plain-text size report: the current run plus a short trend table.

use std::fmt::{self, Write};

use crate::schema::{BenchmarkEntry, BenchmarkHistory, SizePair};
use crate::Mode;

/// Number of history rows shown.
pub const HISTORY_WINDOW: usize = 10;

/// Vapor gzipped change (bytes) that counts as a real movement.
pub const TREND_THRESHOLD_BYTES: i64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    Improving,
    Regressing,
    Stable,
}

impl Trend {
    pub fn label(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Regressing => "regressing",
            Trend::Stable => "stable",
        }
    }
}

/// Trend of `newer` relative to `older`, by Vapor gzipped size.
pub fn trend(newer: &BenchmarkEntry, older: &BenchmarkEntry) -> Trend {
    let change = newer.vapor.gzipped as i64 - older.vapor.gzipped as i64;
    if change < -TREND_THRESHOLD_BYTES {
        Trend::Improving
    } else if change > TREND_THRESHOLD_BYTES {
        Trend::Regressing
    } else {
        Trend::Stable
    }
}

fn kb(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

/// Signed delta with a direction label: `+1.2 KB (Vapor larger)`,
/// `4.9 KB (Vapor smaller)` or `0 KB (equal)`.
pub fn format_delta(delta: i64) -> String {
    match delta {
        0 => "0 KB (equal)".to_string(),
        d if d > 0 => format!("+{} (Vapor larger)", kb(d as u64)),
        d => format!("{} (Vapor smaller)", kb(d.unsigned_abs())),
    }
}

fn ratio(sizes: &SizePair) -> String {
    match sizes.compression_ratio() {
        Some(r) => format!("{r:.2}x"),
        None => "n/a".to_string(),
    }
}

fn date_of(timestamp: &str) -> &str {
    timestamp.get(..10).unwrap_or(timestamp)
}

/// Render `current` and, for benchmark runs, the most recent benchmark entries
/// of `history`, newest first.
pub fn render(current: &BenchmarkEntry, history: &BenchmarkHistory) -> String {
    let mut out = String::new();
    write_report(&mut out, current, history).expect("writing to a String cannot fail");
    out
}

/// Write the report for `current` into `out`.
///
/// Trends compare each row with the next older row in the displayed window, so
/// the last row never has one even when older history exists.
pub fn write_report<W: Write>(
    out: &mut W,
    current: &BenchmarkEntry,
    history: &BenchmarkHistory,
) -> fmt::Result {
    writeln!(out, "Vapor vs Classic bundle size")?;
    writeln!(out, "============================")?;
    writeln!(out)?;
    writeln!(out, "Subject version: {}", current.subject_version)?;
    writeln!(out, "Mode:            {}", current.mode.as_str())?;
    writeln!(out, "Timestamp:       {}", current.timestamp)?;
    writeln!(out)?;

    writeln!(out, "Current run")?;
    writeln!(out, "-----------")?;
    for (name, sizes) in [("Vapor", &current.vapor), ("Classic", &current.classic)] {
        writeln!(
            out,
            "{:<8} raw {:>10} | gzip {:>10} | ratio {}",
            format!("{name}:"),
            kb(sizes.raw),
            kb(sizes.gzipped),
            ratio(sizes)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Delta (raw):  {}", format_delta(current.delta.raw))?;
    writeln!(out, "Delta (gzip): {}", format_delta(current.delta.gzipped))?;

    if current.mode == Mode::Inspect {
        writeln!(out)?;
        return writeln!(out, "Inspect build: not recorded in history.");
    }

    let recent: Vec<&BenchmarkEntry> = history
        .benchmarks
        .iter()
        .filter(|e| e.mode == Mode::Benchmark)
        .rev()
        .take(HISTORY_WINDOW)
        .collect();

    writeln!(out)?;
    writeln!(out, "History (newest first)")?;
    writeln!(out, "----------------------")?;
    if recent.is_empty() {
        return writeln!(out, "No benchmark history yet.");
    }

    writeln!(
        out,
        "{:<18} {:<10} {:>10} {:>12} {:<24} {}",
        "Version", "Date", "Vapor gz", "Classic gz", "Delta gz", "Trend"
    )?;
    for (i, entry) in recent.iter().enumerate() {
        let trend_label = recent
            .get(i + 1)
            .map(|older| trend(entry, older).label())
            .unwrap_or("-");
        writeln!(
            out,
            "{:<18} {:<10} {:>10} {:>12} {:<24} {}",
            entry.subject_version,
            date_of(&entry.timestamp),
            kb(entry.vapor.gzipped),
            kb(entry.classic.gzipped),
            format_delta(entry.delta.gzipped),
            trend_label
        )?;
    }
    Ok(())
}
