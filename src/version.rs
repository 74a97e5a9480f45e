//! Ordering of subject-library release strings.
//!
//! Accepts `MAJOR.MINOR.PATCH` optionally followed by `-alpha.N`, `-beta.N` or
//! `-rc.N`. Anything else parses to the zero sentinel `0.0.0` (stable, number 0),
//! so malformed strings compare equal to each other instead of failing a run.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Prerelease tier. Declaration order is the ranking: a stable release outranks
/// every prerelease of the same `MAJOR.MINOR.PATCH`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrereleaseTier {
    Alpha,
    Beta,
    Rc,
    #[default]
    Stable,
}

impl PrereleaseTier {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "alpha" => Some(Self::Alpha),
            "beta" => Some(Self::Beta),
            "rc" => Some(Self::Rc),
            _ => None,
        }
    }
}

/// Field order matters: the derived `Ord` compares major, minor, patch, tier,
/// then prerelease number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParsedVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub tier: PrereleaseTier,
    pub prerelease_num: u64,
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-(alpha|beta|rc)\.(\d+))?$")
            .expect("version pattern is valid")
    })
}

/// Parse a version string, degrading to the zero sentinel on mismatch.
pub fn parse(version: &str) -> ParsedVersion {
    try_parse(version).unwrap_or_default()
}

fn try_parse(version: &str) -> Option<ParsedVersion> {
    let caps = version_re().captures(version.trim())?;
    let num = |i: usize| -> Option<u64> { caps.get(i)?.as_str().parse().ok() };

    let (tier, prerelease_num) = match caps.get(4) {
        Some(tag) => (PrereleaseTier::from_tag(tag.as_str())?, num(5)?),
        None => (PrereleaseTier::Stable, 0),
    };

    Some(ParsedVersion {
        major: num(1)?,
        minor: num(2)?,
        patch: num(3)?,
        tier,
        prerelease_num,
    })
}

/// Total order over version strings.
pub fn compare(a: &str, b: &str) -> Ordering {
    parse(a).cmp(&parse(b))
}

/// Sort version strings ascending in place.
pub fn sort_versions<S: AsRef<str>>(versions: &mut [S]) {
    versions.sort_by(|a, b| compare(a.as_ref(), b.as_ref()));
}
