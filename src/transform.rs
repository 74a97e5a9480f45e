//! Text-level rewriting of the demo app sources between variants.
//!
//! The checked-in sources are the Vapor variant. Switching to Classic replaces
//! the entry file with a fixed `createApp` bootstrap and drops the `vapor`
//! attribute from the first `<script setup` tag of every component file. The
//! original bytes of every tracked file are captured once into a [`Snapshot`]
//! and written back by [`restore`].

use regex::bytes::Regex;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{BenchError, Result};
use crate::Variant;

/// Entry file contents for the Classic variant.
pub const CLASSIC_ENTRY: &str = "\
import { createApp } from 'vue'
import App from './App.vue'

createApp(App).mount('#app')
";

/// Fixed set of files the transform touches, relative to the project root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackedFiles {
    pub entry: PathBuf,
    pub components: Vec<PathBuf>,
}

impl Default for TrackedFiles {
    fn default() -> Self {
        Self {
            entry: PathBuf::from("src/main.ts"),
            components: [
                "src/App.vue",
                "src/components/Counter.vue",
                "src/components/TodoList.vue",
                "src/components/TodoItem.vue",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Entry,
    Component,
}

#[derive(Clone, Debug)]
struct CapturedFile {
    path: PathBuf,
    role: Role,
    original: Vec<u8>,
    digest: [u8; 32],
}

/// Original contents of every tracked file, captured before any rewrite.
#[derive(Clone, Debug)]
pub struct Snapshot {
    files: Vec<CapturedFile>,
}

fn sha256(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

fn read_tracked(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| BenchError::TrackedFile {
        path: path.to_path_buf(),
        source,
    })
}

fn write_tracked(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|source| BenchError::TrackedFile {
        path: path.to_path_buf(),
        source,
    })
}

impl Snapshot {
    pub fn capture(root: &Path, tracked: &TrackedFiles) -> Result<Self> {
        let roles = std::iter::once((&tracked.entry, Role::Entry))
            .chain(tracked.components.iter().map(|p| (p, Role::Component)));

        let mut files = Vec::new();
        for (rel, role) in roles {
            let path = root.join(rel);
            let original = read_tracked(&path)?;
            debug!(path = %path.display(), bytes = original.len(), "captured tracked file");
            files.push(CapturedFile {
                digest: sha256(&original),
                path,
                role,
                original,
            });
        }
        Ok(Self { files })
    }

    #[cfg(test)]
    fn original(&self, path: &Path) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.original.as_slice())
    }

    /// Tracked files whose on-disk bytes no longer match the capture.
    pub fn verify(&self) -> Result<Vec<PathBuf>> {
        let mut changed = Vec::new();
        for f in &self.files {
            if sha256(&read_tracked(&f.path)?) != f.digest {
                changed.push(f.path.clone());
            }
        }
        Ok(changed)
    }
}

/// Rewrite every tracked file into `variant`'s form.
pub fn apply_variant(snapshot: &Snapshot, variant: Variant) -> Result<()> {
    match variant {
        Variant::Vapor => restore(snapshot),
        Variant::Classic => {
            for f in &snapshot.files {
                let contents: Cow<'_, [u8]> = match f.role {
                    Role::Entry => Cow::Borrowed(CLASSIC_ENTRY.as_bytes()),
                    Role::Component => strip_marker_attribute(&f.original),
                };
                write_tracked(&f.path, &contents)?;
            }
            debug!(files = snapshot.files.len(), "applied classic variant");
            Ok(())
        }
    }
}

/// Write back the captured bytes of every tracked file, changed or not.
pub fn restore(snapshot: &Snapshot) -> Result<()> {
    for f in &snapshot.files {
        write_tracked(&f.path, &f.original)?;
    }
    debug!(files = snapshot.files.len(), "restored tracked files");
    Ok(())
}

fn script_setup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<script setup(?:\s[^>]*)?>").expect("tag pattern is valid"))
}

fn vapor_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+vapor([\s/>])").expect("attribute pattern is valid"))
}

/// Remove one `vapor` attribute from the first `<script setup ...>` tag.
/// Input without that tag, or whose tag lacks the attribute, comes back borrowed.
pub fn strip_marker_attribute(source: &[u8]) -> Cow<'_, [u8]> {
    let Some(tag) = script_setup_re().find(source) else {
        return Cow::Borrowed(source);
    };
    let rewritten = vapor_attr_re().replacen(tag.as_bytes(), 1, &b"$1"[..]);
    let Cow::Owned(new_tag) = rewritten else {
        return Cow::Borrowed(source);
    };

    let mut out = Vec::with_capacity(source.len());
    out.extend_from_slice(&source[..tag.start()]);
    out.extend_from_slice(&new_tag);
    out.extend_from_slice(&source[tag.end()..]);
    Cow::Owned(out)
}
