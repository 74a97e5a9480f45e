//! Aggregate byte sizes of a build output tree.
//!
//! Compressed size is the sum of each file gzipped on its own at the default
//! level, not one stream over the concatenated tree. Recorded history depends
//! on this, so keep it that way.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::schema::SizePair;

fn collect_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in walkdir::WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            out.push(entry.path().to_path_buf());
        }
    }
    out.sort();
    Ok(out)
}

fn gzip_len(bytes: &[u8]) -> io::Result<u64> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(bytes)?;
    Ok(enc.finish()?.len() as u64)
}

/// Sum of file lengths under `dir`.
pub fn raw_size(dir: &Path) -> io::Result<u64> {
    let mut total = 0;
    for f in collect_files(dir)? {
        total += fs::metadata(&f)?.len();
    }
    Ok(total)
}

/// Sum of independently gzipped file lengths under `dir`.
pub fn compressed_size(dir: &Path) -> io::Result<u64> {
    let mut total = 0;
    for f in collect_files(dir)? {
        total += gzip_len(&fs::read(&f)?)?;
    }
    Ok(total)
}

/// Both sizes in a single walk.
pub fn measure_dir(dir: &Path) -> io::Result<SizePair> {
    let mut sizes = SizePair::default();
    for f in collect_files(dir)? {
        let bytes = fs::read(&f)?;
        sizes.raw += bytes.len() as u64;
        sizes.gzipped += gzip_len(&bytes)?;
    }
    Ok(sizes)
}
