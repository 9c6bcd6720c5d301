//! Utility functions for path naming and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Label sanitisation into safe path segments
//! - Filename length fitting for the archive file system
//! - Temp-file naming for atomic writes
//! - File system validation for the archive root

use std::borrow::Cow;
use std::error::Error;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Longest allowed final path component, in bytes.
///
/// ext4 allows 255; the rest is headroom for the `_tmp` suffix.
pub const MAX_LEAF_BYTES: usize = 240;

const UNSAFE_CHARS: [char; 8] = ['*', '+', '?', ':', '"', '\'', '|', '/'];

/// Turn an arbitrary label into a safe path segment.
///
/// Leading and trailing whitespace is stripped, all remaining whitespace
/// (spaces, tabs, newlines) is removed, and each character of
/// `* + ? : " ' | /` becomes `_`.
///
/// Never fails. May return an empty string, in which case the caller picks a
/// fallback label.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(sanitize(" 議程 / 附件: A "), "議程_附件_A");
/// ```
pub fn sanitize(label: &str) -> String {
    label
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// [`sanitize`], or `fallback` when nothing is left.
pub fn sanitize_or(label: &str, fallback: &str) -> String {
    let cleaned = sanitize(label);
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Split a file name into stem and extension (with its dot).
///
/// A leading dot does not start an extension, so `.bashrc` has none.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Shorten the final component of `path` until it fits in [`MAX_LEAF_BYTES`].
///
/// Repeatedly drops two characters from the stem and appends `_`, keeping the
/// extension. Returns the path untouched when it already fits.
pub fn fit_file_name(path: &Path) -> Cow<'_, Path> {
    let Some(leaf) = path.file_name().and_then(|n| n.to_str()) else {
        return Cow::Borrowed(path);
    };
    if leaf.len() <= MAX_LEAF_BYTES {
        return Cow::Borrowed(path);
    }

    let (stem, ext) = split_extension(leaf);
    let mut stem: Vec<char> = stem.chars().collect();
    let byte_len = |s: &[char]| s.iter().map(|c| c.len_utf8()).sum::<usize>() + ext.len();
    while byte_len(&stem) > MAX_LEAF_BYTES && stem.len() > 1 {
        let keep = stem.len().saturating_sub(2);
        stem.truncate(keep);
        stem.push('_');
    }

    let leaf: String = stem.into_iter().chain(ext.chars()).collect();
    Cow::Owned(path.with_file_name(leaf))
}

/// The temp file a download is written to before being renamed into place.
pub fn tmp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push("_tmp");
    PathBuf::from(name)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Archive directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
