// LogDiag - platform/fs.rs
//
// Filesystem naming helpers for scanned logs and their filtered copies.

use crate::util::constants;
use std::path::{Path, PathBuf};

/// Sibling path of `path` with `-filtered` inserted before the final extension.
///
/// `node0/swirlds.log` -> `node0/swirlds-filtered.log`,
/// `node0/output` -> `node0/output-filtered`,
/// `node0/app.tar.log` -> `node0/app.tar-filtered.log`.
pub fn filtered_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!(
            "{stem}{}.{}",
            constants::FILTERED_SUFFIX,
            ext.to_string_lossy()
        ),
        None => format!("{stem}{}", constants::FILTERED_SUFFIX),
    };
    path.with_file_name(name)
}

/// Returns true if `path` names a filtered copy produced by a previous scan.
pub fn is_filtered_copy(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.ends_with(constants::FILTERED_SUFFIX))
}

/// File name of `path` as UTF-8, lossy. Empty if there is none.
pub fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
