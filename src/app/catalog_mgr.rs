// LogDiag - app/catalog_mgr.rs
//
// Loads every category catalog from the resources directory.
// One `<category>.json` file per category; the file stem is the category.
//
// Unlike per-file scan problems, catalog problems are never absorbed: the
// first invalid catalog aborts the load before any scanning starts.

use crate::core::catalog;
use crate::core::model::Catalog;
use crate::util::constants;
use crate::util::error::CatalogError;
use std::path::{Path, PathBuf};

/// Load all catalogs from `dir`, sorted by category name.
pub fn load_catalogs(dir: &Path) -> Result<Vec<Catalog>, CatalogError> {
    if !dir.is_dir() {
        return Err(CatalogError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let paths = catalog_paths(dir)?;
    if paths.len() > constants::MAX_CATALOGS {
        return Err(CatalogError::TooManyCatalogs {
            count: paths.len(),
            max: constants::MAX_CATALOGS,
        });
    }

    let mut catalogs = Vec::with_capacity(paths.len());
    for path in paths {
        let catalog = load_catalog_file(&path)?;
        tracing::info!(
            category = %catalog.category,
            rules = catalog.rules.len(),
            path = %path.display(),
            "Loaded catalog"
        );
        catalogs.push(catalog);
    }

    if catalogs.is_empty() {
        tracing::warn!(dir = %dir.display(), "No catalogs found; every log will get the default diagnosis");
    }

    Ok(catalogs)
}

/// Load a single catalog file; the category is the file stem.
pub fn load_catalog_file(path: &Path) -> Result<Catalog, CatalogError> {
    let io_err = |e| CatalogError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    let metadata = std::fs::metadata(path).map_err(io_err)?;
    if metadata.len() > constants::MAX_CATALOG_FILE_SIZE {
        return Err(CatalogError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size: constants::MAX_CATALOG_FILE_SIZE,
        });
    }

    let content = std::fs::read_to_string(path).map_err(io_err)?;
    let category = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    catalog::load_catalog_str(&category, &content, path)
}

/// `*.json` files directly inside `dir`, sorted by name.
///
/// The verdict file is skipped: the diagnostics directory may be the same
/// directory as the resources directory (both default to `.`).
fn catalog_paths(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let entries = std::fs::read_dir(dir).map_err(|e| CatalogError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| CatalogError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();

        if !path.is_file()
            || path.extension().and_then(|e| e.to_str()) != Some(constants::CATALOG_EXTENSION)
        {
            continue;
        }
        if path.file_name().and_then(|n| n.to_str()) == Some(constants::VERDICT_JSON_FILE) {
            tracing::debug!(path = %path.display(), "Skipping verdict file in resources dir");
            continue;
        }
        paths.push(path);
    }

    paths.sort();
    Ok(paths)
}
