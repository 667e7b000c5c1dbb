use crate::utils::error::{Result, ToolkitError};
use std::path::{Path, PathBuf};

/// Expand a leading `~` to the home directory.
pub fn expand_user(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Absolute form of `path` without requiring it to exist.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    let expanded = expand_user(path);
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(std::env::current_dir()?.join(expanded))
    }
}

pub fn resolve_file(path: &Path, description: &str) -> Result<PathBuf> {
    let expanded = expand_user(path);
    if !expanded.exists() {
        return Err(ToolkitError::NotFound {
            description: description.to_string(),
            path: expanded,
        });
    }
    if !expanded.is_file() {
        return Err(ToolkitError::InvalidInput {
            path: expanded,
            reason: format!("{} must be a file", description),
        });
    }
    Ok(expanded.canonicalize()?)
}

/// Creates the directory when it is missing.
pub fn resolve_directory(path: &Path, description: &str) -> Result<PathBuf> {
    let expanded = expand_user(path);
    if expanded.exists() && !expanded.is_dir() {
        return Err(ToolkitError::InvalidInput {
            path: expanded,
            reason: format!("{} must be a directory", description),
        });
    }
    std::fs::create_dir_all(&expanded)?;
    Ok(expanded.canonicalize()?)
}

/// `<data_dir>/data/<dataset>/<molecule>/<assay>`, created if missing.
pub fn dataset_dir(data_dir: &Path, dataset: &str, molecule: &str, assay: &str) -> Result<PathBuf> {
    let dir = data_dir.join("data").join(dataset).join(molecule).join(assay);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Make sure the parent directory of an output file exists.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
