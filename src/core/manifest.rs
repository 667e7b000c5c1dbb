//! Readers for the small tabular inputs that drive each tool.

use crate::utils::error::{Result, ToolkitError};
use crate::utils::paths::{expand_user, resolve_file};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One row of the `CombineFasta` manifest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FastaSource {
    pub database_name: String,
    pub database_order: String,
    pub fasta_path: PathBuf,
}

pub const FASTA_MANIFEST_COLUMNS: [&str; 3] = ["database_name", "database_order", "fasta_path"];

/// Reads the TSV manifest and resolves every FASTA path it lists.
pub fn read_fasta_manifest(path: &Path) -> Result<Vec<FastaSource>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?;

    let found: BTreeSet<String> = reader.headers()?.iter().map(str::to_string).collect();
    let missing: Vec<&str> = FASTA_MANIFEST_COLUMNS
        .iter()
        .copied()
        .filter(|c| !found.contains(*c))
        .collect();

    if !missing.is_empty() {
        return Err(ToolkitError::ManifestError {
            path: path.to_path_buf(),
            message: format!(
                "manifest must contain columns {:?}; found {:?}",
                FASTA_MANIFEST_COLUMNS, found
            ),
        });
    }

    let mut sources = Vec::new();
    for row in reader.deserialize::<FastaSource>() {
        let mut source = row?;
        let description = format!("FASTA file for {}", source.database_name);
        source.fasta_path = resolve_file(&source.fasta_path, &description).inspect_err(|e| {
            tracing::error!("{}", e);
        })?;
        sources.push(source);
    }

    if sources.is_empty() {
        return Err(ToolkitError::ManifestError {
            path: path.to_path_buf(),
            message: "manifest file is empty".to_string(),
        });
    }

    Ok(sources)
}

/// One row of the `Convert2MzML` input CSV.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversionJob {
    pub sample_id: String,
    pub wiff: PathBuf,
}

pub fn read_conversion_jobs(path: &Path) -> Result<Vec<ConversionJob>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    for column in ["sample_id", "wiff"] {
        if !headers.iter().any(|h| h == column) {
            return Err(ToolkitError::ManifestError {
                path: path.to_path_buf(),
                message: format!("missing column '{}'", column),
            });
        }
    }

    reader
        .deserialize::<ConversionJob>()
        .map(|row| row.map_err(ToolkitError::from))
        .collect()
}

/// Reads a FragPipe manifest: the first tab-separated column of every
/// non-blank line is an mzML path, which must exist.
pub fn read_fragpipe_manifest(path: &Path) -> Result<Vec<PathBuf>> {
    let content = std::fs::read_to_string(path)?;
    let mut mzml_files = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value = line.split('\t').next().unwrap_or_default();
        let mzml = expand_user(Path::new(value));
        if !mzml.exists() {
            return Err(ToolkitError::ManifestError {
                path: path.to_path_buf(),
                message: format!("line {}: mzML file not found: {}", index + 1, mzml.display()),
            });
        }
        mzml_files.push(mzml.canonicalize()?);
    }

    if mzml_files.is_empty() {
        return Err(ToolkitError::ManifestError {
            path: path.to_path_buf(),
            message: "manifest does not contain any entries".to_string(),
        });
    }

    Ok(mzml_files)
}

/// Extracts `database.db-path` from a FragPipe workflow file.
///
/// Inline `#` comments and surrounding quotes are stripped; the FASTA must
/// exist.
pub fn read_workflow_database(path: &Path) -> Result<PathBuf> {
    let content = std::fs::read_to_string(path)?;
    let mut database = None;

    for line in content.lines() {
        if !line.starts_with("database.db-path") {
            continue;
        }
        let Some((_, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.split('#').next().unwrap_or_default();
        let value = value.trim().trim_matches('"').trim_matches('\'');
        let fasta = expand_user(Path::new(value));
        if !fasta.exists() {
            return Err(ToolkitError::WorkflowError {
                path: path.to_path_buf(),
                message: format!("database file not found: {}", fasta.display()),
            });
        }
        database = Some(fasta);
    }

    database.ok_or_else(|| ToolkitError::WorkflowError {
        path: path.to_path_buf(),
        message: "could not find a database.db-path entry".to_string(),
    })
}
