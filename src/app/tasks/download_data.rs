use crate::adapters::pride::PrideArchive;
use crate::config::args::DownloadDataArgs;
use crate::config::settings::Settings;
use crate::core::checksums::{read_checksums, sha512_file_async, write_checksums, CHECKSUM_FILE};
use crate::domain::model::TaskReport;
use crate::domain::ports::{RemoteArchive, Task};
use crate::utils::error::{Result, ToolkitError};
use crate::utils::paths::dataset_dir;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// A public dataset and the files of it this toolkit works with.
#[derive(Debug, Clone, Copy)]
pub struct Dataset {
    pub name: &'static str,
    pub accession: &'static str,
    /// Directory of the dataset below the archive root.
    pub path: &'static str,
    pub molecule: &'static str,
    pub assay: &'static str,
    pub files: &'static [&'static str],
}

pub const DATASETS: &[Dataset] = &[Dataset {
    name: "van_puyvelde-2022",
    accession: "PXD028735",
    path: "pride/data/archive/2022/02/PXD028735/",
    molecule: "Protein",
    assay: "DIA",
    files: &[
        "LFQ_TTOF5600_SWATH_Condition_A_Sample_Alpha_01.wiff",
        "LFQ_TTOF5600_SWATH_Condition_A_Sample_Alpha_01.wiff.scan",
        "LFQ_TTOF5600_SWATH_Condition_B_Sample_Alpha_01.wiff",
        "LFQ_TTOF5600_SWATH_Condition_B_Sample_Alpha_01.wiff.scan",
        "LFQ_TTOF5600_SWATH_Ecoli_01.wiff",
        "LFQ_TTOF5600_SWATH_Ecoli_01.wiff.scan",
        "LFQ_TTOF5600_SWATH_Yeast_01.wiff",
        "LFQ_TTOF5600_SWATH_Yeast_01.wiff.scan",
        "LFQ_TTOF5600_SWATH_Human_01.wiff",
        "LFQ_TTOF5600_SWATH_Human_01.wiff.scan",
    ],
}];

pub fn find_dataset(name: &str) -> Result<&'static Dataset> {
    DATASETS
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| ToolkitError::InvalidConfigValueError {
            field: "--dataset".to_string(),
            value: name.to_string(),
            reason: format!(
                "unknown dataset; available: {}",
                DATASETS.iter().map(|d| d.name).collect::<Vec<_>>().join(", ")
            ),
        })
}

/// Brings a local raw-data directory in sync with the archive.
///
/// Files whose local copy matches the recorded SHA-512 are skipped; the
/// checksum file is rewritten after every downloaded file.
pub async fn sync_dataset<A: RemoteArchive + ?Sized>(
    dataset: &Dataset,
    archive: &A,
    output_dir: &Path,
) -> Result<TaskReport> {
    let existing = read_checksums(output_dir)?;
    if !existing.is_empty() {
        tracing::info!(
            "Read {} recorded checksums from {}",
            existing.len(),
            output_dir.join(CHECKSUM_FILE).display()
        );
    }

    let mut available = Vec::new();
    let mut missing = Vec::new();
    for &file in dataset.files {
        if archive.contains(file).await? {
            available.push(file);
        } else {
            missing.push(file);
        }
    }
    if !missing.is_empty() {
        tracing::warn!("Missing on the server ({}):", missing.len());
        for file in &missing {
            tracing::warn!("  - {}", file);
        }
    }

    let mut checksums: HashMap<String, String> = HashMap::new();
    let mut finished = Vec::new();
    let mut to_download = Vec::new();
    for file in available {
        let local = output_dir.join(file);
        match existing.get(file) {
            Some(expected) if local.exists() => {
                tracing::info!("Verifying {}...", file);
                if &sha512_file_async(local.clone()).await? == expected {
                    checksums.insert(file.to_string(), expected.clone());
                    finished.push(file);
                } else {
                    tracing::warn!("Checksum mismatch for {}, will re-download", file);
                    to_download.push(file);
                }
            }
            _ => to_download.push(file),
        }
    }

    if !finished.is_empty() {
        tracing::info!("Already downloaded ({}):", finished.len());
        for file in &finished {
            tracing::info!("  ✓ {}", file);
        }
    }

    let report = TaskReport::new("DownloadData")
        .with_output(output_dir)
        .with_count("already_downloaded", finished.len())
        .with_count("missing", missing.len());

    if to_download.is_empty() {
        tracing::info!("All files already downloaded");
        return Ok(report.with_count("downloaded", 0));
    }

    tracing::info!("Files to download ({}):", to_download.len());
    for file in &to_download {
        tracing::info!("  - {}", file);
    }

    for file in &to_download {
        let local = output_dir.join(file);
        tracing::info!("Downloading {} to {}", file, local.display());
        let bytes = archive.fetch(file, &local).await?;
        tracing::info!("Calculating SHA-512 for {} ({} bytes)...", file, bytes);
        checksums.insert(file.to_string(), sha512_file_async(local).await?);
        // Recorded after every file so an interrupted run keeps what finished.
        let written = write_checksums(output_dir, dataset.files, &checksums)?;
        tracing::debug!("Saved {} checksums", written);
    }

    tracing::info!(
        "Saved {} checksums to {}",
        checksums.len(),
        output_dir.join(CHECKSUM_FILE).display()
    );

    Ok(report.with_count("downloaded", to_download.len()))
}

pub struct DownloadData {
    args: DownloadDataArgs,
    settings: Settings,
}

impl DownloadData {
    pub fn new(args: DownloadDataArgs, settings: Settings) -> Self {
        Self { args, settings }
    }
}

#[async_trait]
impl Task for DownloadData {
    fn name(&self) -> &'static str {
        "DownloadData"
    }

    async fn run(&self) -> Result<TaskReport> {
        let dataset = find_dataset(&self.args.dataset)?;
        let data_dir = self.settings.data_dir()?;
        let output_dir =
            dataset_dir(data_dir, dataset.name, dataset.molecule, dataset.assay)?.join("Raw");
        std::fs::create_dir_all(&output_dir)?;

        let base_url = self
            .args
            .base_url
            .as_deref()
            .unwrap_or(&self.settings.download.base_url);
        let archive = PrideArchive::new(base_url, dataset.path)?
            .with_progress(self.settings.download.show_progress);
        tracing::info!(
            "Syncing {} ({}) from {}",
            dataset.name,
            dataset.accession,
            archive.directory()
        );

        let report = sync_dataset(dataset, &archive, &output_dir).await?;
        tracing::info!("✅ Download completed");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry() {
        let dataset = find_dataset("van_puyvelde-2022").unwrap();
        assert_eq!(dataset.files.len(), 10);
        assert!(dataset.files.iter().all(|f| f.contains(".wiff")));
        assert!(find_dataset("unknown").is_err());
    }
}
