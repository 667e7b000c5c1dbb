use crate::config::args::CombineFastaArgs;
use crate::core::fasta::annotate_tier;
use crate::core::manifest::read_fasta_manifest;
use crate::domain::model::TaskReport;
use crate::domain::ports::Task;
use crate::utils::error::Result;
use crate::utils::paths::{absolute, ensure_parent, resolve_file};
use async_trait::async_trait;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

/// Concatenates the FASTA files of a manifest, tagging every header with
/// ` PE=<database_order>`.
pub struct CombineFasta {
    args: CombineFastaArgs,
}

impl CombineFasta {
    pub fn new(args: CombineFastaArgs) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Task for CombineFasta {
    fn name(&self) -> &'static str {
        "CombineFasta"
    }

    async fn run(&self) -> Result<TaskReport> {
        let manifest = resolve_file(&self.args.manifest, "FASTA manifest")?;
        // Every input is resolved before the output is created.
        let sources = read_fasta_manifest(&manifest)?;
        let output = absolute(&self.args.output)?;
        ensure_parent(&output)?;

        let mut writer = BufWriter::new(File::create(&output)?);
        let mut total = 0;
        for source in &sources {
            let entries = annotate_tier(
                BufReader::new(File::open(&source.fasta_path)?),
                &mut writer,
                &source.database_order,
            )?;
            tracing::info!(
                "Added {} entries from {} (PE={})",
                entries,
                source.database_name,
                source.database_order
            );
            total += entries;
        }
        writer.flush()?;

        tracing::info!(
            "✅ Combined {} databases into {}",
            sources.len(),
            output.display()
        );
        Ok(TaskReport::new(self.name())
            .with_output(output)
            .with_count("databases", sources.len())
            .with_count("entries", total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_combines_in_manifest_order() {
        let temp = TempDir::new().unwrap();
        let ecoli = temp.path().join("ecoli.fasta");
        let human = temp.path().join("human.fasta");
        std::fs::write(&ecoli, ">E1 OS=E. coli PE=1 SV=1\nAAA\n").unwrap();
        std::fs::write(&human, ">H1 OS=H. sapiens\nCCC\n>H2\nGGG\n").unwrap();
        let manifest = temp.path().join("manifest.tsv");
        std::fs::write(
            &manifest,
            format!(
                "database_name\tdatabase_order\tfasta_path\nhuman\t3\t{}\necoli\t1\t{}\n",
                human.display(),
                ecoli.display()
            ),
        )
        .unwrap();

        let output = temp.path().join("combined.fasta");
        let report = CombineFasta::new(CombineFastaArgs {
            manifest,
            output: output.clone(),
        })
        .run()
        .await
        .unwrap();

        assert_eq!(report.counts["entries"], 3);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            ">H1 OS=H. sapiens PE=3\nCCC\n>H2 PE=3\nGGG\n>E1 OS=E. coli SV=1 PE=1\nAAA\n"
        );
    }

    #[tokio::test]
    async fn test_missing_fasta_leaves_no_output() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("manifest.tsv");
        std::fs::write(
            &manifest,
            "database_name\tdatabase_order\tfasta_path\nyeast\t2\t/nonexistent/yeast.fasta\n",
        )
        .unwrap();
        let output = temp.path().join("combined.fasta");

        let result = CombineFasta::new(CombineFastaArgs {
            manifest,
            output: output.clone(),
        })
        .run()
        .await;
        assert!(result.is_err());
        assert!(!output.exists());
    }
}
