use crate::adapters::pepxml::{find_pepxml_files, read_pepxml_file};
use crate::adapters::protxml::{protein_probabilities, read_protxml_file};
use crate::adapters::tables::{
    write_protein_groups, write_proteins, write_psms, PROTEIN_GROUP_TABLE, PROTEIN_TABLE,
    PSM_TABLE,
};
use crate::config::args::ComputeFdrArgs;
use crate::core::fasta::tier_map;
use crate::core::fdr::{compute_fdr, AccessionClassifier, FdrInput};
use crate::domain::model::TaskReport;
use crate::domain::ports::Task;
use crate::utils::error::Result;
use crate::utils::paths::{resolve_directory, resolve_file};
use crate::utils::validation::validate_required_field;
use async_trait::async_trait;
use std::fs::File;
use std::io::BufReader;

pub const FDR_SUMMARY_FILE: &str = "summary.json";

pub struct ComputeFdr {
    args: ComputeFdrArgs,
}

impl ComputeFdr {
    pub fn new(args: ComputeFdrArgs) -> Self {
        Self { args }
    }

    fn classifier(&self) -> Result<AccessionClassifier> {
        let tiers = if self.args.group_fdr {
            let database = validate_required_field("--database", &self.args.database)?;
            let database = resolve_file(database, "FASTA database file")?;
            tracing::info!("Reading protein tiers from {}", database.display());
            let tiers = tier_map(BufReader::new(File::open(&database)?))?;
            tracing::info!("{} accessions carry a PE= tier", tiers.len());
            Some(tiers)
        } else {
            None
        };
        Ok(AccessionClassifier::new(
            self.args.decoy_prefix.clone(),
            self.args.contam_prefix.clone(),
            tiers,
        ))
    }
}

#[async_trait]
impl Task for ComputeFdr {
    fn name(&self) -> &'static str {
        "ComputeFDR"
    }

    async fn run(&self) -> Result<TaskReport> {
        let pep_dir = resolve_directory(&self.args.pep, "pepXML directory")?;
        let pep_files = find_pepxml_files(&pep_dir)?;
        tracing::info!("Found {} pepXML files in {}", pep_files.len(), pep_dir.display());
        let output_dir = resolve_directory(&self.args.output, "output directory")?;
        let classifier = self.classifier()?;

        let mut psms = Vec::new();
        for file in &pep_files {
            tracing::info!("Loading pepXML {}", file.display());
            psms.extend(read_pepxml_file(file)?);
        }

        let (groups, protein_probabilities) = if self.args.nopg_fdr {
            if self.args.prot.is_some() {
                tracing::warn!("--nopg-fdr is set, ignoring the provided protXML file");
            }
            (None, None)
        } else {
            match &self.args.prot {
                Some(prot) => {
                    let prot = resolve_file(prot, "protXML file")?;
                    tracing::info!("Loading protein groups from protXML {}", prot.display());
                    let groups = read_protxml_file(&prot)?;
                    let probabilities = protein_probabilities(&groups);
                    (Some(groups), Some(probabilities))
                }
                None => {
                    tracing::warn!("No protXML given; the protein group table will be empty");
                    (Some(Vec::new()), None)
                }
            }
        };

        let result = compute_fdr(
            FdrInput {
                psms,
                groups,
                protein_probabilities,
            },
            &classifier,
        )?;

        let psm_path = output_dir.join(PSM_TABLE);
        let protein_path = output_dir.join(PROTEIN_TABLE);
        let psm_rows = write_psms(&psm_path, &result.psms)?;
        let protein_rows = write_proteins(&protein_path, &result.proteins)?;
        let mut report = TaskReport::new(self.name())
            .with_output(&psm_path)
            .with_output(&protein_path)
            .with_count("psms", psm_rows)
            .with_count("proteins", protein_rows);

        if !self.args.nopg_fdr {
            let group_path = output_dir.join(PROTEIN_GROUP_TABLE);
            let group_rows = write_protein_groups(&group_path, &result.groups)?;
            report = report
                .with_output(&group_path)
                .with_count("protein_groups", group_rows);
        }

        let summary = result.summary(classifier.is_grouped());
        let summary_path = output_dir.join(FDR_SUMMARY_FILE);
        std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
        for (tier, counts) in &summary.tiers {
            tracing::info!(
                "Tier {}: {}/{} PSMs, {}/{} proteins, {}/{} protein groups at 1% FDR",
                tier,
                counts.target_psms_at_1pct,
                counts.psms,
                counts.target_proteins_at_1pct,
                counts.proteins,
                counts.target_groups_at_1pct,
                counts.protein_groups
            );
        }

        tracing::info!("✅ Stored FDR-annotated identifications in {}", output_dir.display());
        Ok(report.with_output(summary_path))
    }
}
