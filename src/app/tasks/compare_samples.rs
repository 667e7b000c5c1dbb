use crate::adapters::tables::{
    read_identifications, write_comparison, write_status_counts, AcceptanceFilter,
    COMPARISON_SUMMARY_TABLE, COMPARISON_TABLE,
};
use crate::config::args::CompareSamplesArgs;
use crate::core::compare::{compare_samples, summarize, unmatched_tier_samples, Identification};
use crate::domain::model::TaskReport;
use crate::domain::ports::Task;
use crate::utils::error::Result;
use crate::utils::paths::{resolve_directory, resolve_file};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Compares ComputeFDR results of mixture samples with those of the
/// individual samples each organism was measured in alone.
pub struct CompareSamples {
    args: CompareSamplesArgs,
}

impl CompareSamples {
    pub fn new(args: CompareSamplesArgs) -> Self {
        Self { args }
    }

    fn load(&self, name: &str, dir: &Path, filter: &AcceptanceFilter) -> Result<Vec<Identification>> {
        let table_name = self.args.level.table_name();
        resolve_file(&dir.join(table_name), &format!("{} of sample {}", table_name, name))?;
        let ids = read_identifications(dir, self.args.level, filter)?;
        tracing::info!("{}: {} accepted identifications", name, ids.len());
        Ok(ids)
    }
}

#[async_trait]
impl Task for CompareSamples {
    fn name(&self) -> &'static str {
        "CompareSamples"
    }

    async fn run(&self) -> Result<TaskReport> {
        let filter = AcceptanceFilter {
            max_q_value: self.args.qvalue,
            contam_prefix: self.args.contam_prefix.clone(),
        };

        let mut mixtures = BTreeMap::new();
        for (name, dir) in &self.args.mixtures {
            mixtures.insert(name.clone(), self.load(name, dir, &filter)?);
        }
        let mut individuals = HashMap::new();
        for (name, dir) in &self.args.individuals {
            individuals.insert(name.clone(), self.load(name, dir, &filter)?);
        }

        let tier_samples = self.args.tier_sample_map();
        for sample in tier_samples.values() {
            if !individuals.contains_key(sample) {
                tracing::warn!(
                    "Individual sample '{}' was not given with --individual; its tier will only show mixture_only records",
                    sample
                );
            }
        }

        for (tier, sample, found) in unmatched_tier_samples(&individuals, &tier_samples) {
            tracing::warn!(
                "Individual sample '{}' has no identifications in tier {} (found tiers: {}); was it run with --group-fdr?",
                sample,
                tier,
                found.join(", ")
            );
        }

        let records = compare_samples(&mixtures, &individuals, &tier_samples);
        let counts = summarize(&records);

        let output_dir = resolve_directory(&self.args.output, "comparison output directory")?;
        let comparison_path = output_dir.join(COMPARISON_TABLE);
        let summary_path = output_dir.join(COMPARISON_SUMMARY_TABLE);
        write_comparison(&comparison_path, &records)?;
        write_status_counts(&summary_path, &counts)?;

        for c in &counts {
            tracing::info!("{} tier {}: {} {}", c.mixture_sample, c.tier, c.count, c.status);
        }
        tracing::info!("✅ Comparison written to {}", output_dir.display());

        Ok(TaskReport::new(self.name())
            .with_output(comparison_path)
            .with_output(summary_path)
            .with_count("records", records.len()))
    }
}
