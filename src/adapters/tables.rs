//! Tab-separated result tables written by ComputeFDR and CompareSamples,
//! and the readers CompareSamples uses to load them back.

use crate::core::compare::{ComparisonLevel, ComparisonRecord, Identification, StatusCount};
use crate::core::fdr::{AnnotatedGroup, AnnotatedPsm, AnnotatedProtein};
use crate::domain::model::{DecoyStatus, Tier};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const PSM_TABLE: &str = "psms.tsv";
pub const PROTEIN_TABLE: &str = "proteins.tsv";
pub const PROTEIN_GROUP_TABLE: &str = "protein_groups.tsv";
pub const COMPARISON_TABLE: &str = "comparison.tsv";
pub const COMPARISON_SUMMARY_TABLE: &str = "summary.tsv";

fn tsv_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    Ok(csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?)
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>, headers: &[&str]) -> Result<usize> {
    let mut writer = tsv_writer(path)?;
    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    // serialize() emits the header with the first row only.
    if count == 0 {
        writer.write_record(headers)?;
    }
    writer.flush()?;
    Ok(count)
}

#[derive(Serialize)]
struct PsmRow<'a> {
    spectrum: &'a str,
    retention_time: Option<f64>,
    observed_mz: Option<f64>,
    peptide: &'a str,
    modified_peptide: &'a str,
    charge: u8,
    proteins: String,
    status: DecoyStatus,
    tier: Tier,
    hyperscore: Option<f64>,
    nextscore: Option<f64>,
    expect: Option<f64>,
    probability: Option<f64>,
    score: f64,
    q_value: f64,
}

const PSM_HEADERS: [&str; 15] = [
    "spectrum",
    "retention_time",
    "observed_mz",
    "peptide",
    "modified_peptide",
    "charge",
    "proteins",
    "status",
    "tier",
    "hyperscore",
    "nextscore",
    "expect",
    "probability",
    "score",
    "q_value",
];

pub fn write_psms(path: &Path, psms: &[AnnotatedPsm]) -> Result<usize> {
    let rows = psms.iter().map(|p| PsmRow {
        spectrum: &p.psm.spectrum,
        retention_time: p.psm.retention_time,
        observed_mz: p.psm.observed_mz(),
        peptide: &p.psm.peptide,
        modified_peptide: &p.psm.modified_peptide,
        charge: p.psm.charge,
        proteins: p.psm.proteins.join(";"),
        status: p.status,
        tier: p.tier,
        hyperscore: p.psm.hyperscore,
        nextscore: p.psm.nextscore,
        expect: p.psm.expect,
        probability: p.psm.probability,
        score: p.score,
        q_value: p.q_value,
    });
    write_rows(path, rows, &PSM_HEADERS)
}

pub fn write_proteins(path: &Path, proteins: &[AnnotatedProtein]) -> Result<usize> {
    write_rows(
        path,
        proteins,
        &["accession", "status", "tier", "score", "q_value"],
    )
}

#[derive(Serialize)]
struct GroupRow<'a> {
    protein_group: &'a str,
    accessions: String,
    status: DecoyStatus,
    tier: Tier,
    probability: f64,
    q_value: f64,
}

pub fn write_protein_groups(path: &Path, groups: &[AnnotatedGroup]) -> Result<usize> {
    let rows = groups.iter().map(|g| GroupRow {
        protein_group: g.accessions.first().map(String::as_str).unwrap_or_default(),
        accessions: g.accessions.join(";"),
        status: g.status,
        tier: g.tier,
        probability: g.probability,
        q_value: g.q_value,
    });
    write_rows(
        path,
        rows,
        &["protein_group", "accessions", "status", "tier", "probability", "q_value"],
    )
}

/// Which rows of a ComputeFDR table count as accepted identifications.
#[derive(Debug, Clone)]
pub struct AcceptanceFilter {
    pub max_q_value: f64,
    pub contam_prefix: String,
}

impl AcceptanceFilter {
    fn accepts(&self, status: DecoyStatus, tier: &str, accession: &str, q_value: f64) -> bool {
        status.is_target()
            && tier != "-1"
            && !accession.starts_with(&self.contam_prefix)
            && q_value <= self.max_q_value
    }
}

#[derive(Deserialize)]
struct GroupInput {
    protein_group: String,
    status: DecoyStatus,
    tier: String,
    q_value: f64,
}

#[derive(Deserialize)]
struct PsmInput {
    modified_peptide: String,
    charge: u8,
    proteins: String,
    status: DecoyStatus,
    tier: String,
    q_value: f64,
}

/// Loads the accepted identifications from a ComputeFDR output directory.
pub fn read_identifications(
    dir: &Path,
    level: ComparisonLevel,
    filter: &AcceptanceFilter,
) -> Result<Vec<Identification>> {
    let path = dir.join(level.table_name());
    let mut reader = csv::ReaderBuilder::new().delimiter(b'\t').from_path(&path)?;
    let mut ids = Vec::new();

    match level {
        ComparisonLevel::Protein => {
            for row in reader.deserialize::<GroupInput>() {
                let row = row?;
                if filter.accepts(row.status, &row.tier, &row.protein_group, row.q_value) {
                    ids.push(Identification {
                        tier: row.tier,
                        key: row.protein_group,
                        charge: None,
                    });
                }
            }
        }
        ComparisonLevel::Peptide => {
            for row in reader.deserialize::<PsmInput>() {
                let row = row?;
                let leading = row.proteins.split(';').next().unwrap_or_default();
                if filter.accepts(row.status, &row.tier, leading, row.q_value) {
                    ids.push(Identification {
                        tier: row.tier,
                        key: row.modified_peptide,
                        charge: Some(row.charge),
                    });
                }
            }
        }
    }

    tracing::debug!("{}: {} accepted identifications", path.display(), ids.len());
    Ok(ids)
}

#[derive(Serialize)]
struct ComparisonRow<'a> {
    mixture_sample: &'a str,
    tier: &'a str,
    key: &'a str,
    charge: Option<u8>,
    individual_sample: Option<&'a str>,
    mixture_present: bool,
    individual_present: bool,
    status: String,
}

pub fn write_comparison(path: &Path, records: &[ComparisonRecord]) -> Result<usize> {
    let rows = records.iter().map(|r| ComparisonRow {
        mixture_sample: &r.mixture_sample,
        tier: &r.tier,
        key: &r.key,
        charge: r.charge,
        individual_sample: r.individual_sample.as_deref(),
        mixture_present: r.mixture_present,
        individual_present: r.individual_present,
        status: r.status.to_string(),
    });
    write_rows(
        path,
        rows,
        &[
            "mixture_sample",
            "tier",
            "key",
            "charge",
            "individual_sample",
            "mixture_present",
            "individual_present",
            "status",
        ],
    )
}

pub fn write_status_counts(path: &Path, counts: &[StatusCount]) -> Result<usize> {
    write_rows(path, counts, &["mixture_sample", "tier", "status", "count"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SpectrumMatch;
    use tempfile::TempDir;

    fn annotated(proteins: &[&str], status: DecoyStatus, tier: Tier, q_value: f64) -> AnnotatedPsm {
        AnnotatedPsm {
            psm: SpectrumMatch {
                spectrum: "run.1.1.2".to_string(),
                retention_time: Some(10.0),
                precursor_neutral_mass: 1000.0,
                charge: 2,
                peptide: "PEPTIDEK".to_string(),
                modified_peptide: "PEPTIDEK".to_string(),
                proteins: proteins.iter().map(|p| p.to_string()).collect(),
                hyperscore: Some(20.0),
                nextscore: None,
                expect: None,
                probability: None,
            },
            status,
            tier,
            score: 20.0,
            q_value,
        }
    }

    #[test]
    fn test_psm_table_round_trips_into_identifications() {
        let temp = TempDir::new().unwrap();
        let psms = vec![
            annotated(&["ECOLI_A"], DecoyStatus::Target, Tier::Level(1), 0.0),
            annotated(&["rev_ECOLI_A"], DecoyStatus::Decoy, Tier::Level(1), 0.0),
            annotated(&["contam_TRYP"], DecoyStatus::Target, Tier::Contaminant, 0.0),
            annotated(&["YEAST_A"], DecoyStatus::Target, Tier::Level(2), 0.2),
        ];
        assert_eq!(write_psms(&temp.path().join(PSM_TABLE), &psms).unwrap(), 4);

        let filter = AcceptanceFilter {
            max_q_value: 0.01,
            contam_prefix: "contam_".to_string(),
        };
        let ids = read_identifications(temp.path(), ComparisonLevel::Peptide, &filter).unwrap();
        assert_eq!(
            ids,
            vec![Identification {
                tier: "1".to_string(),
                key: "PEPTIDEK".to_string(),
                charge: Some(2),
            }]
        );
    }

    #[test]
    fn test_empty_table_still_has_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(PROTEIN_GROUP_TABLE);
        assert_eq!(write_protein_groups(&path, &[]).unwrap(), 0);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "protein_group\taccessions\tstatus\ttier\tprobability\tq_value\n"
        );

        let filter = AcceptanceFilter {
            max_q_value: 0.01,
            contam_prefix: "contam_".to_string(),
        };
        assert!(read_identifications(temp.path(), ComparisonLevel::Protein, &filter)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_protein_group_table_uses_leading_accession() {
        let temp = TempDir::new().unwrap();
        let groups = vec![AnnotatedGroup {
            accessions: vec!["ECOLI_A".to_string(), "ECOLI_B".to_string()],
            status: DecoyStatus::Target,
            tier: Tier::Level(1),
            probability: 0.99,
            q_value: 0.0,
        }];
        write_protein_groups(&temp.path().join(PROTEIN_GROUP_TABLE), &groups).unwrap();

        let filter = AcceptanceFilter {
            max_q_value: 0.01,
            contam_prefix: "contam_".to_string(),
        };
        let ids = read_identifications(temp.path(), ComparisonLevel::Protein, &filter).unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].key, "ECOLI_A");
    }
}
