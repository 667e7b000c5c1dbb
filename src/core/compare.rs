//! Compares identifications in mixture samples against the individual
//! sample that holds each tier's organism on its own.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ComparisonLevel {
    #[default]
    Protein,
    Peptide,
}

impl ComparisonLevel {
    /// The ComputeFDR table compared at this level.
    pub fn table_name(self) -> &'static str {
        match self {
            ComparisonLevel::Protein => "protein_groups.tsv",
            ComparisonLevel::Peptide => "psms.tsv",
        }
    }
}

/// One accepted identification: a protein group accession, or a modified
/// peptide with its charge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identification {
    pub tier: String,
    pub key: String,
    pub charge: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    IndividualOnly,
    MixtureOnly,
    Both,
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PresenceStatus::IndividualOnly => "individual_only",
            PresenceStatus::MixtureOnly => "mixture_only",
            PresenceStatus::Both => "both",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRecord {
    pub mixture_sample: String,
    pub tier: String,
    pub key: String,
    pub charge: Option<u8>,
    pub individual_sample: Option<String>,
    pub mixture_present: bool,
    pub individual_present: bool,
    pub status: PresenceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub mixture_sample: String,
    pub tier: String,
    pub status: PresenceStatus,
    pub count: usize,
}

fn keys_for_tier(ids: &[Identification], tier: &str) -> BTreeSet<(String, Option<u8>)> {
    ids.iter()
        .filter(|id| id.tier == tier)
        .map(|id| (id.key.clone(), id.charge))
        .collect()
}

/// For every mixture and every tier observed in it, flags each key as seen
/// in the mixture, in the tier's individual sample, or in both.
///
/// Records are ordered by mixture, tier, key. A tier with no individual
/// sample configured only yields `mixture_only` records.
pub fn compare_samples(
    mixtures: &BTreeMap<String, Vec<Identification>>,
    individuals: &HashMap<String, Vec<Identification>>,
    tier_samples: &HashMap<String, String>,
) -> Vec<ComparisonRecord> {
    let mut records = Vec::new();

    for (mixture_name, mixture_ids) in mixtures {
        let tiers: BTreeSet<&str> = mixture_ids.iter().map(|id| id.tier.as_str()).collect();

        for tier in tiers {
            let mixture_keys = keys_for_tier(mixture_ids, tier);
            let individual_sample = tier_samples.get(tier).cloned();
            let individual_keys = individual_sample
                .as_ref()
                .and_then(|sample| individuals.get(sample))
                .map(|ids| keys_for_tier(ids, tier))
                .unwrap_or_default();

            for (key, charge) in mixture_keys.union(&individual_keys) {
                let lookup = (key.clone(), *charge);
                let mixture_present = mixture_keys.contains(&lookup);
                let individual_present = individual_keys.contains(&lookup);
                let status = match (mixture_present, individual_present) {
                    (true, true) => PresenceStatus::Both,
                    (true, false) => PresenceStatus::MixtureOnly,
                    _ => PresenceStatus::IndividualOnly,
                };
                records.push(ComparisonRecord {
                    mixture_sample: mixture_name.clone(),
                    tier: tier.to_string(),
                    key: key.clone(),
                    charge: *charge,
                    individual_sample: individual_sample.clone(),
                    mixture_present,
                    individual_present,
                    status,
                });
            }
        }
    }

    records
}

/// Tier samples that hold identifications, but none in the tier they are
/// assigned to, with the tiers they do hold. This is typically a sample
/// processed without per-tier FDR, whose rows all carry tier `0`.
pub fn unmatched_tier_samples(
    individuals: &HashMap<String, Vec<Identification>>,
    tier_samples: &HashMap<String, String>,
) -> Vec<(String, String, Vec<String>)> {
    let mut unmatched: Vec<(String, String, Vec<String>)> = tier_samples
        .iter()
        .filter_map(|(tier, sample)| {
            let ids = individuals.get(sample).filter(|ids| !ids.is_empty())?;
            if ids.iter().any(|id| &id.tier == tier) {
                return None;
            }
            let found: BTreeSet<&str> = ids.iter().map(|id| id.tier.as_str()).collect();
            Some((
                tier.clone(),
                sample.clone(),
                found.into_iter().map(str::to_string).collect(),
            ))
        })
        .collect();
    unmatched.sort();
    unmatched
}

/// Counts records per mixture, tier and status.
pub fn summarize(records: &[ComparisonRecord]) -> Vec<StatusCount> {
    let mut counts: BTreeMap<(&str, &str, PresenceStatus), usize> = BTreeMap::new();
    for r in records {
        *counts
            .entry((r.mixture_sample.as_str(), r.tier.as_str(), r.status))
            .or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((mixture, tier, status), count)| StatusCount {
            mixture_sample: mixture.to_string(),
            tier: tier.to_string(),
            status,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(tier: &str, key: &str) -> Identification {
        Identification {
            tier: tier.to_string(),
            key: key.to_string(),
            charge: None,
        }
    }

    fn setup() -> (
        BTreeMap<String, Vec<Identification>>,
        HashMap<String, Vec<Identification>>,
        HashMap<String, String>,
    ) {
        let mixtures = BTreeMap::from([(
            "mix_01".to_string(),
            vec![id("1", "ECOLI_A"), id("1", "ECOLI_B"), id("2", "YEAST_A")],
        )]);
        let individuals = HashMap::from([
            (
                "ecoli_01".to_string(),
                vec![id("1", "ECOLI_B"), id("1", "ECOLI_C"), id("2", "STRAY")],
            ),
            ("yeast_01".to_string(), vec![id("2", "YEAST_A")]),
        ]);
        let tier_samples = HashMap::from([
            ("1".to_string(), "ecoli_01".to_string()),
            ("2".to_string(), "yeast_01".to_string()),
        ]);
        (mixtures, individuals, tier_samples)
    }

    #[test]
    fn test_compare_samples_flags_presence() {
        let (mixtures, individuals, tier_samples) = setup();
        let records = compare_samples(&mixtures, &individuals, &tier_samples);

        let flat: Vec<(&str, &str, PresenceStatus)> = records
            .iter()
            .map(|r| (r.tier.as_str(), r.key.as_str(), r.status))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("1", "ECOLI_A", PresenceStatus::MixtureOnly),
                ("1", "ECOLI_B", PresenceStatus::Both),
                ("1", "ECOLI_C", PresenceStatus::IndividualOnly),
                ("2", "YEAST_A", PresenceStatus::Both),
            ]
        );
        assert_eq!(records[0].individual_sample.as_deref(), Some("ecoli_01"));
    }

    #[test]
    fn test_unmapped_tier_is_mixture_only() {
        let (mut mixtures, individuals, tier_samples) = setup();
        mixtures.insert("mix_02".to_string(), vec![id("3", "HUMAN_A")]);
        let records = compare_samples(&mixtures, &individuals, &tier_samples);
        let human = records.iter().find(|r| r.key == "HUMAN_A").unwrap();
        assert_eq!(human.status, PresenceStatus::MixtureOnly);
        assert_eq!(human.individual_sample, None);
    }

    #[test]
    fn test_peptide_keys_include_charge() {
        let mixtures = BTreeMap::from([(
            "mix".to_string(),
            vec![Identification {
                tier: "1".to_string(),
                key: "PEPTIDEK".to_string(),
                charge: Some(2),
            }],
        )]);
        let individuals = HashMap::from([(
            "ind".to_string(),
            vec![Identification {
                tier: "1".to_string(),
                key: "PEPTIDEK".to_string(),
                charge: Some(3),
            }],
        )]);
        let tier_samples = HashMap::from([("1".to_string(), "ind".to_string())]);
        let records = compare_samples(&mixtures, &individuals, &tier_samples);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, PresenceStatus::MixtureOnly);
        assert_eq!(records[1].status, PresenceStatus::IndividualOnly);
    }

    #[test]
    fn test_summarize_counts_per_status() {
        let (mixtures, individuals, tier_samples) = setup();
        let records = compare_samples(&mixtures, &individuals, &tier_samples);
        let summary = summarize(&records);
        assert_eq!(summary.len(), 4);
        assert_eq!(summary[0].status, PresenceStatus::IndividualOnly);
        assert!(summary.iter().all(|s| s.count == 1));
        assert!(summarize(&[]).is_empty());
    }

    #[test]
    fn test_unmatched_tier_samples() {
        let individuals = HashMap::from([
            ("ecoli_01".to_string(), vec![id("0", "ECOLI_A"), id("0", "ECOLI_B")]),
            ("yeast_01".to_string(), vec![id("2", "YEAST_A")]),
            ("human_01".to_string(), vec![]),
        ]);
        let tier_samples = HashMap::from([
            ("1".to_string(), "ecoli_01".to_string()),
            ("2".to_string(), "yeast_01".to_string()),
            ("3".to_string(), "human_01".to_string()),
        ]);
        assert_eq!(
            unmatched_tier_samples(&individuals, &tier_samples),
            vec![("1".to_string(), "ecoli_01".to_string(), vec!["0".to_string()])]
        );
    }
}
