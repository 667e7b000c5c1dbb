//! Target-decoy FDR estimation for PSMs, proteins and protein groups,
//! optionally split by database tier.

use crate::domain::model::{DecoyStatus, ProteinGroup, SpectrumMatch, Tier};
use crate::utils::error::{Result, ToolkitError};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Decides target/decoy status, contaminant status and tier of accessions.
#[derive(Debug, Clone)]
pub struct AccessionClassifier {
    decoy_prefix: String,
    contam_prefix: String,
    tiers: Option<HashMap<String, i64>>,
}

impl AccessionClassifier {
    /// `tiers` is `None` unless FDR is computed per tier.
    pub fn new(
        decoy_prefix: impl Into<String>,
        contam_prefix: impl Into<String>,
        tiers: Option<HashMap<String, i64>>,
    ) -> Self {
        Self {
            decoy_prefix: decoy_prefix.into(),
            contam_prefix: contam_prefix.into(),
            tiers,
        }
    }

    pub fn decoy_prefix(&self) -> &str {
        &self.decoy_prefix
    }

    pub fn is_grouped(&self) -> bool {
        self.tiers.is_some()
    }

    pub fn is_contaminant(&self, accession: &str) -> bool {
        accession.starts_with(&self.contam_prefix)
            || accession
                .strip_prefix(&self.decoy_prefix)
                .is_some_and(|rest| rest.starts_with(&self.contam_prefix))
    }

    pub fn status(&self, accession: &str) -> DecoyStatus {
        if accession.starts_with(&self.decoy_prefix) {
            DecoyStatus::Decoy
        } else {
            DecoyStatus::Target
        }
    }

    pub fn tier(&self, accession: &str) -> Tier {
        let Some(tiers) = &self.tiers else {
            return Tier::UNGROUPED;
        };
        if self.is_contaminant(accession) {
            return Tier::Contaminant;
        }
        tiers
            .get(accession)
            .or_else(|| {
                accession
                    .strip_prefix(&self.decoy_prefix)
                    .and_then(|target| tiers.get(target))
            })
            .map(|t| Tier::Level(*t))
            .unwrap_or(Tier::Unknown)
    }

    /// Strips the decoy prefix, so a target and its decoy share a key.
    pub fn pair_key<'a>(&self, accession: &'a str) -> &'a str {
        accession
            .strip_prefix(self.decoy_prefix.as_str())
            .unwrap_or(accession)
    }
}

/// Which pepXML score ranks the PSMs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    PeptideProphetProbability,
    Hyperscore,
    Expect,
}

impl ScoreKind {
    fn raw(self, psm: &SpectrumMatch) -> Option<f64> {
        match self {
            ScoreKind::PeptideProphetProbability => psm.probability,
            ScoreKind::Hyperscore => psm.hyperscore,
            ScoreKind::Expect => psm.expect,
        }
    }

    /// Score oriented so that higher is better.
    pub fn score(self, psm: &SpectrumMatch) -> f64 {
        match (self, self.raw(psm)) {
            (_, None) => f64::NEG_INFINITY,
            (ScoreKind::Expect, Some(e)) => -e,
            (_, Some(s)) => s,
        }
    }

    /// The first score kind carried by every PSM, falling back to the first
    /// carried by any.
    pub fn select(psms: &[SpectrumMatch]) -> Option<ScoreKind> {
        const ORDER: [ScoreKind; 3] = [
            ScoreKind::PeptideProphetProbability,
            ScoreKind::Hyperscore,
            ScoreKind::Expect,
        ];
        ORDER
            .into_iter()
            .find(|kind| psms.iter().all(|p| kind.raw(p).is_some()))
            .or_else(|| {
                ORDER
                    .into_iter()
                    .find(|kind| psms.iter().any(|p| kind.raw(p).is_some()))
            })
    }
}

/// Assigns q-values by target-decoy competition.
///
/// Items are ranked by `score` (higher first); tied scores share one FDR
/// estimate. FDR at a threshold is `decoys / targets`, and the q-value is the
/// lowest FDR at which the item is still accepted. Returns q-values in input
/// order.
pub fn q_values(items: &[(f64, DecoyStatus)]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        items[b]
            .0
            .partial_cmp(&items[a].0)
            .unwrap_or(Ordering::Equal)
    });

    let mut fdrs = vec![0.0; items.len()];
    let mut targets = 0usize;
    let mut decoys = 0usize;
    let mut start = 0;
    while start < order.len() {
        let score = items[order[start]].0;
        let mut end = start;
        while end < order.len() && items[order[end]].0 == score {
            match items[order[end]].1 {
                DecoyStatus::Target => targets += 1,
                DecoyStatus::Decoy => decoys += 1,
            }
            end += 1;
        }
        // NaN never equals itself; take it alone.
        if end == start {
            match items[order[start]].1 {
                DecoyStatus::Target => targets += 1,
                DecoyStatus::Decoy => decoys += 1,
            }
            end = start + 1;
        }
        let fdr = (decoys as f64 / targets.max(1) as f64).min(1.0);
        for &i in &order[start..end] {
            fdrs[i] = fdr;
        }
        start = end;
    }

    let mut q = vec![0.0; items.len()];
    let mut running = 1.0f64;
    for &i in order.iter().rev() {
        running = running.min(fdrs[i]);
        q[i] = running;
    }
    q
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedPsm {
    #[serde(skip)]
    pub psm: SpectrumMatch,
    pub status: DecoyStatus,
    pub tier: Tier,
    pub score: f64,
    pub q_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedProtein {
    pub accession: String,
    pub status: DecoyStatus,
    pub tier: Tier,
    pub score: f64,
    pub q_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedGroup {
    pub accessions: Vec<String>,
    pub status: DecoyStatus,
    pub tier: Tier,
    pub probability: f64,
    pub q_value: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TierSummary {
    pub psms: usize,
    pub target_psms_at_1pct: usize,
    pub proteins: usize,
    pub target_proteins_at_1pct: usize,
    pub protein_groups: usize,
    pub target_groups_at_1pct: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FdrSummary {
    pub score: ScoreKind,
    pub grouped_by_tier: bool,
    pub tiers: BTreeMap<String, TierSummary>,
}

#[derive(Debug, Clone)]
pub struct FdrResult {
    pub score: ScoreKind,
    pub psms: Vec<AnnotatedPsm>,
    pub proteins: Vec<AnnotatedProtein>,
    pub groups: Vec<AnnotatedGroup>,
}

const REPORT_THRESHOLD: f64 = 0.01;

impl FdrResult {
    pub fn summary(&self, grouped_by_tier: bool) -> FdrSummary {
        let mut tiers: BTreeMap<Tier, TierSummary> = BTreeMap::new();
        let passes = |status: DecoyStatus, q: f64| status.is_target() && q <= REPORT_THRESHOLD;

        for p in &self.psms {
            let entry = tiers.entry(p.tier).or_default();
            entry.psms += 1;
            entry.target_psms_at_1pct += usize::from(passes(p.status, p.q_value));
        }
        for p in &self.proteins {
            let entry = tiers.entry(p.tier).or_default();
            entry.proteins += 1;
            entry.target_proteins_at_1pct += usize::from(passes(p.status, p.q_value));
        }
        for g in &self.groups {
            let entry = tiers.entry(g.tier).or_default();
            entry.protein_groups += 1;
            entry.target_groups_at_1pct += usize::from(passes(g.status, g.q_value));
        }

        FdrSummary {
            score: self.score,
            grouped_by_tier,
            tiers: tiers
                .into_iter()
                .map(|(tier, summary)| (tier.to_string(), summary))
                .collect(),
        }
    }
}

/// Orders the PSM's proteins decoys first, then by tier, and derives the
/// PSM's status and tier from the first one.
fn classify_psm(psm: &mut SpectrumMatch, classifier: &AccessionClassifier) -> (DecoyStatus, Tier) {
    let mut evidences: Vec<(DecoyStatus, Tier, String)> = psm
        .proteins
        .drain(..)
        .map(|acc| (classifier.status(&acc), classifier.tier(&acc), acc))
        .collect();
    evidences.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    let (status, tier) = evidences
        .first()
        .map(|(s, t, _)| (*s, *t))
        .unwrap_or((DecoyStatus::Target, Tier::Unknown));
    let tier = if classifier.is_grouped() {
        tier
    } else {
        Tier::UNGROUPED
    };
    psm.proteins = evidences.into_iter().map(|(_, _, acc)| acc).collect();
    (status, tier)
}

/// Keeps the better of each target/decoy pair; ties keep the target.
fn pick<T>(
    entries: Vec<T>,
    key: impl Fn(&T) -> String,
    status: impl Fn(&T) -> DecoyStatus,
    score: impl Fn(&T) -> f64,
) -> Vec<T> {
    let mut best: HashMap<String, usize> = HashMap::new();
    for (i, entry) in entries.iter().enumerate() {
        let k = key(entry);
        match best.get(&k) {
            None => {
                best.insert(k, i);
            }
            Some(&j) => {
                let current = &entries[j];
                let better = match score(entry).partial_cmp(&score(current)) {
                    Some(Ordering::Greater) => true,
                    Some(Ordering::Equal) => {
                        status(entry).is_target() && !status(current).is_target()
                    }
                    _ => false,
                };
                if better {
                    best.insert(k, i);
                }
            }
        }
    }

    let mut keep = vec![false; entries.len()];
    for i in best.into_values() {
        keep[i] = true;
    }
    entries
        .into_iter()
        .zip(keep)
        .filter_map(|(e, k)| k.then_some(e))
        .collect()
}

pub struct FdrInput {
    pub psms: Vec<SpectrumMatch>,
    /// Protein groups read from protXML; `None` skips group-level FDR.
    pub groups: Option<Vec<ProteinGroup>>,
    /// Use protXML probabilities as protein scores.
    pub protein_probabilities: Option<HashMap<String, f64>>,
}

pub fn compute_fdr(input: FdrInput, classifier: &AccessionClassifier) -> Result<FdrResult> {
    if input.psms.is_empty() {
        return Err(ToolkitError::NoIdentifications {
            message: "no peptide-spectrum matches in the pepXML files".to_string(),
        });
    }
    let score = ScoreKind::select(&input.psms).ok_or_else(|| ToolkitError::NoIdentifications {
        message: "PSMs carry neither a PeptideProphet probability, a hyperscore nor an expect value"
            .to_string(),
    })?;
    tracing::info!("Ranking PSMs by {:?}", score);

    // PSMs
    let mut psm_buckets: BTreeMap<Tier, Vec<AnnotatedPsm>> = BTreeMap::new();
    let mut protein_scores: HashMap<String, f64> = HashMap::new();
    for mut psm in input.psms {
        let (status, tier) = classify_psm(&mut psm, classifier);
        let s = score.score(&psm);
        for acc in &psm.proteins {
            let entry = protein_scores.entry(acc.clone()).or_insert(f64::NEG_INFINITY);
            *entry = entry.max(s);
        }
        psm_buckets.entry(tier).or_default().push(AnnotatedPsm {
            psm,
            status,
            tier,
            score: s,
            q_value: 1.0,
        });
    }

    // Proteins
    let mut protein_buckets: BTreeMap<Tier, Vec<AnnotatedProtein>> = BTreeMap::new();
    let mut accessions: Vec<String> = protein_scores.keys().cloned().collect();
    accessions.sort();
    for accession in accessions {
        let score = match &input.protein_probabilities {
            Some(probabilities) => probabilities.get(&accession).copied().unwrap_or(0.0),
            None => protein_scores[&accession],
        };
        let tier = classifier.tier(&accession);
        protein_buckets.entry(tier).or_default().push(AnnotatedProtein {
            status: classifier.status(&accession),
            tier,
            score,
            q_value: 1.0,
            accession,
        });
    }

    // Protein groups
    let mut group_buckets: BTreeMap<Tier, Vec<AnnotatedGroup>> = BTreeMap::new();
    for group in input.groups.unwrap_or_default() {
        let tiers: Vec<Tier> = group.accessions.iter().map(|a| classifier.tier(a)).collect();
        let Some(&tier) = tiers.first() else {
            continue;
        };
        let accessions: Vec<String> = group
            .accessions
            .into_iter()
            .zip(tiers)
            .filter_map(|(acc, t)| (t == tier).then_some(acc))
            .collect();
        group_buckets.entry(tier).or_default().push(AnnotatedGroup {
            status: classifier.status(&accessions[0]),
            accessions,
            tier,
            probability: group.probability,
            q_value: 1.0,
        });
    }

    let mut tiers: Vec<Tier> = psm_buckets
        .keys()
        .chain(protein_buckets.keys())
        .chain(group_buckets.keys())
        .copied()
        .collect();
    tiers.sort();
    tiers.dedup();

    let mut result = FdrResult {
        score,
        psms: Vec::new(),
        proteins: Vec::new(),
        groups: Vec::new(),
    };

    for tier in tiers {
        let mut psms = psm_buckets.remove(&tier).unwrap_or_default();
        let proteins = protein_buckets.remove(&tier).unwrap_or_default();
        let groups = group_buckets.remove(&tier).unwrap_or_default();
        tracing::info!(
            "Processing tier {}: {} PSMs, {} proteins, {} protein groups",
            tier,
            psms.len(),
            proteins.len(),
            groups.len()
        );

        let q = q_values(&psms.iter().map(|p| (p.score, p.status)).collect::<Vec<_>>());
        for (p, q) in psms.iter_mut().zip(q) {
            p.q_value = q;
        }

        let mut proteins = pick(
            proteins,
            |p| classifier.pair_key(&p.accession).to_string(),
            |p| p.status,
            |p| p.score,
        );
        let q = q_values(&proteins.iter().map(|p| (p.score, p.status)).collect::<Vec<_>>());
        for (p, q) in proteins.iter_mut().zip(q) {
            p.q_value = q;
        }

        let mut groups = pick(
            groups,
            |g| classifier.pair_key(&g.accessions[0]).to_string(),
            |g| g.status,
            |g| g.probability,
        );
        let q = q_values(&groups.iter().map(|g| (g.probability, g.status)).collect::<Vec<_>>());
        for (g, q) in groups.iter_mut().zip(q) {
            g.q_value = q;
        }

        result.psms.extend(psms);
        result.proteins.extend(proteins);
        result.groups.extend(groups);
    }

    Ok(result)
}
