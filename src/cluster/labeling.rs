//! Human-readable labels for k-means clusters
//!
//! Clusters are visited in the order their code first appears in the row
//! assignments. Each cluster ranks its `processed_tag` values by the number
//! of distinct videos carrying them (ties keep the tag's first appearance in
//! the input) and claims the first candidate no earlier cluster has claimed.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::error::AnalyzerError;
use crate::model::NormalizedTagRow;

/// Number of ranked tags a cluster may draw its label from
pub const LABEL_CANDIDATES: usize = 4;

/// What to do when every top candidate is already taken
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Only the top candidates are considered; the cluster stays unlabeled
    #[default]
    TopCandidates,
    /// Keep walking the full ranking before giving up
    Exhaustive,
}

/// Label decision for one cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLabel {
    pub code: usize,
    pub label: Option<String>,
    /// Candidates considered, best first
    pub candidates: Vec<String>,
}

/// Labels for one clustering run, in visiting order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterLabels {
    clusters: Vec<ClusterLabel>,
}

impl ClusterLabels {
    pub fn clusters(&self) -> &[ClusterLabel] {
        &self.clusters
    }

    pub fn label_for(&self, code: usize) -> Option<&str> {
        self.clusters
            .iter()
            .find(|c| c.code == code)
            .and_then(|c| c.label.as_deref())
    }

    pub fn labeled(&self) -> impl Iterator<Item = (usize, &str)> {
        self.clusters
            .iter()
            .filter_map(|c| c.label.as_deref().map(|label| (c.code, label)))
    }

    /// Advisory errors for clusters left without a label
    pub fn ambiguous(&self) -> Vec<AnalyzerError> {
        self.clusters
            .iter()
            .filter(|c| c.label.is_none())
            .map(|c| AnalyzerError::AmbiguousLabel {
                code: c.code,
                candidates: c.candidates.clone(),
            })
            .collect()
    }
}

/// Labels claimed so far in a labeling pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedLabels(HashSet<String>);

impl UsedLabels {
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Claim the first unused candidate, returning the updated set
pub fn claim_label(candidates: &[String], mut used: UsedLabels) -> (Option<String>, UsedLabels) {
    match candidates.iter().find(|c| !used.contains(c)) {
        Some(label) => {
            used.0.insert(label.clone());
            (Some(label.clone()), used)
        }
        None => (None, used),
    }
}

/// Rank a cluster's tags by distinct video count, stable on first appearance
pub fn rank_tags<'a>(
    members: impl IntoIterator<Item = &'a NormalizedTagRow>,
    first_seen: &HashMap<&str, usize>,
) -> Vec<String> {
    let mut videos: HashMap<&str, HashSet<&str>> = HashMap::new();
    for row in members {
        videos
            .entry(row.processed_tag.as_str())
            .or_default()
            .insert(row.id.as_str());
    }

    let mut ranked: Vec<(&str, usize)> = videos
        .into_iter()
        .map(|(tag, ids)| (tag, ids.len()))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| first_seen.get(a.0).cmp(&first_seen.get(b.0)))
    });
    ranked.into_iter().map(|(tag, _)| tag.to_string()).collect()
}

/// Assign labels to the clusters of `assignments` (one code per row)
pub fn label_clusters(
    rows: &[NormalizedTagRow],
    assignments: &[usize],
    policy: LabelPolicy,
) -> ClusterLabels {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut visit_order: Vec<usize> = Vec::new();
    let mut members: HashMap<usize, Vec<&NormalizedTagRow>> = HashMap::new();

    for (index, (row, code)) in rows.iter().zip(assignments).enumerate() {
        first_seen.entry(row.processed_tag.as_str()).or_insert(index);
        let cluster = members.entry(*code).or_insert_with(|| {
            visit_order.push(*code);
            Vec::new()
        });
        cluster.push(row);
    }

    let (clusters, _) = visit_order.into_iter().fold(
        (Vec::new(), UsedLabels::default()),
        |(mut clusters, used), code| {
            let mut candidates = rank_tags(members[&code].iter().copied(), &first_seen);
            if policy == LabelPolicy::TopCandidates {
                candidates.truncate(LABEL_CANDIDATES);
            }

            let (label, used) = claim_label(&candidates, used);
            if label.is_none() {
                warn!(
                    "⚠️ Cluster {} left unlabeled, candidates already taken: {:?}",
                    code, candidates
                );
            }
            clusters.push(ClusterLabel {
                code,
                label,
                candidates,
            });
            (clusters, used)
        },
    );

    ClusterLabels { clusters }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, tag: &str) -> NormalizedTagRow {
        NormalizedTagRow {
            id: id.to_string(),
            raw_tag: tag.to_string(),
            processed_tag: tag.to_string(),
            stemmed_tag: tag.to_string(),
        }
    }

    #[test]
    fn test_rank_by_distinct_videos() {
        let rows = vec![
            row("v1", "rust"),
            row("v1", "rust"),
            row("v1", "cargo"),
            row("v2", "cargo"),
            row("v3", "cargo"),
            row("v2", "rust"),
        ];
        let first_seen: HashMap<&str, usize> = [("rust", 0), ("cargo", 2)].into_iter().collect();
        assert_eq!(rank_tags(&rows, &first_seen), vec!["cargo", "rust"]);
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let rows = vec![row("v1", "zeta"), row("v2", "alpha"), row("v3", "mid")];
        let assignments = vec![0, 0, 0];
        let labels = label_clusters(&rows, &assignments, LabelPolicy::TopCandidates);
        assert_eq!(labels.clusters()[0].candidates, vec!["zeta", "alpha", "mid"]);
        assert_eq!(labels.label_for(0), Some("zeta"));
    }

    #[test]
    fn test_visit_order_is_first_encountered_not_numeric() {
        // Cluster 2 appears first and wins the contested "python" label
        let rows = vec![
            row("v1", "python"),
            row("v2", "python"),
            row("v3", "python"),
            row("v4", "snake"),
        ];
        let assignments = vec![2, 0, 0, 0];
        let labels = label_clusters(&rows, &assignments, LabelPolicy::TopCandidates);

        let order: Vec<usize> = labels.clusters().iter().map(|c| c.code).collect();
        assert_eq!(order, vec![2, 0]);
        assert_eq!(labels.label_for(2), Some("python"));
        assert_eq!(labels.label_for(0), Some("snake"));
    }

    #[test]
    fn test_labels_are_unique() {
        let rows = vec![
            row("v1", "a"), row("v1", "b"), row("v1", "c"), row("v1", "d"),
            row("v2", "a"), row("v2", "b"), row("v2", "c"), row("v2", "d"),
            row("v3", "a"), row("v3", "b"), row("v3", "c"), row("v3", "d"),
        ];
        let assignments = vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2];
        let labels = label_clusters(&rows, &assignments, LabelPolicy::TopCandidates);

        let assigned: Vec<&str> = labels.labeled().map(|(_, l)| l).collect();
        assert_eq!(assigned, vec!["a", "b", "c"]);
        let unique: HashSet<&str> = assigned.iter().copied().collect();
        assert_eq!(unique.len(), assigned.len());
    }

    #[test]
    fn test_exhausted_candidates_leave_cluster_unlabeled() {
        let mut rows = Vec::new();
        let mut assignments = Vec::new();
        for code in 0..5 {
            for tag in ["a", "b", "c", "d", "e"] {
                rows.push(row(&format!("v{code}"), tag));
                assignments.push(code);
            }
        }

        let top = label_clusters(&rows, &assignments, LabelPolicy::TopCandidates);
        assert_eq!(top.label_for(3), Some("d"));
        assert_eq!(top.label_for(4), None);
        assert_eq!(top.clusters()[4].candidates.len(), LABEL_CANDIDATES);
        let ambiguous = top.ambiguous();
        assert_eq!(ambiguous.len(), 1);
        assert!(matches!(ambiguous[0], AnalyzerError::AmbiguousLabel { code: 4, .. }));

        let exhaustive = label_clusters(&rows, &assignments, LabelPolicy::Exhaustive);
        assert_eq!(exhaustive.label_for(4), Some("e"));
        assert!(exhaustive.ambiguous().is_empty());
    }

    #[test]
    fn test_claim_label_threads_used_set() {
        let candidates = vec!["x".to_string(), "y".to_string()];
        let (first, used) = claim_label(&candidates, UsedLabels::default());
        let (second, used) = claim_label(&candidates, used);
        let (third, used) = claim_label(&candidates, used);

        assert_eq!(first.as_deref(), Some("x"));
        assert_eq!(second.as_deref(), Some("y"));
        assert_eq!(third, None);
        assert_eq!(used.len(), 2);
    }
}
