//! Tag categorization: normalize, vectorize, cluster, label and merge back
//!
//! Every raw tag of every video is normalized into stemmed tokens. One
//! TF-IDF row is built per `(video, stem)` pair and clustered with k-means.
//! Identical stems always land in the same cluster, so a video row receives
//! the labels of its tag's stems, one output row per distinct label.

use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use std::time::Instant;
use tracing::{debug, info};

use crate::cluster::{ClusterLabels, ElbowPoint, KMeansResult, VideoClusterer};
use crate::config::Config;
use crate::dataset::{DatasetReader, DatasetWriter};
use crate::error::Result;
use crate::model::{NormalizedTagRow, VideoRecord};
use crate::normalize::TagNormalizer;
use crate::vectorize::{TagVectorizer, TfIdfMatrix};

/// Result of one categorization run
#[derive(Debug, Clone)]
pub struct CategorizationOutcome {
    /// Input rows with `category` filled in
    pub records: Vec<VideoRecord>,
    /// Normalized rows that were clustered, in matrix order
    pub tag_rows: Vec<NormalizedTagRow>,
    pub clustering: KMeansResult,
    pub labels: ClusterLabels,
}

impl CategorizationOutcome {
    /// Number of distinct categories assigned
    pub fn category_count(&self) -> usize {
        self.labels.labeled().count()
    }
}

/// Wires the normalizer, vectorizer and clusterer together
#[derive(Debug, Clone)]
pub struct CategorizationPipeline {
    normalizer: TagNormalizer,
    vectorizer: TagVectorizer,
    clusterer: VideoClusterer,
}

impl CategorizationPipeline {
    pub fn new(
        normalizer: TagNormalizer,
        vectorizer: TagVectorizer,
        clusterer: VideoClusterer,
    ) -> Self {
        Self {
            normalizer,
            vectorizer,
            clusterer,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            TagNormalizer::from_config(&config.normalizer),
            TagVectorizer::new(),
            VideoClusterer::from_config(&config.clustering),
        )
    }

    pub fn normalizer(&self) -> &TagNormalizer {
        &self.normalizer
    }

    /// One row per `(id, stem)`, keeping the first raw tag that produced it
    pub fn normalize_rows(&self, records: &[VideoRecord]) -> Vec<NormalizedTagRow> {
        let mut seen: HashSet<(&str, String)> = HashSet::new();
        let mut rows = Vec::new();

        for record in records {
            let Some(raw_tag) = record.tag.as_deref() else {
                continue;
            };
            for token in self.normalizer.normalize(raw_tag) {
                if !seen.insert((record.id.as_str(), token.stemmed.clone())) {
                    continue;
                }
                rows.push(NormalizedTagRow {
                    id: record.id.clone(),
                    raw_tag: raw_tag.to_string(),
                    processed_tag: token.processed,
                    stemmed_tag: token.stemmed,
                });
            }
        }
        rows
    }

    pub fn build_matrix(&self, rows: &[NormalizedTagRow]) -> Result<TfIdfMatrix> {
        let documents: Vec<&str> = rows.iter().map(|r| r.stemmed_tag.as_str()).collect();
        self.vectorizer.fit_transform(&documents)
    }

    /// Categorize `records` and return them with categories attached
    pub fn run(&self, records: Vec<VideoRecord>) -> Result<CategorizationOutcome> {
        let start_time = Instant::now();

        let tag_rows = self.normalize_rows(&records);
        info!(
            "🔤 Normalized {} rows into {} tag tokens",
            records.len(),
            tag_rows.len()
        );

        let matrix = self.build_matrix(&tag_rows)?;
        debug!(
            "TF-IDF matrix: {} rows x {} features",
            matrix.n_rows(),
            matrix.n_features()
        );

        let clustering = self.clusterer.cluster(&matrix)?;
        info!(
            "🧮 k-means with k={} finished after {} iterations (converged: {}, inertia {:.4})",
            self.clusterer.kmeans().k(),
            clustering.iterations,
            clustering.converged,
            clustering.inertia
        );

        let labels = self.clusterer.label(&tag_rows, &clustering);
        let records = merge_labels(records, &self.normalizer, &tag_rows, &clustering, &labels);

        info!(
            "🏷️ Categorized {} rows into {} categories in {:.2}s",
            records.len(),
            labels.labeled().count(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(CategorizationOutcome {
            records,
            tag_rows,
            clustering,
            labels,
        })
    }

    /// Read the whole dataset, categorize it and replace the writer's rows
    ///
    /// Nothing is written unless the run succeeds.
    pub fn categorize<R, W>(&self, reader: &R, writer: &mut W) -> Result<CategorizationOutcome>
    where
        R: DatasetReader + ?Sized,
        W: DatasetWriter + ?Sized,
    {
        let records = reader.load(&[])?;
        let outcome = self.run(records)?;
        writer.replace(&outcome.records)?;
        Ok(outcome)
    }

    /// Inertia curve over `ks` for choosing the cluster count offline
    pub fn elbow(&self, records: &[VideoRecord], ks: RangeInclusive<usize>) -> Result<Vec<ElbowPoint>> {
        let rows = self.normalize_rows(records);
        let matrix = self.build_matrix(&rows)?;
        self.clusterer.kmeans().elbow(&matrix, ks)
    }
}

/// Attach labels to every record whose raw tag produced a labeled stem
fn merge_labels(
    records: Vec<VideoRecord>,
    normalizer: &TagNormalizer,
    tag_rows: &[NormalizedTagRow],
    clustering: &KMeansResult,
    labels: &ClusterLabels,
) -> Vec<VideoRecord> {
    let mut label_by_stem: HashMap<&str, Option<&str>> = HashMap::new();
    for (row, code) in tag_rows.iter().zip(&clustering.assignments) {
        label_by_stem
            .entry(row.stemmed_tag.as_str())
            .or_insert_with(|| labels.label_for(*code));
    }

    let mut merged = Vec::with_capacity(records.len());
    for record in records {
        let mut categories: Vec<&str> = Vec::new();
        if let Some(raw_tag) = record.tag.as_deref() {
            for token in normalizer.normalize(raw_tag) {
                if let Some(Some(label)) = label_by_stem.get(token.stemmed.as_str()).copied() {
                    if !categories.contains(&label) {
                        categories.push(label);
                    }
                }
            }
        }

        if categories.is_empty() {
            merged.push(record.with_category(None));
        } else {
            for category in categories {
                merged.push(record.clone().with_category(Some(category)));
            }
        }
    }
    merged
}
