/// Tag clustering into labeled categories
pub mod kmeans;
pub mod labeling;

pub use kmeans::{ElbowPoint, KMeans, KMeansResult};
pub use labeling::{label_clusters, ClusterLabel, ClusterLabels, LabelPolicy, LABEL_CANDIDATES};

use crate::config::ClusteringConfig;
use crate::error::Result;
use crate::model::NormalizedTagRow;
use crate::vectorize::TfIdfMatrix;

/// k-means partitioning plus the labeling heuristic
#[derive(Debug, Clone)]
pub struct VideoClusterer {
    kmeans: KMeans,
    policy: LabelPolicy,
}

impl VideoClusterer {
    pub fn new(kmeans: KMeans, policy: LabelPolicy) -> Self {
        Self { kmeans, policy }
    }

    pub fn from_config(config: &ClusteringConfig) -> Self {
        let kmeans = KMeans::new(config.clusters)
            .with_max_iterations(config.max_iterations)
            .with_tolerance(config.tolerance)
            .with_seed(config.seed);
        Self::new(kmeans, config.label_policy)
    }

    pub fn kmeans(&self) -> &KMeans {
        &self.kmeans
    }

    pub fn cluster(&self, matrix: &TfIdfMatrix) -> Result<KMeansResult> {
        self.kmeans.fit(matrix)
    }

    pub fn label(&self, rows: &[NormalizedTagRow], result: &KMeansResult) -> ClusterLabels {
        label_clusters(rows, &result.assignments, self.policy)
    }
}
