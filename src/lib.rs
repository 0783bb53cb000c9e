/// Video Tag Analyzer - Rust Implementation
///
/// Categorizes online videos by clustering their free-text tags and computes
/// popularity, duration and engagement reports sliced by tag or category.

pub mod cluster;
pub mod config;
pub mod dataset;
pub mod duration;
pub mod error;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod preprocess;
pub mod report;
pub mod vectorize;

// Re-export main types for easy access
pub use crate::cluster::{ClusterLabels, KMeans, LabelPolicy, VideoClusterer};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::dataset::{DatasetKind, DatasetReader, DatasetWriter, InMemoryDataset, JsonDatasetStore};
pub use crate::duration::{format_iso8601, parse_duration, DurationParser};
pub use crate::error::{AnalyzerError, Result};
pub use crate::metrics::{
    Dimension, Measure, MeasureValue, MetricName, MetricRow, MetricSpec, MetricsAggregator,
    MetricsService, NullCategory, SortDirection,
};
pub use crate::model::{Column, NormalizedTagRow, Statistic, Statistics, VideoRecord};
pub use crate::normalize::{NormalizedToken, TagNormalizer};
pub use crate::pipeline::{CategorizationOutcome, CategorizationPipeline};
pub use crate::report::{sink_for, ExportFormat, Report, ReportSink, Sheet};
pub use crate::vectorize::{TagVectorizer, TfIdfMatrix};
