use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cluster::LabelPolicy;
use crate::duration::DurationParser;
use crate::metrics::NullCategory;
use crate::report::ExportFormat;

/// Configuration for the Video Tag Analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dataset location and preprocessing settings
    pub dataset: DatasetConfig,

    /// Tag normalization settings
    pub normalizer: NormalizerConfig,

    /// k-means and labeling settings
    pub clustering: ClusteringConfig,

    /// Metric computation settings
    pub metrics: MetricsConfig,

    /// Report export settings
    pub report: ReportConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Root directory for the preprocessed and data lake datasets
    pub data_dir: PathBuf,

    /// Reject durations with trailing input instead of ignoring it
    pub strict_durations: bool,

    /// Tag given to videos published without tags (`None` keeps them untagged)
    pub untagged_marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Strip characters outside `[A-Za-z0-9]` before other filters
    pub ascii_filter: bool,

    /// Tokens dropped after normalization, e.g. the search keyword
    pub excluded_tags: Vec<String>,

    /// Words treated as stopwords on top of the English list
    pub extra_stopwords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Number of categories (k)
    pub clusters: usize,

    pub max_iterations: usize,

    /// Convergence threshold on total squared centroid movement
    pub tolerance: f64,

    /// Seed for centroid initialization
    pub seed: u64,

    pub label_policy: LabelPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Treatment of rows whose category is missing
    pub null_category: NullCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ExportFormat,

    /// Directory reports are written to
    pub output_dir: PathBuf,

    /// Report name used when none is given
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            strict_durations: false,
            untagged_marker: None,
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            ascii_filter: true,
            excluded_tags: Vec::new(),
            extra_stopwords: Vec::new(),
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            clusters: 8,
            max_iterations: 300,
            tolerance: 1e-4,
            seed: 42,
            label_policy: LabelPolicy::TopCandidates,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            null_category: NullCategory::Exclude,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Json,
            output_dir: PathBuf::from("./reports"),
            file_name: "metrics".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            normalizer: NormalizerConfig::default(),
            clustering: ClusteringConfig::default(),
            metrics: MetricsConfig::default(),
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DatasetConfig {
    pub fn duration_parser(&self) -> DurationParser {
        if self.strict_durations {
            DurationParser::strict()
        } else {
            DurationParser::new()
        }
    }
}

impl Config {
    /// Load configuration from the first readable config file, then apply
    /// environment overrides
    pub fn load() -> Result<Self> {
        let config_paths = [
            "video-tag-analyzer.toml",
            "config/video-tag-analyzer.toml",
            "/etc/video-tag-analyzer/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return config.apply_env();
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read config file {}: {}", path, e))?;
        let config: Config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        tracing::info!("📄 Loaded configuration from: {}", path);
        config.apply_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env()
    }

    /// Override fields with `VTA_*` environment variables
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(data_dir) = std::env::var("VTA_DATA_DIR") {
            self.dataset.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(clusters) = std::env::var("VTA_CLUSTERS") {
            self.clustering.clusters = clusters
                .parse()
                .map_err(|e| anyhow!("Invalid VTA_CLUSTERS '{}': {}", clusters, e))?;
        }

        if let Ok(seed) = std::env::var("VTA_SEED") {
            self.clustering.seed = seed
                .parse()
                .map_err(|e| anyhow!("Invalid VTA_SEED '{}': {}", seed, e))?;
        }

        if let Ok(log_level) = std::env::var("VTA_LOG_LEVEL") {
            self.logging.level = log_level;
        }

        if let Ok(excluded) = std::env::var("VTA_EXCLUDED_TAGS") {
            self.normalizer.excluded_tags = excluded
                .split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
        }

        Ok(self)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.clustering.clusters == 0 {
            return Err(anyhow!("clusters must be greater than 0"));
        }

        if self.clustering.max_iterations == 0 {
            return Err(anyhow!("max_iterations must be greater than 0"));
        }

        if !self.clustering.tolerance.is_finite() || self.clustering.tolerance < 0.0 {
            return Err(anyhow!("tolerance must be a non-negative number"));
        }

        if let NullCategory::Bucket(name) = &self.metrics.null_category {
            if name.trim().is_empty() {
                return Err(anyhow!("null category bucket needs a name"));
            }
        }

        if self.report.file_name.trim().is_empty() {
            return Err(anyhow!("report file_name must not be empty"));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Video Tag Analyzer Configuration:\n\
            - Data Directory: {}\n\
            - Strict Durations: {}\n\
            - Excluded Tags: {}\n\
            - Clusters: {} (seed {}, max {} iterations)\n\
            - Label Policy: {:?}\n\
            - Null Category: {:?}\n\
            - Report: {} in {}",
            self.dataset.data_dir.display(),
            self.dataset.strict_durations,
            if self.normalizer.excluded_tags.is_empty() {
                "none".to_string()
            } else {
                self.normalizer.excluded_tags.join(", ")
            },
            self.clustering.clusters,
            self.clustering.seed,
            self.clustering.max_iterations,
            self.clustering.label_policy,
            self.metrics.null_category,
            self.report.format,
            self.report.output_dir.display()
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.config.dataset.data_dir = dir;
        self
    }

    pub fn with_clusters(mut self, clusters: usize) -> Self {
        self.config.clustering.clusters = clusters;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.clustering.seed = seed;
        self
    }

    pub fn with_excluded_tags(mut self, tags: Vec<String>) -> Self {
        self.config.normalizer.excluded_tags = tags;
        self
    }

    pub fn with_label_policy(mut self, policy: LabelPolicy) -> Self {
        self.config.clustering.label_policy = policy;
        self
    }

    pub fn with_null_category(mut self, policy: NullCategory) -> Self {
        self.config.metrics.null_category = policy;
        self
    }

    pub fn with_report_format(mut self, format: ExportFormat) -> Self {
        self.config.report.format = format;
        self
    }

    pub fn strict_durations(mut self, strict: bool) -> Self {
        self.config.dataset.strict_durations = strict;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.clustering.clusters, 8);
        assert_eq!(config.clustering.seed, 42);
        assert!(config.normalizer.ascii_filter);
        assert!(!config.dataset.strict_durations);
        assert_eq!(config.metrics.null_category, NullCategory::Exclude);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_clusters(12)
            .with_seed(7)
            .with_excluded_tags(vec!["python".to_string()])
            .strict_durations(true)
            .build();

        assert_eq!(config.clustering.clusters, 12);
        assert_eq!(config.clustering.seed, 7);
        assert_eq!(config.normalizer.excluded_tags, vec!["python"]);
        assert!(config.dataset.duration_parser().is_strict());
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());
        assert!(ConfigBuilder::new().with_clusters(0).build().validate().is_err());
        assert!(ConfigBuilder::new()
            .with_null_category(NullCategory::Bucket(" ".to_string()))
            .build()
            .validate()
            .is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [clustering]
            clusters = 5
            label_policy = "exhaustive"

            [metrics]
            null_category = { bucket = "uncategorized" }

            [report]
            format = "csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.clustering.clusters, 5);
        assert_eq!(config.clustering.seed, 42);
        assert_eq!(config.clustering.label_policy, LabelPolicy::Exhaustive);
        assert_eq!(
            config.metrics.null_category,
            NullCategory::Bucket("uncategorized".to_string())
        );
        assert_eq!(config.report.format, ExportFormat::Csv);
        assert_eq!(config.dataset, DatasetConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("video-tag-analyzer.toml");
        let path = path.to_str().unwrap();

        let config = ConfigBuilder::new()
            .with_clusters(3)
            .with_label_policy(LabelPolicy::Exhaustive)
            .build();
        config.save(path).unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let reloaded: Config = toml::from_str(&content).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_summary_mentions_clusters() {
        let summary = ConfigBuilder::new().with_clusters(6).build().summary();
        assert!(summary.contains("Clusters: 6"));
        assert!(summary.contains("Excluded Tags: none"));
    }
}
