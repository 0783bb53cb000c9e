//! Dataset row types shared by the pipeline, the store and the aggregator

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalyzerError;

/// Engagement counters reported for a video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statistics {
    pub view_count: u64,
    pub like_count: u64,
    pub dislike_count: u64,
    pub favorite_count: u64,
    pub comment_count: u64,
}

impl Statistics {
    pub fn get(&self, statistic: Statistic) -> u64 {
        match statistic {
            Statistic::Views => self.view_count,
            Statistic::Likes => self.like_count,
            Statistic::Dislikes => self.dislike_count,
            Statistic::Favorites => self.favorite_count,
            Statistic::Comments => self.comment_count,
        }
    }
}

/// One of the five engagement counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Views,
    Likes,
    Dislikes,
    Favorites,
    Comments,
}

impl Statistic {
    pub const ALL: [Statistic; 5] = [
        Statistic::Views,
        Statistic::Likes,
        Statistic::Dislikes,
        Statistic::Favorites,
        Statistic::Comments,
    ];

    /// Column name used in reports
    pub fn column_name(&self) -> &'static str {
        match self {
            Statistic::Views => "view_count",
            Statistic::Likes => "like_count",
            Statistic::Dislikes => "dislike_count",
            Statistic::Favorites => "favorite_count",
            Statistic::Comments => "comment_count",
        }
    }
}

/// A single (video, tag) row of the exploded dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Stable video identifier
    pub id: String,

    /// Raw tag for this row; `None` for a video published without tags
    pub tag: Option<String>,

    /// Duration in seconds, identical on every row of the same video
    pub duration: u64,

    #[serde(default)]
    pub statistics: Statistics,

    /// Derived category, populated once by the categorization pipeline
    #[serde(default)]
    pub category: Option<String>,
}

impl VideoRecord {
    pub fn new(id: impl Into<String>, tag: Option<&str>, duration: u64) -> Self {
        Self {
            id: id.into(),
            tag: tag.map(str::to_string),
            duration,
            statistics: Statistics::default(),
            category: None,
        }
    }

    pub fn with_statistics(mut self, statistics: Statistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_category(mut self, category: Option<&str>) -> Self {
        self.category = category.map(str::to_string);
        self
    }

    /// Keep only the requested columns; `id` is always kept
    pub fn project(mut self, columns: &[Column]) -> Self {
        if !columns.contains(&Column::Tag) {
            self.tag = None;
        }
        if !columns.contains(&Column::Duration) {
            self.duration = 0;
        }
        if !columns.contains(&Column::Statistics) {
            self.statistics = Statistics::default();
        }
        if !columns.contains(&Column::Category) {
            self.category = None;
        }
        self
    }
}

/// Columns a dataset reader can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Id,
    Tag,
    Duration,
    Statistics,
    Category,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Id,
        Column::Tag,
        Column::Duration,
        Column::Statistics,
        Column::Category,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Tag => "tag",
            Column::Duration => "duration",
            Column::Statistics => "statistics",
            Column::Category => "category",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AnalyzerError::Dataset(format!("unknown column '{}'", s)))
    }
}

/// A normalized token extracted from one raw tag of one video
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedTagRow {
    pub id: String,
    pub raw_tag: String,
    pub processed_tag: String,
    pub stemmed_tag: String,
}
