use serde::{Deserialize, Serialize};

use crate::model::{Column, Statistic, VideoRecord};

/// Column a metric is grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Tag,
    Category,
}

impl Dimension {
    pub fn column(&self) -> Column {
        match self {
            Dimension::Tag => Column::Tag,
            Dimension::Category => Column::Category,
        }
    }

    pub fn column_name(&self) -> &'static str {
        self.column().as_str()
    }

    pub fn value<'a>(&self, record: &'a VideoRecord) -> Option<&'a str> {
        match self {
            Dimension::Tag => record.tag.as_deref(),
            Dimension::Category => record.category.as_deref(),
        }
    }
}

/// Aggregation applied to each group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    DistinctVideoCount,
    SumDuration,
    MeanDuration,
    SumStatistic(Statistic),
    /// All five statistics summed side by side
    Engagement,
}

impl Measure {
    /// Output column names, in output order
    pub fn column_names(&self) -> Vec<&'static str> {
        match self {
            Measure::DistinctVideoCount => vec!["n_videos"],
            Measure::SumDuration | Measure::MeanDuration => vec!["duration"],
            Measure::SumStatistic(statistic) => vec![statistic.column_name()],
            Measure::Engagement => Statistic::ALL.iter().map(|s| s.column_name()).collect(),
        }
    }

    /// Dataset columns needed besides `id` and the grouping columns
    pub fn required_columns(&self) -> Vec<Column> {
        match self {
            Measure::DistinctVideoCount => vec![],
            Measure::SumDuration | Measure::MeanDuration => vec![Column::Duration],
            Measure::SumStatistic(_) | Measure::Engagement => vec![Column::Statistics],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// How rows without a category are treated by category metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullCategory {
    /// Drop the rows, as a group-by on a missing key would
    #[default]
    Exclude,
    /// Report them under the given name
    Bucket(String),
}

/// A complete description of one metric computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSpec {
    pub dimension: Dimension,
    pub measure: Measure,
    /// `None` keeps the group order (ascending by key)
    pub sort: Option<SortDirection>,
    pub limit: Option<usize>,
    /// Keep only the first row per value of this dimension after sorting
    pub per_partition: Option<Dimension>,
}

impl MetricSpec {
    pub fn new(dimension: Dimension, measure: Measure) -> Self {
        Self {
            dimension,
            measure,
            sort: None,
            limit: None,
            per_partition: None,
        }
    }

    pub fn sorted(mut self, direction: SortDirection) -> Self {
        self.sort = Some(direction);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn per_partition(mut self, partition: Dimension) -> Self {
        self.per_partition = Some(partition);
        self
    }

    /// Header row for this metric's output
    pub fn column_names(&self) -> Vec<&'static str> {
        let mut columns = Vec::new();
        if let Some(partition) = self.per_partition {
            columns.push(partition.column_name());
        }
        columns.push(self.dimension.column_name());
        columns.extend(self.measure.column_names());
        columns
    }

    /// Columns to request from the dataset reader
    pub fn required_columns(&self) -> Vec<Column> {
        let mut columns = vec![Column::Id, self.dimension.column()];
        if let Some(partition) = self.per_partition {
            columns.push(partition.column());
        }
        columns.extend(self.measure.required_columns());
        columns.sort();
        columns.dedup();
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_names() {
        let spec = MetricSpec::new(Dimension::Tag, Measure::DistinctVideoCount);
        assert_eq!(spec.column_names(), vec!["tag", "n_videos"]);

        let spec = MetricSpec::new(Dimension::Tag, Measure::SumStatistic(Statistic::Views))
            .per_partition(Dimension::Category);
        assert_eq!(spec.column_names(), vec!["category", "tag", "view_count"]);

        let spec = MetricSpec::new(Dimension::Category, Measure::Engagement);
        assert_eq!(spec.column_names().len(), 6);
    }

    #[test]
    fn test_required_columns() {
        let spec = MetricSpec::new(Dimension::Category, Measure::MeanDuration);
        assert_eq!(
            spec.required_columns(),
            vec![Column::Id, Column::Duration, Column::Category]
        );

        let spec = MetricSpec::new(Dimension::Tag, Measure::Engagement)
            .per_partition(Dimension::Category);
        assert_eq!(
            spec.required_columns(),
            vec![Column::Id, Column::Tag, Column::Statistics, Column::Category]
        );
    }
}
