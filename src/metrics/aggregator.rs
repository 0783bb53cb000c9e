use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use super::spec::{Dimension, Measure, MetricSpec, NullCategory, SortDirection};
use crate::model::{Statistic, Statistics, VideoRecord};

/// A single aggregated number
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MeasureValue {
    Integer(u64),
    Float(f64),
}

impl MeasureValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MeasureValue::Integer(v) => *v as f64,
            MeasureValue::Float(v) => *v,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (MeasureValue::Integer(a), MeasureValue::Integer(b)) => a.cmp(b),
            _ => self.as_f64().total_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for MeasureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureValue::Integer(v) => write!(f, "{}", v),
            MeasureValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// One output row of a metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub partition: Option<String>,
    pub dimension: String,
    /// Values in the order of [`Measure::column_names`]
    pub values: Vec<MeasureValue>,
}

impl MetricRow {
    /// The value rows are sorted by
    pub fn value(&self) -> MeasureValue {
        self.values[0]
    }

    /// Rendered cells in header order
    pub fn cells(&self) -> Vec<String> {
        self.partition
            .iter()
            .cloned()
            .chain(std::iter::once(self.dimension.clone()))
            .chain(self.values.iter().map(ToString::to_string))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MeasuredValue {
    Nothing,
    Duration(u64),
    Statistics(Statistics),
}

#[derive(Default)]
struct Accumulator<'a> {
    ids: HashSet<&'a str>,
    rows: u64,
    duration: u64,
    statistics: [u64; 5],
}

impl<'a> Accumulator<'a> {
    fn add(&mut self, record: &'a VideoRecord) {
        self.ids.insert(record.id.as_str());
        self.rows += 1;
        self.duration = self.duration.saturating_add(record.duration);
        for (total, statistic) in self.statistics.iter_mut().zip(Statistic::ALL) {
            *total = total.saturating_add(record.statistics.get(statistic));
        }
    }

    fn values(&self, measure: Measure) -> Vec<MeasureValue> {
        match measure {
            Measure::DistinctVideoCount => vec![MeasureValue::Integer(self.ids.len() as u64)],
            Measure::SumDuration => vec![MeasureValue::Integer(self.duration)],
            Measure::MeanDuration => {
                vec![MeasureValue::Float(self.duration as f64 / self.rows as f64)]
            }
            Measure::SumStatistic(statistic) => {
                let index = Statistic::ALL
                    .iter()
                    .position(|s| *s == statistic)
                    .unwrap_or(0);
                vec![MeasureValue::Integer(self.statistics[index])]
            }
            Measure::Engagement => self
                .statistics
                .iter()
                .map(|v| MeasureValue::Integer(*v))
                .collect(),
        }
    }
}

/// Group-by / aggregate / sort / limit engine behind every report
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    null_category: NullCategory,
}

impl MetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_null_category(mut self, policy: NullCategory) -> Self {
        self.null_category = policy;
        self
    }

    fn key_of<'a>(&'a self, dimension: Dimension, record: &'a VideoRecord) -> Option<&'a str> {
        match (dimension.value(record), dimension, &self.null_category) {
            (Some(value), _, _) => Some(value),
            (None, Dimension::Category, NullCategory::Bucket(name)) => Some(name.as_str()),
            (None, _, _) => None,
        }
    }

    /// Compute one metric over an exploded (one row per tag) dataset
    pub fn compute(&self, rows: &[VideoRecord], spec: &MetricSpec) -> Vec<MetricRow> {
        let mut seen: HashSet<(&str, Option<&str>, &str, MeasuredValue)> = HashSet::new();
        let mut groups: BTreeMap<(Option<&str>, &str), Accumulator> = BTreeMap::new();

        for record in rows {
            let Some(key) = self.key_of(spec.dimension, record) else {
                continue;
            };
            let partition = match spec.per_partition {
                Some(dimension) => match self.key_of(dimension, record) {
                    Some(value) => Some(value),
                    None => continue,
                },
                None => None,
            };

            let measured = match spec.measure {
                Measure::DistinctVideoCount => MeasuredValue::Nothing,
                Measure::SumDuration | Measure::MeanDuration => {
                    MeasuredValue::Duration(record.duration)
                }
                Measure::SumStatistic(_) | Measure::Engagement => {
                    MeasuredValue::Statistics(record.statistics)
                }
            };
            if !seen.insert((record.id.as_str(), partition, key, measured)) {
                continue;
            }

            groups.entry((partition, key)).or_default().add(record);
        }

        let mut output: Vec<MetricRow> = groups
            .into_iter()
            .map(|((partition, key), accumulator)| MetricRow {
                partition: partition.map(str::to_string),
                dimension: key.to_string(),
                values: accumulator.values(spec.measure),
            })
            .collect();

        match spec.sort {
            Some(SortDirection::Ascending) => {
                output.sort_by(|a, b| a.value().compare(&b.value()))
            }
            Some(SortDirection::Descending) => {
                output.sort_by(|a, b| b.value().compare(&a.value()))
            }
            None => {}
        }

        if spec.per_partition.is_some() {
            let mut kept: HashSet<Option<String>> = HashSet::new();
            output.retain(|row| kept.insert(row.partition.clone()));
        }
        if let Some(limit) = spec.limit {
            output.truncate(limit);
        }

        output
    }
}
