/// Dimensional metrics over the exploded video dataset
pub mod aggregator;
pub mod registry;
pub mod service;
pub mod spec;

pub use aggregator::{MeasureValue, MetricRow, MetricsAggregator};
pub use registry::MetricName;
pub use service::MetricsService;
pub use spec::{Dimension, Measure, MetricSpec, NullCategory, SortDirection};
