use std::path::PathBuf;
use tracing::{debug, info};

use super::aggregator::MetricsAggregator;
use super::registry::MetricName;
use crate::dataset::DatasetReader;
use crate::error::Result;
use crate::report::{Report, ReportSink, Sheet};

/// Runs named metrics against a dataset
pub struct MetricsService<R> {
    reader: R,
    aggregator: MetricsAggregator,
}

impl<R: DatasetReader> MetricsService<R> {
    pub fn new(reader: R, aggregator: MetricsAggregator) -> Self {
        Self { reader, aggregator }
    }

    pub fn aggregator(&self) -> &MetricsAggregator {
        &self.aggregator
    }

    /// Compute one metric by name
    pub fn compute_metric(&self, name: &str) -> Result<Sheet> {
        let metric: MetricName = name.parse()?;
        self.compute(metric)
    }

    fn compute(&self, metric: MetricName) -> Result<Sheet> {
        let spec = metric.spec();
        let rows = self.reader.load(&spec.required_columns())?;
        let output = self.aggregator.compute(&rows, &spec);
        debug!("{}: {} rows in, {} rows out", metric, rows.len(), output.len());

        Ok(Sheet {
            name: metric.as_str().to_string(),
            columns: spec.column_names().into_iter().map(str::to_string).collect(),
            rows: output,
        })
    }

    /// Compute several metrics; every name is checked before anything runs
    pub fn compute_metrics<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Sheet>> {
        MetricName::parse_all(names)?
            .into_iter()
            .map(|metric| self.compute(metric))
            .collect()
    }

    pub fn build_report<S: AsRef<str>>(&self, names: &[S], report_name: &str) -> Result<Report> {
        Ok(Report::new(report_name, self.compute_metrics(names)?))
    }

    /// Compute `names` and hand the report to `sink`
    pub fn export_metrics<S: AsRef<str>>(
        &self,
        names: &[S],
        sink: &dyn ReportSink,
        report_name: &str,
    ) -> Result<PathBuf> {
        let report = self.build_report(names, report_name)?;
        info!("📈 Exporting {} metrics as '{}'", report.sheets.len(), report_name);
        sink.write_report(&report)
    }
}
