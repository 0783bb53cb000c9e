//! Report assembly and the file sinks that write it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::error::{AnalyzerError, Result};
use crate::metrics::{MeasureValue, MetricRow};

/// One metric table
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<MetricRow>,
}

impl Sheet {
    fn json_rows(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Value> = Vec::with_capacity(self.columns.len());
                if let Some(partition) = &row.partition {
                    cells.push(Value::from(partition.as_str()));
                }
                cells.push(Value::from(row.dimension.as_str()));
                cells.extend(row.values.iter().map(|v| match v {
                    MeasureValue::Integer(n) => Value::from(*n),
                    MeasureValue::Float(f) => Value::from(*f),
                }));
                Value::Array(cells)
            })
            .collect()
    }
}

/// A set of metric tables produced together
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub name: String,
    pub generated_at: DateTime<Utc>,
    pub sheets: Vec<Sheet>,
}

impl Report {
    pub fn new(name: impl Into<String>, sheets: Vec<Sheet>) -> Self {
        Self {
            name: name.into(),
            generated_at: Utc::now(),
            sheets,
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "generated_at": self.generated_at.to_rfc3339(),
            "sheets": self.sheets.iter().map(|sheet| json!({
                "name": sheet.name,
                "columns": sheet.columns,
                "rows": sheet.json_rows(),
            })).collect::<Vec<_>>(),
        })
    }
}

/// Output formats for exported reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "markdown",
        }
    }

    /// Default output path for a report called `name` under `dir`
    pub fn output_path(&self, dir: &Path, name: &str) -> PathBuf {
        match self {
            ExportFormat::Json => dir.join(format!("{}.json", name)),
            ExportFormat::Csv => dir.join(name),
            ExportFormat::Markdown => dir.join(format!("{}.md", name)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            other => Err(AnalyzerError::Config(format!(
                "unknown export format '{}'",
                other
            ))),
        }
    }
}

/// Destination for a finished report
pub trait ReportSink {
    /// Write the report and return where it went
    fn write_report(&self, report: &Report) -> Result<PathBuf>;
}

/// Whole report as one JSON document
#[derive(Debug, Clone)]
pub struct JsonReportSink {
    path: PathBuf,
}

impl JsonReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for JsonReportSink {
    fn write_report(&self, report: &Report) -> Result<PathBuf> {
        ensure_parent(&self.path)?;
        fs::write(&self.path, serde_json::to_string_pretty(&report.to_json())?)?;
        info!("📊 Report '{}' written to {}", report.name, self.path.display());
        Ok(self.path.clone())
    }
}

/// One CSV file per sheet inside a directory
#[derive(Debug, Clone)]
pub struct CsvReportSink {
    dir: PathBuf,
}

impl CsvReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_line<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

impl ReportSink for CsvReportSink {
    fn write_report(&self, report: &Report) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        for sheet in &report.sheets {
            let mut content = csv_line(&sheet.columns);
            for row in &sheet.rows {
                content.push_str(&csv_line(&row.cells()));
            }
            fs::write(self.dir.join(format!("{}.csv", sheet.name)), content)?;
        }
        info!(
            "📊 Report '{}' written to {} ({} sheets)",
            report.name,
            self.dir.display(),
            report.sheets.len()
        );
        Ok(self.dir.clone())
    }
}

/// One Markdown file with a table per sheet
#[derive(Debug, Clone)]
pub struct MarkdownReportSink {
    path: PathBuf,
}

impl MarkdownReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn markdown_row<S: AsRef<str>>(cells: &[S]) -> String {
    let cells: Vec<String> = cells
        .iter()
        .map(|c| c.as_ref().replace('|', "\\|"))
        .collect();
    format!("| {} |\n", cells.join(" | "))
}

impl ReportSink for MarkdownReportSink {
    fn write_report(&self, report: &Report) -> Result<PathBuf> {
        let mut content = format!(
            "# {}\n\nGenerated at {}\n",
            report.name,
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        for sheet in &report.sheets {
            content.push_str(&format!("\n## {}\n\n", sheet.name));
            content.push_str(&markdown_row(&sheet.columns));
            content.push_str(&markdown_row(&vec!["---"; sheet.columns.len()]));
            for row in &sheet.rows {
                content.push_str(&markdown_row(&row.cells()));
            }
        }

        ensure_parent(&self.path)?;
        fs::write(&self.path, content)?;
        info!("📊 Report '{}' written to {}", report.name, self.path.display());
        Ok(self.path.clone())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Sink writing `format` to `output`
pub fn sink_for(format: ExportFormat, output: impl Into<PathBuf>) -> Box<dyn ReportSink> {
    match format {
        ExportFormat::Json => Box::new(JsonReportSink::new(output)),
        ExportFormat::Csv => Box::new(CsvReportSink::new(output)),
        ExportFormat::Markdown => Box::new(MarkdownReportSink::new(output)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn report() -> Report {
        Report::new(
            "weekly",
            vec![
                Sheet {
                    name: "videos_per_tag".to_string(),
                    columns: vec!["tag".to_string(), "n_videos".to_string()],
                    rows: vec![
                        MetricRow {
                            partition: None,
                            dimension: "rust, cargo".to_string(),
                            values: vec![MeasureValue::Integer(3)],
                        },
                        MetricRow {
                            partition: None,
                            dimension: "go".to_string(),
                            values: vec![MeasureValue::Integer(1)],
                        },
                    ],
                },
                Sheet {
                    name: "avg_video_duration_per_tag".to_string(),
                    columns: vec!["tag".to_string(), "duration".to_string()],
                    rows: vec![MetricRow {
                        partition: None,
                        dimension: "go".to_string(),
                        values: vec![MeasureValue::Float(90.5)],
                    }],
                },
            ],
        )
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_json_sink() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("weekly.json");
        let written = JsonReportSink::new(&path).write_report(&report()).unwrap();
        assert_eq!(written, path);

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["name"], "weekly");
        assert_eq!(value["sheets"][0]["columns"], json!(["tag", "n_videos"]));
        assert_eq!(value["sheets"][0]["rows"][0], json!(["rust, cargo", 3]));
        assert_eq!(value["sheets"][1]["rows"][0][1], json!(90.5));
    }

    #[test]
    fn test_csv_sink_writes_one_file_per_sheet() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("weekly");
        sink_for(ExportFormat::Csv, &dir).write_report(&report()).unwrap();

        let content = fs::read_to_string(dir.join("videos_per_tag.csv")).unwrap();
        assert_eq!(content, "tag,n_videos\n\"rust, cargo\",3\ngo,1\n");
        assert!(dir.join("avg_video_duration_per_tag.csv").exists());
    }

    #[test]
    fn test_markdown_sink() {
        let temp_dir = TempDir::new().unwrap();
        let path = ExportFormat::Markdown.output_path(temp_dir.path(), "weekly");
        sink_for(ExportFormat::Markdown, &path).write_report(&report()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# weekly\n"));
        assert!(content.contains("## videos_per_tag\n\n| tag | n_videos |\n| --- | --- |\n| rust, cargo | 3 |\n| go | 1 |\n"));
        assert!(content.contains("| go | 90.5 |"));
    }
}
