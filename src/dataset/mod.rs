//! Dataset access used by the pipeline and the metrics service

pub mod store;

pub use store::{DatasetKind, JsonDatasetStore};

use crate::error::Result;
use crate::model::{Column, VideoRecord};

/// Source of exploded video rows
pub trait DatasetReader {
    /// Load every row, keeping only `columns` (all columns when empty)
    fn load(&self, columns: &[Column]) -> Result<Vec<VideoRecord>>;
}

/// Sink for exploded video rows
pub trait DatasetWriter {
    /// Append `rows` to the dataset
    fn write(&mut self, rows: &[VideoRecord]) -> Result<()>;

    /// Swap the whole dataset for `rows`; on error the previous rows stay readable
    fn replace(&mut self, rows: &[VideoRecord]) -> Result<()>;
}

impl<T: DatasetReader + ?Sized> DatasetReader for &T {
    fn load(&self, columns: &[Column]) -> Result<Vec<VideoRecord>> {
        (**self).load(columns)
    }
}

pub(crate) fn project_all(rows: impl IntoIterator<Item = VideoRecord>, columns: &[Column]) -> Vec<VideoRecord> {
    if columns.is_empty() {
        return rows.into_iter().collect();
    }
    rows.into_iter().map(|row| row.project(columns)).collect()
}

/// Rows held in memory, mostly for tests and one-off runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryDataset {
    rows: Vec<VideoRecord>,
}

impl InMemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<VideoRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[VideoRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<VideoRecord> {
        self.rows
    }
}

impl DatasetReader for InMemoryDataset {
    fn load(&self, columns: &[Column]) -> Result<Vec<VideoRecord>> {
        Ok(project_all(self.rows.iter().cloned(), columns))
    }
}

impl DatasetWriter for InMemoryDataset {
    fn write(&mut self, rows: &[VideoRecord]) -> Result<()> {
        self.rows.extend_from_slice(rows);
        Ok(())
    }

    fn replace(&mut self, rows: &[VideoRecord]) -> Result<()> {
        self.rows = rows.to_vec();
        Ok(())
    }
}
