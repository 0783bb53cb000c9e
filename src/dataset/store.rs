//! JSON Lines dataset store on the local filesystem
//!
//! Each write produces one immutable part file under the kind's directory.
//! Part names carry a sequence number so reads return rows in write order,
//! followed by the MD5 digest of the part content.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{project_all, DatasetReader, DatasetWriter};
use crate::error::{AnalyzerError, Result};
use crate::model::{Column, VideoRecord};

const PART_EXTENSION: &str = "jsonl";
const STAGING_DIR: &str = ".staging";

/// Processed dataset kinds kept under the data root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Exploded rows straight out of preprocessing
    Preprocessed,
    /// Rows enriched with a category
    DataLake,
}

impl DatasetKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            DatasetKind::Preprocessed => "preprocessed",
            DatasetKind::DataLake => "datalake",
        }
    }
}

/// Store for one dataset kind under a data root
#[derive(Debug, Clone)]
pub struct JsonDatasetStore {
    root: PathBuf,
    kind: DatasetKind,
}

impl JsonDatasetStore {
    pub fn new(root: impl Into<PathBuf>, kind: DatasetKind) -> Self {
        Self {
            root: root.into(),
            kind,
        }
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    /// Directory holding this kind's part files
    pub fn dir(&self) -> PathBuf {
        self.root.join(self.kind.dir_name())
    }

    pub fn exists(&self) -> bool {
        self.dir().is_dir()
    }

    /// Part files in write order
    pub fn part_files(&self) -> Result<Vec<PathBuf>> {
        let dir = self.dir();
        if !dir.is_dir() {
            return Err(AnalyzerError::Dataset(format!(
                "No {} dataset found at {}",
                self.kind.dir_name(),
                dir.display()
            )));
        }

        let mut parts = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1) {
            let entry = entry.map_err(|e| AnalyzerError::Dataset(e.to_string()))?;
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(PART_EXTENSION)
            {
                parts.push(path.to_path_buf());
            }
        }
        parts.sort();
        Ok(parts)
    }

    /// Write `rows` as a new part file; nothing is written for an empty batch
    pub fn write_part(&self, rows: &[VideoRecord]) -> Result<Option<PathBuf>> {
        if rows.is_empty() {
            debug!("Skipping empty {} part", self.kind.dir_name());
            return Ok(None);
        }

        let dir = self.dir();
        fs::create_dir_all(&dir)?;

        let mut content = String::new();
        for row in rows {
            content.push_str(&serde_json::to_string(row)?);
            content.push('\n');
        }

        let sequence = self.part_files()?.len();
        let digest = md5::compute(content.as_bytes());
        let path = dir.join(format!("part-{:05}-{:x}.{}", sequence, digest, PART_EXTENSION));
        fs::write(&path, content)?;

        info!("💾 Wrote {} rows to {}", rows.len(), path.display());
        Ok(Some(path))
    }

    /// Replace every part with a single part holding `rows`
    ///
    /// The new part is written under a staging directory first and only
    /// swapped in once complete, so a failed write keeps the previous parts.
    pub fn replace_parts(&self, rows: &[VideoRecord]) -> Result<Option<PathBuf>> {
        let staging_root = self.root.join(STAGING_DIR);
        let staging = JsonDatasetStore::new(&staging_root, self.kind);
        staging.clear()?;

        let written = staging.write_part(rows)?;
        self.clear()?;
        if staging.exists() {
            fs::rename(staging.dir(), self.dir())?;
        }
        if staging_root.is_dir() {
            fs::remove_dir(&staging_root)?;
        }

        Ok(written.and_then(|path| path.file_name().map(|name| self.dir().join(name))))
    }

    /// Read every row of every part
    pub fn read_all(&self) -> Result<Vec<VideoRecord>> {
        let mut rows = Vec::new();
        for part in self.part_files()? {
            read_part(&part, &mut rows)?;
        }
        debug!("Loaded {} rows from {}", rows.len(), self.dir().display());
        Ok(rows)
    }

    /// Delete every part of this kind
    pub fn clear(&self) -> Result<()> {
        let dir = self.dir();
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
            info!("🗑️ Cleared {} dataset at {}", self.kind.dir_name(), dir.display());
        }
        Ok(())
    }
}

fn read_part(path: &Path, rows: &mut Vec<VideoRecord>) -> Result<()> {
    let reader = BufReader::new(fs::File::open(path)?);
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|e| {
            AnalyzerError::Dataset(format!("{}:{}: {}", path.display(), number + 1, e))
        })?;
        rows.push(row);
    }
    Ok(())
}

impl DatasetReader for JsonDatasetStore {
    fn load(&self, columns: &[Column]) -> Result<Vec<VideoRecord>> {
        Ok(project_all(self.read_all()?, columns))
    }
}

impl DatasetWriter for JsonDatasetStore {
    fn write(&mut self, rows: &[VideoRecord]) -> Result<()> {
        self.write_part(rows).map(|_| ())
    }

    fn replace(&mut self, rows: &[VideoRecord]) -> Result<()> {
        self.replace_parts(rows).map(|_| ())
    }
}
