//! Raw `videos.list` responses to exploded video rows

use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::duration::DurationParser;
use crate::error::{AnalyzerError, Result};
use crate::model::{Statistics, VideoRecord};

/// One page of a `videos.list` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<RawVideo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVideo {
    pub id: String,
    #[serde(default)]
    pub snippet: RawSnippet,
    pub content_details: Option<RawContentDetails>,
    #[serde(default)]
    pub statistics: RawStatistics,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSnippet {
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawContentDetails {
    pub duration: String,
}

/// Counters arrive as decimal strings, occasionally as plain numbers
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStatistics {
    #[serde(default, deserialize_with = "counter")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "counter")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "counter")]
    pub dislike_count: u64,
    #[serde(default, deserialize_with = "counter")]
    pub favorite_count: u64,
    #[serde(default, deserialize_with = "counter")]
    pub comment_count: u64,
}

impl From<&RawStatistics> for Statistics {
    fn from(raw: &RawStatistics) -> Self {
        Statistics {
            view_count: raw.view_count,
            like_count: raw.like_count,
            dislike_count: raw.dislike_count,
            favorite_count: raw.favorite_count,
            comment_count: raw.comment_count,
        }
    }
}

fn counter<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Counter {
        Number(u64),
        Text(String),
    }

    match Option::<Counter>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Counter::Number(n)) => Ok(n),
        Some(Counter::Text(text)) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Read one response file, or every `.json` file under a directory
pub fn load_video_responses(path: &Path) -> Result<Vec<VideoListResponse>> {
    let files: Vec<PathBuf> = if path.is_dir() {
        let mut files = Vec::new();
        for entry in WalkDir::new(path).min_depth(1) {
            let entry = entry.map_err(|e| AnalyzerError::Dataset(e.to_string()))?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("json")
            {
                files.push(entry.into_path());
            }
        }
        files.sort();
        files
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        return Err(AnalyzerError::Dataset(format!(
            "Input path does not exist: {}",
            path.display()
        )));
    };

    let mut responses = Vec::with_capacity(files.len());
    for file in &files {
        let content = fs::read_to_string(file)?;
        let response: VideoListResponse = serde_json::from_str(&content).map_err(|e| {
            AnalyzerError::Dataset(format!("{}: {}", file.display(), e))
        })?;
        debug!("📄 {} videos in {}", response.items.len(), file.display());
        responses.push(response);
    }

    info!("📥 Loaded {} response files from {}", files.len(), path.display());
    Ok(responses)
}

/// Explode videos into one row per tag with parsed durations
///
/// Repeated `(id, tag)` pairs are kept once. A video without tags becomes a
/// single row tagged `untagged_marker`, or `None` when no marker is given.
pub fn explode_videos(
    responses: &[VideoListResponse],
    parser: &DurationParser,
    untagged_marker: Option<&str>,
) -> Result<Vec<VideoRecord>> {
    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    let mut rows = Vec::new();
    let mut untagged = 0usize;

    for video in responses.iter().flat_map(|r| &r.items) {
        let duration = match &video.content_details {
            Some(details) => parser.parse(&details.duration)?,
            None => {
                warn!("⚠️ Video {} has no content details, duration set to 0", video.id);
                0
            }
        };
        let statistics = Statistics::from(&video.statistics);

        let tags: Vec<Option<&str>> = if video.snippet.tags.is_empty() {
            untagged += 1;
            vec![untagged_marker]
        } else {
            video.snippet.tags.iter().map(|t| Some(t.as_str())).collect()
        };

        for tag in tags {
            if !seen.insert((video.id.clone(), tag.map(str::to_string))) {
                continue;
            }
            rows.push(VideoRecord::new(video.id.as_str(), tag, duration).with_statistics(statistics));
        }
    }

    info!(
        "🏷️ Exploded {} videos into {} rows ({} without tags)",
        seen.iter().map(|(id, _)| id).collect::<HashSet<_>>().len(),
        rows.len(),
        untagged
    );
    Ok(rows)
}
