use std::fs;
use tempfile::TempDir;
use video_tag_analyzer::preprocess::{explode_videos, load_video_responses};
use video_tag_analyzer::{
    sink_for, AnalyzerError, CategorizationPipeline, ConfigBuilder, DatasetKind, DatasetReader,
    DurationParser, ExportFormat, InMemoryDataset, JsonDatasetStore, MeasureValue, MetricRow,
    MetricsAggregator, MetricsService, NullCategory, VideoRecord,
};

const RESPONSE: &str = r#"{
    "items": [
        {
            "id": "v1",
            "snippet": {"tags": ["python", "coding"]},
            "contentDetails": {"duration": "PT2M"},
            "statistics": {"viewCount": "100", "likeCount": "10"}
        },
        {
            "id": "v2",
            "snippet": {"tags": ["python"]},
            "contentDetails": {"duration": "PT5M"},
            "statistics": {"viewCount": "50", "likeCount": "5"}
        },
        {
            "id": "v3",
            "snippet": {"tags": ["coding"]},
            "contentDetails": {"duration": "PT1M"},
            "statistics": {"viewCount": "10", "likeCount": "1"}
        },
        {
            "id": "v4",
            "snippet": {},
            "contentDetails": {"duration": "PT30S"},
            "statistics": {"viewCount": "1"}
        }
    ]
}"#;

fn scenario() -> Vec<VideoRecord> {
    vec![
        VideoRecord::new("v1", Some("python"), 120),
        VideoRecord::new("v1", Some("coding"), 120),
        VideoRecord::new("v2", Some("python"), 300),
        VideoRecord::new("v3", Some("coding"), 60),
    ]
}

fn service(rows: Vec<VideoRecord>) -> MetricsService<InMemoryDataset> {
    MetricsService::new(InMemoryDataset::from_rows(rows), MetricsAggregator::new())
}

fn pairs(rows: &[MetricRow]) -> Vec<(&str, f64)> {
    rows.iter()
        .map(|r| (r.dimension.as_str(), r.value().as_f64()))
        .collect()
}

#[test]
fn test_tag_metrics_scenario() {
    let service = service(scenario());

    let per_tag = service.compute_metric("videos_per_tag").unwrap();
    assert_eq!(pairs(&per_tag.rows), vec![("coding", 2.0), ("python", 2.0)]);

    let most = service.compute_metric("most_video_time_tag").unwrap();
    assert_eq!(pairs(&most.rows), vec![("python", 420.0)]);

    // coding: 120 (v1) + 60 (v3)
    let least = service.compute_metric("least_video_time_tag").unwrap();
    assert_eq!(pairs(&least.rows), vec![("coding", 180.0)]);

    let avg = service.compute_metric("avg_video_duration_per_tag").unwrap();
    assert_eq!(pairs(&avg.rows), vec![("python", 210.0), ("coding", 90.0)]);
    assert!(avg.rows.iter().all(|r| matches!(r.value(), MeasureValue::Float(_))));
}

#[test]
fn test_distinct_count_never_exceeds_rows() {
    let mut rows = scenario();
    rows.extend(scenario());
    rows.push(VideoRecord::new("v9", None, 15));

    let sheet = service(rows.clone()).compute_metric("videos_per_tag").unwrap();
    for row in &sheet.rows {
        let tagged = rows
            .iter()
            .filter(|r| r.tag.as_deref() == Some(row.dimension.as_str()))
            .count();
        assert!(row.value().as_f64() <= tagged as f64);
    }
}

#[test]
fn test_untagged_video_does_not_break_tag_metrics() {
    let rows = vec![VideoRecord::new("v1", None, 30)];
    let service = service(rows);
    for name in ["videos_per_tag", "tag_with_most_videos", "engagement_per_tag"] {
        assert!(service.compute_metric(name).unwrap().rows.is_empty());
    }
}

#[test]
fn test_unknown_metric_is_rejected() {
    let err = service(scenario()).compute_metric("top_channels").unwrap_err();
    assert!(matches!(err, AnalyzerError::UnsupportedMetric(ref name) if name == "top_channels"));
}

#[test]
fn test_end_to_end_through_the_store() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("responses");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("page-1.json"), RESPONSE).unwrap();

    // Preprocess
    let responses = load_video_responses(&input).unwrap();
    let rows = explode_videos(&responses, &DurationParser::new(), None).unwrap();
    assert_eq!(rows.len(), 5);
    let preprocessed = JsonDatasetStore::new(temp_dir.path(), DatasetKind::Preprocessed);
    preprocessed.write_part(&rows).unwrap();

    // Categorize
    let config = ConfigBuilder::new()
        .with_data_dir(temp_dir.path().to_path_buf())
        .with_clusters(2)
        .build();
    let mut datalake = JsonDatasetStore::new(temp_dir.path(), DatasetKind::DataLake);
    let outcome = CategorizationPipeline::from_config(&config)
        .categorize(&preprocessed, &mut datalake)
        .unwrap();
    assert_eq!(outcome.category_count(), 2);
    assert!(outcome.labels.ambiguous().is_empty());

    let enriched = datalake.load(&[]).unwrap();
    assert_eq!(enriched, outcome.records);
    let v4: Vec<_> = enriched.iter().filter(|r| r.id == "v4").collect();
    assert_eq!(v4.len(), 1);
    assert_eq!(v4[0].category, None);

    // Report
    let service = MetricsService::new(&datalake, MetricsAggregator::new());
    let per_category = service.compute_metric("videos_per_category").unwrap();
    assert_eq!(pairs(&per_category.rows), vec![("coding", 2.0), ("python", 2.0)]);

    let most_viewed = service.compute_metric("most_viewed_tag_per_category").unwrap();
    assert_eq!(most_viewed.columns, vec!["category", "tag", "view_count"]);
    assert_eq!(most_viewed.rows.len(), 2);

    let output = temp_dir.path().join("report");
    let path = service
        .export_metrics(
            &["videos_per_tag", "videos_per_category"],
            sink_for(ExportFormat::Csv, &output).as_ref(),
            "weekly",
        )
        .unwrap();
    assert_eq!(path, output);
    let csv = fs::read_to_string(output.join("videos_per_tag.csv")).unwrap();
    assert_eq!(csv, "tag,n_videos\ncoding,2\npython,2\n");
}

#[test]
fn test_unlabeled_rows_can_be_bucketed() {
    let rows = vec![
        VideoRecord::new("v1", Some("rust"), 10).with_category(Some("rust")),
        VideoRecord::new("v2", Some("misc"), 20),
    ];
    let dataset = InMemoryDataset::from_rows(rows);

    let excluded = MetricsService::new(&dataset, MetricsAggregator::new())
        .compute_metric("videos_per_category")
        .unwrap();
    assert_eq!(pairs(&excluded.rows), vec![("rust", 1.0)]);

    let bucketed = MetricsService::new(
        &dataset,
        MetricsAggregator::new().with_null_category(NullCategory::Bucket("other".to_string())),
    )
    .compute_metric("videos_per_category")
    .unwrap();
    assert_eq!(pairs(&bucketed.rows), vec![("other", 1.0), ("rust", 1.0)]);
}

#[test]
fn test_categorization_is_reproducible() {
    let rows: Vec<VideoRecord> = [
        ("a", "machine learning"), ("b", "deep learning"), ("c", "neural networks"),
        ("d", "rust programming"), ("e", "rust"), ("f", "cooking"), ("g", "baking"),
        ("h", "bread baking"), ("i", "programming tutorial"),
    ]
    .iter()
    .map(|(id, tag)| VideoRecord::new(*id, Some(*tag), 60))
    .collect();

    let config = ConfigBuilder::new().with_clusters(3).with_seed(11).build();
    let pipeline = CategorizationPipeline::from_config(&config);
    let first = pipeline.run(rows.clone()).unwrap();
    let second = pipeline.run(rows).unwrap();

    assert_eq!(first.records, second.records);
    assert_eq!(first.labels, second.labels);
    let labels: Vec<&str> = first.labels.labeled().map(|(_, label)| label).collect();
    let mut unique = labels.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), labels.len());
}
