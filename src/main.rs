use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use video_tag_analyzer::preprocess::{explode_videos, load_video_responses};
use video_tag_analyzer::{
    sink_for, CategorizationPipeline, Config, DatasetKind, DatasetReader, ExportFormat,
    JsonDatasetStore, MetricName, MetricsAggregator, MetricsService,
};

fn cli() -> Command {
    Command::new("video-tag-analyzer")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Categorize videos by their tags and report popularity metrics")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (default: search the usual locations)")
                .global(true)
        )
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .value_name("DIR")
                .help("Root directory of the datasets")
                .global(true)
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
                .global(true)
        )
        .subcommand(
            Command::new("preprocess")
                .about("Explode raw videos.list responses into the preprocessed dataset")
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .value_name("PATH")
                        .help("Response file or directory of response files")
                        .required(true)
                )
                .arg(
                    Arg::new("append")
                        .long("append")
                        .help("Keep previously preprocessed rows")
                        .action(clap::ArgAction::SetTrue)
                )
        )
        .subcommand(
            Command::new("categorize")
                .about("Cluster tags into categories and write the data lake")
                .arg(
                    Arg::new("clusters")
                        .short('k')
                        .long("clusters")
                        .value_name("NUM")
                        .help("Number of categories")
                        .value_parser(clap::value_parser!(usize))
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_name("SEED")
                        .help("Seed for centroid initialization")
                        .value_parser(clap::value_parser!(u64))
                )
        )
        .subcommand(
            Command::new("report")
                .about("Compute metrics and export them")
                .arg(
                    Arg::new("metric")
                        .short('m')
                        .long("metric")
                        .value_name("NAME")
                        .help("Metric to include (repeatable)")
                        .num_args(1..)
                        .action(clap::ArgAction::Append)
                        .required(true)
                )
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_name("FORMAT")
                        .help("Export format (default from config)")
                        .value_parser(["json", "csv", "markdown"])
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("PATH")
                        .help("Output file, or directory for csv")
                )
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .value_name("NAME")
                        .help("Report name (default from config)")
                )
        )
        .subcommand(Command::new("metrics").about("List available metric names"))
        .subcommand(
            Command::new("elbow")
                .about("Print k-means inertia over a range of cluster counts")
                .arg(
                    Arg::new("min-k")
                        .long("min-k")
                        .value_name("NUM")
                        .default_value("1")
                        .value_parser(clap::value_parser!(usize))
                )
                .arg(
                    Arg::new("max-k")
                        .long("max-k")
                        .value_name("NUM")
                        .default_value("10")
                        .value_parser(clap::value_parser!(usize))
                )
        )
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(data_dir) = matches.get_one::<String>("data-dir") {
        config.dataset.data_dir = PathBuf::from(data_dir);
    }

    // Initialize logging
    let level = if matches.get_flag("verbose") {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .init();

    match matches.subcommand() {
        Some(("preprocess", args)) => preprocess(&config, args),
        Some(("categorize", args)) => categorize(config, args),
        Some(("report", args)) => report(&config, args),
        Some(("metrics", _)) => {
            for name in MetricName::all() {
                println!("{}", name);
            }
            Ok(())
        }
        Some(("elbow", args)) => elbow(&config, args),
        _ => Err(anyhow!("No subcommand given")),
    }
}

fn preprocess(config: &Config, args: &ArgMatches) -> Result<()> {
    let input = args
        .get_one::<String>("input")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("--input is required"))?;

    info!("🚀 Preprocessing {}", input.display());
    let responses = load_video_responses(&input)?;
    let rows = explode_videos(
        &responses,
        &config.dataset.duration_parser(),
        config.dataset.untagged_marker.as_deref(),
    )?;

    let store = JsonDatasetStore::new(&config.dataset.data_dir, DatasetKind::Preprocessed);
    if args.get_flag("append") {
        store.write_part(&rows)?;
    } else {
        store.replace_parts(&rows)?;
    }

    info!("✅ Preprocessed {} rows into {}", rows.len(), store.dir().display());
    Ok(())
}

fn categorize(mut config: Config, args: &ArgMatches) -> Result<()> {
    if let Some(clusters) = args.get_one::<usize>("clusters") {
        config.clustering.clusters = *clusters;
    }
    if let Some(seed) = args.get_one::<u64>("seed") {
        config.clustering.seed = *seed;
    }
    config.validate()?;
    tracing::debug!("{}", config.summary());

    let reader = JsonDatasetStore::new(&config.dataset.data_dir, DatasetKind::Preprocessed);
    let mut writer = JsonDatasetStore::new(&config.dataset.data_dir, DatasetKind::DataLake);

    let pipeline = CategorizationPipeline::from_config(&config);
    let outcome = pipeline.categorize(&reader, &mut writer)?;

    for cluster in outcome.labels.clusters() {
        match &cluster.label {
            Some(label) => info!("📂 Cluster {} -> {}", cluster.code, label),
            None => warn!("⚠️ Cluster {} has no label", cluster.code),
        }
    }
    let ambiguous = outcome.labels.ambiguous();
    if !ambiguous.is_empty() {
        warn!(
            "⚠️ {} clusters left unlabeled; consider a smaller cluster count or the exhaustive label policy",
            ambiguous.len()
        );
    }

    info!(
        "✅ Wrote {} categorized rows to {}",
        outcome.records.len(),
        writer.dir().display()
    );
    Ok(())
}

fn report(config: &Config, args: &ArgMatches) -> Result<()> {
    config.validate()?;

    let names: Vec<String> = args
        .get_many::<String>("metric")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let format = match args.get_one::<String>("format") {
        Some(format) => format.parse::<ExportFormat>()?,
        None => config.report.format,
    };
    let report_name = args
        .get_one::<String>("name")
        .cloned()
        .unwrap_or_else(|| config.report.file_name.clone());
    let output = args
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| format.output_path(&config.report.output_dir, &report_name));

    let mut store = JsonDatasetStore::new(&config.dataset.data_dir, DatasetKind::DataLake);
    if !store.exists() {
        warn!("⚠️ No categorized dataset yet, category metrics will be empty");
        store = JsonDatasetStore::new(&config.dataset.data_dir, DatasetKind::Preprocessed);
    }

    let aggregator =
        MetricsAggregator::new().with_null_category(config.metrics.null_category.clone());
    let service = MetricsService::new(store, aggregator);
    let sink = sink_for(format, output);
    let path = service.export_metrics(&names, sink.as_ref(), &report_name)?;

    info!("✅ Report written to {}", path.display());
    Ok(())
}

fn elbow(config: &Config, args: &ArgMatches) -> Result<()> {
    let min_k = args.get_one::<usize>("min-k").copied().unwrap_or(1);
    let max_k = args.get_one::<usize>("max-k").copied().unwrap_or(10);
    if min_k > max_k {
        anyhow::bail!("--min-k ({}) must not exceed --max-k ({})", min_k, max_k);
    }

    let reader = JsonDatasetStore::new(&config.dataset.data_dir, DatasetKind::Preprocessed);
    let records = reader.load(&[])?;
    let pipeline = CategorizationPipeline::from_config(config);
    let curve = pipeline.elbow(&records, min_k..=max_k)?;

    println!("k\tinertia");
    for point in curve {
        println!("{}\t{:.6}", point.k, point.inertia);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn test_report_accepts_several_metrics() {
        let matches = cli()
            .try_get_matches_from([
                "video-tag-analyzer",
                "report",
                "--metric",
                "videos_per_tag",
                "tag_with_most_videos",
                "--format",
                "csv",
                "--data-dir",
                "/tmp/data",
            ])
            .unwrap();
        assert_eq!(
            matches.get_one::<String>("data-dir").map(String::as_str),
            Some("/tmp/data")
        );
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "report");
        let metrics: Vec<&String> = args.get_many::<String>("metric").unwrap().collect();
        assert_eq!(metrics.len(), 2);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(cli()
            .try_get_matches_from(["video-tag-analyzer", "report", "-m", "x", "-f", "xlsx"])
            .is_err());
    }
}
