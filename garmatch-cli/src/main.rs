use clap::{Parser, Subcommand};
use garmatch::detect::{load_records, save_records, DetectionRecord};
use garmatch::pipeline::{
    consolidate_precomputed, extract_regions, query_all, JsonDetections,
};
use garmatch::{
    BoxSegmenter, ConflictTable, ConsolidationConfig, Consolidator, FeatureTable,
    LabelVocabulary, RegionConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Garmatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for stage progress and skipped units.
    #[arg(long)]
    trace: bool,
    #[command(subcommand)]
    stage: Option<Stage>,
}

#[derive(Subcommand, Debug)]
enum Stage {
    /// Consolidate precomputed raw detections into detection records.
    Detect,
    /// Cut region images out of the sources named by the records.
    Extract,
    /// Rank query features against the catalog.
    Query,
    /// Detect, then extract.
    Run,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    detections_path: String,
    records_path: String,
    image_dir: String,
    region_dir: String,
    catalog_path: String,
    query_path: String,
    output_path: Option<String>,
    conflict_rules_path: String,
    vocabulary_path: Option<String>,
    top_k: usize,
    consolidation: ConsolidationConfig,
    region: RegionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detections_path: String::new(),
            records_path: String::new(),
            image_dir: String::new(),
            region_dir: String::new(),
            catalog_path: String::new(),
            query_path: String::new(),
            output_path: None,
            conflict_rules_path: "conflict_rules.json".to_string(),
            vocabulary_path: None,
            top_k: 3,
            consolidation: ConsolidationConfig::default(),
            region: RegionConfig::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectSummary {
    records: usize,
    records_path: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("garmatch=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let stage = cli
        .stage
        .ok_or("a stage is required: detect, extract, query, or run")?;
    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;

    match stage {
        Stage::Detect => {
            run_detect(&config)?;
        }
        Stage::Extract => {
            let records = load_records(&config.records_path)?;
            run_extract(&config, &records)?;
        }
        Stage::Query => run_query(&config)?,
        Stage::Run => {
            let records = run_detect(&config)?;
            run_extract(&config, &records)?;
        }
    }

    Ok(())
}

fn run_detect(config: &Config) -> Result<Vec<DetectionRecord>, Box<dyn std::error::Error>> {
    if config.detections_path.is_empty() || config.records_path.is_empty() {
        return Err("detections_path and records_path must be set in the config".into());
    }

    let vocabulary = match &config.vocabulary_path {
        Some(path) => LabelVocabulary::load(path)?,
        None => LabelVocabulary::fashionpedia(),
    };
    let conflicts = ConflictTable::load(&config.conflict_rules_path)?;
    let consolidator = Consolidator::new(config.consolidation.clone(), conflicts, vocabulary);

    let detections = JsonDetections::load(&config.detections_path)?;
    let records = consolidate_precomputed(&detections, &consolidator)?;
    save_records(&config.records_path, &records)?;

    let summary = DetectSummary {
        records: records.len(),
        records_path: config.records_path.clone(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(records)
}

fn run_extract(
    config: &Config,
    records: &[DetectionRecord],
) -> Result<(), Box<dyn std::error::Error>> {
    if config.image_dir.is_empty() || config.region_dir.is_empty() {
        return Err("image_dir and region_dir must be set in the config".into());
    }

    let report = extract_regions(
        &BoxSegmenter,
        records,
        &config.image_dir,
        &config.region_dir,
        &config.region,
    )?;
    emit(config, &serde_json::to_string_pretty(&report)?)
}

fn run_query(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if config.catalog_path.is_empty() || config.query_path.is_empty() {
        return Err("catalog_path and query_path must be set in the config".into());
    }
    if config.top_k == 0 {
        return Err("top_k must be at least 1".into());
    }

    let catalog = FeatureTable::load(&config.catalog_path)?;
    let queries = FeatureTable::load(&config.query_path)?;
    let reports = query_all(&catalog, &queries, config.top_k)?;
    emit(config, &serde_json::to_string_pretty(&reports)?)
}

fn emit(config: &Config, json: &str) -> Result<(), Box<dyn std::error::Error>> {
    match &config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}
