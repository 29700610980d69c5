//! tasksplit CLI - Split an AOI into balanced field-mapping tasks
//!
//! Usage:
//!   tasksplit-cli --aoi <aoi.geojson> [--lines <lines.geojson>]
//!                 [--buildings <buildings.geojson>] [--output <tasks.geojson>]
//!
//! Reads the AOI, split-line candidates and building footprints as GeoJSON,
//! runs the splitting pipeline, and writes the resulting task polygons as a
//! GeoJSON FeatureCollection (to stdout when no output path is given).

use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use tasksplit::{
    parse_aoi, parse_buildings, parse_line_features, split_aoi, to_feature_collection,
    OutputOptions, SplitConfig,
};

#[derive(Parser)]
#[command(name = "tasksplit-cli")]
#[command(about = "Split an AOI into balanced field-mapping task polygons", long_about = None)]
struct Cli {
    /// GeoJSON file with the AOI polygon
    #[arg(long)]
    aoi: PathBuf,

    /// GeoJSON file with tagged line features (roads, waterways, railways)
    #[arg(long)]
    lines: Option<PathBuf>,

    /// GeoJSON file with building footprints or points
    #[arg(long)]
    buildings: Option<PathBuf>,

    /// Output file for the task FeatureCollection (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Merge polygons with fewer features than this into a neighbor
    #[arg(long, default_value = "20")]
    min_feature_count: usize,

    /// Target number of buildings per task
    #[arg(long, default_value = "10")]
    target_features_per_cluster: usize,

    /// Boundary densification spacing for the Voronoi step
    #[arg(long, default_value = "0.00005")]
    spacing: f64,

    /// Attach task_id / polygon_id / feature_count properties to the output
    #[arg(long)]
    properties: bool,

    /// Also emit zero-building split polygons
    #[arg(long)]
    include_empty: bool,

    /// Enable verbose debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let aoi = parse_aoi(&fs::read_to_string(&cli.aoi)?)?;

    let lines = match &cli.lines {
        Some(path) => parse_line_features(&fs::read_to_string(path)?)?,
        None => Vec::new(),
    };
    let buildings = match &cli.buildings {
        Some(path) => parse_buildings(&fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    let config = SplitConfig {
        min_feature_count: cli.min_feature_count,
        target_features_per_cluster: cli.target_features_per_cluster,
        boundary_sample_spacing: cli.spacing,
        ..SplitConfig::default()
    };

    let output = split_aoi(&aoi, &lines, buildings, &config)?;
    print_summary(&output);

    let collection = to_feature_collection(
        &output,
        &OutputOptions {
            include_properties: cli.properties,
            include_empty_polygons: cli.include_empty,
        },
    );
    let text = collection.to_string();
    match &cli.output {
        Some(path) => fs::write(path, text)?,
        None => println!("{text}"),
    }
    Ok(())
}

fn print_summary(output: &tasksplit::SplitOutput) {
    eprintln!("{}", "=".repeat(60));
    eprintln!("Split polygons: {}", output.split_polygons.len());
    eprintln!("Clusters:       {}", output.clusters.len());
    eprintln!("Task polygons:  {}", output.tasks.len());
    for warning in &output.warnings {
        eprintln!("warning: {warning}");
    }
    eprintln!("{}", "=".repeat(60));
}
