//! Command-line interface for the run-out survey pipeline.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::ReportMetadata;
use crate::core::loaders::load_measurement_csv;
use crate::processors::{process_survey, PositionOutcome, SummaryRow};
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "shell-runout")]
#[command(about = "Shell run-out survey processing: eccentricity and distortion tables", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a survey sheet (CSV export) into report tables
    Process {
        /// Survey sheet CSV
        input: PathBuf,
        /// Output directory for tables and charts
        output_dir: PathBuf,
        /// Angular samples per revolution (defaults to the sheet's row count)
        #[arg(short, long)]
        samples: Option<usize>,
        /// Company name for the report
        #[arg(long, default_value = "")]
        company: String,
        /// Equipment name for the report
        #[arg(long, default_value = "")]
        equipment: String,
        /// Capacity / feed rate for the report
        #[arg(long, default_value = "")]
        capacity: String,
        /// Date of measurement
        #[arg(long, default_value = "")]
        date: String,
        /// Measured position description
        #[arg(long, default_value = "")]
        measured_position: String,
        /// Positions drawn with the girth-gear layout
        #[arg(long, value_delimiter = ',')]
        gg_positions: Vec<usize>,
        /// Maximum samples shown on each radar chart
        #[arg(long)]
        radar_positions: Option<usize>,
        /// Render radar and profile charts
        #[arg(long)]
        plots: bool,
        /// Fixed decimals for numeric cells
        #[arg(long)]
        precision: Option<usize>,
    },

    /// Load and validate a survey sheet without processing it
    Inspect {
        /// Survey sheet CSV
        input: PathBuf,
    },

    /// Write the default configuration as YAML
    InitConfig {
        /// Destination file
        path: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<60} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 38 {
            format!("{}...", value.chars().take(35).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<38} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

/// Format a per-position result line the way the report prints it.
pub fn format_result(row: &SummaryRow) -> String {
    format!(
        "Position {:>3}: Runout = {:.2} mm, Angle of Occurrence = {:.2}°, Eccentricity = {:.2} mm",
        row.position, row.runout, row.phase_angle, row.eccentricity
    )
}

/// Load the configuration file if one was given, otherwise the defaults.
///
/// An unreadable or invalid file is an error; the defaults are never
/// substituted for it.
fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };

    let config = PipelineConfig::from_yaml(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config in {}", path.display()))?;
    info!("Loaded config from: {}", path.display());
    Ok(config)
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Process {
            input,
            output_dir,
            samples,
            company,
            equipment,
            capacity,
            date,
            measured_position,
            gg_positions,
            radar_positions,
            plots,
            precision,
        } => {
            let mut config = config;
            if samples.is_some() {
                config.survey.sample_count = samples;
            }
            if radar_positions.is_some() {
                config.plots.radar_positions = radar_positions;
            }
            if precision.is_some() {
                config.output.precision = precision;
            }
            config.plots.enabled |= plots;

            let metadata = ReportMetadata {
                company,
                equipment,
                capacity,
                date,
                measured_position,
                gg_positions,
            };
            cmd_process(&input, &output_dir, &config, &metadata)
        }
        Commands::Inspect { input } => cmd_inspect(&input, &config),
        Commands::InitConfig { path } => cmd_init_config(&path, &config),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn cmd_process(
    input: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
    metadata: &ReportMetadata,
) -> Result<()> {
    let start = Instant::now();

    println!("Processing survey sheet...");
    println!("Input: {}", input.display());
    println!("Output directory: {}", output_dir.display());

    let spinner = create_spinner("Decomposing run-out profiles...");
    let output = process_survey(input, output_dir, config, metadata);
    spinner.finish_and_clear();

    let output = output.with_context(|| format!("Failed to process {}", input.display()))?;
    let aggregation = &output.analysis.aggregation;

    for outcome in &aggregation.outcomes {
        if let PositionOutcome::Skipped {
            position,
            label,
            reason,
        } = outcome
        {
            println!("Skipped position {} ({}): {}", position, label, reason);
        }
    }

    for row in &aggregation.summary {
        println!("{}", format_result(row));
    }

    print_summary(
        "Survey Processing Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Output directory", output_dir.display().to_string()),
            ("Samples", output.analysis.grid.sample_count().to_string()),
            ("Positions processed", aggregation.records.len().to_string()),
            ("Positions skipped", aggregation.skipped_count().to_string()),
            ("Tables written", output.tables.len().to_string()),
            ("Charts written", output.charts.len().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );

    Ok(())
}

fn cmd_inspect(input: &Path, config: &PipelineConfig) -> Result<()> {
    let layout = &config.survey.metadata_rows;
    let table = load_measurement_csv(input, layout)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    let available = |row: &[Option<f64>]| row.iter().filter(|v| v.is_some()).count();
    let meta = &table.metadata;
    let positions = table.num_positions();

    print_summary(
        "Survey Sheet",
        &[
            ("Input file", input.display().to_string()),
            ("Data rows", table.total_rows.to_string()),
            ("Angular rows", table.num_angular_rows().to_string()),
            ("Axial positions", positions.to_string()),
            ("Distance", format!("{}/{}", available(&meta.distance), positions)),
            (
                "Cumulative distance",
                format!("{}/{}", available(&meta.cumulative_distance), positions),
            ),
            ("Min temperature", format!("{}/{}", available(&meta.min_temperature), positions)),
            ("Max temperature", format!("{}/{}", available(&meta.max_temperature), positions)),
            ("Avg temperature", format!("{}/{}", available(&meta.avg_temperature), positions)),
        ],
    );

    for (i, column) in table.columns.iter().enumerate() {
        if column.iter().all(Option::is_none) {
            warn!(
                "position {} ({}) has no numeric measurements",
                i + 1,
                table.column_label(i)
            );
        }
    }

    Ok(())
}

fn cmd_init_config(path: &Path, config: &PipelineConfig) -> Result<()> {
    config
        .to_yaml(path)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    println!("Wrote configuration to {}", path.display());
    Ok(())
}
