use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use spill_cli::{write_outputs, RunConfig};
use spill_validation::{ModelType, ValidationConfig, ValidationOutput, ValidationReport, ValidationType};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a model collection against an observation collection
    Validate {
        /// GeoJSON observation file
        obs: PathBuf,
        /// GeoJSON model file
        model: PathBuf,
        /// Model output type: BE or Prob
        model_type: ModelType,
        /// Observation type: Satellite or Coastal
        validation_type: ValidationType,
        /// GeoJSON file of confirmed oil-free areas
        #[arg(long)]
        no_oil_file: Option<PathBuf>,
        /// EPSG code of the planar system areas are measured in
        #[arg(long, default_value = "3857")]
        crs: i32,
        /// Directory the report and result collections are written to
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,
    },
    /// Validate using a TOML or JSON run configuration
    Run {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Override the configured EPSG code
        #[arg(long)]
        crs: Option<i32>,
        /// Override the configured output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the JSON schema of the run configuration or of the report
    Schema {
        /// Print the report schema instead
        #[arg(long)]
        report: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            obs,
            model,
            model_type,
            validation_type,
            no_oil_file,
            crs,
            output_dir,
        } => {
            let config = RunConfig {
                obs_file: obs.display().to_string(),
                model_file: model.display().to_string(),
                no_oil_file: no_oil_file.map(|path| path.display().to_string()),
                validation: ValidationConfig::new(model_type, validation_type).with_crs(crs),
                output_dir: output_dir.display().to_string(),
            };
            validate(&config)?;
        }
        Commands::Run {
            config,
            crs,
            output_dir,
        } => {
            let mut run_config = RunConfig::from_file(&config)?;
            if let Some(crs) = crs {
                run_config.validation.crs = crs;
            }
            if let Some(output_dir) = output_dir {
                run_config.output_dir = output_dir.display().to_string();
            }
            validate(&run_config)?;
        }
        Commands::Schema { report } => {
            let schema = if report {
                serde_json::to_string_pretty(&ValidationReport::schema())?
            } else {
                serde_json::to_string_pretty(&RunConfig::schema())?
            };
            println!("{schema}");
        }
    }

    Ok(())
}

fn validate(config: &RunConfig) -> Result<()> {
    info!(
        obs = %config.obs_file,
        model = %config.model_file,
        no_oil = config.no_oil_file.as_deref().unwrap_or("-"),
        "Starting validation"
    );

    let output = config.run()?;
    print_summary(&output);

    let crs = config.validation.target_crs()?;
    let written = write_outputs(&output, crs, &config.output_dir)?;
    for path in &written {
        info!("Wrote {}", path.display());
    }

    info!("✅ Validation completed!");
    Ok(())
}

fn print_summary(output: &ValidationOutput) {
    let report = &output.report;

    println!(
        "Case: {}  Time: {}",
        report.case_name.as_deref().unwrap_or("-"),
        report.time.as_deref().unwrap_or("-")
    );
    println!("Observed area: {:.4} km²", report.observed_area_km2);
    for area in &report.predicted_areas {
        println!(
            "  level {:>6}: predicted {:.4} km² (band {:.4} km²)",
            area.level, area.full_contour_area_km2, area.cutout_area_km2
        );
    }

    if report.moe.points().is_empty() {
        warn!("No 2D MOE points were computed");
    }
    for point in report.moe.points() {
        println!(
            "  level {:>6}: MOE x = {:.4}, y = {:.4} (FN {:.4} km², FP {:.4} km²)",
            point.level, point.x, point.y, point.false_negative_km2, point.false_positive_km2
        );
    }

    if let Some(scores) = &report.skill_scores {
        match scores.area.value() {
            Some(value) => println!("Area skill score: {value:.4}"),
            None => println!("Area skill score: not defined"),
        }
        match scores.centroid.value() {
            Some(centroid) => println!(
                "Centroid skill score: {:.4} (distance {:.3} km, length scale {:.3} km)",
                centroid.score, centroid.centroid_distance_km, centroid.length_scale_km
            ),
            None => println!("Centroid skill score: not defined"),
        }
    }
}
