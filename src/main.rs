//! Command-line front end for a GRBL motion stage.
//!
//! ```text
//! grbl_stage --config stage.toml goto 10 10
//! grbl_stage --config stage.toml run --points scan.csv --dimension 2 --return-home
//! grbl_stage --config stage.toml sample --count 50 --nearest-neighbour --output scan.csv
//! grbl_stage init-config > stage.toml
//! ```
//!
//! `--simulate` replaces the serial port with a simulated machine.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grbl_stage::adapters::SimulatedGrbl;
use grbl_stage::data::{self, TourOrder};
use grbl_stage::{GrblController, Point, StageConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "grbl_stage", version, about = "Drive a GRBL motion stage inside a safety envelope")]
struct Cli {
    /// Configuration file (TOML). GRBL_* environment variables override it.
    #[arg(short, long, default_value = "grbl_stage.toml")]
    config: PathBuf,

    /// Use a simulated machine instead of the serial port
    #[arg(long)]
    simulate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a default configuration file
    InitConfig,
    /// Set the origin and move to one position
    Goto {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        #[arg(allow_negative_numbers = true, default_value_t = 0.0)]
        z: f64,
    },
    /// Set the origin and visit every point of a CSV file in order
    Run {
        #[arg(short, long)]
        points: PathBuf,
        /// Components per point (2 or 3)
        #[arg(short, long, default_value_t = 2)]
        dimension: usize,
        /// Move back to the origin when done
        #[arg(long)]
        return_home: bool,
    },
    /// Generate random positions inside the chamber
    Sample {
        #[arg(short = 'n', long)]
        count: usize,
        /// Sampling radius in mm (defaults to the chamber's usable radius)
        #[arg(short, long)]
        radius: Option<f64>,
        #[arg(long)]
        nearest_neighbour: bool,
        /// Write to this CSV file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::InitConfig = cli.command {
        print!("{}", StageConfig::default().to_toml_string()?);
        return Ok(());
    }

    let config = StageConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;

    // Initialize tracing with RUST_LOG env var, falling back to the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.application.log_level)),
        )
        .init();

    match cli.command {
        Command::InitConfig => Ok(()),
        Command::Goto { x, y, z } => {
            let targets = vec![Point::new(x, y, z)];
            visit(&config, cli.simulate, &targets).await
        }
        Command::Run {
            points,
            dimension,
            return_home,
        } => {
            let mut targets = data::load_points(&points, dimension)
                .with_context(|| format!("Failed to load points from {:?}", points))?;
            if return_home {
                targets.push(Point::ORIGIN);
            }
            visit(&config, cli.simulate, &targets).await
        }
        Command::Sample {
            count,
            radius,
            nearest_neighbour,
            output,
        } => {
            let radius = radius.unwrap_or_else(|| config.chamber.true_radius());
            let order = if nearest_neighbour {
                TourOrder::NearestNeighbour
            } else {
                TourOrder::AsDrawn
            };
            let points = data::generate(count, radius, order, &mut rand::thread_rng());
            if points.len() < count {
                tracing::warn!(
                    "Only {} of {} points fit with the minimum spacing",
                    points.len(),
                    count
                );
            }
            match output {
                Some(path) => data::save_points(&path, &points, 2)
                    .with_context(|| format!("Failed to write {:?}", path))?,
                None => data::write_points(std::io::stdout().lock(), &points, 2)?,
            }
            Ok(())
        }
    }
}

async fn connect(config: &StageConfig, simulate: bool) -> Result<GrblController> {
    let settings = config.controller_settings();
    if simulate {
        info!("Using simulated GRBL machine");
        Ok(GrblController::with_transport(Box::new(SimulatedGrbl::new()), config.chamber, settings).await?)
    } else {
        GrblController::connect(&config.machine.port, config.chamber, settings)
            .await
            .with_context(|| format!("Failed to connect to stage on '{}'", config.machine.port))
    }
}

async fn visit(config: &StageConfig, simulate: bool, targets: &[Point]) -> Result<()> {
    let mut stage = connect(config, simulate).await?;
    stage.set_origin().await.context("Failed to set origin")?;

    for (i, target) in targets.iter().enumerate() {
        stage
            .move_to(*target)
            .await
            .with_context(|| format!("Move {} of {} to {} failed", i + 1, targets.len(), target))?;
    }

    info!("Visited {} positions", targets.len());
    stage.close().await?;
    Ok(())
}
