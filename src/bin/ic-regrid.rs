//! Regrid sea-ice restarts and ocean state onto a model grid.
//!
//! Usage: `ic-regrid <ice|ocean|eta|topo> --config run.toml [--log-filter FILTER]`

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use ic_regrid::config::{
    load_config, IceRemapConfig, InterfaceHeightConfig, OceanRemapConfig, TopographyPatchConfig,
};
use ic_regrid::pipeline::{add_interface_heights, patch_topography, IceRemapPipeline, OceanRemapPipeline};

#[derive(Parser, Debug)]
#[command(name = "ic-regrid")]
#[command(about = "Build ocean and sea-ice initial conditions from precomputed regridding weights")]
struct Args {
    /// Log filter; overrides RUST_LOG
    #[arg(long = "log-filter", global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Regrid a sea-ice restart and repair its thermodynamic state
    Ice {
        /// TOML run configuration
        #[arg(long)]
        config: PathBuf,
    },
    /// Regrid one ocean scalar or velocity pair
    Ocean {
        /// TOML run configuration
        #[arg(long)]
        config: PathBuf,
    },
    /// Add interface heights to an ocean initial-condition file
    Eta {
        /// TOML run configuration
        #[arg(long)]
        config: PathBuf,
    },
    /// Merge a remapped bathymetry into the model bathymetry
    Topo {
        /// TOML run configuration
        #[arg(long)]
        config: PathBuf,
    },
}

fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(f) => EnvFilter::new(f),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    fmt().with_env_filter(filter).with_target(false).init();
}

fn run(command: &Command) -> ic_regrid::Result<PathBuf> {
    match command {
        Command::Ice { config } => {
            let config: IceRemapConfig = load_config(config)?;
            IceRemapPipeline::run(&config)
        }
        Command::Ocean { config } => {
            let config: OceanRemapConfig = load_config(config)?;
            OceanRemapPipeline::run(&config)
        }
        Command::Eta { config } => {
            let config: InterfaceHeightConfig = load_config(config)?;
            add_interface_heights(&config)
        }
        Command::Topo { config } => {
            let config: TopographyPatchConfig = load_config(config)?;
            patch_topography(&config)
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.log_filter.as_deref());

    match run(&args.command) {
        Ok(path) => info!("Wrote {}", path.display()),
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    }
}
