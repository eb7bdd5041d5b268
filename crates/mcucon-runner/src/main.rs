//! `mcucon` command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mcucon_board::BoardKind;
use mcucon_runner::{detect, telemetry, Overrides, RunnerConfig, RunnerResult};
use tracing::error;

/// Serial command console for microcontroller boards.
#[derive(Parser, Debug)]
#[command(name = "mcucon", version, about)]
struct Cli {
    /// Log filter, e.g. `debug` or `mcucon_core=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a console on a simulated board
    Run {
        /// YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Board variant (uno, uno-bluetooth, esp32-cam)
        #[arg(long)]
        board: Option<BoardKind>,

        /// TCP port for the wired serial channel
        #[arg(long)]
        serial_port: Option<u16>,

        /// TCP port for the Bluetooth serial channel
        #[arg(long)]
        bluetooth_port: Option<u16>,

        /// Serve HTTP on this address, even on boards without WiFi
        #[arg(long)]
        http: Option<String>,
    },

    /// List boards attached to this machine
    Detect {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init_logging(cli.log_level.as_deref());

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> RunnerResult<()> {
    match command {
        Commands::Run {
            config,
            board,
            serial_port,
            bluetooth_port,
            http,
        } => {
            let mut runner_config = match config {
                Some(path) => RunnerConfig::load(&path)?,
                None => RunnerConfig::default(),
            };
            runner_config.apply(&Overrides {
                board,
                serial_port,
                bluetooth_port,
                http,
            });
            mcucon_runner::run(runner_config)
        }
        Commands::Detect { json } => {
            let report = detect::detect();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", detect::render(&report));
            }
            Ok(())
        }
    }
}
