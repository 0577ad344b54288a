use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use ramptrace_algo::RateSelection;
use ramptrace_core::time::parse_timestamp;
use ramptrace_core::Timestamp;
use ramptrace_ts::{Frequency, GapPolicy, HourLabel, HourlyAverage};

#[derive(Parser, Debug)]
#[command(name = "ramptrace", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Worker threads for multi-unit runs ("auto" = CPU count)
    #[arg(long, default_value = "auto", global = true)]
    pub threads: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconstruct output trajectories from dispatch commands
    Trajectory {
        #[command(subcommand)]
        command: TrajectoryCommands,
    },
    /// Minutely and hourly series
    Ts {
        #[command(subcommand)]
        command: TsCommands,
    },
    /// Fixed start-up and shutdown timelines
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Run the full pipeline for every unit in a configuration file
    Run {
        /// Run configuration (YAML, JSON or TOML)
        #[arg(long)]
        config: PathBuf,
        /// Override the configured output directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

/// Where to find commands and which ramp rules apply to them.
#[derive(Args, Debug, Clone)]
pub struct CommandInput {
    /// Command table (CSV or Parquet)
    pub input: PathBuf,
    /// Timestamp column name
    #[arg(long, default_value = "time")]
    pub time_col: String,
    /// Target MW column name
    #[arg(long, default_value = "mw")]
    pub mw_col: String,
    /// Historical stop-flag column, if present
    #[arg(long)]
    pub flag_col: Option<String>,
    /// Ramp rule preset
    #[arg(long, default_value = "ppa")]
    pub rules: RateSelection,
    /// Hold duration after an upward threshold crossing (seconds)
    #[arg(long)]
    pub hold_up: Option<f64>,
    /// Hold duration after a downward threshold crossing (seconds)
    #[arg(long)]
    pub hold_down: Option<f64>,
    /// Do not emit flat segments between a finish and the next command
    #[arg(long)]
    pub no_gap_pairs: bool,
    /// Shortest silence that gets a gap segment (seconds)
    #[arg(long, default_value_t = 1.0)]
    pub gap_min: f64,
}

#[derive(Subcommand, Debug)]
pub enum TrajectoryCommands {
    /// Build segments and the per-pair summary
    Build {
        #[command(flatten)]
        input: CommandInput,
        /// Event table output (CSV or Parquet)
        #[arg(long)]
        segments_out: PathBuf,
        /// Summary table output (CSV or Parquet)
        #[arg(long)]
        summary_out: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum TsCommands {
    /// Sample reconstructed trajectories on a fixed grid
    Minutely {
        #[command(flatten)]
        input: CommandInput,
        /// Grid frequency (e.g. T, 5T, 30S)
        #[arg(long, default_value = "T")]
        freq: Frequency,
        /// Fill between segments that do not touch
        #[arg(long, default_value = "none")]
        gap_policy: GapPolicy,
        /// Only sample grid ticks, not event times on the grid
        #[arg(long)]
        no_edge_ticks: bool,
        /// Add the originating pair index as a column
        #[arg(long)]
        track_pairs: bool,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Average a fixed-frequency series per hour
    Hourly {
        /// Series table with time and value columns
        input: PathBuf,
        #[arg(long, default_value = "time")]
        time_col: String,
        #[arg(long, default_value = "mw")]
        value_col: String,
        /// Step of the input series
        #[arg(long, default_value = "T")]
        freq: Frequency,
        #[arg(long, default_value = "right")]
        label: HourLabel,
        /// Emit hours with fewer samples than a full bucket
        #[arg(long)]
        keep_incomplete: bool,
        #[arg(long, default_value = "trapezoid")]
        average: HourlyAverage,
        /// Report MWh instead of average MW
        #[arg(long)]
        energy: bool,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Compare hourly values with a contracted schedule
    Compare {
        /// Hourly table as written by `ts hourly`
        input: PathBuf,
        #[arg(long, default_value = "MW")]
        value_col: String,
        /// Contract table with time and MW columns
        #[arg(long)]
        contract: PathBuf,
        #[arg(long, default_value = "time")]
        contract_time_col: String,
        #[arg(long, default_value = "mw")]
        contract_mw_col: String,
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Light-off to first dispatched target
    Startup {
        /// When the unit last came off line
        #[arg(long, value_parser = parse_time)]
        previous_stop: Timestamp,
        #[arg(long, value_parser = parse_time)]
        light_off: Timestamp,
        /// Logged synchronise time
        #[arg(long, value_parser = parse_time)]
        sync: Option<Timestamp>,
        /// Logged time the unit reached 40% load
        #[arg(long, value_parser = parse_time)]
        at_40: Option<Timestamp>,
        /// Command table supplying the ramp target
        #[arg(long)]
        commands: Option<PathBuf>,
        #[arg(long, default_value = "time")]
        time_col: String,
        #[arg(long, default_value = "mw")]
        mw_col: String,
        /// observed, expected, or minutes after light-off
        #[arg(long, default_value = "expected")]
        sync_mode: String,
        #[arg(long)]
        mw40: Option<f64>,
        #[arg(long)]
        mw100: Option<f64>,
        #[arg(short, long)]
        out: PathBuf,
        /// Also write the timeline sampled each minute
        #[arg(long)]
        minutely_out: Option<PathBuf>,
    },
    /// Descent from 40% load to zero
    Shutdown {
        /// Time the unit is at 40% load
        #[arg(long, value_parser = parse_time)]
        at_40: Timestamp,
        #[arg(long, default_value_t = ramptrace_algo::profiles::DEFAULT_MW40)]
        mw40: f64,
        #[arg(short, long)]
        out: PathBuf,
        #[arg(long)]
        minutely_out: Option<PathBuf>,
    },
}

pub fn parse_time(raw: &str) -> Result<Timestamp, String> {
    parse_timestamp(raw).ok_or_else(|| format!("unrecognized timestamp '{raw}'"))
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
