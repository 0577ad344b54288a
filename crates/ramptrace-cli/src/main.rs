use std::process::ExitCode;

use clap::Parser;
use ramptrace_cli::cli::{Cli, Commands};
use tracing::{debug, error};
use tracing_subscriber::FmtSubscriber;

use crate::commands::util::configure_threads;
use crate::commands::{profile, run, trajectory, ts};

mod commands;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {err}");
    }

    configure_threads(&cli.threads);
    debug!(threads = rayon::current_num_threads(), "thread pool ready");

    let result = match &cli.command {
        Commands::Trajectory { command } => trajectory::handle(command),
        Commands::Ts { command } => ts::handle(command),
        Commands::Profile { command } => profile::handle(command),
        Commands::Run { config, out_dir } => run::handle(config, out_dir.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
