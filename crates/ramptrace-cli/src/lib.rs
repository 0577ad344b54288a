pub mod cli;
pub mod config;

pub use cli::{
    build_cli_command, Cli, CommandInput, Commands, ProfileCommands, TrajectoryCommands,
    TsCommands,
};
pub use config::{load_config_from_path, RunConfig, UnitConfig};
