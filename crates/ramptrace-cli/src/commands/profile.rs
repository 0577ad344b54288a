use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ramptrace_algo::profiles::{
    build_shutdown_timeline, build_startup_timeline, ProfileTimeline, ShutdownProfile,
    StartupInputs, StartupOptions, SyncMode,
};
use ramptrace_cli::cli::ProfileCommands;
use ramptrace_ts::io::{profile_frame, read_commands, resampled_frame, write_frame, CommandColumns};
use ramptrace_ts::{resample, ResampleOptions};
use tracing::info;

use crate::commands::util::report_diagnostics;

pub fn handle(command: &ProfileCommands) -> Result<()> {
    match command {
        ProfileCommands::Startup {
            previous_stop,
            light_off,
            sync,
            at_40,
            commands,
            time_col,
            mw_col,
            sync_mode,
            mw40,
            mw100,
            out,
            minutely_out,
        } => {
            let mut inputs = StartupInputs::new(*previous_stop, *light_off);
            inputs.observed_sync = *sync;
            inputs.observed_40pct = *at_40;
            if let Some(path) = commands {
                let columns = CommandColumns {
                    time: time_col.clone(),
                    mw: mw_col.clone(),
                    flag: None,
                };
                let (cmds, diag) = read_commands(path, &columns)?;
                report_diagnostics(&diag, &path.display().to_string());
                inputs.commands = cmds;
            }
            let options = StartupOptions {
                mw40_override: *mw40,
                mw100_override: *mw100,
                sync_mode: parse_sync_mode(sync_mode)?,
            };
            info!(
                downtime_hours = inputs.downtime_hours(),
                startup = inputs.startup_type().label(),
                "building start-up timeline"
            );
            let timeline =
                build_startup_timeline(&inputs, &options).context("building start-up timeline")?;
            write_timeline(&timeline, out, minutely_out.as_deref())
        }
        ProfileCommands::Shutdown {
            at_40,
            mw40,
            out,
            minutely_out,
        } => {
            let timeline = build_shutdown_timeline(*at_40, *mw40, &ShutdownProfile::default());
            write_timeline(&timeline, out, minutely_out.as_deref())
        }
    }
}

fn parse_sync_mode(raw: &str) -> Result<SyncMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "observed" => Ok(SyncMode::Observed),
        "expected" => Ok(SyncMode::Expected),
        other => other
            .parse::<f64>()
            .ok()
            .filter(|m| m.is_finite() && *m >= 0.0)
            .map(SyncMode::Override)
            .ok_or_else(|| {
                anyhow!("sync mode must be observed, expected or minutes after light-off, got '{raw}'")
            }),
    }
}

fn write_timeline(timeline: &ProfileTimeline, out: &Path, minutely_out: Option<&Path>) -> Result<()> {
    write_frame(&mut profile_frame(timeline)?, out)?;
    println!("Wrote {} profile points to {}", timeline.len(), out.display());
    if let Some(path) = minutely_out {
        let series = resample(std::slice::from_ref(timeline), &ResampleOptions::default())?;
        write_frame(&mut resampled_frame(&series)?, path)?;
        println!("Wrote {} points to {}", series.len(), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_mode_parsing() {
        assert_eq!(parse_sync_mode("Observed").unwrap(), SyncMode::Observed);
        assert_eq!(parse_sync_mode("90").unwrap(), SyncMode::Override(90.0));
        assert!(parse_sync_mode("soon").is_err());
        assert!(parse_sync_mode("-5").is_err());
    }
}
