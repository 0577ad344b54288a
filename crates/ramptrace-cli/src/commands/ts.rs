use anyhow::{Context, Result};
use ramptrace_algo::build_pairs;
use ramptrace_cli::cli::TsCommands;
use ramptrace_ts::io::{
    comparison_frame, hourly_frame, read_hourly, read_points, read_series, resampled_frame,
    write_frame,
};
use ramptrace_ts::{compare_with_contract, hourly_average, resample, HourlyOptions, ResampleOptions};
use tracing::info;

use crate::commands::util::{build_options, load_commands};

pub fn handle(command: &TsCommands) -> Result<()> {
    match command {
        TsCommands::Minutely {
            input,
            freq,
            gap_policy,
            no_edge_ticks,
            track_pairs,
            out,
        } => {
            let options = build_options(input)?;
            let commands = load_commands(input)?;
            let output = build_pairs(&commands, &options).context("building trajectory")?;

            let resample_options = ResampleOptions {
                frequency: *freq,
                include_edge_ticks: !no_edge_ticks,
                gap_policy: *gap_policy,
                track_pair_index: *track_pairs,
                ..ResampleOptions::default()
            };
            info!(freq = %freq, gap_policy = %gap_policy, "Resampling {} segments", output.len());
            let series = resample(&output.segments, &resample_options)?;
            write_frame(&mut resampled_frame(&series)?, out)?;
            println!("Wrote {} points to {}", series.len(), out.display());
            Ok(())
        }
        TsCommands::Hourly {
            input,
            time_col,
            value_col,
            freq,
            label,
            keep_incomplete,
            average,
            energy,
            out,
        } => {
            let options = HourlyOptions {
                frequency: *freq,
                label: *label,
                drop_incomplete: !keep_incomplete,
                average: *average,
                energy: *energy,
            };
            let series = read_series(input, time_col, value_col)?;
            info!(samples = series.len(), label = %label, "Aggregating to hours");
            let hourly = hourly_average(&series, &options)?;
            write_frame(&mut hourly_frame(&hourly, *energy)?, out)?;
            println!("Wrote {} hours to {}", hourly.len(), out.display());
            Ok(())
        }
        TsCommands::Compare {
            input,
            value_col,
            contract,
            contract_time_col,
            contract_mw_col,
            out,
        } => {
            let hourly = read_hourly(input, "time", value_col)?;
            let contract_points = read_points(contract, contract_time_col, contract_mw_col)?;
            let rows = compare_with_contract(&hourly, &contract_points);
            let matched = rows.iter().filter(|r| r.contract_mw.is_some()).count();
            write_frame(&mut comparison_frame(&rows)?, out)?;
            println!(
                "Compared {} hours ({} with a contract value), wrote {}",
                rows.len(),
                matched,
                out.display()
            );
            Ok(())
        }
    }
}
