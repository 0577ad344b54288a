use std::io::{self, Write};

use anyhow::{Context, Result};
use ramptrace_algo::build_pairs;
use ramptrace_cli::cli::TrajectoryCommands;
use ramptrace_core::BuildOutput;
use ramptrace_ts::io::{segments_frame, summary_frame, write_frame};
use tabwriter::TabWriter;
use tracing::info;

use crate::commands::util::{build_options, load_commands};

pub fn handle(command: &TrajectoryCommands) -> Result<()> {
    match command {
        TrajectoryCommands::Build {
            input,
            segments_out,
            summary_out,
        } => {
            let options = build_options(input)?;
            let commands = load_commands(input)?;
            info!(
                commands = commands.len(),
                rules = %options.rules.rate_selection,
                "building trajectory"
            );
            let output = build_pairs(&commands, &options).context("building trajectory")?;

            write_frame(&mut segments_frame(&output)?, segments_out)?;
            write_frame(&mut summary_frame(&output.summary)?, summary_out)?;
            print_summary_table(&output)?;
            println!(
                "Wrote {} and {}",
                segments_out.display(),
                summary_out.display()
            );
            Ok(())
        }
    }
}

fn print_summary_table(output: &BuildOutput) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "PAIR\tSTART\tFINISH\tMW\tEND")?;
    for row in &output.summary {
        writeln!(
            writer,
            "{}\t{}\t{}\t{:.3}\t{}",
            row.pair_index,
            row.start_time,
            row.finish_time,
            row.finish_mw.value(),
            row.end_reason
        )?;
    }
    writer.flush()?;
    println!(
        "{} segments ({} cut, {} gap)",
        output.len(),
        output.cut_count(),
        output.gap_count()
    );
    Ok(())
}
