use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ramptrace_algo::build_pairs;
use ramptrace_cli::config::{load_config_from_path, RunConfig, UnitConfig};
use ramptrace_core::Diagnostics;
use ramptrace_ts::io::{
    comparison_frame, hourly_frame, read_commands, read_points, resampled_frame, segments_frame,
    summary_frame, write_frame,
};
use ramptrace_ts::{compare_with_contract, hourly_average, resample};
use rayon::prelude::*;
use tabwriter::TabWriter;
use tracing::{error, info};

use crate::commands::util::report_diagnostics;

/// Counts reported for one processed unit.
#[derive(Debug)]
struct UnitReport {
    name: String,
    commands: usize,
    dropped: usize,
    segments: usize,
    cuts: usize,
    minutes: usize,
    hours: usize,
    contract_hours: Option<usize>,
    diagnostics: Diagnostics,
}

pub fn handle(config_path: &Path, out_dir: Option<&Path>) -> Result<()> {
    let mut config = load_config_from_path(config_path)?;
    if let Some(dir) = out_dir {
        config.output_dir = dir.to_path_buf();
    }
    info!(
        units = config.units.len(),
        rules = %config.rules,
        out = %config.output_dir.display(),
        "starting run"
    );

    let results: Vec<(String, Result<UnitReport>)> = config
        .units
        .par_iter()
        .map(|unit| (unit.name.clone(), run_unit(&config, unit)))
        .collect();

    let mut reports = Vec::new();
    let mut combined = Diagnostics::new();
    let mut failed = 0usize;
    for (name, result) in results {
        match result {
            Ok(mut report) => {
                combined.merge(std::mem::take(&mut report.diagnostics));
                reports.push(report);
            }
            Err(err) => {
                failed += 1;
                error!(unit = %name, "unit failed: {err:#}");
            }
        }
    }
    info!("run cleaning: {}", combined.summary());
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    fs::write(
        config.output_dir.join("diagnostics.json"),
        serde_json::to_string_pretty(&combined)?,
    )
    .context("writing run diagnostics")?;
    print_report_table(&reports)?;

    if failed > 0 {
        return Err(anyhow!("{failed} of {} units failed", config.units.len()));
    }
    Ok(())
}

fn run_unit(config: &RunConfig, unit: &UnitConfig) -> Result<UnitReport> {
    let dir = config.output_dir.join(&unit.name);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let (commands, mut diag) = read_commands(&unit.commands, &unit.columns)?;
    diag.tag_entity(&unit.name);
    report_diagnostics(&diag, &unit.name);
    fs::write(
        dir.join("diagnostics.json"),
        serde_json::to_string_pretty(&diag)?,
    )
    .context("writing diagnostics")?;

    let output = build_pairs(&commands, &config.build_options())
        .with_context(|| format!("building trajectory for {}", unit.name))?;
    write_frame(&mut segments_frame(&output)?, &dir.join("segments.csv"))?;
    write_frame(&mut summary_frame(&output.summary)?, &dir.join("summary.csv"))?;

    let series = resample(&output.segments, &config.resample)?;
    write_frame(&mut resampled_frame(&series)?, &dir.join("minutely.csv"))?;

    let hourly = hourly_average(&series, &config.hourly)?;
    write_frame(
        &mut hourly_frame(&hourly, config.hourly.energy)?,
        &dir.join("hourly.csv"),
    )?;

    let contract_hours = match &unit.contract {
        Some(path) => {
            let contract = read_points(path, &unit.contract_time_col, &unit.contract_mw_col)?;
            let rows = compare_with_contract(&hourly, &contract);
            write_frame(&mut comparison_frame(&rows)?, &dir.join("comparison.csv"))?;
            Some(rows.iter().filter(|r| r.contract_mw.is_some()).count())
        }
        None => None,
    };

    info!(unit = %unit.name, segments = output.len(), hours = hourly.len(), "unit done");
    Ok(UnitReport {
        name: unit.name.clone(),
        commands: commands.len(),
        dropped: diag.stats.rows_dropped,
        segments: output.len(),
        cuts: output.cut_count(),
        minutes: series.len(),
        hours: hourly.len(),
        contract_hours,
        diagnostics: diag,
    })
}

fn print_report_table(reports: &[UnitReport]) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "UNIT\tCOMMANDS\tDROPPED\tSEGMENTS\tCUTS\tMINUTES\tHOURS\tCONTRACT"
    )?;
    for report in reports {
        let contract = report
            .contract_hours
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            report.name,
            report.commands,
            report.dropped,
            report.segments,
            report.cuts,
            report.minutes,
            report.hours,
            contract
        )?;
    }
    writer.flush()?;
    Ok(())
}
