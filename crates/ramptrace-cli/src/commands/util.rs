use anyhow::{Context, Result};
use ramptrace_algo::{PairBuildOptions, RampRules};
use ramptrace_core::{Command, Diagnostics};
use ramptrace_ts::io::{read_commands, CommandColumns};
use rayon::ThreadPoolBuilder;
use tracing::{info, warn};

use ramptrace_cli::cli::CommandInput;

pub fn configure_threads(threads: &str) {
    let count = if threads.eq_ignore_ascii_case("auto") {
        num_cpus::get()
    } else {
        threads.parse().unwrap_or_else(|_| num_cpus::get())
    };
    let _ = ThreadPoolBuilder::new().num_threads(count).build_global();
}

pub fn build_options(input: &CommandInput) -> Result<PairBuildOptions> {
    let preset = RampRules::preset(input.rules);
    let rules = preset.with_hold_durations(
        input.hold_up.unwrap_or(preset.up_hold_seconds),
        input.hold_down.unwrap_or(preset.down_hold_seconds),
    );
    rules.validate().context("invalid ramp rules")?;
    Ok(PairBuildOptions::new(rules)
        .with_gap_pairs(!input.no_gap_pairs)
        .with_gap_min_seconds(input.gap_min))
}

pub fn load_commands(input: &CommandInput) -> Result<Vec<Command>> {
    let columns = CommandColumns {
        time: input.time_col.clone(),
        mw: input.mw_col.clone(),
        flag: input.flag_col.clone(),
    };
    let (commands, diag) = read_commands(&input.input, &columns)?;
    report_diagnostics(&diag, &input.input.display().to_string());
    Ok(commands)
}

/// Log cleaning results; every issue goes out at `warn`.
pub fn report_diagnostics(diag: &Diagnostics, source: &str) {
    info!(source, "{}", diag.summary());
    for issue in &diag.issues {
        warn!(source, "{issue}");
    }
}
