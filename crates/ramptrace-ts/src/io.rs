//! Tabular input and output.
//!
//! Inputs are read with every column cast to text first, so a timestamp
//! column typed as dates, integers or strings is parsed the same way.
//! Outputs use fixed column names and write timestamps as text in
//! `YYYY-mm-dd HH:MM:SS[.ffffff]` form.

use std::fs::{self, File};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use polars::prelude::*;
#[cfg(feature = "parquet")]
use polars::prelude::{ParquetReader, ParquetWriter};
use ramptrace_algo::profiles::ProfileTimeline;
use ramptrace_algo::{clean_commands, RawCommand};
use ramptrace_core::time::{format_timestamp, parse_timestamp};
use ramptrace_core::{
    BuildOutput, Command, Diagnostics, HourlyPoint, PairSummary, ResampledPoint, TimePoint,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::compare::ContractComparison;

/// Column names of a command table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandColumns {
    pub time: String,
    pub mw: String,
    /// Historical stop flag, read but never used to gate the cut
    pub flag: Option<String>,
}

impl Default for CommandColumns {
    fn default() -> Self {
        Self {
            time: "time".to_string(),
            mw: "mw".to_string(),
            flag: None,
        }
    }
}

pub fn read_frame(path: &Path) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    match extension.as_str() {
        #[cfg(feature = "parquet")]
        "parquet" => {
            let reader = ParquetReader::new(&mut file);
            reader.finish().context("reading Parquet file")
        }
        #[cfg(not(feature = "parquet"))]
        "parquet" => Err(anyhow!(
            "parquet support is disabled; rebuild with the 'parquet' feature"
        )),
        "csv" | "txt" => {
            let reader = CsvReader::new(&mut file);
            reader.has_header(true).finish().context("reading CSV file")
        }
        _ => Err(anyhow!(
            "unsupported file extension '{}'; use .csv or .parquet",
            extension
        )),
    }
}

/// Load and clean a command table.
///
/// A missing time or power column is not fatal: the result is empty and the
/// problem is recorded as a diagnostics error.
pub fn read_commands(path: &Path, columns: &CommandColumns) -> Result<(Vec<Command>, Diagnostics)> {
    let df = read_frame(path)?;
    for required in [&columns.time, &columns.mw] {
        if df.column(required).is_err() {
            warn!(file = %path.display(), column = %required, "command column missing");
            let mut diag = Diagnostics::new();
            diag.add_error(
                "schema",
                &format!("column '{required}' not found in {}", path.display()),
            );
            return Ok((Vec::new(), diag));
        }
    }

    let times = column_text(&df, &columns.time)?;
    let values = column_text(&df, &columns.mw)?;
    let flags = match columns.flag.as_deref() {
        Some(name) if df.column(name).is_ok() => column_text(&df, name)?,
        _ => vec![None; df.height()],
    };

    let rows = times
        .into_iter()
        .zip(values)
        .zip(flags)
        .map(|((time, mw), flag)| RawCommand {
            time: time.as_deref().and_then(parse_timestamp),
            mw: mw.as_deref().and_then(parse_number),
            flag,
        });
    let (commands, diag) = clean_commands(rows);
    debug!(
        file = %path.display(),
        rows = diag.stats.rows_read,
        kept = commands.len(),
        "loaded commands"
    );
    Ok((commands, diag))
}

/// Read a fixed-frequency series; empty or non-numeric values become `None`.
/// Rows with an unreadable timestamp are skipped.
pub fn read_series(path: &Path, time_col: &str, value_col: &str) -> Result<Vec<ResampledPoint>> {
    let df = read_frame(path)?;
    let times = column_text(&df, time_col)?;
    let values = column_text(&df, value_col)?;

    let mut skipped = 0usize;
    let series: Vec<ResampledPoint> = times
        .into_iter()
        .zip(values)
        .filter_map(|(time, value)| {
            let parsed = time.as_deref().and_then(parse_timestamp);
            if parsed.is_none() {
                skipped += 1;
            }
            parsed.map(|t| ResampledPoint::new(t, value.as_deref().and_then(parse_number)))
        })
        .collect();
    if skipped > 0 {
        warn!(file = %path.display(), skipped, "series rows without a readable timestamp");
    }
    Ok(series)
}

/// Read `(time, value)` points, dropping rows where either is unreadable.
pub fn read_points(path: &Path, time_col: &str, value_col: &str) -> Result<Vec<TimePoint>> {
    Ok(read_series(path, time_col, value_col)?
        .into_iter()
        .filter_map(|p| p.mw.map(|mw| TimePoint::new(p.time, mw)))
        .collect())
}

/// Read an hourly table as written by [`hourly_frame`].
pub fn read_hourly(path: &Path, time_col: &str, value_col: &str) -> Result<Vec<HourlyPoint>> {
    let df = read_frame(path)?;
    let samples = match df.column("samples") {
        Ok(_) => column_text(&df, "samples")?,
        Err(_) => vec![None; df.height()],
    };
    let times = column_text(&df, time_col)?;
    let values = column_text(&df, value_col)?;

    Ok(times
        .into_iter()
        .zip(values)
        .zip(samples)
        .filter_map(|((time, value), count)| {
            let hour = time.as_deref().and_then(parse_timestamp)?;
            let value = value.as_deref().and_then(parse_number)?;
            let samples = count
                .as_deref()
                .and_then(|c| c.trim().parse::<usize>().ok())
                .unwrap_or(0);
            Some(HourlyPoint {
                hour,
                value,
                samples,
            })
        })
        .collect())
}

fn column_text(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(column)
        .with_context(|| format!("column '{column}' not found"))?;
    let text = series
        .cast(&DataType::Utf8)
        .with_context(|| format!("casting column '{column}' to text"))?;
    let chunked = text
        .utf8()
        .with_context(|| format!("column '{column}' must be utf8"))?;
    Ok(chunked
        .into_iter()
        .map(|opt| opt.map(|value| value.to_string()))
        .collect())
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Long table of every event: `pair_index, event, time, mw`.
pub fn segments_frame(output: &BuildOutput) -> Result<DataFrame> {
    let mut pair_index = Vec::new();
    let mut event = Vec::new();
    let mut time = Vec::new();
    let mut mw = Vec::new();
    for segment in &output.segments {
        for ev in segment.events() {
            pair_index.push(segment.index().to_string());
            event.push(ev.kind.as_str());
            time.push(format_timestamp(ev.time));
            mw.push(ev.mw.value());
        }
    }
    DataFrame::new(vec![
        Series::new("pair_index", pair_index),
        Series::new("event", event),
        Series::new("time", time),
        Series::new("mw", mw),
    ])
    .context("building segments frame")
}

pub fn summary_frame(summary: &[PairSummary]) -> Result<DataFrame> {
    let text = |t: Option<ramptrace_core::Timestamp>| t.map(format_timestamp);
    DataFrame::new(vec![
        Series::new(
            "pair_index",
            summary.iter().map(|r| r.pair_index.to_string()).collect::<Vec<_>>(),
        ),
        Series::new(
            "start_mw",
            summary.iter().map(|r| r.start_mw.value()).collect::<Vec<_>>(),
        ),
        Series::new(
            "start_time",
            summary.iter().map(|r| format_timestamp(r.start_time)).collect::<Vec<_>>(),
        ),
        Series::new(
            "hold_mw",
            summary.iter().map(|r| r.hold_mw.map(|m| m.value())).collect::<Vec<_>>(),
        ),
        Series::new(
            "hold_start",
            summary.iter().map(|r| text(r.hold_start)).collect::<Vec<_>>(),
        ),
        Series::new(
            "hold_end",
            summary.iter().map(|r| text(r.hold_end)).collect::<Vec<_>>(),
        ),
        Series::new(
            "finish_mw",
            summary.iter().map(|r| r.finish_mw.value()).collect::<Vec<_>>(),
        ),
        Series::new(
            "finish_time",
            summary.iter().map(|r| format_timestamp(r.finish_time)).collect::<Vec<_>>(),
        ),
        Series::new(
            "end_reason",
            summary.iter().map(|r| r.end_reason.as_str()).collect::<Vec<_>>(),
        ),
        Series::new(
            "inside_hold",
            summary.iter().map(|r| r.inside_hold).collect::<Vec<_>>(),
        ),
        Series::new(
            "is_gap",
            summary.iter().map(|r| r.is_gap).collect::<Vec<_>>(),
        ),
        Series::new(
            "gap_seconds",
            summary.iter().map(|r| r.gap_seconds).collect::<Vec<_>>(),
        ),
    ])
    .context("building summary frame")
}

/// `time, mw`, plus `pair` when the series carries pair indices.
pub fn resampled_frame(series: &[ResampledPoint]) -> Result<DataFrame> {
    let mut columns = vec![
        Series::new(
            "time",
            series.iter().map(|p| format_timestamp(p.time)).collect::<Vec<_>>(),
        ),
        Series::new("mw", series.iter().map(|p| p.mw).collect::<Vec<_>>()),
    ];
    if series.iter().any(|p| p.pair.is_some()) {
        columns.push(Series::new(
            "pair",
            series
                .iter()
                .map(|p| p.pair.map(|index| index.to_string()))
                .collect::<Vec<_>>(),
        ));
    }
    DataFrame::new(columns).context("building resampled frame")
}

/// `time, MW, samples` (or `MWh` for energy output).
pub fn hourly_frame(hourly: &[HourlyPoint], energy: bool) -> Result<DataFrame> {
    let value_name = if energy { "MWh" } else { "MW" };
    DataFrame::new(vec![
        Series::new(
            "time",
            hourly.iter().map(|h| format_timestamp(h.hour)).collect::<Vec<_>>(),
        ),
        Series::new(value_name, hourly.iter().map(|h| h.value).collect::<Vec<_>>()),
        Series::new(
            "samples",
            hourly.iter().map(|h| h.samples as i64).collect::<Vec<_>>(),
        ),
    ])
    .context("building hourly frame")
}

pub fn comparison_frame(rows: &[ContractComparison]) -> Result<DataFrame> {
    DataFrame::new(vec![
        Series::new(
            "time",
            rows.iter().map(|r| format_timestamp(r.hour)).collect::<Vec<_>>(),
        ),
        Series::new("MW", rows.iter().map(|r| r.mw).collect::<Vec<_>>()),
        Series::new(
            "contract_MW",
            rows.iter().map(|r| r.contract_mw).collect::<Vec<_>>(),
        ),
        Series::new(
            "deviation_pct",
            rows.iter().map(|r| r.deviation_pct).collect::<Vec<_>>(),
        ),
    ])
    .context("building comparison frame")
}

/// `phase, offset_min, time, mw`.
pub fn profile_frame(timeline: &ProfileTimeline) -> Result<DataFrame> {
    let points = &timeline.points;
    DataFrame::new(vec![
        Series::new(
            "phase",
            points.iter().map(|p| p.phase.as_str()).collect::<Vec<_>>(),
        ),
        Series::new(
            "offset_min",
            points.iter().map(|p| p.offset_minutes).collect::<Vec<_>>(),
        ),
        Series::new(
            "time",
            points.iter().map(|p| format_timestamp(p.time)).collect::<Vec<_>>(),
        ),
        Series::new("mw", points.iter().map(|p| p.mw).collect::<Vec<_>>()),
    ])
    .context("building profile frame")
}

/// Write CSV or Parquet by extension, creating parent directories.
pub fn write_frame(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase());

    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    match extension.as_deref() {
        #[cfg(feature = "parquet")]
        Some("parquet") => ParquetWriter::new(&mut file)
            .finish(df)
            .map(|_| ())
            .context("writing Parquet file")?,
        #[cfg(not(feature = "parquet"))]
        Some("parquet") => {
            return Err(anyhow!(
                "parquet support is disabled; rebuild with the 'parquet' feature"
            ))
        }
        Some("csv") => CsvWriter::new(&mut file)
            .finish(df)
            .context("writing CSV file")?,
        _ => {
            return Err(anyhow!(
                "unsupported output extension for {}; use .csv or .parquet",
                path.display()
            ))
        }
    }
    debug!(file = %path.display(), rows = df.height(), "wrote table");
    Ok(())
}
