//! Command cleaning.
//!
//! Raw rows come from spreadsheets and hand-kept logs: timestamps may be
//! missing, power cells may hold text, and rows are not always in time order.
//! [`clean_commands`] turns them into a time-sorted command stream and
//! reports every dropped row through [`Diagnostics`].

use ramptrace_core::{Command, Diagnostics, Timestamp};
use tracing::warn;

/// One row as read from an input table, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCommand {
    pub time: Option<Timestamp>,
    pub mw: Option<f64>,
    pub flag: Option<String>,
}

impl RawCommand {
    pub fn new(time: Option<Timestamp>, mw: Option<f64>) -> Self {
        Self {
            time,
            mw,
            flag: None,
        }
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }
}

/// Historical stop-command flag: `TRUE`, `1`, `T`, `Y`, `YES` (any case) are set.
pub fn normalize_flag(raw: Option<&str>) -> bool {
    raw.map(|v| v.trim().to_ascii_uppercase())
        .is_some_and(|v| matches!(v.as_str(), "TRUE" | "1" | "T" | "Y" | "YES"))
}

/// Drop incomplete rows and sort the rest by time (stable).
pub fn clean_commands(rows: impl IntoIterator<Item = RawCommand>) -> (Vec<Command>, Diagnostics) {
    let mut diag = Diagnostics::new();
    let mut commands = Vec::new();
    let mut latest: Option<Timestamp> = None;

    for (idx, row) in rows.into_iter().enumerate() {
        let line = idx + 1;
        diag.stats.rows_read += 1;

        let Some(time) = row.time else {
            diag.drop_row("missing or unparseable timestamp", line);
            continue;
        };
        let mw = match row.mw {
            Some(v) if v.is_finite() => v,
            Some(v) => {
                diag.drop_row(&format!("non-finite MW value {v}"), line);
                continue;
            }
            None => {
                diag.drop_row("missing or unparseable MW value", line);
                continue;
            }
        };

        if latest.is_some_and(|prev| time < prev) {
            diag.stats.rows_reordered += 1;
        }
        latest = latest.max(Some(time));

        commands.push(
            Command::new(time, mw).with_stop_flag(normalize_flag(row.flag.as_deref())),
        );
    }

    if diag.stats.rows_reordered > 0 {
        diag.add_warning(
            "order",
            &format!(
                "{} rows were out of time order and have been sorted",
                diag.stats.rows_reordered
            ),
        );
    }
    commands.sort_by_key(|c| c.time);
    diag.stats.rows_kept = commands.len();

    if diag.stats.rows_dropped > 0 {
        warn!(
            dropped = diag.stats.rows_dropped,
            read = diag.stats.rows_read,
            "dropped incomplete command rows"
        );
    }
    (commands, diag)
}

/// Finite-value filter plus stable time sort, applied by the pair builder
/// to whatever it is handed.
pub fn prepare_commands(commands: &[Command]) -> Vec<Command> {
    let mut kept: Vec<Command> = commands
        .iter()
        .filter(|c| c.target_mw.is_finite())
        .copied()
        .collect();
    kept.sort_by_key(|c| c.time);
    kept
}
