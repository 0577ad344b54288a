//! Run configuration for `ramptrace run`.
//!
//! ```yaml
//! output_dir: out
//! rules: epc
//! hold_up_seconds: 1800
//! resample:
//!   gap_policy: ffill
//! hourly:
//!   label: right
//! units:
//!   - name: S1
//!     commands: s1_commands.csv
//!     contract: contract.csv
//! ```
//!
//! Relative paths are resolved against the configuration file's directory.
//! The hourly stage always reads the resampled series, so its frequency is
//! taken from `resample.frequency`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use ramptrace_algo::{PairBuildOptions, RampRules, RateSelection};
use ramptrace_ts::io::CommandColumns;
use ramptrace_ts::{HourlyOptions, ResampleOptions};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub output_dir: PathBuf,
    /// Ramp rule preset shared by every unit
    pub rules: RateSelection,
    pub hold_up_seconds: Option<f64>,
    pub hold_down_seconds: Option<f64>,
    pub make_gap_pairs: bool,
    pub gap_min_seconds: f64,
    pub resample: ResampleOptions,
    pub hourly: HourlyOptions,
    pub units: Vec<UnitConfig>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("ramptrace-out"),
            rules: RateSelection::Ppa,
            hold_up_seconds: None,
            hold_down_seconds: None,
            make_gap_pairs: true,
            gap_min_seconds: 1.0,
            resample: ResampleOptions::default(),
            hourly: HourlyOptions::default(),
            units: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConfig {
    pub name: String,
    pub commands: PathBuf,
    #[serde(default)]
    pub columns: CommandColumns,
    #[serde(default)]
    pub contract: Option<PathBuf>,
    #[serde(default = "default_time_col")]
    pub contract_time_col: String,
    #[serde(default = "default_mw_col")]
    pub contract_mw_col: String,
}

fn default_time_col() -> String {
    "time".to_string()
}

fn default_mw_col() -> String {
    "mw".to_string()
}

impl RunConfig {
    pub fn build_options(&self) -> PairBuildOptions {
        let preset = RampRules::preset(self.rules);
        let rules = preset.with_hold_durations(
            self.hold_up_seconds.unwrap_or(preset.up_hold_seconds),
            self.hold_down_seconds.unwrap_or(preset.down_hold_seconds),
        );
        PairBuildOptions::new(rules)
            .with_gap_pairs(self.make_gap_pairs)
            .with_gap_min_seconds(self.gap_min_seconds)
    }

    /// Resolve relative paths against `base` and check unit names.
    pub fn resolve(mut self, base: &Path) -> Result<Self> {
        if self.units.is_empty() {
            return Err(anyhow!("run configuration lists no units"));
        }
        let mut seen = std::collections::HashSet::new();
        for unit in &mut self.units {
            if unit.name.trim().is_empty() {
                return Err(anyhow!("unit name cannot be empty"));
            }
            if !seen.insert(unit.name.clone()) {
                return Err(anyhow!("duplicate unit '{}' in run configuration", unit.name));
            }
            unit.commands = rebase(base, &unit.commands);
            unit.contract = unit.contract.as_deref().map(|p| rebase(base, p));
        }
        self.output_dir = rebase(base, &self.output_dir);
        if self.hourly.frequency != self.resample.frequency {
            warn!(
                hourly = %self.hourly.frequency,
                resample = %self.resample.frequency,
                "hourly frequency follows the resample frequency"
            );
            self.hourly.frequency = self.resample.frequency;
        }
        self.build_options()
            .rules
            .validate()
            .context("invalid ramp rules in run configuration")?;
        self.resample
            .validate()
            .context("invalid resample options in run configuration")?;
        Ok(self)
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

pub fn load_config_from_path(path: &Path) -> Result<RunConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading run configuration '{}'", path.display()))?;
    let config: RunConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing run configuration yaml")?
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing run configuration json")?
        }
        Some(ext) if ext.eq_ignore_ascii_case("toml") => {
            toml::from_str(&data).context("parsing run configuration toml")?
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing run configuration")?,
    };
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ramptrace_algo::build_pairs;
    use ramptrace_core::time::{add_seconds, parse_timestamp};
    use ramptrace_core::Command;
    use ramptrace_ts::{hourly_average, resample, GapPolicy, HourLabel};
    use tempfile::tempdir;

    #[test]
    fn test_yaml_config_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        fs::write(
            &path,
            "rules: epc\nhold_up_seconds: 600\nresample:\n  gap_policy: ffill\nunits:\n  - name: S1\n    commands: s1.csv\n",
        )
        .unwrap();

        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.rules, RateSelection::Epc);
        assert_eq!(config.resample.gap_policy, GapPolicy::Ffill);
        assert_eq!(config.hourly.label, HourLabel::Right);
        assert_eq!(config.units[0].commands, dir.path().join("s1.csv"));
        assert_eq!(config.units[0].columns, CommandColumns::default());

        let rules = config.build_options().rules;
        assert_eq!(rules.up_hold_seconds, 600.0);
        assert_eq!(rules.down_hold_seconds, 1800.0);
        assert_eq!(rules.up_threshold.value(), 429.0);
    }

    #[test]
    fn test_toml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            "output_dir = \"/tmp/out\"\n\n[resample]\nfrequency = \"5T\"\n\n[hourly]\nlabel = \"left\"\n\n[[units]]\nname = \"S2\"\ncommands = \"s2.csv\"\ncontract = \"ct.csv\"\n",
        )
        .unwrap();

        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.hourly.label, HourLabel::Left);
        assert_eq!(config.resample.frequency.seconds(), 300);
        assert_eq!(config.hourly.frequency.seconds(), 300);
        assert_eq!(config.units[0].contract, Some(dir.path().join("ct.csv")));
    }

    #[test]
    fn test_hourly_completeness_uses_resample_frequency() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        fs::write(
            &path,
            "resample:\n  frequency: 5T\nhourly:\n  frequency: T\nunits:\n  - name: S1\n    commands: s1.csv\n",
        )
        .unwrap();
        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.hourly.frequency, config.resample.frequency);
        assert_eq!(config.hourly.frequency.expected_per_hour(), 13);

        let t0 = parse_timestamp("2024-03-01 00:00:00").unwrap();
        let commands = vec![
            Command::new(t0, 100.0),
            Command::new(add_seconds(t0, 6.0 * 3600.0), 100.0),
        ];
        let output = build_pairs(&commands, &config.build_options()).unwrap();
        let series = resample(&output.segments, &config.resample).unwrap();
        assert_eq!(series.len(), 73);

        let hourly = hourly_average(&series, &config.hourly).unwrap();
        assert_eq!(hourly.len(), 6);
        assert!(hourly
            .iter()
            .all(|h| h.samples == 13 && (h.value - 100.0).abs() < 1e-9));
    }

    #[test]
    fn test_duplicate_units_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(
            &path,
            r#"{"units": [{"name": "S1", "commands": "a.csv"}, {"name": "S1", "commands": "b.csv"}]}"#,
        )
        .unwrap();
        assert!(load_config_from_path(&path).is_err());
    }

    #[test]
    fn test_empty_units_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        fs::write(&path, "rules: ppa\n").unwrap();
        assert!(load_config_from_path(&path).is_err());
    }
}
