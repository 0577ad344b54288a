//! Hourly output against a contracted hourly schedule.

use std::collections::HashMap;

use ramptrace_core::time::truncate_to_minute;
use ramptrace_core::{HourlyPoint, TimePoint, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Values at or below this magnitude are treated as zero output.
const ZERO_OUTPUT: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContractComparison {
    pub hour: Timestamp,
    pub mw: f64,
    pub contract_mw: Option<f64>,
    /// `(mw - contract) / mw * 100`
    pub deviation_pct: Option<f64>,
}

/// Left-join hourly rows with contract values on the minute-truncated hour.
///
/// When the contract lists the same hour twice the later finite value is
/// used. Deviation is left empty for hours without a contract value or with
/// zero output.
pub fn compare_with_contract(
    hourly: &[HourlyPoint],
    contract: &[TimePoint],
) -> Vec<ContractComparison> {
    let mut by_hour: HashMap<Timestamp, f64> = HashMap::with_capacity(contract.len());
    for point in contract.iter().filter(|p| p.mw.is_finite()) {
        by_hour.insert(truncate_to_minute(point.time), point.mw);
    }

    let rows: Vec<ContractComparison> = hourly
        .iter()
        .map(|row| {
            let contract_mw = by_hour.get(&truncate_to_minute(row.hour)).copied();
            ContractComparison {
                hour: row.hour,
                mw: row.value,
                contract_mw,
                deviation_pct: contract_mw.and_then(|ct| deviation_pct(row.value, ct)),
            }
        })
        .collect();

    debug!(
        hours = rows.len(),
        matched = rows.iter().filter(|r| r.contract_mw.is_some()).count(),
        "contract comparison"
    );
    rows
}

fn deviation_pct(mw: f64, contract: f64) -> Option<f64> {
    if !mw.is_finite() || mw.abs() <= ZERO_OUTPUT {
        return None;
    }
    Some((mw - contract) / mw * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ramptrace_core::time::parse_timestamp;

    fn t(s: &str) -> Timestamp {
        parse_timestamp(s).unwrap()
    }

    fn hour(s: &str, value: f64) -> HourlyPoint {
        HourlyPoint {
            hour: t(s),
            value,
            samples: 61,
        }
    }

    #[test]
    fn test_deviation_and_missing_contract() {
        let hourly = vec![
            hour("2024-01-01 01:00:00", 200.0),
            hour("2024-01-01 02:00:00", 0.0),
            hour("2024-01-01 03:00:00", 150.0),
        ];
        let contract = vec![
            TimePoint::new(t("2024-01-01 01:00:00"), 180.0),
            TimePoint::new(t("2024-01-01 02:00:00"), 50.0),
        ];
        let rows = compare_with_contract(&hourly, &contract);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].contract_mw, Some(180.0));
        assert!((rows[0].deviation_pct.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(rows[1].contract_mw, Some(50.0));
        assert_eq!(rows[1].deviation_pct, None);
        assert_eq!(rows[2].contract_mw, None);
        assert_eq!(rows[2].deviation_pct, None);
    }

    #[test]
    fn test_contract_matched_at_minute_resolution() {
        let hourly = vec![hour("2024-01-01 01:00:00", 100.0)];
        let contract = vec![
            TimePoint::new(t("2024-01-01 01:00:20"), 90.0),
            TimePoint::new(t("2024-01-01 01:00:40"), 80.0),
            TimePoint::new(t("2024-01-01 01:00:50"), f64::NAN),
        ];
        let rows = compare_with_contract(&hourly, &contract);
        assert_eq!(rows[0].contract_mw, Some(80.0));
        assert!((rows[0].deviation_pct.unwrap() - 20.0).abs() < 1e-9);
    }
}
