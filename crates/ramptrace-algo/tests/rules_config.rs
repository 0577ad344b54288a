use ramptrace_algo::{PairBuildOptions, RampRules, RateSelection};
use ramptrace_core::{Megawatts, MegawattsPerSecond};

#[test]
fn test_partial_yaml_falls_back_to_ppa_defaults() {
    let yaml = r#"
up_hold_seconds: 900
rate_selection: epc
"#;
    let rules: RampRules = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(rules.up_hold_seconds, 900.0);
    assert_eq!(rules.down_hold_seconds, 1800.0);
    assert_eq!(rules.rate_selection, RateSelection::Epc);
    assert_eq!(rules.slow_rate, MegawattsPerSecond(0.11));
    // thresholds are not implied by the policy
    assert_eq!(rules.up_threshold, Megawatts(330.0));
}

#[test]
fn test_build_options_json_round_trip() {
    let options = PairBuildOptions::new(RampRules::epc().with_hold_durations(600.0, 0.0))
        .with_gap_min_seconds(30.0);
    let json = serde_json::to_string(&options).unwrap();
    assert!(json.contains("\"rate_selection\":\"epc\""));

    let back: PairBuildOptions = serde_json::from_str(&json).unwrap();
    assert_eq!(back, options);
}

#[test]
fn test_empty_options_document() {
    let options: PairBuildOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, PairBuildOptions::default());
    assert!(options.make_gap_pairs);
    assert_eq!(options.gap_min_seconds, 1.0);
}
