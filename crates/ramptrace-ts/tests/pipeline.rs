//! Commands through segments, minutely series and hourly values.

use ramptrace_algo::profiles::{build_shutdown_timeline, ShutdownProfile};
use ramptrace_algo::{build_pairs, PairBuildOptions, RampRules};
use ramptrace_core::time::{add_seconds, parse_timestamp};
use ramptrace_core::{Command, PairIndex, ResampledPoint, TimePoint, Timestamp};
use ramptrace_ts::io::resampled_frame;
use ramptrace_ts::{
    hourly_average, resample, Frequency, GapPolicy, HourLabel, HourlyAverage, HourlyOptions,
    ResampleOptions,
};

fn base() -> Timestamp {
    parse_timestamp("2024-03-01 00:00:00").unwrap()
}

fn at(secs: f64) -> Timestamp {
    add_seconds(base(), secs)
}

fn path(points: &[(f64, f64)]) -> Vec<TimePoint> {
    points
        .iter()
        .map(|&(secs, mw)| TimePoint::new(at(secs), mw))
        .collect()
}

fn value_at(series: &[ResampledPoint], t: Timestamp) -> Option<f64> {
    series.iter().find(|p| p.time == t).and_then(|p| p.mw)
}

#[test]
fn test_single_ramp_sampled_each_minute() {
    let series = resample(
        &[path(&[(0.0, 0.0), (120.0, 2.0)])],
        &ResampleOptions::default(),
    )
    .unwrap();

    let times: Vec<Timestamp> = series.iter().map(|p| p.time).collect();
    assert_eq!(times, vec![at(0.0), at(60.0), at(120.0)]);
    let values: Vec<f64> = series.iter().filter_map(|p| p.mw).collect();
    assert_eq!(values, vec![0.0, 1.0, 2.0]);
}

#[test]
fn test_ffill_holds_previous_value_across_gap() {
    let paths = vec![
        path(&[(0.0, 0.0), (300.0, 50.0)]),
        path(&[(900.0, 80.0), (1200.0, 80.0)]),
    ];
    let options = ResampleOptions::default().with_gap_policy(GapPolicy::Ffill);
    let series = resample(&paths, &options).unwrap();

    let gap: Vec<&ResampledPoint> = series
        .iter()
        .filter(|p| p.time > at(300.0) && p.time < at(900.0))
        .collect();
    assert_eq!(gap.len(), 9);
    assert!(gap.iter().all(|p| p.mw == Some(50.0)));
    assert_eq!(value_at(&series, at(900.0)), Some(80.0));
    assert_eq!(series.len(), 6 + 9 + 6);
}

#[test]
fn test_gap_policies_fill_differently() {
    let paths = vec![
        path(&[(0.0, 10.0), (60.0, 10.0)]),
        path(&[(240.0, 40.0), (300.0, 40.0)]),
    ];
    let fill = |policy| {
        let options = ResampleOptions::default().with_gap_policy(policy);
        resample(&paths, &options).unwrap()
    };

    let none = fill(GapPolicy::None);
    assert_eq!(none.len(), 4);

    let nan = fill(GapPolicy::Nan);
    assert_eq!(nan.len(), 6);
    assert!(nan.iter().any(|p| p.time == at(120.0) && p.mw.is_none()));

    let bridged = fill(GapPolicy::BridgeLinear);
    assert!((value_at(&bridged, at(120.0)).unwrap() - 20.0).abs() < 1e-9);
    assert!((value_at(&bridged, at(180.0)).unwrap() - 30.0).abs() < 1e-9);
}

#[test]
fn test_segments_resample_onto_aligned_grid() {
    let commands = vec![Command::new(at(0.0), 0.0), Command::new(at(3600.0), 330.0)];
    let out = build_pairs(&commands, &PairBuildOptions::new(RampRules::ppa())).unwrap();

    let options = ResampleOptions {
        track_pair_index: true,
        ..ResampleOptions::default()
    };
    let series = resample(&out.segments, &options).unwrap();

    assert_eq!(series.len(), 61);
    assert!(series.iter().all(|p| Frequency::MINUTE.is_aligned(p.time)));
    assert!(series.iter().all(|p| p.pair == Some(PairIndex::Pair(0))));
    assert!((value_at(&series, at(1800.0)).unwrap() - 198.0).abs() < 1e-6);
    assert_eq!(value_at(&series, at(3000.0)), Some(330.0));
    assert_eq!(value_at(&series, at(3600.0)), Some(330.0));

    let values: Vec<f64> = series.iter().filter_map(|p| p.mw).collect();
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_tracked_gap_segment_ticks_keep_their_own_tag() {
    // 100 -> 122 at the slow rate finishes at 200 s; flat gap until 600 s
    let commands = vec![Command::new(at(0.0), 100.0), Command::new(at(600.0), 122.0)];
    let out = build_pairs(&commands, &PairBuildOptions::new(RampRules::ppa())).unwrap();
    assert_eq!(out.len(), 2);

    let options = ResampleOptions {
        track_pair_index: true,
        ..ResampleOptions::default()
    };
    let series = resample(&out.segments, &options).unwrap();

    let ramp: Vec<&ResampledPoint> = series
        .iter()
        .filter(|p| p.pair == Some(PairIndex::Pair(0)))
        .collect();
    let gap: Vec<&ResampledPoint> = series
        .iter()
        .filter(|p| p.pair == Some(PairIndex::Gap(0)))
        .collect();
    assert_eq!(ramp.len(), 4);
    assert_eq!(gap.len(), 7);
    assert_eq!(gap[0].time, at(240.0));
    assert!(gap.iter().all(|p| p.mw == Some(122.0)));

    let frame = resampled_frame(&series).unwrap();
    let tags = frame.column("pair").unwrap().utf8().unwrap();
    assert_eq!(tags.get(0), Some("0"));
    assert_eq!(tags.get(series.len() - 1), Some("0_gap"));
}

#[test]
fn test_profile_timeline_resamples_like_a_segment() {
    let timeline = build_shutdown_timeline(at(0.0), 264.0, &ShutdownProfile::default());
    let series = resample(&[timeline], &ResampleOptions::default()).unwrap();

    assert_eq!(series.len(), 136);
    assert_eq!(value_at(&series, at(30.0 * 60.0)), Some(264.0));
    assert!((value_at(&series, at(45.0 * 60.0)).unwrap() - 231.0).abs() < 1e-9);
    assert_eq!(value_at(&series, at(135.0 * 60.0)), Some(0.0));
}

fn ramp_series(minutes: usize) -> Vec<ResampledPoint> {
    (0..minutes)
        .map(|m| ResampledPoint::new(at(m as f64 * 60.0), Some(m as f64)))
        .collect()
}

#[test]
fn test_hourly_left_and_right_labels() {
    let series = ramp_series(121);

    let left = hourly_average(
        &series,
        &HourlyOptions {
            label: HourLabel::Left,
            ..HourlyOptions::default()
        },
    )
    .unwrap();
    let hours: Vec<Timestamp> = left.iter().map(|h| h.hour).collect();
    assert_eq!(hours, vec![at(0.0), at(3600.0)]);
    assert!((left[0].value - 30.0).abs() < 1e-9);
    assert!((left[1].value - 90.0).abs() < 1e-9);
    assert!(left.iter().all(|h| h.samples == 61));

    let right = hourly_average(
        &series,
        &HourlyOptions {
            label: HourLabel::Right,
            ..HourlyOptions::default()
        },
    )
    .unwrap();
    let hours: Vec<Timestamp> = right.iter().map(|h| h.hour).collect();
    assert_eq!(hours, vec![at(3600.0), at(7200.0)]);
    assert!((right[0].value - 30.0).abs() < 1e-9);
}

#[test]
fn test_incomplete_hours_dropped_unless_kept() {
    let series = ramp_series(90);
    let strict = hourly_average(&series, &HourlyOptions::default()).unwrap();
    assert_eq!(strict.len(), 1);
    assert_eq!(strict[0].hour, at(3600.0));

    let lenient = hourly_average(
        &series,
        &HourlyOptions {
            drop_incomplete: false,
            ..HourlyOptions::default()
        },
    )
    .unwrap();
    assert_eq!(lenient.len(), 3);
    assert_eq!(lenient[0].samples, 1);
    assert_eq!(lenient[2].samples, 30);
}

#[test]
fn test_energy_and_sample_mean() {
    let series = ramp_series(61);
    let energy = hourly_average(
        &series,
        &HourlyOptions {
            energy: true,
            label: HourLabel::Left,
            ..HourlyOptions::default()
        },
    )
    .unwrap();
    assert!((energy[0].value - 30.0).abs() < 1e-9);

    let mean = hourly_average(
        &series,
        &HourlyOptions {
            average: HourlyAverage::SampleMean,
            label: HourLabel::Left,
            ..HourlyOptions::default()
        },
    )
    .unwrap();
    assert!((mean[0].value - 30.0).abs() < 1e-9);
}
