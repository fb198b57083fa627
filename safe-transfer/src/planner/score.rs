//! Sliding-window risk scoring.
//!
//! A route scores points whenever a value stays above a threshold for a
//! whole window: sustained crowding, sustained infection risk, and long
//! uninterrupted rides.

use crate::domain::{PathSegment, Route};

use super::config::{ScoringConfig, Thresholds, WindowPass};

/// Scan a series for windows whose minimum exceeds a threshold.
///
/// Starting at each index `i`, the window closes at the first `j > i` whose
/// time is more than `window` after `times[i]`. If the minimum of
/// `values[i..=j]` exceeds a level, the highest such level's score is
/// added and the scan resumes at `j`, so the closing sample can open the
/// next window. The scan stops at the first `i` whose window never closes.
///
/// `times` must be non-decreasing.
pub fn scan_windows(values: &[f64], times: &[i64], window: i64, thresholds: &Thresholds) -> f64 {
    let len = values.len().min(times.len());
    let mut score = 0.0;
    let mut i = 0;

    while i < len {
        let Some(j) = (i + 1..len).find(|&j| times[j] - times[i] > window) else {
            break;
        };

        let min = values[i..=j].iter().copied().fold(f64::INFINITY, f64::min);
        if let Some(points) = thresholds.score_for(min) {
            score += points;
            i = j - 1;
        }
        i += 1;
    }

    score
}

fn scan_pass(values: &[f64], times: &[i64], pass: &WindowPass) -> f64 {
    scan_windows(values, times, pass.window_secs, &pass.thresholds)
}

/// Score of one transit segment: the sum of its three passes.
///
/// Stations without a prediction count as zero.
pub fn score_segment(segment: &PathSegment, config: &ScoringConfig) -> f64 {
    let times: Vec<i64> = segment.stations.iter().map(|s| s.elapsed_secs()).collect();
    let congestion: Vec<f64> = segment
        .stations
        .iter()
        .map(|s| s.predicted_congestion.unwrap_or(0.0))
        .collect();
    let risk: Vec<f64> = segment
        .stations
        .iter()
        .map(|s| s.predicted_risk.unwrap_or(0.0))
        .collect();
    let elapsed: Vec<f64> = times.iter().map(|&t| t as f64).collect();

    scan_pass(&congestion, &times, &config.congestion)
        + scan_pass(&risk, &times, &config.risk)
        + scan_pass(&elapsed, &times, &config.elapsed)
}

/// Compute `(risk_score, mean_risk)` for a route.
///
/// `mean_risk` averages the predicted risk of every transit station and
/// is 0 for a route without any.
pub fn score_route(route: &Route, config: &ScoringConfig) -> (f64, f64) {
    let risk_score = route
        .transit_segments()
        .map(|segment| score_segment(segment, config))
        .sum();

    let (total, count) = route
        .transit_stations()
        .fold((0.0, 0usize), |(total, count), station| {
            (total + station.predicted_risk.unwrap_or(0.0), count + 1)
        });
    let mean_risk = if count == 0 {
        0.0
    } else {
        total / count as f64
    };

    (risk_score, mean_risk)
}

/// Score a route in place.
pub fn apply_score(route: &mut Route, config: &ScoringConfig) {
    let (risk_score, mean_risk) = score_route(route, config);
    route.risk_score = Some(risk_score);
    route.mean_risk = Some(mean_risk);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BusId, LaneId, Prediction, RouteSummary, SegmentKind, Station, StationId};
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 8, 24)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap()
    }

    fn thresholds(pairs: &[(f64, f64)]) -> Thresholds {
        Thresholds::new(pairs.iter().copied())
    }

    #[test]
    fn window_that_never_exceeds_scores_nothing() {
        let t = thresholds(&[(0.25, 0.5), (0.5, 1.0)]);
        let score = scan_windows(&[0.1, 0.3, 0.6, 0.2], &[0, 300, 600, 900], 600, &t);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn window_includes_its_closing_sample() {
        let t = thresholds(&[(0.5, 1.0)]);
        // The window from index 0 closes at index 3, whose value is low.
        let score = scan_windows(&[0.9, 0.9, 0.9, 0.1], &[0, 300, 600, 900], 600, &t);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn highest_level_wins_and_scan_jumps() {
        let t = ScoringConfig::default().congestion.thresholds;
        let values = [0.6, 0.7, 0.8, 0.9, 0.3];
        let times = [0, 300, 600, 900, 1200];
        // i=0 closes at j=3 with min 0.6: +1, resume at 3, which never closes.
        assert_eq!(scan_windows(&values, &times, 600, &t), 1.0);

        let values = [1.2, 1.3, 1.1, 1.4, 1.5, 1.6, 1.2];
        let times = [0, 300, 600, 900, 1200, 1500, 1800];
        // i=0 -> j=3 (+3), i=3 -> j=6 (+3), i=6 never closes.
        assert_eq!(scan_windows(&values, &times, 600, &t), 6.0);
    }

    #[test]
    fn short_series_scores_nothing() {
        let t = thresholds(&[(0.0, 1.0)]);
        assert_eq!(scan_windows(&[], &[], 600, &t), 0.0);
        assert_eq!(scan_windows(&[5.0], &[0], 600, &t), 0.0);
        assert_eq!(scan_windows(&[5.0, 5.0], &[0, 600], 600, &t), 0.0);
    }

    #[test]
    fn elapsed_pass_rewards_long_rides_only() {
        let pass = ScoringConfig::default().elapsed;
        let times: Vec<i64> = (0..7).map(|i| i * 300).collect();
        let values: Vec<f64> = times.iter().map(|&t| t as f64).collect();
        assert_eq!(scan_pass(&values, &times, &pass), 0.0);

        let times: Vec<i64> = (0..11).map(|i| i * 300).collect();
        let values: Vec<f64> = times.iter().map(|&t| t as f64).collect();
        assert_eq!(scan_pass(&values, &times, &pass), 1.0);
    }

    fn bus_segment(congestions: &[f64], risks: &[f64], gap_secs: i64) -> PathSegment {
        let mut seg = PathSegment::walk(1000, Duration::minutes(20), t0());
        seg.kind = SegmentKind::Bus;
        seg.lane = Some(LaneId::Bus {
            id: BusId(1),
            number: "1".into(),
            bus_type: 1,
        });
        seg.stations = congestions
            .iter()
            .zip(risks)
            .zip(0i64..)
            .map(|((&congestion, &risk), i)| {
                let offset = Duration::seconds(gap_secs * i);
                Station::new(StationId(i), "S", t0() + offset, offset).with_prediction(
                    Prediction {
                        count: congestion * 46.0,
                        congestion,
                        risk,
                    },
                )
            })
            .collect();
        seg
    }

    fn route(segments: Vec<PathSegment>) -> Route {
        Route::new(
            RouteSummary {
                origin: "A".into(),
                destination: "B".into(),
                total_time: 20,
                payment: 1250,
                map_object: None,
            },
            segments,
        )
    }

    #[test]
    fn route_score_sums_segment_passes() {
        let crowded = bus_segment(&[1.2; 4], &[1.0; 4], 300);
        let quiet = bus_segment(&[0.1; 4], &[0.0; 4], 300);
        let walk = PathSegment::walk(200, Duration::minutes(3), t0());
        let mut r = route(vec![crowded, walk, quiet]);

        apply_score(&mut r, &ScoringConfig::default());

        // Crowded: congestion +3, risk +2, elapsed 0; quiet scores nothing.
        assert_eq!(r.risk_score, Some(5.0));
        assert_eq!(r.mean_risk, Some(0.5));
    }

    #[test]
    fn route_without_transit_has_zero_mean_risk() {
        let r = route(vec![PathSegment::walk(200, Duration::minutes(3), t0())]);
        assert_eq!(score_route(&r, &ScoringConfig::default()), (0.0, 0.0));
    }

    proptest! {
        #[test]
        fn values_at_or_below_every_level_score_zero(
            values in prop::collection::vec(0.0f64..=0.25, 0..20),
        ) {
            let times: Vec<i64> = (0..values.len() as i64).map(|i| i * 120).collect();
            let t = ScoringConfig::default().congestion.thresholds;
            prop_assert_eq!(scan_windows(&values, &times, 600, &t), 0.0);
        }

        #[test]
        fn score_is_a_multiple_of_the_single_level(
            values in prop::collection::vec(0.0f64..2.0, 0..20),
        ) {
            let times: Vec<i64> = (0..values.len() as i64).map(|i| i * 120).collect();
            let t = thresholds(&[(1.0, 2.0)]);
            let score = scan_windows(&values, &times, 600, &t);
            prop_assert!(score >= 0.0);
            prop_assert_eq!(score % 2.0, 0.0);
        }
    }
}
