//! End-to-end tests for the planning pipeline, against the mock provider.

use super::*;
use crate::domain::{
    BusId, BusLineDetail, Coordinates, DayClass, Direction, DispatchIntervals, Itinerary, LaneId,
    LegStation, LineStation, LocalStationId, RawLeg, Route, RouteSummary, StationId, SubwayLine,
    TRAFFIC_BUS, TRAFFIC_SUBWAY, TRAFFIC_WALK,
};
use crate::history::{
    HistoricalModels, HourlyOccupancy, RidershipKey, RidershipPrediction, RiskTable, SubwayKey,
};
use crate::odsay::MockOdsayClient;
use chrono::{NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use std::time::Duration as StdDuration;

// 2021-03-08 is a Monday.
fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 3, 8)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

fn bus_line(id: i64) -> BusLineDetail {
    BusLineDetail {
        bus_id: BusId(id),
        bus_no: id.to_string(),
        start_point: "Depot".into(),
        end_point: "Terminal".into(),
        first_departure: None,
        last_departure: None,
        // One hour end to end over four stations.
        total_distance_m: 18_700.0,
        intervals: DispatchIntervals {
            general: Some(60.0),
            ..DispatchIntervals::default()
        },
        stations: (1..=4)
            .map(|i| LineStation {
                station_id: StationId(i),
                local_id: LocalStationId(100 + i as u64),
                name: format!("Stop {i}"),
            })
            .collect(),
    }
}

fn ridership_rows(models: &mut HistoricalModels, route_no: &str, rows: &[(u64, i32, f64, f64)]) {
    for &(local, hour, ride, alight) in rows {
        models.ridership.insert(
            RidershipKey {
                route_no: route_no.into(),
                is_weekend: false,
                local_station: LocalStationId(local),
                hour,
            },
            RidershipPrediction { ride, alight },
        );
    }
}

fn models() -> HistoricalModels {
    let mut models = HistoricalModels::default();

    // Bus 100 stays moderate; bus 200 overflows and must be clamped.
    ridership_rows(
        &mut models,
        "100",
        &[
            (101, 7, 10.0, 0.0),
            (102, 8, 5.0, 1.0),
            (103, 8, 2.0, 4.0),
            (104, 8, 0.0, 12.0),
        ],
    );
    ridership_rows(
        &mut models,
        "200",
        &[
            (101, 7, 100.0, 0.0),
            (102, 8, 20.0, 0.0),
            (103, 8, 0.0, 10.0),
            (104, 8, 0.0, 200.0),
        ],
    );

    let up = |code: &str| SubwayKey::new(DayClass::Weekday, code, Direction::Up);
    models
        .subway
        .insert(up("401"), [(8, 80.0)].into_iter().collect::<HourlyOccupancy>());
    models
        .subway
        .insert(up("402"), [(8, 500.0)].into_iter().collect::<HourlyOccupancy>());
    models.subway.insert(
        SubwayKey::sentinel(DayClass::Weekday, Direction::Up),
        [(8, 30.0)].into_iter().collect::<HourlyOccupancy>(),
    );

    models.bus_risk = (0..=70).map(|n| (n, n as f64 / 70.0)).collect::<RiskTable>();
    models.subway_risk = (0..=600).map(|n| (n, n as f64 / 600.0)).collect::<RiskTable>();
    models
}

fn summary(total_time: u32) -> RouteSummary {
    RouteSummary {
        origin: "Stop 2".into(),
        destination: "Central".into(),
        total_time,
        payment: 1450,
        map_object: Some("1:2:3".into()),
    }
}

fn walk(distance: u32, minutes: u32) -> RawLeg {
    RawLeg {
        traffic_type: TRAFFIC_WALK,
        distance,
        section_time: minutes,
        start_name: None,
        end_name: None,
        stations: Vec::new(),
        lanes: Vec::new(),
        way_code: None,
    }
}

fn leg_stations(ids: &[i64]) -> Vec<LegStation> {
    ids.iter()
        .map(|&id| LegStation {
            station_id: StationId(id),
            name: format!("Stop {id}"),
        })
        .collect()
}

fn bus_leg(ids: &[i64], minutes: u32, buses: &[i64]) -> RawLeg {
    RawLeg {
        traffic_type: TRAFFIC_BUS,
        distance: 2500,
        section_time: minutes,
        start_name: None,
        end_name: None,
        stations: leg_stations(ids),
        lanes: buses
            .iter()
            .map(|&id| LaneId::Bus {
                id: BusId(id),
                number: id.to_string(),
                bus_type: 11,
            })
            .collect(),
        way_code: None,
    }
}

fn subway_leg(ids: &[i64], minutes: u32, line: i32) -> RawLeg {
    RawLeg {
        traffic_type: TRAFFIC_SUBWAY,
        distance: 4000,
        section_time: minutes,
        start_name: None,
        end_name: None,
        stations: leg_stations(ids),
        lanes: vec![LaneId::Subway {
            line: SubwayLine(line),
        }],
        way_code: Some(1),
    }
}

/// Walk, bus 100 or 200, interchange, subway line 4.
fn bus_then_subway() -> Itinerary {
    Itinerary {
        summary: summary(16),
        legs: vec![
            walk(200, 2),
            bus_leg(&[2, 3, 4], 6, &[100, 200]),
            walk(0, 0),
            subway_leg(&[401, 402, 403], 6, 4),
        ],
    }
}

fn mock() -> MockOdsayClient {
    MockOdsayClient::from_parts(vec![bus_then_subway()], vec![bus_line(100), bus_line(200)])
        .with_latency(StdDuration::from_millis(5))
}

async fn run(
    provider: &MockOdsayClient,
    itineraries: &[Itinerary],
    mode: RankMode,
) -> PlanOutcome {
    let models = models();
    let config = EngineConfig::new();
    Planner::new(provider, &models, &config)
        .plan(itineraries, now(), mode)
        .await
}

#[tokio::test]
async fn every_lane_alternative_becomes_a_route() {
    let provider = mock();
    let outcome = run(&provider, &[bus_then_subway()], RankMode::Safest).await;

    assert_eq!(outcome.report.itineraries, 1);
    assert_eq!(outcome.report.candidates, 2);
    assert_eq!(outcome.report.dropped_incomplete, 0);
    assert_eq!(outcome.routes.len(), 2);

    for route in &outcome.routes {
        // Walk, bus, subway: the zero-length interchange is gone.
        assert_eq!(route.segments.len(), 3);
        assert!(route.risk_score.is_some());
        assert!(route.mean_risk.is_some());
    }
}

#[tokio::test]
async fn bus_occupancy_follows_ridership_and_clamps() {
    let provider = mock();
    let outcome = run(&provider, &[bus_then_subway()], RankMode::Fastest).await;

    let bus_counts = |route: &Route| -> Vec<f64> {
        route.segments[1]
            .stations
            .iter()
            .map(|s| s.predicted_count.unwrap())
            .collect()
    };

    let by_bus = |id: i64| {
        outcome
            .routes
            .iter()
            .find(|r| r.segments[1].bus_id() == Some(BusId(id)))
            .unwrap()
    };

    // Before boarding: 10; then +4, -2, -12.
    assert_eq!(bus_counts(by_bus(100)), vec![14.0, 12.0, 0.0]);
    // 100 + 20 = 120 clamps to 70; 110 clamps to 70; -90 clamps to 0.
    assert_eq!(bus_counts(by_bus(200)), vec![70.0, 70.0, 0.0]);
}

#[tokio::test]
async fn subway_uses_default_row_and_clamps() {
    let provider = mock();
    let outcome = run(&provider, &[bus_then_subway()], RankMode::Safest).await;
    let subway = &outcome.routes[0].segments[2];

    let congestion: Vec<f64> = subway
        .stations
        .iter()
        .map(|s| s.predicted_congestion.unwrap())
        .collect();
    assert_eq!(congestion, vec![0.8, 3.68, 0.3]);
    assert_eq!(subway.stations[0].predicted_count, Some(128.0));
    assert_eq!(subway.warning_count, 0);
}

#[tokio::test]
async fn identical_bus_lookups_fetch_once() {
    let provider = mock();
    let itineraries = vec![bus_then_subway(), bus_then_subway(), bus_then_subway()];
    let outcome = run(&provider, &itineraries, RankMode::Safest).await;

    assert_eq!(outcome.report.candidates, 6);
    // One fetch per distinct (bus, board, alight, start) key: buses 100 and 200.
    assert_eq!(provider.fetch_count(), 2);
}

#[tokio::test]
async fn different_start_times_are_different_lookups() {
    let provider = mock();
    let later_start = Itinerary {
        summary: summary(20),
        legs: vec![walk(400, 6), bus_leg(&[2, 3, 4], 6, &[100])],
    };
    run(&provider, &[bus_then_subway(), later_start], RankMode::Safest).await;

    assert_eq!(provider.fetch_count(), 3);
}

#[tokio::test]
async fn each_request_gets_a_fresh_cache() {
    let provider = mock();
    run(&provider, &[bus_then_subway()], RankMode::Safest).await;
    run(&provider, &[bus_then_subway()], RankMode::Safest).await;

    assert_eq!(provider.fetch_count(), 4);
}

#[tokio::test]
async fn provider_failure_drops_only_the_affected_routes() {
    let provider = mock().with_failure(BusId(200));
    let outcome = run(&provider, &[bus_then_subway()], RankMode::Safest).await;

    assert_eq!(outcome.report.candidates, 2);
    assert_eq!(outcome.report.provider_failures, 1);
    assert_eq!(outcome.report.dropped_incomplete, 1);
    assert_eq!(outcome.routes.len(), 1);
    assert_eq!(outcome.routes[0].segments[1].bus_id(), Some(BusId(100)));
}

#[tokio::test]
async fn missing_coverage_never_reaches_the_output() {
    let provider = mock();
    // Line 7 has no station rows and no default row for "down".
    let mut uncovered = bus_then_subway();
    uncovered.legs[3] = subway_leg(&[701, 702], 4, 7);
    uncovered.legs[3].way_code = Some(2);

    let outcome = run(&provider, &[uncovered, bus_then_subway()], RankMode::Safest).await;

    assert_eq!(outcome.report.candidates, 4);
    assert_eq!(outcome.report.dropped_incomplete, 2);
    assert!(outcome.routes.iter().all(Route::is_complete));
}

#[tokio::test]
async fn broken_itineraries_are_rejected_and_counted() {
    let provider = mock();
    let degenerate = Itinerary {
        summary: summary(5),
        legs: vec![bus_leg(&[2], 5, &[100])],
    };
    let mut unsupported = bus_then_subway();
    unsupported.legs[0].traffic_type = 9;

    let outcome = run(
        &provider,
        &[degenerate, bus_then_subway(), unsupported],
        RankMode::Safest,
    )
    .await;

    assert_eq!(outcome.report.itineraries, 3);
    assert_eq!(outcome.report.rejected_itineraries, 2);
    assert_eq!(outcome.report.candidates, 2);
}

#[tokio::test]
async fn safest_and_riskiest_are_ordered_by_risk() {
    let provider = mock();
    let itineraries = vec![bus_then_subway(), bus_then_subway()];

    let safest = run(&provider, &itineraries, RankMode::Safest).await.routes;
    assert!(
        safest
            .windows(2)
            .all(|w| w[0].risk_key().0 <= w[1].risk_key().0)
    );

    let riskiest = run(&provider, &itineraries, RankMode::Riskiest).await.routes;
    assert!(
        riskiest
            .windows(2)
            .all(|w| w[0].risk_key().0 >= w[1].risk_key().0)
    );
    assert_eq!(
        riskiest.first().map(Route::risk_key),
        safest.last().map(Route::risk_key)
    );
}

#[tokio::test]
async fn planning_is_deterministic() {
    let itineraries = vec![bus_then_subway(), bus_then_subway()];
    let first = run(&mock(), &itineraries, RankMode::Safest).await;
    let second = run(&mock(), &itineraries, RankMode::Safest).await;

    assert_eq!(first.routes, second.routes);
    assert_eq!(first.report, second.report);
}

#[tokio::test]
async fn plan_trip_asks_the_directions_provider() {
    let provider = mock();
    let models = models();
    let config = EngineConfig::new().with_max_concurrent_routes(1);

    let outcome = Planner::new(&provider, &models, &config)
        .plan_trip(
            Coordinates::new(126.97, 37.55),
            Coordinates::new(127.02, 37.50),
            now(),
            RankMode::Fastest,
        )
        .await
        .unwrap();

    assert_eq!(outcome.report.itineraries, 1);
    assert_eq!(outcome.routes.len(), 2);
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn candidates_are_the_product_of_lane_counts(
        lane_counts in prop::collection::vec(1usize..4, 1..4),
    ) {
        let mut next_id = 1000;
        let legs = lane_counts
            .iter()
            .map(|&k| {
                let buses: Vec<i64> = (0..k).map(|_| { next_id += 1; next_id }).collect();
                bus_leg(&[2, 3], 4, &buses)
            })
            .collect();
        let itinerary = Itinerary { summary: summary(12), legs };

        let provider = MockOdsayClient::from_parts(Vec::new(), Vec::new());
        let outcome = block_on(run(&provider, &[itinerary], RankMode::Safest));

        let expected: usize = lane_counts.iter().product();
        prop_assert_eq!(outcome.report.candidates, expected);
        // Unknown lines cannot be enriched, so nothing survives the filter.
        prop_assert!(outcome.routes.is_empty());
    }

    #[test]
    fn predictions_stay_in_range(
        ride in 0.0f64..500.0,
        alight in 0.0f64..500.0,
        raw in -50.0f64..1000.0,
    ) {
        let mut models = models();
        ridership_rows(
            &mut models,
            "100",
            &[(102, 8, ride, alight), (103, 8, ride, alight), (104, 8, ride, alight)],
        );
        models.subway.insert(
            SubwayKey::new(DayClass::Weekday, "401", Direction::Up),
            [(8, raw)].into_iter().collect::<HourlyOccupancy>(),
        );
        let config = EngineConfig::new();
        let provider = mock();

        let planner = Planner::new(&provider, &models, &config);
        let outcome = block_on(planner.plan(&[bus_then_subway()], now(), RankMode::Safest));

        for route in &outcome.routes {
            for seg in route.transit_segments() {
                for station in &seg.stations {
                    let congestion = station.predicted_congestion.unwrap();
                    let count = station.predicted_count.unwrap();
                    match seg.kind {
                        crate::domain::SegmentKind::Bus => {
                            prop_assert!((0.0..=70.0).contains(&count));
                            prop_assert!((0.0..=70.0 / 46.0).contains(&congestion));
                        }
                        _ => {
                            prop_assert!((0.0..=3.68).contains(&congestion));
                            prop_assert!((0.0..=368.0 * 1.6).contains(&count));
                        }
                    }
                }
            }
        }
    }
}
