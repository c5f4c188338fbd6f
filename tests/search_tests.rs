use std::time::Instant;

use transitnav::{
    prelude::*,
    raptor::{Label, RoundLabels, WALKING_NAME},
};

const A: Coordinate = Coordinate::new(59.0000, 18.0);
const B: Coordinate = Coordinate::new(59.0135, 18.0);
const B_WALK: Coordinate = Coordinate::new(59.0175, 18.0);
const C: Coordinate = Coordinate::new(59.0270, 18.0);
const D: Coordinate = Coordinate::new(59.0500, 18.0);
const NOWHERE: Coordinate = Coordinate::new(60.0, 18.0);

fn at(hms: &str) -> Time {
    Time::from_hms(hms).unwrap()
}

/// Wednesday 7 May 2025.
fn wednesday(hms: &str) -> Departure {
    Departure::new(at(hms), ServiceDate::from_yyyymmdd(20250507).unwrap())
}

fn stops() -> RepositoryBuilder {
    let mut builder = RepositoryBuilder::new();
    builder.add_stop("A", "A", A);
    builder.add_stop("B", "B", B);
    builder.add_stop("B2", "B walk", B_WALK);
    builder.add_stop("C", "C", C);
    builder.add_stop("D", "D", D);
    let start = ServiceDate::from_yyyymmdd(20250101).unwrap();
    let end = ServiceDate::from_yyyymmdd(20251231).unwrap();
    builder.add_service("daily", [true; 7], start, end);
    builder.add_service(
        "thursday",
        [false, false, false, true, false, false, false],
        start,
        end,
    );
    builder
}

fn add_trip(
    builder: &mut RepositoryBuilder,
    id: &str,
    service: &str,
    line: &str,
    visits: &[(&str, &str)],
) {
    let visits = visits
        .iter()
        .enumerate()
        .map(|(seq, (stop, time))| TripVisit::new(*stop, seq as u32 + 1, at(time), at(time)))
        .collect();
    assert!(builder.add_trip(id, service, line, visits).is_some());
}

fn line_network(service: &str) -> Repository {
    let mut builder = stops();
    add_trip(
        &mut builder,
        "t1",
        service,
        "1",
        &[("A", "08:00:00"), ("B", "08:10:00"), ("C", "08:20:00")],
    );
    builder.build()
}

/// A slow direct trip A -> D and a faster one changing at B with a walk to B2.
fn transfer_network() -> Repository {
    let mut builder = stops();
    add_trip(&mut builder, "slow", "daily", "slow", &[("A", "08:00:00"), ("D", "09:30:00")]);
    add_trip(&mut builder, "first", "daily", "1", &[("A", "08:00:00"), ("B", "08:10:00")]);
    add_trip(&mut builder, "second", "daily", "2", &[("B2", "08:20:00"), ("D", "08:40:00")]);
    builder.build()
}

fn plan(repository: &Repository, from: Coordinate, to: Coordinate) -> SearchOutcome<'_> {
    repository
        .router(from, to)
        .departure_at(wednesday("07:50:00"))
        .search()
        .unwrap()
}

fn found<'a>(outcome: SearchOutcome<'a>) -> SearchResult<'a> {
    match outcome {
        SearchOutcome::Found(result) => result,
        other => panic!("expected a journey, got {other:?}"),
    }
}

#[test]
fn walk_directly_when_close() {
    let repository = line_network("daily");
    let nearby = Coordinate::new(59.0009, 18.0);
    let outcome = plan(&repository, A, nearby);
    let SearchOutcome::WalkDirectly { distance, duration } = outcome else {
        panic!("expected a walk, got {outcome:?}");
    };
    assert!(distance.as_meters() > 90.0 && distance.as_meters() < 110.0);
    assert!(duration.as_seconds() > 80 && duration.as_seconds() < 100);
}

#[test]
fn single_trip_journey() {
    let repository = line_network("daily");
    let result = found(plan(&repository, A, C));
    assert!(!result.is_next_day());
    assert_eq!(result.destination_rounds().collect::<Vec<_>>(), vec![1]);
    assert_eq!(result.arrival_time(1), Some(at("08:20:00")));

    let itinerary = result.best().unwrap();
    assert_eq!(itinerary.round, 1);
    assert_eq!(itinerary.arrival_time(), Some(at("08:20:00")));
    let trips: Vec<_> = itinerary.trip_legs().collect();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].from_name.as_ref(), "A");
    assert_eq!(trips[0].to_name.as_ref(), "C");
    assert_eq!(trips[0].name.as_ref(), "1");
    assert_eq!(trips[0].departure_time, at("08:00:00"));
    assert_eq!(trips[0].arrival_time, at("08:20:00"));
    assert_eq!(trips[0].stops.len(), 3);
    assert_eq!(itinerary.transfers(), 0);
}

#[test]
fn transfer_buffer_skips_tight_connection() {
    let mut builder = stops();
    add_trip(
        &mut builder,
        "gone",
        "daily",
        "gone",
        &[("A", "07:55:00"), ("B", "08:00:00"), ("C", "08:15:00")],
    );
    add_trip(
        &mut builder,
        "tight",
        "daily",
        "tight",
        &[("A", "07:59:00"), ("B", "08:04:00"), ("C", "08:19:00")],
    );
    add_trip(
        &mut builder,
        "late",
        "daily",
        "late",
        &[("A", "08:00:00"), ("B", "08:05:00"), ("C", "08:20:00")],
    );
    let repository = builder.build();
    assert_eq!(repository.patterns.len(), 1);

    // At B by 08:03, two minutes are needed before boarding.
    let router = repository.router(B, C).departure_at(wednesday("08:03:00"));
    let result = found(router.search().unwrap());
    let itinerary = result.best().unwrap();
    let trip = itinerary.trip_legs().next().unwrap();
    assert_eq!(trip.name.as_ref(), "late");
    assert_eq!(trip.departure_time, at("08:05:00"));
    assert_eq!(itinerary.arrival_time(), Some(at("08:20:00")));

    let config = SearchConfig {
        min_transfer_time: Duration::ZERO,
        ..Default::default()
    };
    let result = found(
        repository
            .router(B, C)
            .with_config(config)
            .departure_at(wednesday("08:03:00"))
            .search()
            .unwrap(),
    );
    let itinerary = result.best().unwrap();
    assert_eq!(itinerary.trip_legs().next().unwrap().name.as_ref(), "tight");
    assert_eq!(itinerary.arrival_time(), Some(at("08:19:00")));
}

#[test]
fn switches_to_an_earlier_trip_along_the_pattern() {
    let mut builder = stops();
    add_trip(
        &mut builder,
        "t0",
        "daily",
        "early",
        &[("A", "07:55:00"), ("B", "08:10:00"), ("C", "08:20:00")],
    );
    add_trip(
        &mut builder,
        "t1",
        "daily",
        "late",
        &[("A", "08:05:00"), ("B", "08:25:00"), ("C", "08:40:00")],
    );
    let repository = builder.build();
    assert_eq!(repository.patterns.len(), 1);

    // Halfway between A and B, both about 11 minutes away on foot. "early"
    // has left A by then but can still be caught at B.
    let between = Coordinate::new(59.00675, 18.0);
    let result = found(plan(&repository, between, C));
    let itinerary = result.best().unwrap();
    let trips: Vec<_> = itinerary.trip_legs().collect();
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].name.as_ref(), "early");
    assert_eq!(trips[0].from_name.as_ref(), "B");
    assert_eq!(trips[0].departure_time, at("08:10:00"));
    assert_eq!(itinerary.arrival_time(), Some(at("08:20:00")));
}

#[test]
fn retries_on_the_next_day() {
    let repository = line_network("thursday");
    let result = found(plan(&repository, A, C));
    assert!(result.is_next_day());
    assert_eq!(result.day_offset(), 1);
    assert_eq!(result.departure().date.as_yyyymmdd(), 20250508);
    assert_eq!(result.departure().time, at("00:05:00"));
    let itinerary = result.best().unwrap();
    assert!(itinerary.is_next_day());
    assert_eq!(itinerary.arrival_time(), Some(at("08:20:00")));
}

#[test]
fn gives_up_after_bounded_rollover() {
    let mut builder = stops();
    let start = ServiceDate::from_yyyymmdd(20240101).unwrap();
    let end = ServiceDate::from_yyyymmdd(20241231).unwrap();
    builder.add_service("expired", [true; 7], start, end);
    add_trip(&mut builder, "t1", "expired", "1", &[("A", "08:00:00"), ("C", "08:20:00")]);
    let repository = builder.build();
    let outcome = plan(&repository, A, C);
    assert!(matches!(outcome, SearchOutcome::NoJourney));
}

#[test]
fn no_journey_against_direction_of_travel() {
    let repository = line_network("daily");
    let outcome = plan(&repository, C, A);
    assert!(matches!(outcome, SearchOutcome::NoJourney));
}

#[test]
fn location_not_served() {
    let repository = line_network("daily");
    let outcome = plan(&repository, NOWHERE, C);
    assert!(matches!(outcome, SearchOutcome::LocationNotServed(Endpoint::Origin)));
    let outcome = plan(&repository, A, NOWHERE);
    assert!(matches!(outcome, SearchOutcome::LocationNotServed(Endpoint::Destination)));
}

#[test]
fn transfers_through_a_footpath() {
    let repository = transfer_network();
    let result = found(plan(&repository, A, D));
    assert_eq!(result.destination_rounds().collect::<Vec<_>>(), vec![1, 2]);

    let itinerary = result.reconstruct(2).unwrap();
    let kinds: Vec<_> = itinerary.legs.iter().map(|leg| leg.kind.is_trip()).collect();
    assert_eq!(kinds, vec![false, true, false, true, false]);
    let walk = &itinerary.legs[2];
    assert_eq!(walk.from_name.as_ref(), "B");
    assert_eq!(walk.to_name.as_ref(), "B walk");
    assert_eq!(walk.name.as_ref(), WALKING_NAME);
    assert!(walk.arrival_time <= at("08:18:00"));
    assert_eq!(itinerary.transfers(), 1);
    assert_eq!(itinerary.arrival_time(), Some(at("08:40:00")));
}

#[test]
fn journeys_trade_transfers_for_arrival() {
    let repository = transfer_network();
    let result = found(plan(&repository, A, D));
    let journeys = result.journeys().unwrap();
    assert_eq!(journeys.len(), 2);
    assert_eq!(journeys[0].arrival_time(), Some(at("09:30:00")));
    assert_eq!(journeys[0].transfers(), 0);
    assert_eq!(journeys[1].arrival_time(), Some(at("08:40:00")));
    assert_eq!(journeys[1].transfers(), 1);
    for pair in journeys.windows(2) {
        assert!(pair[1].arrival_time() < pair[0].arrival_time());
        assert!(pair[1].round > pair[0].round);
    }
    assert!(matches!(
        result.reconstruct(42),
        Err(transitnav::raptor::Error::RoundOutOfRange { round: 42, .. })
    ));
}

#[test]
fn search_is_idempotent() {
    let repository = transfer_network();
    let router = repository.router(A, D).departure_at(wednesday("07:50:00"));
    let first = found(router.search().unwrap());
    let second = found(router.search().unwrap());
    assert_eq!(first.rounds(), second.rounds());
}

fn label_at(rounds: &[RoundLabels], round: usize, stop: StopRef) -> Option<&Label> {
    rounds.get(round)?.get(stop)
}

#[test]
fn labels_are_monotonic_and_pruned() {
    let repository = transfer_network();
    let result = found(plan(&repository, A, D));
    let rounds = result.rounds();
    let buffer = SearchConfig::default().min_transfer_time;

    let mut best_destination = Time::from_seconds(u32::MAX);
    for (round, labels) in rounds.iter().enumerate() {
        for label in labels.reached().chain(labels.destination()) {
            assert!(label.arrival_time >= label.departure_time);
            // Nothing is kept that can not beat an earlier round's destination.
            assert!(label.arrival_time < best_destination);
            let StopRef::Stop(_) = label.from else {
                assert_eq!(label.from, StopRef::VirtualOrigin);
                assert_eq!(round, 0);
                continue;
            };
            if label.kind.is_trip() {
                let boarding = label_at(rounds, round - 1, label.from).unwrap();
                assert!(boarding.arrival_time + buffer <= label.departure_time);
            } else {
                let boarding = label_at(rounds, round, label.from)
                    .or_else(|| label_at(rounds, round - 1, label.from))
                    .unwrap();
                assert!(boarding.arrival_time <= label.departure_time);
            }
        }
        if let Some(destination) = labels.destination() {
            best_destination = best_destination.min(destination.arrival_time);
        }
    }
}

#[test]
fn cancelled_search_stops() {
    let repository = line_network("daily");
    let token = CancelToken::new();
    token.cancel();
    let outcome = repository
        .router(A, C)
        .departure_at(wednesday("07:50:00"))
        .cancel_token(token)
        .search();
    assert!(matches!(outcome, Err(transitnav::raptor::Error::Cancelled)));

    let outcome = repository
        .router(A, C)
        .departure_at(wednesday("07:50:00"))
        .deadline(Instant::now())
        .search();
    assert!(matches!(outcome, Err(transitnav::raptor::Error::DeadlineExceeded)));
}

#[test]
fn repository_is_shared_between_threads() {
    let repository = transfer_network();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let result = found(plan(&repository, A, D));
                    result.best().unwrap().arrival_time()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(at("08:40:00")));
        }
    });
}
