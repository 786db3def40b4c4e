use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::*;
use shared_api::ApiClient;
use shared_models::error::AppError;
use shared_utils::logging::init_test_tracing;
use shared_utils::test_utils::{MockApiResponses, TestConfig};

fn day(d: u32) -> CalendarDate {
    CalendarDate::new(2024, 3, d).unwrap()
}

async fn create_test_api() -> (MockServer, Arc<ApiClient>) {
    init_test_tracing();
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(mock_server.uri()).to_app_config();
    let api = Arc::new(ApiClient::new(&config).expect("client should build"));
    (mock_server, api)
}

async fn mount_availability(mock_server: &MockServer, provider_id: &str, date: CalendarDate, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/providers/{}/day-availability", provider_id)))
        .and(query_param("day", date.day().to_string()))
        .and(query_param("month", date.month().to_string()))
        .and(query_param("year", date.year().to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(mock_server)
        .await;
}

async fn load(session: &mut BookingSession, request: FetchRequest) -> Result<FetchResolution, BookingError> {
    let outcome = session.fetcher().fetch(request).await;
    session.apply_availability(outcome)
}

#[tokio::test]
async fn test_book_morning_slot_end_to_end() {
    let (mock_server, api) = create_test_api().await;
    mount_availability(&mock_server, "p1", day(10), MockApiResponses::availability_response(&[(8, true), (14, false)])).await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .and(body_json(json!({
            "provider_id": "p1",
            "date": "2024-03-10T11:00:00.000Z"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockApiResponses::appointment_response("p1", "user-1", "2024-03-10T11:00:00.000Z"),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (mut session, request) = BookingSession::open(api, "p1", day(10));
    assert_eq!(session.phase(), BookingPhase::DateChosen);
    assert!(session.is_awaiting_availability());

    assert_eq!(load(&mut session, request).await.unwrap(), FetchResolution::Applied);
    assert_eq!(session.phase(), BookingPhase::AvailabilityLoaded);

    let groups = session.partition();
    assert_eq!(groups.morning, vec![DisplaySlot { hour: 8, label: "08:00".to_string(), available: true }]);
    assert_eq!(groups.afternoon, vec![DisplaySlot { hour: 14, label: "14:00".to_string(), available: false }]);

    session.select_hour(8).unwrap();
    assert_eq!(session.phase(), BookingPhase::HourChosen);
    assert!(session.is_hour_selected(8));

    let confirmation = session.submit().await.unwrap();

    assert_eq!(confirmation.requested_date, Utc.with_ymd_and_hms(2024, 3, 10, 11, 0, 0).unwrap());
    assert_eq!(confirmation.appointment.provider_id, "p1");
    assert_eq!(session.phase(), BookingPhase::Succeeded);
}

#[tokio::test]
async fn test_success_is_terminal() {
    let (mock_server, api) = create_test_api().await;
    mount_availability(&mock_server, "p1", day(10), MockApiResponses::full_day_availability(&[])).await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockApiResponses::appointment_response("p1", "user-1", "2024-03-10T12:00:00.000Z"),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (mut session, request) = BookingSession::open(api, "p1", day(10));
    load(&mut session, request).await.unwrap();
    session.select_hour(9).unwrap();
    session.submit().await.unwrap();

    assert_matches!(
        session.select_provider("p2"),
        Err(BookingError::InvalidTransition { from: BookingPhase::Succeeded, .. })
    );
    assert_matches!(session.select_date(day(11)), Err(BookingError::InvalidTransition { .. }));
    assert_matches!(session.select_hour(10), Err(BookingError::InvalidTransition { .. }));

    let err = session.submit().await.unwrap_err();
    assert_matches!(err, BookingError::InvalidTransition { .. });
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_unavailable_hour_cannot_be_selected() {
    let (mock_server, api) = create_test_api().await;
    mount_availability(&mock_server, "p1", day(10), MockApiResponses::availability_response(&[(8, true), (14, false)])).await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (mut session, request) = BookingSession::open(api, "p1", day(10));

    assert_matches!(session.select_hour(8), Err(BookingError::AvailabilityNotLoaded));

    load(&mut session, request).await.unwrap();

    assert_eq!(session.select_hour(14), Err(BookingError::SlotUnavailable { hour: 14 }));
    assert!(!session.is_hour_selected(14));
    assert_eq!(session.phase(), BookingPhase::AvailabilityLoaded);

    assert_eq!(session.submit().await.unwrap_err(), BookingError::StaleSelection);
    assert_eq!(session.phase(), BookingPhase::AvailabilityLoaded);
}

#[tokio::test]
async fn test_last_request_wins_when_first_resolves_last() {
    let (mock_server, api) = create_test_api().await;
    mount_availability(&mock_server, "p1", day(10), MockApiResponses::availability_response(&[(8, true)])).await;
    mount_availability(&mock_server, "p1", day(11), MockApiResponses::availability_response(&[(15, true)])).await;

    let (mut session, first) = BookingSession::open(api, "p1", day(10));
    let second = session.select_date(day(11)).unwrap().expect("date changed");

    let first_fetch = session.fetcher().fetch(first);
    let second_fetch = session.fetcher().fetch(second);

    let second_outcome = second_fetch.await;
    let first_outcome = first_fetch.await;

    assert_eq!(session.apply_availability(second_outcome).unwrap(), FetchResolution::Applied);
    assert_eq!(session.apply_availability(first_outcome).unwrap(), FetchResolution::Discarded);

    let table = session.availability().unwrap();
    assert!(table.is_for("p1", day(11)));
    assert_eq!(table.slots, vec![AvailabilitySlot::new(15, true)]);
}

#[tokio::test]
async fn test_rapid_changes_on_spawned_fetches_keep_only_latest() {
    let (mock_server, api) = create_test_api().await;

    Mock::given(method("GET"))
        .and(path("/providers/p1/day-availability"))
        .and(query_param("day", "10"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockApiResponses::availability_response(&[(8, true)]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock_server)
        .await;
    mount_availability(&mock_server, "p2", day(10), MockApiResponses::availability_response(&[(9, false)])).await;
    mount_availability(&mock_server, "p2", day(12), MockApiResponses::availability_response(&[(16, true)])).await;

    let (mut session, first) = BookingSession::open(api, "p1", day(10));
    let second = session.select_provider("p2").unwrap().unwrap();
    let third = session.select_date(day(12)).unwrap().unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    for request in [first, second, third] {
        let fetch = session.fetcher().fetch(request);
        let tx = tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(fetch.await);
        });
    }
    drop(tx);

    let mut applied = 0;
    while let Some(outcome) = rx.recv().await {
        if session.apply_availability(outcome).unwrap() == FetchResolution::Applied {
            applied += 1;
        }
    }

    assert_eq!(applied, 1);
    let table = session.availability().unwrap();
    assert!(table.is_for("p2", day(12)));
    assert!(table.is_available(16));
    assert_eq!(session.phase(), BookingPhase::AvailabilityLoaded);
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_table() {
    let (mock_server, api) = create_test_api().await;
    mount_availability(&mock_server, "p1", day(10), MockApiResponses::availability_response(&[(8, true), (9, true)])).await;

    Mock::given(method("GET"))
        .and(path("/providers/p1/day-availability"))
        .and(query_param("day", "11"))
        .respond_with(ResponseTemplate::new(500).set_body_json(MockApiResponses::error_response("Internal server error")))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_availability(&mock_server, "p1", day(11), MockApiResponses::availability_response(&[(10, true)])).await;

    let (mut session, request) = BookingSession::open(api, "p1", day(10));
    load(&mut session, request).await.unwrap();

    let request = session.select_date(day(11)).unwrap().unwrap();
    let err = load(&mut session, request).await.unwrap_err();

    assert_matches!(err, BookingError::FetchFailure(AppError::ExternalService { status: 500, .. }));
    let table = session.availability().unwrap();
    assert!(table.is_for("p1", day(10)));
    assert_eq!(table.slots.len(), 2);
    assert_eq!(session.phase(), BookingPhase::DateChosen);
    assert_matches!(session.select_hour(8), Err(BookingError::AvailabilityNotLoaded));

    let retry = session.refresh_availability().unwrap();
    assert_eq!(load(&mut session, retry).await.unwrap(), FetchResolution::Applied);
    assert!(session.availability().unwrap().is_for("p1", day(11)));
    assert_eq!(session.phase(), BookingPhase::AvailabilityLoaded);
}

#[tokio::test]
async fn test_hour_becomes_stale_after_new_availability() {
    let (mock_server, api) = create_test_api().await;
    mount_availability(&mock_server, "p1", day(10), MockApiResponses::full_day_availability(&[])).await;
    mount_availability(&mock_server, "p1", day(11), MockApiResponses::full_day_availability(&[8])).await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (mut session, request) = BookingSession::open(api, "p1", day(10));
    load(&mut session, request).await.unwrap();
    session.select_hour(8).unwrap();

    let request = session.select_date(day(11)).unwrap().unwrap();

    // Hour is kept but unverified until the new table arrives.
    assert_eq!(session.selection().hour, Some(8));
    assert!(!session.is_hour_selected(8));
    assert_eq!(session.submit().await.unwrap_err(), BookingError::StaleSelection);
    assert_eq!(session.phase(), BookingPhase::DateChosen);

    load(&mut session, request).await.unwrap();

    assert_eq!(session.phase(), BookingPhase::AvailabilityLoaded);
    assert!(!session.is_hour_selected(8));
    let err = session.submit().await.unwrap_err();
    assert_eq!(err, BookingError::StaleSelection);
    assert!(err.requires_reselection());
}

#[tokio::test]
async fn test_returning_to_previous_date_waits_for_fresh_availability() {
    let (mock_server, api) = create_test_api().await;
    mount_availability(&mock_server, "p1", day(10), MockApiResponses::full_day_availability(&[])).await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (mut session, request) = BookingSession::open(api, "p1", day(10));
    load(&mut session, request).await.unwrap();
    session.select_hour(8).unwrap();

    session.select_date(day(11)).unwrap().unwrap();
    let back = session.select_date(day(10)).unwrap().unwrap();

    // The old table matches the pair again, but its refetch is still pending.
    assert!(session.availability().unwrap().is_for("p1", day(10)));
    assert!(session.is_awaiting_availability());
    assert_eq!(session.phase(), BookingPhase::DateChosen);
    assert_eq!(session.verified_hour(), None);
    assert!(!session.is_hour_selected(8));

    assert_eq!(session.submit().await.unwrap_err(), BookingError::StaleSelection);
    assert_eq!(session.phase(), BookingPhase::DateChosen);

    assert_eq!(load(&mut session, back).await.unwrap(), FetchResolution::Applied);
    assert_eq!(session.phase(), BookingPhase::HourChosen);
    assert!(session.is_hour_selected(8));
}

#[tokio::test]
async fn test_submit_before_first_availability_sends_nothing() {
    let (mock_server, api) = create_test_api().await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (mut session, _request) = BookingSession::open(api, "p1", day(10));

    assert_eq!(session.submit().await.unwrap_err(), BookingError::StaleSelection);
    assert_eq!(session.phase(), BookingPhase::DateChosen);
}

#[tokio::test]
async fn test_sticky_hour_is_kept_when_still_available() {
    let (mock_server, api) = create_test_api().await;
    mount_availability(&mock_server, "p1", day(10), MockApiResponses::full_day_availability(&[])).await;
    mount_availability(&mock_server, "p1", day(11), MockApiResponses::full_day_availability(&[9])).await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .and(body_json(json!({
            "provider_id": "p1",
            "date": "2024-03-11T13:00:00.000Z"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockApiResponses::appointment_response("p1", "user-1", "2024-03-11T13:00:00.000Z"),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (mut session, request) = BookingSession::open(api, "p1", day(10));
    load(&mut session, request).await.unwrap();
    session.select_hour(10).unwrap();

    let request = session.select_date(day(11)).unwrap().unwrap();
    load(&mut session, request).await.unwrap();

    assert_eq!(session.phase(), BookingPhase::HourChosen);
    assert!(session.is_hour_selected(10));

    let confirmation = session.submit().await.unwrap();
    assert_eq!(confirmation.requested_date, Utc.with_ymd_and_hms(2024, 3, 11, 13, 0, 0).unwrap());
}

#[tokio::test]
async fn test_transport_failure_keeps_selection_for_retry() {
    let (mock_server, api) = create_test_api().await;
    mount_availability(&mock_server, "p1", day(10), MockApiResponses::full_day_availability(&[])).await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(503).set_body_json(MockApiResponses::error_response("Service unavailable")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockApiResponses::appointment_response("p1", "user-1", "2024-03-10T19:00:00.000Z"),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (mut session, request) = BookingSession::open(api, "p1", day(10));
    load(&mut session, request).await.unwrap();
    session.select_hour(16).unwrap();

    let err = session.submit().await.unwrap_err();
    assert_matches!(err, BookingError::TransportFailure(AppError::ExternalService { status: 503, .. }));
    assert_eq!(session.phase(), BookingPhase::Failed);
    assert_eq!(
        session.selection(),
        Selection { provider_id: "p1".to_string(), date: day(10), hour: Some(16) }
    );

    let confirmation = session.submit().await.unwrap();
    assert_eq!(confirmation.requested_date, Utc.with_ymd_and_hms(2024, 3, 10, 19, 0, 0).unwrap());
    assert_eq!(session.phase(), BookingPhase::Succeeded);
}

#[tokio::test]
async fn test_unchanged_provider_or_date_issues_no_fetch() {
    let (_mock_server, api) = create_test_api().await;
    let (mut session, _request) = BookingSession::open(api, "p1", day(10));

    assert_eq!(session.select_provider("p1").unwrap(), None);
    assert_eq!(session.select_date(day(10)).unwrap(), None);

    let next = session.select_provider("p2").unwrap().unwrap();
    assert_eq!(next.provider_id, "p2");
    assert_eq!(next.date, day(10));
}

#[tokio::test]
async fn test_fetch_day_drops_out_of_range_hours() {
    let (mock_server, api) = create_test_api().await;
    Mock::given(method("GET"))
        .and(path("/providers/provider%20with%20space/day-availability"))
        .and(query_param("day", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockApiResponses::availability_response(&[(8, true), (30, true), (12, false)]),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = AvailabilityFetcher::new(api);
    let slots = fetcher.fetch_day("provider with space", day(10)).await.unwrap();

    assert_eq!(slots, vec![AvailabilitySlot::new(8, true), AvailabilitySlot::new(12, false)]);
}

#[tokio::test]
async fn test_fetch_day_failure_is_fetch_failure() {
    let (mock_server, api) = create_test_api().await;

    Mock::given(method("GET"))
        .and(path("/providers/p9/day-availability"))
        .respond_with(ResponseTemplate::new(404).set_body_json(MockApiResponses::error_response("Provider not found")))
        .mount(&mock_server)
        .await;

    let fetcher = AvailabilityFetcher::new(api);
    let err = fetcher.fetch_day("p9", day(10)).await.unwrap_err();

    assert_eq!(err, BookingError::FetchFailure(AppError::NotFound("Provider not found".to_string())));
}
