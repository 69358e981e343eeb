//! End-to-end integration tests for the settlement engine.
//!
//! This suite drives the HTTP API against a shared in-memory store:
//! - trip pay calculation and idempotent recalculation
//! - cut pay submission
//! - ledger queries with filters and pagination
//! - ledger edits and the reconciliation invariant
//! - bulk approval of mixed batches
//! - pay period lifecycle and guard behavior
//! - the payroll extract
//!
//! Plus a property suite asserting the display-breakdown reconciliation
//! invariant for arbitrary inputs.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use linehaul_settlement::api::{AppState, create_router};
use linehaul_settlement::config::EngineSettings;
use linehaul_settlement::models::{
    RateCard, RateMethod, RateScope, Trip, TripReport,
};
use linehaul_settlement::store::{MemoryStore, PayrollStore};

// =============================================================================
// Test Helpers
// =============================================================================

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Reads a Decimal field from a JSON object (amounts serialize as strings).
fn field_dec(value: &Value, key: &str) -> Decimal {
    dec(value[key].as_str().unwrap())
}

/// A store and a router sharing it, so tests can seed directly and then
/// drive the HTTP surface.
fn store_and_router() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        Arc::clone(&store) as Arc<dyn PayrollStore>,
        EngineSettings::default(),
    );
    (store, create_router(state))
}

fn seed_trip(store: &Arc<MemoryStore>, driver_name: &str, miles: &str) -> Trip {
    let trip = Trip {
        id: Uuid::new_v4(),
        trip_number: format!("T-{}", &Uuid::new_v4().to_string()[..8]),
        driver_id: Some(Uuid::new_v4()),
        driver_name: driver_name.to_string(),
        carrier_id: None,
        linehaul_profile_id: Some(Uuid::new_v4()),
        route_id: None,
        origin_terminal: "PDX".to_string(),
        destination_terminal: "SEA".to_string(),
        dispatch_time: Utc.with_ymd_and_hms(2026, 3, 10, 6, 0, 0).unwrap(),
        arrival_time: None,
        miles: dec(miles),
        transit_hours: dec("4"),
        trailer_count: 2,
        fuel_cost: dec("95.00"),
        delays: vec![],
    };
    store.insert_trip(trip.clone());
    trip
}

fn seed_default_mile_card(store: &Arc<MemoryStore>, double_rate: &str) {
    let mut card = RateCard::new(RateScope::Default, None, RateMethod::PerMile, dec("0.50"));
    card.double_mile_rate = Some(dec(double_rate));
    store.insert_rate_card(card);
}

async fn post(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn calculate(router: Router, trip_id: Uuid) -> (StatusCode, Value) {
    post(
        router,
        "/trip-pay/calculate",
        json!({ "trip_id": trip_id }),
    )
    .await
}

// =============================================================================
// Calculation
// =============================================================================

#[tokio::test]
async fn test_calculate_creates_ledger_line() {
    let (store, router) = store_and_router();
    seed_default_mile_card(&store, "0.72");
    let trip = seed_trip(&store, "J. Moreno", "182");

    let (status, outcome) = calculate(router.clone(), trip.id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["created"], json!(true));
    assert_eq!(outcome["status"], json!("calculated"));

    let (status, page) = get(router, "/line-items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], json!(1));
    // 182 miles * 0.72 double rate
    assert_eq!(field_dec(&page["items"][0], "mileage_pay"), dec("131.04"));
    assert_eq!(field_dec(&page["items"][0], "total_gross_pay"), dec("131.04"));
}

#[tokio::test]
async fn test_recalculation_is_idempotent() {
    let (store, router) = store_and_router();
    seed_default_mile_card(&store, "0.72");
    let trip = seed_trip(&store, "J. Moreno", "182");

    let (_, first) = calculate(router.clone(), trip.id).await;
    let (_, second) = calculate(router.clone(), trip.id).await;
    assert_eq!(first["created"], json!(true));
    assert_eq!(second["created"], json!(false));
    assert_eq!(first["trip_pay_id"], second["trip_pay_id"]);

    let (_, page) = get(router, "/line-items").await;
    assert_eq!(page["total"], json!(1));
}

#[tokio::test]
async fn test_calculate_without_card_leaves_pending() {
    let (store, router) = store_and_router();
    let trip = seed_trip(&store, "J. Moreno", "182");

    let (status, outcome) = calculate(router.clone(), trip.id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["status"], json!("pending"));

    let (_, page) = get(router, "/line-items").await;
    assert_eq!(page["items"][0]["status"], json!("pending"));
    assert_eq!(field_dec(&page["items"][0], "total_gross_pay"), Decimal::ZERO);
}

#[tokio::test]
async fn test_calculate_missing_driver_is_422() {
    let (store, router) = store_and_router();
    let mut trip = seed_trip(&store, "J. Moreno", "182");
    trip.driver_id = None;
    store.update_trip(trip.clone()).unwrap();

    let (status, body) = calculate(router, trip.id).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], json!("MISSING_PREREQUISITE"));
}

// =============================================================================
// Display breakdown & reconciliation
// =============================================================================

#[tokio::test]
async fn test_display_buckets_reconcile_with_total() {
    let (store, router) = store_and_router();
    seed_default_mile_card(&store, "0.72");
    let trip = seed_trip(&store, "J. Moreno", "182");
    store.put_trip_report(TripReport {
        trip_id: trip.id,
        drop_and_hook_count: 2,
        chain_up_count: 1,
        wait_time_minutes: 90,
        wait_reason: Some("dock congestion".to_string()),
    });

    calculate(router.clone(), trip.id).await;
    let (_, page) = get(router, "/line-items").await;
    let item = &page["items"][0];

    let buckets = ["drop_and_hook_pay", "chain_up_pay", "wait_time_pay", "other_accessorial_pay"]
        .iter()
        .map(|k| field_dec(item, k))
        .sum::<Decimal>();
    let components = field_dec(item, "base_pay") + field_dec(item, "mileage_pay") + buckets
        + field_dec(item, "bonus_pay")
        - field_dec(item, "deductions");
    let total = field_dec(item, "total_gross_pay");
    assert!((components - total).abs() <= dec("0.01"));
}

// =============================================================================
// Cut pay
// =============================================================================

#[tokio::test]
async fn test_cut_pay_submission_projects_line() {
    let (_, router) = store_and_router();
    let (status, request) = post(
        router.clone(),
        "/cut-pay",
        json!({
            "driver_id": Uuid::new_v4(),
            "driver_name": "K. Ibarra",
            "request_type": "hours",
            "quantity": "3.5",
            "rate_override": "30.00",
            "requested_date": "2026-03-12"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(field_dec(&request, "total_pay"), dec("105.00"));
    assert_eq!(request["status"], json!("pending"));

    let (_, page) = get(router, "/line-items?source_type=cut_pay").await;
    assert_eq!(page["total"], json!(1));
    assert_eq!(field_dec(&page["items"][0], "total_gross_pay"), dec("105.00"));
    assert_eq!(field_dec(&page["items"][0], "work_hours"), dec("3.5"));
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn test_query_filters_and_sorts() {
    let (store, router) = store_and_router();
    seed_default_mile_card(&store, "0.72");
    let a = seed_trip(&store, "A. Alvarez", "100");
    let b = seed_trip(&store, "B. Burke", "300");
    calculate(router.clone(), a.id).await;
    calculate(router.clone(), b.id).await;

    let (_, page) = get(
        router.clone(),
        "/line-items?sort=total_gross_pay&direction=desc",
    )
    .await;
    assert_eq!(page["total"], json!(2));
    assert_eq!(page["items"][0]["driver_name"], json!("B. Burke"));

    let (_, page) = get(router.clone(), "/line-items?driver_search=alvarez").await;
    assert_eq!(page["total"], json!(1));

    let (_, page) = get(router, "/line-items?page=2&page_size=1").await;
    assert_eq!(page["total"], json!(2));
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
}

// =============================================================================
// Edit
// =============================================================================

#[tokio::test]
async fn test_edit_adjusts_source_and_reprojects() {
    let (store, router) = store_and_router();
    seed_default_mile_card(&store, "0.72");
    let trip = seed_trip(&store, "J. Moreno", "182");
    calculate(router.clone(), trip.id).await;

    let (_, page) = get(router.clone(), "/line-items").await;
    let line_id = page["items"][0]["id"].as_str().unwrap().to_string();

    let (status, line) = post(
        router.clone(),
        &format!("/line-items/{}/edit", line_id),
        json!({ "kind": "trip", "bonus_pay": "25.00" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // 131.04 + 25.00
    assert_eq!(field_dec(&line, "total_gross_pay"), dec("156.04"));
    assert_eq!(field_dec(&line, "bonus_pay"), dec("25.00"));
}

#[tokio::test]
async fn test_edit_with_disagreeing_total_is_422() {
    let (store, router) = store_and_router();
    seed_default_mile_card(&store, "0.72");
    let trip = seed_trip(&store, "J. Moreno", "182");
    calculate(router.clone(), trip.id).await;

    let (_, page) = get(router.clone(), "/line-items").await;
    let line_id = page["items"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = post(
        router,
        &format!("/line-items/{}/edit", line_id),
        json!({ "kind": "trip", "total_gross_pay": "999.99" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], json!("RECONCILIATION_VIOLATION"));
}

// =============================================================================
// Approval
// =============================================================================

#[tokio::test]
async fn test_bulk_approval_mixed_batch() {
    let (store, router) = store_and_router();
    seed_default_mile_card(&store, "0.72");
    let trip = seed_trip(&store, "J. Moreno", "182");
    let (_, outcome) = calculate(router.clone(), trip.id).await;
    let trip_pay_id = outcome["trip_pay_id"].as_str().unwrap().to_string();

    let (_, cut) = post(
        router.clone(),
        "/cut-pay",
        json!({
            "driver_id": Uuid::new_v4(),
            "driver_name": "K. Ibarra",
            "request_type": "hours",
            "quantity": "2",
            "rate_override": "25.00",
            "requested_date": "2026-03-12"
        }),
    )
    .await;
    let cut_id = cut["id"].as_str().unwrap().to_string();

    let (status, outcome) = post(
        router.clone(),
        "/line-items/approve",
        json!({
            "approver": "ops.lead",
            "items": [
                { "source_type": "trip_pay", "id": trip_pay_id },
                { "source_type": "cut_pay", "id": cut_id },
                { "source_type": "trip_pay", "id": Uuid::new_v4() }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["approved_count"], json!(2));
    assert_eq!(outcome["failures"].as_array().unwrap().len(), 1);
    assert_eq!(outcome["failures"][0]["reason"], json!("not_found"));

    let (_, page) = get(router, "/line-items?status=approved").await;
    assert_eq!(page["total"], json!(2));
    assert_eq!(page["items"][0]["approved_by"], json!("ops.lead"));
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_lifecycle_walk_and_guards() {
    let (store, router) = store_and_router();
    seed_default_mile_card(&store, "0.72");
    let trip = seed_trip(&store, "J. Moreno", "182");
    calculate(router.clone(), trip.id).await;

    let period = store
        .find_period_covering(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap())
        .unwrap();

    let (status, body) = post(
        router.clone(),
        &format!("/pay-periods/{}/transition", period.id),
        json!({ "target": "closed" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("closed"));

    // A new trip cannot enter a closed period.
    let late = seed_trip(&store, "L. Late", "50");
    let (status, body) = calculate(router.clone(), late.id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], json!("INVALID_LIFECYCLE_TRANSITION"));

    // Locking blocks edits.
    post(
        router.clone(),
        &format!("/pay-periods/{}/transition", period.id),
        json!({ "target": "locked" }),
    )
    .await;

    let (_, page) = get(router.clone(), "/line-items").await;
    let line_id = page["items"][0]["id"].as_str().unwrap().to_string();
    let (status, _) = post(
        router.clone(),
        &format!("/line-items/{}/edit", line_id),
        json!({ "kind": "trip", "bonus_pay": "5.00" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Skipping backward is rejected.
    let (status, _) = post(
        router,
        &format!("/pay-periods/{}/transition", period.id),
        json!({ "target": "open" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// =============================================================================
// Arrival finalization
// =============================================================================

#[tokio::test]
async fn test_arrival_finalizes_line() {
    let (store, router) = store_and_router();
    seed_default_mile_card(&store, "0.72");
    let trip = seed_trip(&store, "J. Moreno", "182");
    calculate(router.clone(), trip.id).await;

    let (status, line) = post(
        router,
        &format!("/trips/{}/arrival", trip.id),
        json!({ "arrival_time": "2026-03-10T10:30:00Z" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(line["status"], json!("complete"));
    // 4.5 hours dispatch-to-arrival
    assert_eq!(field_dec(&line, "work_hours"), dec("4.5"));
    // 131.04 labor + 95.00 fuel
    assert_eq!(field_dec(&line, "total_cost"), dec("226.04"));
    assert_eq!(field_dec(&line, "total_gross_pay"), dec("131.04"));
}

// =============================================================================
// Export
// =============================================================================

#[tokio::test]
async fn test_export_stamps_lines_once() {
    let (store, router) = store_and_router();
    seed_default_mile_card(&store, "0.72");
    let trip = seed_trip(&store, "J. Moreno", "182");
    calculate(router.clone(), trip.id).await;

    let (status, rows) = get(router.clone(), "/export").await;
    assert_eq!(status, StatusCode::OK);
    let first_stamp = rows[0]["exported_at"].as_str().unwrap().to_string();

    let (_, rows) = get(router, "/export").await;
    assert_eq!(rows[0]["exported_at"].as_str().unwrap(), first_stamp);
}

// =============================================================================
// Reconciliation property
// =============================================================================

mod reconciliation_properties {
    use super::*;
    use linehaul_settlement::calculation::{display_breakdown, round_to_cents};
    use proptest::prelude::*;

    proptest! {
        /// The display buckets always sum exactly to the priced aggregate,
        /// whatever the operational counts claim.
        #[test]
        fn display_buckets_sum_to_aggregate(
            cents in 0u64..2_000_000,
            drop_and_hook in 0u32..20,
            chain_up in 0u32..20,
            wait_minutes in 0u32..1440,
        ) {
            let aggregate = round_to_cents(Decimal::from(cents) / Decimal::from(100));
            let report = TripReport {
                trip_id: Uuid::new_v4(),
                drop_and_hook_count: drop_and_hook,
                chain_up_count: chain_up,
                wait_time_minutes: wait_minutes,
                wait_reason: None,
            };
            let breakdown =
                display_breakdown(aggregate, &report, &EngineSettings::default());
            prop_assert_eq!(breakdown.total(), aggregate);
            prop_assert!(breakdown.drop_and_hook_pay >= Decimal::ZERO);
            prop_assert!(breakdown.chain_up_pay >= Decimal::ZERO);
            prop_assert!(breakdown.wait_time_pay >= Decimal::ZERO);
            prop_assert!(breakdown.other_accessorial_pay >= Decimal::ZERO);
        }
    }
}
