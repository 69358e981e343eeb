//! HTTP request handlers for the settlement engine API.

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::approval::BulkApprovalCoordinator;
use crate::calculation::{CutPayEvaluator, TripPayCalculator};
use crate::export::ExportCoordinator;
use crate::ledger_edit::{LedgerEditor, LineItemEdit};
use crate::lifecycle::PayPeriodLifecycleManager;
use crate::projection::PayrollLineItemProjector;
use crate::store::sort_and_paginate;

use super::request::{
    ArrivalRequest, BulkApprovalRequest, CutPayRequestBody, LineItemQuery, TransitionRequest,
    TripCalculationRequest,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/trip-pay/calculate", post(calculate_trip_pay_handler))
        .route("/trips/:trip_id/arrival", post(trip_arrival_handler))
        .route("/cut-pay", post(submit_cut_pay_handler))
        .route("/line-items", get(query_line_items_handler))
        .route("/line-items/approve", post(bulk_approve_handler))
        .route("/line-items/:id/edit", post(edit_line_item_handler))
        .route("/pay-periods/:id/transition", post(transition_handler))
        .route("/export", get(export_handler))
        .with_state(state)
}

/// Unwraps a JSON body, turning axum rejections into the shared error body.
fn parse_json<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, Response> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(correlation_id = %correlation_id, error = %body_text, "JSON data error");
                    if body_text.contains("missing field") {
                        ApiError::new("VALIDATION_ERROR", body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(correlation_id = %correlation_id, error = %err, "JSON syntax error");
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            Err((
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "application/json")],
                Json(error),
            )
                .into_response())
        }
    }
}

fn engine_error_response(error: crate::error::EngineError, correlation_id: Uuid) -> Response {
    warn!(correlation_id = %correlation_id, error = %error, "Request failed");
    let api_error: ApiErrorResponse = error.into();
    api_error.into_response()
}

/// Handler for `POST /trip-pay/calculate`.
async fn calculate_trip_pay_handler(
    State(state): State<AppState>,
    payload: Result<Json<TripCalculationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        trip_id = %request.trip_id,
        "Processing trip pay calculation"
    );

    let calculator = TripPayCalculator::new(state.store(), state.settings().clone());
    match calculator.calculate(request.trip_id) {
        Ok(outcome) => {
            info!(
                correlation_id = %correlation_id,
                trip_pay_id = %outcome.trip_pay_id,
                created = outcome.created,
                status = ?outcome.status,
                "Trip pay calculation completed"
            );
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(err) => engine_error_response(err, correlation_id),
    }
}

/// Handler for `POST /trips/{trip_id}/arrival`.
///
/// Records the arrival time on the trip and finalizes its ledger line.
async fn trip_arrival_handler(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    payload: Result<Json<ArrivalRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, trip_id = %trip_id, "Processing trip arrival");

    let store = state.store();
    let result = store.get_trip(trip_id).and_then(|mut trip| {
        trip.arrival_time = Some(request.arrival_time);
        store.update_trip(trip)?;
        let projector = PayrollLineItemProjector::new(state.store(), state.settings().clone());
        projector.finalize_trip_arrival(trip_id)
    });
    match result {
        Ok(line) => (StatusCode::OK, Json(line)).into_response(),
        Err(err) => engine_error_response(err, correlation_id),
    }
}

/// Handler for `POST /cut-pay`.
async fn submit_cut_pay_handler(
    State(state): State<AppState>,
    payload: Result<Json<CutPayRequestBody>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let body = match parse_json(payload, correlation_id) {
        Ok(body) => body,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        driver_id = %body.driver_id,
        "Processing cut pay submission"
    );

    let evaluator = CutPayEvaluator::new(state.store(), state.settings().clone());
    match evaluator.evaluate(body.into()) {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(err) => engine_error_response(err, correlation_id),
    }
}

/// Handler for `GET /line-items`.
async fn query_line_items_handler(
    State(state): State<AppState>,
    Query(query): Query<LineItemQuery>,
) -> Response {
    let items = state.store().list_line_items(&query.filter());
    let page = sort_and_paginate(items, query.sort, query.direction, query.page_request());
    (StatusCode::OK, Json(page)).into_response()
}

/// Handler for `POST /line-items/approve`.
async fn bulk_approve_handler(
    State(state): State<AppState>,
    payload: Result<Json<BulkApprovalRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        items = request.items.len(),
        approver = %request.approver,
        "Processing bulk approval"
    );

    let coordinator = BulkApprovalCoordinator::new(state.store(), state.settings().clone());
    let outcome = coordinator.approve(&request.items, &request.approver);
    (StatusCode::OK, Json(outcome)).into_response()
}

/// Handler for `POST /line-items/{id}/edit`.
async fn edit_line_item_handler(
    State(state): State<AppState>,
    Path(line_item_id): Path<Uuid>,
    payload: Result<Json<LineItemEdit>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let edit = match parse_json(payload, correlation_id) {
        Ok(edit) => edit,
        Err(response) => return response,
    };
    info!(correlation_id = %correlation_id, line_item_id = %line_item_id, "Processing ledger edit");

    let editor = LedgerEditor::new(state.store(), state.settings().clone());
    match editor.edit(line_item_id, edit) {
        Ok(line) => (StatusCode::OK, Json(line)).into_response(),
        Err(err) => engine_error_response(err, correlation_id),
    }
}

/// Handler for `POST /pay-periods/{id}/transition`.
async fn transition_handler(
    State(state): State<AppState>,
    Path(period_id): Path<Uuid>,
    payload: Result<Json<TransitionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_json(payload, correlation_id) {
        Ok(request) => request,
        Err(response) => return response,
    };
    info!(
        correlation_id = %correlation_id,
        period_id = %period_id,
        target = ?request.target,
        "Processing pay period transition"
    );

    let manager = PayPeriodLifecycleManager::new(state.store());
    match manager.transition(period_id, request.target) {
        Ok(period) => (StatusCode::OK, Json(period)).into_response(),
        Err(err) => engine_error_response(err, correlation_id),
    }
}

/// Handler for `GET /export`.
async fn export_handler(
    State(state): State<AppState>,
    Query(query): Query<LineItemQuery>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let coordinator = ExportCoordinator::new(state.store());
    match coordinator.export_line_items(&query.filter()) {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => engine_error_response(err, correlation_id),
    }
}
