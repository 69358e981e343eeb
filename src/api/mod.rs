//! HTTP API module for the settlement engine.
//!
//! This module provides the REST endpoints for trip pay calculation, cut
//! pay submission, ledger queries, bulk approval, edits, pay period
//! lifecycle, and the payroll extract.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    ArrivalRequest, BulkApprovalRequest, CutPayRequestBody, LineItemQuery, TransitionRequest,
    TripCalculationRequest,
};
pub use response::ApiError;
pub use state::AppState;
