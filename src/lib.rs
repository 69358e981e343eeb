//! Payroll Rate Resolution & Settlement Engine for LTL linehaul operations.
//!
//! This crate decides which pay rule applies to a completed trip or a manual
//! cut pay request, computes the monetary breakdown, and projects both kinds
//! of source record into one reconciled payroll ledger, gated by a
//! multi-stage pay-period lifecycle.

#![warn(missing_docs)]

pub mod api;
pub mod approval;
pub mod calculation;
pub mod config;
pub mod error;
pub mod export;
pub mod ledger_edit;
pub mod lifecycle;
pub mod models;
pub mod projection;
pub mod store;
