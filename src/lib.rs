//! Payroll Engine library crate.
//!
//! This crate exposes a rules-based payroll calculation engine and an
//! HTTP API as reusable modules.  External applications may depend on
//! the `payroll_engine` crate and call `engine::calculate_payroll` for a
//! single employee, `engine::run_payroll` for a whole pay run, or embed
//! the API via `api::build_router`.

pub mod error;
pub mod models;
pub mod rates;
pub mod rules;
pub mod eligibility;
pub mod calculator;
pub mod engine;
pub mod summary;
pub mod rulebook;
pub mod api;

pub use calculator::calculate_rule_value;
pub use eligibility::applies_to_employee;
pub use engine::{calculate_payroll, run_payroll};
pub use error::{FieldErrors, PayrollError};
pub use rules::{create_rule, validate_rule};
pub use summary::summarize;
