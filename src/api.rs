//! HTTP API for the Payroll Engine.
//!
//! This module exposes a minimal REST API around the payroll engine
//! using the [`axum`](https://crates.io/crates/axum) framework.  Clients
//! can submit a pay run and receive the results in JSON, validate rule
//! drafts, and append rules to the server's active rule book.  The
//! engine itself stays pure; the only shared state is the active rule
//! book and configuration held here.

use crate::engine::run_payroll;
use crate::error::{FieldErrors, PayrollError};
use crate::models::{
    Adjustment, AttendanceItem, DayRecord, Employee, PayPeriod, PayRunInput, PayrollConfig,
};
use crate::rulebook::{load_config, load_rules};
use crate::rules::{create_rule, default_rules, next_order, sort_rules_by_order, validate_rule, Rule, RuleDraft};
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Application state shared across requests.
pub struct AppState {
    pub rules: RwLock<Vec<Rule>>,
    pub config: RwLock<PayrollConfig>,
}

impl AppState {
    pub fn new(rules: Vec<Rule>, config: PayrollConfig) -> Self {
        Self {
            rules: RwLock::new(rules),
            config: RwLock::new(config),
        }
    }

    /// Loads the rule book and configuration, falling back to the
    /// default rules and configuration when no path is given.
    pub fn load(rules_path: Option<&Path>, config_path: Option<&Path>) -> Result<Self> {
        let rules = match rules_path {
            Some(path) => load_rules(path)?,
            None => default_rules(),
        };
        let config = match config_path {
            Some(path) => load_config(path)?,
            None => PayrollConfig::default(),
        };
        Ok(Self::new(rules, config))
    }
}

/// Body of `POST /api/payroll`.  Rules and config default to the
/// server's active ones.  Supplied rules are drafts and go through the
/// same defaults and validation as `POST /api/rules`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRequest {
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub attendance: HashMap<String, Vec<AttendanceItem>>,
    #[serde(default)]
    pub days: HashMap<String, Vec<DayRecord>>,
    #[serde(default)]
    pub adjustments: HashMap<String, Vec<Adjustment>>,
    pub pay_period: PayPeriod,
    #[serde(default)]
    pub rules: Option<Vec<RuleDraft>>,
    #[serde(default)]
    pub config: Option<PayrollConfig>,
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub errors: Option<FieldErrors>,
}

/// Engine errors rendered as `422 Unprocessable Entity`.
pub struct ApiError(PayrollError);

impl From<PayrollError> for ApiError {
    fn from(err: PayrollError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.0.field_errors() {
            Some(fields) => json!({"error": self.0.to_string(), "fields": fields}),
            None => json!({"error": self.0.to_string()}),
        };
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    }
}

/// Build the API router around the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/payroll", post(payroll_handler))
        .route("/api/rules", get(list_rules_handler).post(create_rule_handler))
        .route("/api/rules/validate", post(validate_rule_handler))
        .with_state(state)
}

/// Turns request drafts into rules.  Field errors are keyed
/// `rules[<index>].<field>` and collected across every draft.
fn rules_from_drafts(drafts: Vec<RuleDraft>) -> Result<Vec<Rule>, PayrollError> {
    let mut rules = Vec::with_capacity(drafts.len());
    let mut errors = FieldErrors::new();
    for (index, draft) in drafts.into_iter().enumerate() {
        match create_rule(draft) {
            Ok(rule) => rules.push(rule),
            Err(PayrollError::Validation(fields)) => {
                for (field, message) in fields.iter() {
                    errors.insert(&format!("rules[{index}].{field}"), message);
                }
            }
            Err(err) => return Err(err),
        }
    }
    match errors.into_option() {
        Some(errors) => Err(PayrollError::Validation(errors)),
        None => Ok(rules),
    }
}

/// Handler for POST /api/payroll
async fn payroll_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<PayrollRequest>,
) -> Result<Response, ApiError> {
    let rules = match request.rules {
        Some(drafts) => rules_from_drafts(drafts)?,
        None => app_state.rules.read().await.clone(),
    };
    let config = match request.config {
        Some(config) => config,
        None => *app_state.config.read().await,
    };
    let input = PayRunInput {
        employees: request.employees,
        attendance: request.attendance,
        days: request.days,
        adjustments: request.adjustments,
        rules,
        config,
        pay_period: request.pay_period,
    };
    let result = run_payroll(input)?;
    Ok((StatusCode::OK, Json(result)).into_response())
}

/// Handler for GET /api/rules
async fn list_rules_handler(State(app_state): State<Arc<AppState>>) -> Json<Vec<Rule>> {
    let rules = app_state.rules.read().await;
    Json(sort_rules_by_order(&rules))
}

/// Handler for POST /api/rules/validate
async fn validate_rule_handler(Json(draft): Json<RuleDraft>) -> Json<ValidationResponse> {
    let errors = validate_rule(&draft);
    Json(ValidationResponse {
        valid: errors.is_none(),
        errors,
    })
}

/// Handler for POST /api/rules
async fn create_rule_handler(
    State(app_state): State<Arc<AppState>>,
    Json(mut draft): Json<RuleDraft>,
) -> Result<Response, ApiError> {
    let mut rules = app_state.rules.write().await;
    if draft.order.is_none() {
        draft.order = Some(next_order(&rules));
    }
    let rule = create_rule(draft)?;
    if rules.iter().any(|r| r.id == rule.id) {
        let mut errors = FieldErrors::new();
        errors.insert("id", format!("Duplicate rule id {}", rule.id));
        return Err(PayrollError::Validation(errors).into());
    }
    info!(rule = %rule.id, "rule added");
    rules.push(rule.clone());
    Ok((StatusCode::CREATED, Json(rule)).into_response())
}

/// Launch the API server.  This function binds to the supplied address
/// and blocks until the server terminates (e.g. when interrupted).
pub async fn serve(addr: &str, state: Arc<AppState>) -> Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server listening");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(Arc::new(AppState::new(default_rules(), PayrollConfig::default())))
    }

    async fn send(router: Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn payroll_endpoint_uses_active_rules() {
        let (status, body) = send(
            app(),
            "POST",
            "/api/payroll",
            json!({
                "employees": [{
                    "id": "e1", "name": "Budi", "gender": "male",
                    "maritalStatus": "married", "dailySalary": 300000
                }],
                "payPeriod": {"start": "2025-03-01", "end": "2025-03-31"}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let payroll = &body["results"][0]["payroll"];
        assert_eq!(payroll["baseSalary"], json!(9000000.0));
        assert!(payroll["bonuses"]["marital_bonus"].is_object());
        assert!(payroll["deductions"]["insurance"].is_object());
        assert_eq!(body["config"]["workdayHours"], json!(8.0));
    }

    #[tokio::test]
    async fn payroll_endpoint_accepts_rule_drafts_and_day_records() {
        let (status, body) = send(
            app(),
            "POST",
            "/api/payroll",
            json!({
                "employees": [{
                    "id": "e1", "name": "Budi", "gender": "male",
                    "maritalStatus": "married", "dailySalary": 300000
                }],
                "days": {"e1": [
                    {"type": "regular", "entryTime": "08:00", "exitTime": "16:00"},
                    {"type": "sick"}
                ]},
                "rules": [{"label": "Meal", "type": "fixed", "value": 50000,
                           "criteria": {"appliesTo": []}, "category": "bonus"}],
                "payPeriod": {"start": "2025-03-01", "end": "2025-03-31"}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let result = &body["results"][0];
        assert_eq!(result["payroll"]["bonuses"]["meal"]["finalValue"], json!(50000.0));
        assert!(result["payroll"]["deductions"]["insurance"].is_null());
        assert_eq!(result["attendance"]["regularDays"], json!(1));
        assert_eq!(result["attendance"]["sickDays"], json!(1));
    }

    #[tokio::test]
    async fn payroll_endpoint_reports_invalid_rule_drafts_by_field() {
        let (status, body) = send(
            app(),
            "POST",
            "/api/payroll",
            json!({
                "employees": [],
                "rules": [
                    {"label": "Meal", "type": "fixed", "value": 1,
                     "criteria": {"appliesTo": []}, "category": "bonus"},
                    {"label": "Broken", "type": "fixed", "value": -1,
                     "criteria": {"appliesTo": []}, "category": "bonus"}
                ],
                "payPeriod": {"start": "2025-03-01", "end": "2025-03-31"}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["fields"]["rules[1].value"].is_string());
        assert!(body["fields"]["rules[0].value"].is_null());
    }

    #[tokio::test]
    async fn payroll_endpoint_rejects_bad_config() {
        let (status, body) = send(
            app(),
            "POST",
            "/api/payroll",
            json!({
                "employees": [],
                "payPeriod": {"start": "2025-03-01", "end": "2025-03-31"},
                "config": {"workdayHours": 0}
            }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("workdayHours"));
    }

    #[tokio::test]
    async fn validate_endpoint_lists_field_errors() {
        let (status, body) = send(
            app(),
            "POST",
            "/api/rules/validate",
            json!({"id": "x", "label": "Ok label", "type": "fixed", "value": 1,
                   "criteria": {"appliesTo": []}, "category": "bonus", "order": 1}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid"], json!(false));
        assert!(body["errors"]["id"].is_string());
    }

    #[tokio::test]
    async fn created_rule_is_appended_after_the_last_order() {
        let state = Arc::new(AppState::new(default_rules(), PayrollConfig::default()));
        let (status, body) = send(
            build_router(state.clone()),
            "POST",
            "/api/rules",
            json!({"label": "Night Shift", "type": "hourly_multiplier", "value": 12,
                   "criteria": {"appliesTo": ["male"]}, "category": "bonus"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], json!("night_shift"));
        assert_eq!(body["order"], json!(4.0));
        assert_eq!(state.rules.read().await.len(), 4);

        let (status, body) = send(
            build_router(state),
            "POST",
            "/api/rules",
            json!({"id": "insurance", "label": "Again", "type": "fixed", "value": 1,
                   "criteria": {"appliesTo": []}, "category": "bonus"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["fields"]["id"].is_string());
    }
}
