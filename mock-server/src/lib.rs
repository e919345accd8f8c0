//! Local stand-in for the Ohmyfin API.
//!
//! Serves the four `POST /api/*` endpoints with canned payloads, checks the
//! `KEY` header and the required fields, and answers the way the real API
//! does on failure: a JSON body with `message` and optional `errors`.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const DEFAULT_API_KEY: &str = "test-key";

const CHANGE_STATUSES: &[&str] = &["in process", "success", "rejected", "on hold"];
const ROLES: &[&str] = &["originator", "beneficiary", "intermediary", "correspondent", "other"];

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
}

pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
    };
    Router::new()
        .route("/api/track", post(track))
        .route("/api/change", post(change))
        .route("/api/validate", post(validate))
        .route("/api/getssi", post(get_ssi))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

/// Error body in the API's wire format.
#[derive(Debug, Serialize)]
pub struct ApiFailure {
    #[serde(skip)]
    status: StatusCode,
    message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    errors: BTreeMap<String, Vec<String>>,
}

impl ApiFailure {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            errors: BTreeMap::new(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Field-level problems collected while checking a request body.
#[derive(Default)]
struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    fn add(&mut self, field: &str, message: &str) {
        self.0.entry(field.to_string()).or_default().push(message.to_string());
    }

    fn require(&mut self, body: &Value, fields: &[&str]) {
        for field in fields {
            if !is_present(body, field) {
                self.add(field, "is required");
            }
        }
    }

    fn require_identifier(&mut self, body: &Value) {
        if !is_present(body, "uetr") && !is_present(body, "ref") {
            self.add("uetr", "uetr or ref is required");
        }
    }

    fn one_of(&mut self, body: &Value, field: &str, allowed: &[&str]) {
        if let Some(value) = body.get(field).and_then(Value::as_str) {
            if !allowed.contains(&value) {
                self.add(field, &format!("must be one of: {}", allowed.join(", ")));
            }
        }
    }

    fn finish(self) -> Result<(), ApiFailure> {
        if self.0.is_empty() {
            return Ok(());
        }
        Err(ApiFailure {
            errors: self.0,
            ..ApiFailure::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation failed")
        })
    }
}

fn is_present(body: &Value, field: &str) -> bool {
    match body.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn str_field<'a>(body: &'a Value, field: &str) -> &'a str {
    body.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiFailure> {
    let key = headers.get("key").and_then(|v| v.to_str().ok());
    if key != Some(&*state.api_key) {
        tracing::warn!(key_present = key.is_some(), "rejected request with invalid API key");
        return Err(ApiFailure::new(StatusCode::UNAUTHORIZED, "Invalid API key"));
    }
    Ok(())
}

/// 8 or 11 alphanumeric characters.
pub fn is_valid_bic(bic: &str) -> bool {
    matches!(bic.len(), 8 | 11) && bic.chars().all(|c| c.is_ascii_alphanumeric())
}

fn limits() -> Value {
    json!({"daily": 100, "monthly": 1000, "annual": 10000})
}

async fn track(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiFailure> {
    authorize(&state, &headers)?;

    let mut errors = FieldErrors::default();
    errors.require_identifier(&body);
    errors.require(&body, &["amount", "date", "currency"]);
    let uetr = str_field(&body, "uetr");
    let parsed = if uetr.is_empty() { None } else { Uuid::parse_str(uetr).ok() };
    if !uetr.is_empty() && parsed.is_none() {
        errors.add("uetr", "must be a valid UUID");
    }
    errors.finish()?;

    if parsed.is_some_and(|id| id.is_nil()) {
        return Err(ApiFailure::new(StatusCode::NOT_FOUND, "Transaction not found"));
    }

    Ok(Json(json!({
        "status": "in progress",
        "lastupdate": str_field(&body, "date"),
        "details": [
            {"id": 1, "bank": "JPMorgan Chase Bank", "swift": "CHASUS33", "status": "success", "reason": "", "route": "originator"},
            {"id": 2, "bank": "Deutsche Bank", "swift": "DEUTDEFF", "status": "in progress", "reason": "", "route": "intermediary"}
        ],
        "limits": limits(),
    })))
}

async fn change(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiFailure> {
    authorize(&state, &headers)?;

    let mut errors = FieldErrors::default();
    errors.require_identifier(&body);
    errors.require(&body, &["status", "role"]);
    errors.one_of(&body, "status", CHANGE_STATUSES);
    errors.one_of(&body, "role", ROLES);
    errors.finish()?;

    Ok(Json(json!({
        "success": true,
        "message": "Status updated",
        "status": str_field(&body, "status"),
    })))
}

async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiFailure> {
    authorize(&state, &headers)?;

    let mut errors = FieldErrors::default();
    errors.require(&body, &["beneficiary_bic", "currency"]);
    errors.finish()?;

    let bic_status = |field: &str| {
        if is_valid_bic(str_field(&body, field)) {
            json!({"status": "ok"})
        } else {
            json!({
                "status": "invalid",
                "recommendation": "BIC must be 8 or 11 alphanumeric characters",
            })
        }
    };

    let mut result = json!({
        "beneficiary_bic": bic_status("beneficiary_bic"),
        "avg_business_days": 2,
        "available_correspondents": [
            {"corresBIC": "CHASUS33", "is_preferred": true},
            {"corresBIC": "CITIUS33"}
        ],
    });
    for optional in ["correspondent_bic", "sender_bic", "sender_correspondent_bic"] {
        if is_present(&body, optional) {
            result[optional] = bic_status(optional);
        }
    }
    if is_present(&body, "beneficiary_iban") {
        result["beneficiary_iban"] = json!({
            "status": "warning",
            "details": "IBAN checksum not verified",
            "options": [str_field(&body, "beneficiary_iban")],
        });
    }
    Ok(Json(result))
}

async fn get_ssi(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiFailure> {
    authorize(&state, &headers)?;

    let mut errors = FieldErrors::default();
    errors.require(&body, &["swift", "currency"]);
    let swift = str_field(&body, "swift");
    if !swift.is_empty() && !is_valid_bic(swift) {
        errors.add("swift", "must be 8 or 11 alphanumeric characters");
    }
    errors.finish()?;

    let currency = str_field(&body, "currency");
    Ok(Json(json!({
        "correspondents": [
            {"id": 1, "bank": "JPMorgan Chase Bank", "swift": "CHASUS33", "currency": currency, "account": "400123456", "is_preferred": true},
            {"id": 2, "bank": "Citibank", "swift": "CITIUS33", "currency": currency, "account": "36001234", "is_preferred": false}
        ],
        "currencies": ["USD", "EUR", "GBP"],
        "limits": limits(),
    })))
}
