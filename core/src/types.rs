//! Request and response payloads for the Ohmyfin API.
//!
//! # Design
//! Request fields are all `Option` so that a request can be assembled
//! piecemeal with `..Default::default()`; which fields are actually required
//! is enforced by the client before anything is sent. `None` fields are left
//! out of the JSON body.
//!
//! Response types are lenient: every field is optional and enum values the
//! client does not know map to `Unrecognized`. They are only produced on
//! demand through [`ApiResponse::parse`]; the raw JSON is always available.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

/// Look up a transfer by UETR or reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uetr: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// ISO 4217 code, e.g. `USD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    #[serde(rename = "in progress")]
    InProgress,
    Success,
    Rejected,
    #[serde(rename = "on hold")]
    OnHold,
    Unknown,
    Future,
    #[serde(other)]
    Unrecognized,
}

/// One hop of a transfer's route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackHop {
    pub id: Option<i64>,
    pub bank: Option<String>,
    pub swift: Option<String>,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub route: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub daily: f64,
    pub monthly: f64,
    pub annual: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackResult {
    pub status: Option<TrackStatus>,
    pub lastupdate: Option<String>,
    pub details: Vec<TrackHop>,
    pub limits: Option<Limits>,
}

// ---------------------------------------------------------------------------
// Change
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    #[serde(rename = "in process")]
    InProcess,
    Success,
    Rejected,
    #[serde(rename = "on hold")]
    OnHold,
}

/// The reporting bank's part in the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Originator,
    Beneficiary,
    Intermediary,
    Correspondent,
    Other,
}

/// Report a status change for a transfer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uetr: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ChangeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swift: Option<String>,
    #[serde(rename = "nextName", skip_serializing_if = "Option::is_none")]
    pub next_name: Option<String>,
    #[serde(rename = "nextSwift", skip_serializing_if = "Option::is_none")]
    pub next_swift: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

/// Check payment details before sending a transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary_bic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correspondent_bic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correspondent_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary_iban: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary_owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_bic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_correspondent_bic: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    Ok,
    Invalid,
    Warning,
    #[serde(other)]
    Unrecognized,
}

/// Verdict on a single validated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStatus {
    pub status: FieldStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailableCorrespondent {
    #[serde(rename = "corresBIC")]
    pub corres_bic: Option<String>,
    pub is_preferred: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateResult {
    pub beneficiary_bic: Option<ValidationStatus>,
    pub correspondent_bic: Option<ValidationStatus>,
    pub sender_bic: Option<ValidationStatus>,
    pub sender_correspondent_bic: Option<ValidationStatus>,
    pub beneficiary_iban: Option<ValidationStatus>,
    pub beneficiary_address: Option<ValidationStatus>,
    pub avg_business_days: Option<i64>,
    pub available_correspondents: Option<Vec<AvailableCorrespondent>>,
}

// ---------------------------------------------------------------------------
// Settlement instructions
// ---------------------------------------------------------------------------

/// Ask for standard settlement instructions of a bank in a currency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swift: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Correspondent {
    pub id: Option<i64>,
    pub bank: Option<String>,
    pub swift: Option<String>,
    pub currency: Option<String>,
    pub account: Option<String>,
    pub is_preferred: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsiResult {
    pub correspondents: Vec<Correspondent>,
    pub currencies: Vec<String>,
    pub limits: Option<Limits>,
}

// ---------------------------------------------------------------------------
// Response wrapper
// ---------------------------------------------------------------------------

/// A successful response body, exactly as the API returned it.
///
/// `T` names the documented shape; [`ApiResponse::parse`] decodes into it
/// on request. The payload itself is never checked against `T`, so fields
/// the API adds later, or drops, never turn a success into an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    raw: Value,
    _shape: PhantomData<fn() -> T>,
}

impl<T> ApiResponse<T> {
    pub(crate) fn new(raw: Value) -> Self {
        Self {
            raw,
            _shape: PhantomData,
        }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }
}

impl<T: DeserializeOwned> ApiResponse<T> {
    pub fn parse(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.raw)
    }
}

impl<T> std::ops::Deref for ApiResponse<T> {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.raw
    }
}
