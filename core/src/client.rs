//! Async client for the Ohmyfin payment-tracking API.
//!
//! # Design
//! Every operation runs through the same three steps:
//! - `build_*` checks required fields and turns the input into an
//!   `HttpRequest` (no I/O),
//! - the transport executes it under the configured deadline,
//! - [`OhmyfinClient::parse_response`] classifies the `HttpResponse` (no I/O).
//!
//! The build and parse halves are public so callers with their own HTTP
//! stack can drive the API synchronously. The client holds only immutable
//! configuration, so one instance can serve any number of concurrent calls.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn, Instrument};

use crate::config::ClientConfig;
use crate::error::{ApiError, Error, Result, ValidationError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    ApiResponse, ChangeRequest, SsiRequest, SsiResult, TrackRequest, TrackResult, ValidateRequest,
    ValidateResult,
};

pub const TRACK_PATH: &str = "/api/track";
pub const CHANGE_PATH: &str = "/api/change";
pub const VALIDATE_PATH: &str = "/api/validate";
pub const SSI_PATH: &str = "/api/getssi";

pub const USER_AGENT: &str = concat!("ohmyfin-rust-sdk/", env!("CARGO_PKG_VERSION"));

const DEFAULT_ERROR_MESSAGE: &str = "API request failed";

/// Client for the four Ohmyfin operations.
#[derive(Debug, Clone)]
pub struct OhmyfinClient<T = ReqwestTransport> {
    config: ClientConfig,
    base_url: String,
    transport: T,
}

impl OhmyfinClient<ReqwestTransport> {
    /// Build a client that talks to the API over reqwest.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new()?;
        Ok(Self::assemble(config, transport))
    }
}

impl<T: Transport> OhmyfinClient<T> {
    /// Build a client over a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, transport))
    }

    /// Every trailing `/` of the base URL is dropped so paths join cleanly.
    fn assemble(config: ClientConfig, transport: T) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            config,
            base_url,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Current status and route of a transfer.
    pub async fn track(&self, input: &TrackRequest) -> Result<ApiResponse<TrackResult>> {
        let request = self.build_track(input)?;
        self.dispatch(request).await.map(ApiResponse::new)
    }

    /// Report a status update for a transfer. The response shape is not
    /// documented, so it stays raw JSON.
    pub async fn change(&self, input: &ChangeRequest) -> Result<ApiResponse<Value>> {
        let request = self.build_change(input)?;
        self.dispatch(request).await.map(ApiResponse::new)
    }

    /// Check beneficiary and routing details ahead of a transfer.
    pub async fn validate(&self, input: &ValidateRequest) -> Result<ApiResponse<ValidateResult>> {
        let request = self.build_validate(input)?;
        self.dispatch(request).await.map(ApiResponse::new)
    }

    /// Standard settlement instructions for a bank and currency.
    pub async fn get_ssi(&self, input: &SsiRequest) -> Result<ApiResponse<SsiResult>> {
        let request = self.build_get_ssi(input)?;
        self.dispatch(request).await.map(ApiResponse::new)
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<Value> {
        let span = tracing::debug_span!(
            "ohmyfin.request",
            method = %request.method,
            url = %request.url,
        );
        async {
            debug!("sending request");
            let sent = tokio::time::timeout(self.config.timeout, self.transport.send(request)).await;
            let response = match sent {
                Ok(Ok(response)) => response,
                Ok(Err(err)) => {
                    warn!(error = %err, "transport failure");
                    return Err(Error::Transport(err));
                }
                // The elapsed future has been dropped, which aborts the request.
                Err(_) => {
                    warn!(timeout_ms = self.config.timeout.as_millis() as u64, "request timed out");
                    return Err(ApiError::timeout().into());
                }
            };
            debug!(status = response.status, "response received");
            self.parse_response(response)
        }
        .instrument(span)
        .await
    }
}

impl<T> OhmyfinClient<T> {
    // -----------------------------------------------------------------------
    // Request building
    // -----------------------------------------------------------------------

    pub fn build_track(&self, input: &TrackRequest) -> Result<HttpRequest> {
        let mut missing = Vec::new();
        if !present(&input.uetr) && !present(&input.reference) {
            missing.push("uetr or ref");
        }
        if input.amount.is_none() {
            missing.push("amount");
        }
        if !present(&input.date) {
            missing.push("date");
        }
        if !present(&input.currency) {
            missing.push("currency");
        }
        check("track", missing)?;
        self.post(TRACK_PATH, input)
    }

    /// Only the identifier, `status` and `role` are enforced; amount, date
    /// and currency are passed through when set.
    pub fn build_change(&self, input: &ChangeRequest) -> Result<HttpRequest> {
        let mut missing = Vec::new();
        if !present(&input.uetr) && !present(&input.reference) {
            missing.push("uetr or ref");
        }
        if input.status.is_none() {
            missing.push("status");
        }
        if input.role.is_none() {
            missing.push("role");
        }
        check("change", missing)?;
        self.post(CHANGE_PATH, input)
    }

    pub fn build_validate(&self, input: &ValidateRequest) -> Result<HttpRequest> {
        let mut missing = Vec::new();
        if !present(&input.beneficiary_bic) {
            missing.push("beneficiary_bic");
        }
        if !present(&input.currency) {
            missing.push("currency");
        }
        check("validate", missing)?;
        self.post(VALIDATE_PATH, input)
    }

    pub fn build_get_ssi(&self, input: &SsiRequest) -> Result<HttpRequest> {
        let mut missing = Vec::new();
        if !present(&input.swift) {
            missing.push("swift");
        }
        if !present(&input.currency) {
            missing.push("currency");
        }
        check("get_ssi", missing)?;
        self.post(SSI_PATH, input)
    }

    fn post(&self, path: &str, body: &impl Serialize) -> Result<HttpRequest> {
        let body = serde_json::to_string(body).map_err(Error::Serialization)?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{path}", self.base_url),
            headers: self.headers(),
            body: Some(body),
        })
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            ("KEY".to_string(), self.config.api_key.clone()),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
        ]
    }

    // -----------------------------------------------------------------------
    // Response classification
    // -----------------------------------------------------------------------

    /// Turn a raw response into the success payload or an `ApiError`.
    ///
    /// Bodies that are not JSON fail with "Invalid JSON response" whatever
    /// the status. Status 400 and above fail with the body's `message` and
    /// `errors`. Anything else is returned unmodified.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value> {
        let payload: Value = match serde_json::from_str(&response.body) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(status = response.status, error = %err, "response body is not JSON");
                return Err(ApiError::invalid_json(response.status).into());
            }
        };

        if response.status < 400 {
            return Ok(payload);
        }

        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_ERROR_MESSAGE)
            .to_string();
        let errors = payload.get("errors").and_then(field_errors);
        Err(ApiError {
            message,
            status_code: response.status,
            errors,
        }
        .into())
    }
}

/// Entries of an `errors` object whose value is a list of strings; other
/// entries are skipped.
fn field_errors(errors: &Value) -> Option<BTreeMap<String, Vec<String>>> {
    let fields = errors.as_object()?;
    Some(
        fields
            .iter()
            .filter_map(|(field, messages)| {
                let messages = messages
                    .as_array()?
                    .iter()
                    .map(|message| message.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()?;
                Some((field.clone(), messages))
            })
            .collect(),
    )
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|value| !value.trim().is_empty())
}

fn check(operation: &'static str, missing: Vec<&'static str>) -> Result<()> {
    if missing.is_empty() {
        return Ok(());
    }
    debug!(operation, ?missing, "rejected before sending");
    Err(ValidationError { operation, missing }.into())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::error::TransportError;
    use crate::types::{ChangeStatus, Role, TrackStatus};

    /// Answers every request with the same canned response.
    #[derive(Debug, Default)]
    struct StubTransport {
        status: u16,
        body: String,
        calls: AtomicUsize,
        seen: std::sync::Mutex<Vec<HttpRequest>>,
    }

    impl StubTransport {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body: body.to_string(),
                ..Self::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request);
            Ok(HttpResponse::new(self.status, self.body.clone()))
        }
    }

    /// Flags `released` when dropped.
    #[derive(Debug)]
    struct ConnectionGuard(Arc<AtomicBool>);

    impl Drop for ConnectionGuard {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Holds a "connection" and never answers.
    #[derive(Debug, Default)]
    struct HangingTransport {
        released: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Transport for HangingTransport {
        async fn send(&self, _request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            let _connection = ConnectionGuard(self.released.clone());
            std::future::pending().await
        }
    }

    #[derive(Debug)]
    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn send(&self, _request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            Err(TransportError::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::new("test-key").with_base_url("http://localhost:3000")
    }

    fn client_with<T: Transport>(transport: T) -> OhmyfinClient<T> {
        OhmyfinClient::with_transport(config(), transport).unwrap()
    }

    fn sample_track() -> TrackRequest {
        TrackRequest {
            uetr: Some("97ed4827-7b6f-4491-a06f-b548d5a7512d".into()),
            amount: Some(10000.0),
            date: Some("2024-01-15".into()),
            currency: Some("USD".into()),
            ..Default::default()
        }
    }

    fn sample_change() -> ChangeRequest {
        ChangeRequest {
            uetr: Some("97ed4827-7b6f-4491-a06f-b548d5a7512d".into()),
            status: Some(ChangeStatus::Success),
            role: Some(Role::Beneficiary),
            ..Default::default()
        }
    }

    fn sample_validate() -> ValidateRequest {
        ValidateRequest {
            beneficiary_bic: Some("DEUTDEFF".into()),
            currency: Some("EUR".into()),
            ..Default::default()
        }
    }

    fn sample_ssi() -> SsiRequest {
        SsiRequest {
            swift: Some("CHASUS33".into()),
            currency: Some("USD".into()),
        }
    }

    fn validation_missing(err: Error) -> Vec<&'static str> {
        match err {
            Error::Validation(ValidationError { missing, .. }) => missing,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn api_error(err: Error) -> ApiError {
        match err {
            Error::Api(api) => api,
            other => panic!("expected API error, got {other:?}"),
        }
    }

    // --- construction ---

    #[test]
    fn construction_without_key_fails() {
        let result = OhmyfinClient::new(ClientConfig::default().with_base_url("http://localhost:3000"));
        assert!(matches!(result, Err(Error::Configuration(_))));

        let result = OhmyfinClient::with_transport(ClientConfig::new(""), StubTransport::new(200, "{}"));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn construction_with_key_uses_defaults() {
        let client = OhmyfinClient::new(ClientConfig::new("k")).unwrap();
        assert_eq!(client.config().base_url, "https://ohmyfin.ai");
        assert_eq!(client.config().timeout, Duration::from_secs(30));
    }

    // --- request building ---

    #[test]
    fn build_track_produces_correct_request() {
        let req = client_with(FailingTransport).build_track(&sample_track()).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/api/track");
        assert_eq!(req.header("KEY"), Some("test-key"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("user-agent"), Some(USER_AGENT));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "uetr": "97ed4827-7b6f-4491-a06f-b548d5a7512d",
                "amount": 10000.0,
                "date": "2024-01-15",
                "currency": "USD"
            })
        );
    }

    #[test]
    fn each_operation_posts_to_its_path() {
        let client = client_with(FailingTransport);
        let urls = [
            client.build_track(&sample_track()).unwrap().url,
            client.build_change(&sample_change()).unwrap().url,
            client.build_validate(&sample_validate()).unwrap().url,
            client.build_get_ssi(&sample_ssi()).unwrap().url,
        ];
        assert_eq!(
            urls,
            [
                "http://localhost:3000/api/track",
                "http://localhost:3000/api/change",
                "http://localhost:3000/api/validate",
                "http://localhost:3000/api/getssi",
            ]
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client =
            OhmyfinClient::with_transport(config().with_base_url("https://ohmyfin.ai/"), FailingTransport).unwrap();
        let req = client.build_get_ssi(&sample_ssi()).unwrap();
        assert_eq!(req.url, "https://ohmyfin.ai/api/getssi");
    }

    #[test]
    fn every_trailing_slash_is_stripped() {
        let client =
            OhmyfinClient::with_transport(config().with_base_url("http://localhost:3000/v1//"), FailingTransport)
                .unwrap();
        let req = client.build_track(&sample_track()).unwrap();
        assert_eq!(req.url, "http://localhost:3000/v1/api/track");
    }

    #[test]
    fn user_agent_names_sdk_and_version() {
        assert_eq!(USER_AGENT, format!("ohmyfin-rust-sdk/{}", env!("CARGO_PKG_VERSION")));
    }

    // --- local validation ---

    #[test]
    fn track_accepts_uetr_ref_or_both() {
        let client = client_with(FailingTransport);
        let by_ref = TrackRequest {
            uetr: None,
            reference: Some("REF123".into()),
            ..sample_track()
        };
        let both = TrackRequest {
            reference: Some("REF123".into()),
            ..sample_track()
        };
        assert!(client.build_track(&sample_track()).is_ok());
        assert!(client.build_track(&by_ref).is_ok());
        assert!(client.build_track(&both).is_ok());
    }

    #[test]
    fn track_requires_an_identifier() {
        let input = TrackRequest {
            uetr: None,
            ..sample_track()
        };
        let err = client_with(FailingTransport).build_track(&input).unwrap_err();
        assert_eq!(validation_missing(err), vec!["uetr or ref"]);
    }

    #[test]
    fn blank_strings_count_as_missing() {
        let input = TrackRequest {
            uetr: Some("  ".into()),
            currency: Some(String::new()),
            ..sample_track()
        };
        let err = client_with(FailingTransport).build_track(&input).unwrap_err();
        assert_eq!(validation_missing(err), vec!["uetr or ref", "currency"]);
    }

    #[test]
    fn track_reports_every_missing_field() {
        let err = client_with(FailingTransport)
            .build_track(&TrackRequest::default())
            .unwrap_err();
        assert_eq!(validation_missing(err), vec!["uetr or ref", "amount", "date", "currency"]);
    }

    #[test]
    fn change_does_not_require_amount_date_or_currency() {
        let req = client_with(FailingTransport).build_change(&sample_change()).unwrap();
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert!(body.get("amount").is_none());
        assert_eq!(body["status"], "success");
        assert_eq!(body["role"], "beneficiary");
    }

    #[test]
    fn change_requires_status_and_role() {
        let input = ChangeRequest {
            reference: Some("REF".into()),
            ..Default::default()
        };
        let err = client_with(FailingTransport).build_change(&input).unwrap_err();
        assert_eq!(validation_missing(err), vec!["status", "role"]);
    }

    #[test]
    fn validate_and_ssi_require_both_fields() {
        let client = client_with(FailingTransport);
        let err = client
            .build_validate(&ValidateRequest {
                sender_bic: Some("BOFAUS3N".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(validation_missing(err), vec!["beneficiary_bic", "currency"]);

        let err = client
            .build_get_ssi(&SsiRequest {
                swift: Some("CHASUS33".into()),
                currency: None,
            })
            .unwrap_err();
        assert_eq!(validation_missing(err), vec!["currency"]);
    }

    #[tokio::test]
    async fn missing_fields_never_reach_the_transport() {
        let stub = StubTransport::new(200, "{}");
        let client = client_with(stub.clone());

        let track_inputs = [
            TrackRequest { uetr: None, ..sample_track() },
            TrackRequest { amount: None, ..sample_track() },
            TrackRequest { date: None, ..sample_track() },
            TrackRequest { currency: None, ..sample_track() },
        ];
        for input in &track_inputs {
            assert!(matches!(client.track(input).await, Err(Error::Validation(_))));
        }

        let change_inputs = [
            ChangeRequest { uetr: None, ..sample_change() },
            ChangeRequest { status: None, ..sample_change() },
            ChangeRequest { role: None, ..sample_change() },
        ];
        for input in &change_inputs {
            assert!(matches!(client.change(input).await, Err(Error::Validation(_))));
        }

        let validate_inputs = [
            ValidateRequest { beneficiary_bic: None, ..sample_validate() },
            ValidateRequest { currency: None, ..sample_validate() },
        ];
        for input in &validate_inputs {
            assert!(matches!(client.validate(input).await, Err(Error::Validation(_))));
        }

        let ssi_inputs = [
            SsiRequest { swift: None, ..sample_ssi() },
            SsiRequest { currency: None, ..sample_ssi() },
        ];
        for input in &ssi_inputs {
            assert!(matches!(client.get_ssi(input).await, Err(Error::Validation(_))));
        }

        assert_eq!(stub.calls(), 0);
    }

    // --- dispatch and classification ---

    #[tokio::test]
    async fn track_resolves_to_the_exact_body() {
        let body = r#"{"status":"success","lastupdate":"2024-01-15","details":[],"limits":{"daily":100,"monthly":1000,"annual":10000}}"#;
        let stub = StubTransport::new(200, body);
        let client = client_with(stub.clone());

        let response = client.track(&sample_track()).await.unwrap();
        assert_eq!(
            response.raw(),
            &json!({
                "status": "success",
                "lastupdate": "2024-01-15",
                "details": [],
                "limits": {"daily": 100, "monthly": 1000, "annual": 10000}
            })
        );
        let typed = response.parse().unwrap();
        assert_eq!(typed.status, Some(TrackStatus::Success));
        assert_eq!(stub.calls(), 1);

        let sent = stub.seen.lock().unwrap();
        assert_eq!(sent[0].url, "http://localhost:3000/api/track");
        assert_eq!(sent[0].header("KEY"), Some("test-key"));
    }

    #[tokio::test]
    async fn every_operation_returns_the_body_unmodified() {
        let body = json!({"anything": [1, 2, {"nested": null}], "message": "ok", "extra": 1.5});
        let client = client_with(StubTransport::new(200, &body.to_string()));

        assert_eq!(client.track(&sample_track()).await.unwrap().into_raw(), body);
        assert_eq!(client.change(&sample_change()).await.unwrap().into_raw(), body);
        assert_eq!(client.validate(&sample_validate()).await.unwrap().into_raw(), body);
        assert_eq!(client.get_ssi(&sample_ssi()).await.unwrap().into_raw(), body);
    }

    #[tokio::test]
    async fn error_status_surfaces_message() {
        let client = client_with(StubTransport::new(404, r#"{"message":"not found"}"#));
        let err = api_error(client.track(&sample_track()).await.unwrap_err());
        assert_eq!(err, ApiError::new("not found", 404));
    }

    #[tokio::test]
    async fn error_status_without_message_uses_default() {
        let client = client_with(StubTransport::new(400, r#"{"code":17}"#));
        let err = api_error(client.validate(&sample_validate()).await.unwrap_err());
        assert_eq!(err.message, "API request failed");
        assert_eq!(err.status_code, 400);
        assert!(err.errors.is_none());
    }

    #[tokio::test]
    async fn field_errors_are_passed_through() {
        let client = client_with(StubTransport::new(
            422,
            r#"{"message":"Validation failed","errors":{"currency":["must be 3 letters","unsupported"]}}"#,
        ));
        let err = api_error(client.get_ssi(&sample_ssi()).await.unwrap_err());
        assert_eq!(err.status_code, 422);
        assert_eq!(err.message, "Validation failed");
        let errors = err.errors.unwrap();
        assert_eq!(errors["currency"], vec!["must be 3 letters", "unsupported"]);
    }

    #[tokio::test]
    async fn malformed_field_errors_keep_the_valid_entries() {
        let client = client_with(StubTransport::new(
            422,
            r#"{"message":"Validation failed","errors":{"amount":["x"],"date":"bad","currency":["ok",3]}}"#,
        ));
        let err = api_error(client.track(&sample_track()).await.unwrap_err());
        let errors = err.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["amount"], vec!["x"]);
    }

    #[tokio::test]
    async fn errors_that_are_not_an_object_are_absent() {
        let client = client_with(StubTransport::new(400, r#"{"message":"bad","errors":["amount"]}"#));
        let err = api_error(client.track(&sample_track()).await.unwrap_err());
        assert_eq!(err.message, "bad");
        assert!(err.errors.is_none());
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_json_with_received_status() {
        let client = client_with(StubTransport::new(200, "<html>maintenance</html>"));
        let err = api_error(client.change(&sample_change()).await.unwrap_err());
        assert_eq!(err, ApiError::new("Invalid JSON response", 200));

        let client = client_with(StubTransport::new(502, "Bad Gateway"));
        let err = api_error(client.track(&sample_track()).await.unwrap_err());
        assert_eq!(err, ApiError::new("Invalid JSON response", 502));
    }

    #[tokio::test]
    async fn redirect_range_status_is_success() {
        let client = client_with(StubTransport::new(399, r#"{"ok":true}"#));
        let response = client.get_ssi(&sample_ssi()).await.unwrap();
        assert_eq!(response["ok"], true);
    }

    #[tokio::test]
    async fn timeout_fails_with_408_and_releases_request() {
        let transport = Arc::new(HangingTransport::default());
        let client = OhmyfinClient::with_transport(
            config().with_timeout(Duration::from_millis(50)),
            transport.clone(),
        )
        .unwrap();

        let err = api_error(client.track(&sample_track()).await.unwrap_err());
        assert_eq!(err, ApiError::new("Request timeout", 408));
        assert!(err.is_timeout());
        assert!(transport.released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn transport_failure_keeps_its_cause() {
        let client = client_with(FailingTransport);
        let err = client.validate(&sample_validate()).await.unwrap_err();
        let transport = match err {
            Error::Transport(transport) => transport,
            other => panic!("expected transport error, got {other:?}"),
        };
        let io = transport.get_ref().downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::ConnectionRefused);
    }

    #[tokio::test]
    async fn concurrent_calls_complete_independently() {
        let stub = StubTransport::new(200, r#"{"status":"success"}"#);
        let client = client_with(stub.clone());

        let (track_input, ssi_input) = (sample_track(), sample_ssi());
        let (track, ssi) = tokio::join!(client.track(&track_input), client.get_ssi(&ssi_input));
        assert_eq!(track.unwrap()["status"], "success");
        assert_eq!(ssi.unwrap()["status"], "success");
        assert_eq!(stub.calls(), 2);

        let mut urls: Vec<String> = stub.seen.lock().unwrap().iter().map(|r| r.url.clone()).collect();
        urls.sort();
        assert_eq!(urls, ["http://localhost:3000/api/getssi", "http://localhost:3000/api/track"]);
    }

    #[test]
    fn parse_response_classifies_by_status() {
        let client = client_with(FailingTransport);
        let ok = client.parse_response(HttpResponse::new(200, "[]")).unwrap();
        assert_eq!(ok, json!([]));

        let err = client
            .parse_response(HttpResponse::new(500, r#"{"message":"boom"}"#))
            .unwrap_err();
        assert_eq!(api_error(err), ApiError::new("boom", 500));
    }
}
