//! Async client for the Ohmyfin payment-tracking API.
//!
//! # Overview
//! Four operations, all `POST` with a JSON body:
//! - `track`: status and route of a transfer by UETR or reference,
//! - `change`: report a status update for a transfer,
//! - `validate`: check beneficiary and routing details,
//! - `get_ssi`: standard settlement instructions for a bank and currency.
//!
//! ```no_run
//! # async fn demo() -> ohmyfin_core::Result<()> {
//! use ohmyfin_core::{ClientConfig, OhmyfinClient, SsiRequest};
//!
//! let client = OhmyfinClient::new(ClientConfig::from_env()?)?;
//! let ssi = client
//!     .get_ssi(&SsiRequest {
//!         swift: Some("CHASUS33".into()),
//!         currency: Some("USD".into()),
//!     })
//!     .await?;
//! println!("{}", ssi.raw());
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - Required fields are checked locally; a missing one is an
//!   `Error::Validation` and nothing is sent.
//! - Each operation is built as a plain-data `HttpRequest` and its
//!   `HttpResponse` is classified without I/O, so the `build_*` methods and
//!   `OhmyfinClient::parse_response` also work with any external HTTP stack.
//! - The network sits behind the `Transport` trait; `ReqwestTransport` is the
//!   default.
//! - Successful bodies come back unmodified as `ApiResponse<T>`; decoding
//!   into the typed shape is opt-in.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::OhmyfinClient;
pub use config::ClientConfig;
pub use error::{ApiError, Error, Result, TransportError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    ApiResponse, AvailableCorrespondent, ChangeRequest, ChangeStatus, Correspondent, FieldStatus,
    Limits, Role, SsiRequest, SsiResult, TrackHop, TrackRequest, TrackResult, TrackStatus,
    ValidateRequest, ValidateResult, ValidationStatus,
};
