//! Async client for the Rollbar account-management API.
//!
//! # Overview
//! `RollbarClient` exposes one method per endpoint (projects, teams, invites,
//! users). Each call builds a `Request` descriptor, injects the read or write
//! access token, and dispatches it through a `Transport` over an injected
//! `HttpClient`. Every outcome, from a socket timeout to an API error
//! envelope, comes back as one `Result<ApiResponse, RollbarError>`.
//!
//! # Design
//! - `RequestBuilder`/`Request` are generic; `ApiTarget` seeds them with the
//!   Rollbar scheme and host.
//! - The network lives behind `HttpClient`. `ReqwestClient` is the default
//!   implementation; tests substitute scripted clients.
//! - The HTTP status decides success. A successful body is unwrapped from
//!   the `{err, result}` envelope before it reaches the caller.

pub mod api_request;
pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod request;
pub mod transport;
pub mod types;

pub use api_request::ApiTarget;
pub use auth::AccessTokens;
pub use client::RollbarClient;
pub use error::{ApiError, Result, RollbarError, TransportErrorKind};
#[cfg(feature = "reqwest-client")]
pub use http::ReqwestClient;
pub use http::{HttpClient, HttpMethod, HttpResponse, RequestOptions, ResponseBody, TransportFailure};
pub use request::{Params, Request, RequestBuilder};
pub use transport::{ApiResponse, Transport};
pub use types::{AccessLevel, CreateTeam, Invite, InviteUser, Project, ProjectAccessToken, RateLimit, Team, User};
