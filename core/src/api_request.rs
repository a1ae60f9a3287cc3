//! Request factory for the Rollbar API.
//!
//! The default connection target lives here and nowhere else. Every
//! `RollbarClient` call starts from [`ApiTarget::builder`].

use crate::request::RequestBuilder;

pub const DEFAULT_SCHEME: &str = "https";
pub const DEFAULT_HOST: &str = "api.rollbar.com/api/1";

/// Scheme and host (including the API base path) requests are sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiTarget {
    scheme: String,
    host: String,
}

impl ApiTarget {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Read `ROLLBAR_API_SCHEME` and `ROLLBAR_API_HOST`, falling back to the
    /// public API for whichever is unset.
    pub fn from_env() -> Self {
        let scheme = std::env::var("ROLLBAR_API_SCHEME").unwrap_or_else(|_| DEFAULT_SCHEME.to_string());
        let host = std::env::var("ROLLBAR_API_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        Self::new(scheme, host)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// A builder already pointed at this target.
    pub fn builder(&self) -> RequestBuilder {
        RequestBuilder::new()
            .with_host(self.host.as_str())
            .with_scheme(self.scheme.as_str())
    }
}

impl Default for ApiTarget {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEME, DEFAULT_HOST)
    }
}

/// Builder pre-seeded with the public Rollbar API target.
pub fn builder() -> RequestBuilder {
    ApiTarget::default().builder()
}
