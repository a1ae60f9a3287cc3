//! Generic request descriptors and the builder that produces them.
//!
//! # Design
//! `RequestBuilder` is a plain accumulator: each `with_*` call replaces one
//! field wholesale. `build` clones the accumulated state, so a `Request` is a
//! snapshot that later builder calls cannot reach. Optional maps stay `None`
//! until something is written to them; an empty map and an absent map are
//! different things to the transport (no `qs`, no body).

use serde_json::{Map, Value};

use crate::error::{Result, RollbarError};

/// Header, query and body parameter maps. Values may be any JSON value.
pub type Params = Map<String, Value>;

/// Step-wise accumulator for a [`Request`].
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    scheme: Option<String>,
    host: Option<String>,
    path: Option<String>,
    headers: Option<Params>,
    query_parameters: Option<Params>,
    body_parameters: Option<Params>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_headers(mut self, headers: Params) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_query_parameters(mut self, query_parameters: Params) -> Self {
        self.query_parameters = Some(query_parameters);
        self
    }

    pub fn with_body_parameters(mut self, body_parameters: Params) -> Self {
        self.body_parameters = Some(body_parameters);
        self
    }

    /// Snapshot the accumulated fields into a new `Request`.
    pub fn build(&self) -> Request {
        Request {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            path: self.path.clone(),
            headers: self.headers.clone(),
            query_parameters: self.query_parameters.clone(),
            body_parameters: self.body_parameters.clone(),
        }
    }
}

/// Description of a single HTTP call: where it goes and what it carries.
///
/// Owned by whoever built it. The transport adapter only reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    scheme: Option<String>,
    host: Option<String>,
    path: Option<String>,
    headers: Option<Params>,
    query_parameters: Option<Params>,
    body_parameters: Option<Params>,
}

impl Request {
    /// Build from an optional builder, failing when there is none.
    pub fn from_builder(builder: Option<&RequestBuilder>) -> Result<Self> {
        builder
            .map(RequestBuilder::build)
            .ok_or_else(|| RollbarError::configuration("No builder supplied to constructor."))
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn headers(&self) -> Option<&Params> {
        self.headers.as_ref()
    }

    pub fn query_parameters(&self) -> Option<&Params> {
        self.query_parameters.as_ref()
    }

    pub fn body_parameters(&self) -> Option<&Params> {
        self.body_parameters.as_ref()
    }

    /// Compose `scheme://host/path`.
    ///
    /// Leading slashes on the path and trailing slashes on the host are
    /// collapsed, so `"/projects"` and `"projects"` produce the same URI.
    pub fn uri(&self) -> Result<String> {
        let (scheme, host) = match (non_empty(&self.scheme), non_empty(&self.host)) {
            (Some(scheme), Some(host)) => (scheme, host),
            _ => {
                return Err(RollbarError::configuration(
                    "Cannot construct URI; components missing",
                ))
            }
        };

        let host = host.trim_end_matches('/');
        let path = self.path.as_deref().unwrap_or("").trim_start_matches('/');
        if path.is_empty() {
            Ok(format!("{scheme}://{host}"))
        } else {
            Ok(format!("{scheme}://{host}/{path}"))
        }
    }

    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.headers
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
    }

    pub fn add_headers(&mut self, headers: Value) -> Result<()> {
        let headers = expect_object(
            headers,
            "Headers must be in the form of a JSON-serializable object.",
        )?;
        for (key, value) in headers {
            self.add_header(key, value);
        }
        Ok(())
    }

    pub fn add_query_parameter(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.query_parameters
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
    }

    pub fn add_query_parameters(&mut self, query_parameters: Value) -> Result<()> {
        let query_parameters = expect_object(
            query_parameters,
            "Query parameters must be in the form of a JSON-serializable object.",
        )?;
        for (key, value) in query_parameters {
            self.add_query_parameter(key, value);
        }
        Ok(())
    }

    pub fn add_body_parameter(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.body_parameters
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
    }

    pub fn add_body_parameters(&mut self, body_parameters: Value) -> Result<()> {
        let body_parameters = expect_object(
            body_parameters,
            "Body parameters must be in the form of a JSON-serializable object.",
        )?;
        for (key, value) in body_parameters {
            self.add_body_parameter(key, value);
        }
        Ok(())
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

fn expect_object(value: Value, message: &str) -> Result<Params> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(RollbarError::argument(message)),
    }
}
