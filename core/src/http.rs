//! HTTP transport types and the injected client boundary.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! transport adapter turns a `Request` descriptor into `RequestOptions`, hands
//! them to an `HttpClient`, and interprets the `HttpResponse` it gets back.
//! Sockets, TLS and pooling all live behind the `HttpClient` trait, so tests
//! can script responses without a network.

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::{Result, RollbarError};
use crate::request::{Params, Request};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Transport-ready form of a `Request`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub uri: String,
    pub query: Option<Vec<(String, String)>>,
    pub headers: Option<Vec<(String, String)>>,
    pub body: Option<String>,
    pub json: bool,
}

impl RequestOptions {
    /// Convert a descriptor into options. Query, headers and body are only
    /// present when the descriptor has them.
    pub fn from_request(request: &Request) -> Result<Self> {
        let uri = request.uri()?;
        let query = request.query_parameters().map(pairs);
        let mut headers = request.headers().map(pairs);

        let body = match request.body_parameters() {
            Some(params) => {
                let body = serde_json::to_string(params).map_err(|e| {
                    RollbarError::argument(format!("Body parameters could not be serialized: {e}"))
                })?;
                let headers = headers.get_or_insert_with(Vec::new);
                if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
                    headers.push(("content-type".to_string(), "application/json".to_string()));
                }
                Some(body)
            }
            None => None,
        };

        Ok(Self {
            uri,
            query,
            json: body.is_some(),
            headers,
            body,
        })
    }

    /// The URI with the query string appended.
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.uri)
            .map_err(|e| RollbarError::configuration(format!("Invalid URI {}: {e}", self.uri)))?;
        if let Some(query) = &self.query {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }
}

/// Render each parameter as a string: JSON strings verbatim, everything
/// else in its JSON form.
fn pairs(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Response body as handed back by the client: either already decoded or
/// still raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

/// Why a request produced no response at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    Timeout,
    Other(String),
}

/// The generic HTTP client the transport adapter dispatches through.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(
        &self,
        method: HttpMethod,
        options: RequestOptions,
    ) -> std::result::Result<HttpResponse, TransportFailure>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    async fn execute(
        &self,
        method: HttpMethod,
        options: RequestOptions,
    ) -> std::result::Result<HttpResponse, TransportFailure> {
        (**self).execute(method, options).await
    }
}

#[cfg(feature = "reqwest-client")]
pub use reqwest_client::ReqwestClient;

#[cfg(feature = "reqwest-client")]
mod reqwest_client {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{HttpClient, HttpMethod, HttpResponse, RequestOptions, ResponseBody, TransportFailure};
    use crate::error::{Result, RollbarError};

    /// `HttpClient` backed by `reqwest`.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        inner: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new() -> Result<Self> {
            Self::build(reqwest::Client::builder())
        }

        pub fn with_timeout(timeout: Duration) -> Result<Self> {
            Self::build(reqwest::Client::builder().timeout(timeout))
        }

        fn build(builder: reqwest::ClientBuilder) -> Result<Self> {
            let inner = builder
                .build()
                .map_err(|e| RollbarError::configuration(format!("Failed to build HTTP client: {e}")))?;
            Ok(Self { inner })
        }
    }

    impl From<reqwest::Client> for ReqwestClient {
        fn from(inner: reqwest::Client) -> Self {
            Self { inner }
        }
    }

    /// The URL carries `access_token`, so it is stripped before the error
    /// text is kept.
    fn classify(err: reqwest::Error) -> TransportFailure {
        if err.is_timeout() {
            TransportFailure::Timeout
        } else {
            TransportFailure::Other(err.without_url().to_string())
        }
    }

    #[async_trait]
    impl HttpClient for ReqwestClient {
        async fn execute(
            &self,
            method: HttpMethod,
            options: RequestOptions,
        ) -> std::result::Result<HttpResponse, TransportFailure> {
            let url = options.url().map_err(|e| TransportFailure::Other(e.to_string()))?;
            let mut builder = match method {
                HttpMethod::Get => self.inner.get(url),
                HttpMethod::Post => self.inner.post(url),
                HttpMethod::Put => self.inner.put(url),
                HttpMethod::Patch => self.inner.patch(url),
                HttpMethod::Delete => self.inner.delete(url),
            };
            for (name, value) in options.headers.iter().flatten() {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = options.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(classify)?;
            let status = response.status();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let text = response.text().await.map_err(classify)?;

            Ok(HttpResponse {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                headers,
                body: ResponseBody::Text(text),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_request;
    use serde_json::json;

    #[test]
    fn options_omit_absent_fields() {
        let req = api_request::builder().with_path("/projects").build();
        let options = RequestOptions::from_request(&req).unwrap();
        assert_eq!(options.uri, "https://api.rollbar.com/api/1/projects");
        assert!(options.query.is_none());
        assert!(options.headers.is_none());
        assert!(options.body.is_none());
        assert!(!options.json);
    }

    #[test]
    fn options_serialize_body_as_json() {
        let mut req = api_request::builder().with_path("/projects").build();
        req.add_body_parameter("name", "Sample-Project");
        let options = RequestOptions::from_request(&req).unwrap();

        assert!(options.json);
        let body: Value = serde_json::from_str(options.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "Sample-Project"}));
        assert_eq!(
            options.headers.unwrap(),
            vec![("content-type".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn options_keep_caller_content_type() {
        let mut req = api_request::builder().build();
        req.add_header("Content-Type", "application/json; charset=utf-8");
        req.add_body_parameter("a", 1);
        let headers = RequestOptions::from_request(&req).unwrap().headers.unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].1, "application/json; charset=utf-8");
    }

    #[test]
    fn options_stringify_query_values() {
        let mut req = api_request::builder().build();
        req.add_query_parameter("access_token", "tok");
        req.add_query_parameter("page", 3);
        req.add_query_parameter("flag", true);
        let query = RequestOptions::from_request(&req).unwrap().query.unwrap();
        assert_eq!(
            query,
            vec![
                ("access_token".to_string(), "tok".to_string()),
                ("page".to_string(), "3".to_string()),
                ("flag".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn options_require_a_uri() {
        let req = crate::RequestBuilder::new().with_path("/x").build();
        assert!(matches!(
            RequestOptions::from_request(&req),
            Err(RollbarError::Configuration(_))
        ));
    }

    #[test]
    fn url_appends_encoded_query() {
        let mut req = api_request::builder().with_path("/projects").build();
        req.add_query_parameter("access_token", "a b&c");
        let url = RequestOptions::from_request(&req).unwrap().url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.rollbar.com/api/1/projects?access_token=a+b%26c"
        );
    }

    #[test]
    fn method_names() {
        let names: Vec<_> = [
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Patch,
            HttpMethod::Delete,
        ]
        .iter()
        .map(HttpMethod::as_str)
        .collect();
        assert_eq!(names, ["GET", "POST", "PUT", "PATCH", "DELETE"]);
    }
}
