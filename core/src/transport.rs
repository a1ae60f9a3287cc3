//! Dispatches `Request` descriptors and normalizes the outcome.
//!
//! # Design
//! Every verb goes through [`Transport::dispatch`], which awaits the client
//! exactly once and maps the result onto one `Result<ApiResponse>`:
//!
//! - no response at all: `Transport` (timeout or other);
//! - status above 200: `Api`, message taken from the envelope when possible;
//! - status 200 or below with an undecodable body: `Decoding`;
//! - otherwise the envelope's `result` becomes the response body.
//!
//! The HTTP status is authoritative. The envelope's `err` flag is ignored.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, Result, RollbarError, TransportErrorKind};
use crate::http::{HttpClient, HttpMethod, HttpResponse, RequestOptions, ResponseBody, TransportFailure};
use crate::request::Request;

/// Successful call: status, response headers and the unwrapped `result`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl ApiResponse {
    /// Deserialize the unwrapped result into a typed value.
    pub fn into_body<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.body).map_err(|e| RollbarError::Decoding(Some(e)))
    }

    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Transport adapter over an injected `HttpClient`.
#[derive(Debug, Clone)]
pub struct Transport<C> {
    client: C,
}

impl<C: HttpClient> Transport<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn get(&self, request: &Request) -> Result<ApiResponse> {
        self.dispatch(HttpMethod::Get, request).await
    }

    pub async fn post(&self, request: &Request) -> Result<ApiResponse> {
        self.dispatch(HttpMethod::Post, request).await
    }

    pub async fn put(&self, request: &Request) -> Result<ApiResponse> {
        self.dispatch(HttpMethod::Put, request).await
    }

    pub async fn patch(&self, request: &Request) -> Result<ApiResponse> {
        self.dispatch(HttpMethod::Patch, request).await
    }

    pub async fn delete(&self, request: &Request) -> Result<ApiResponse> {
        self.dispatch(HttpMethod::Delete, request).await
    }

    /// Build options once, send them, and normalize what comes back.
    pub async fn dispatch(&self, method: HttpMethod, request: &Request) -> Result<ApiResponse> {
        let options = RequestOptions::from_request(request)?;
        debug!(method = method.as_str(), uri = %options.uri, "dispatching request");

        match self.client.execute(method, options).await {
            Ok(response) => normalize(response),
            Err(failure) => Err(transport_error(method, failure)),
        }
    }
}

fn transport_error(method: HttpMethod, failure: TransportFailure) -> RollbarError {
    let kind = match failure {
        TransportFailure::Timeout => {
            warn!(method = method.as_str(), "request timed out");
            TransportErrorKind::Timeout
        }
        TransportFailure::Other(reason) => {
            warn!(method = method.as_str(), %reason, "request failed");
            TransportErrorKind::Other
        }
    };
    RollbarError::Transport(kind)
}

/// Map a raw HTTP response onto the success value or an error.
pub fn normalize(response: HttpResponse) -> Result<ApiResponse> {
    let HttpResponse {
        status,
        status_text,
        headers,
        body,
    } = response;

    let parsed = match body {
        ResponseBody::Json(value) => Ok(value),
        ResponseBody::Text(text) => serde_json::from_str::<Value>(&text).map_err(|e| (text, e)),
    };

    if status > 200 {
        let message = match &parsed {
            Ok(value) => envelope_message(value),
            Err((text, _)) => text.clone(),
        };
        debug!(status, %message, "API returned an error");
        return Err(ApiError::new(message, status, status_text).into());
    }

    match parsed {
        Ok(mut envelope) => {
            let result = envelope
                .get_mut("result")
                .map(Value::take)
                .unwrap_or(Value::Null);
            Ok(ApiResponse {
                status_code: status,
                headers,
                body: result,
            })
        }
        Err((_, e)) => {
            debug!(status, error = %e, "response body is not valid JSON");
            Err(RollbarError::Decoding(Some(e)))
        }
    }
}

/// The envelope's `message`, or the whole body as text when there is none.
fn envelope_message(value: &Value) -> String {
    match value.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => value.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{text, ScriptedClient};
    use super::*;
    use crate::api_request;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn request() -> Request {
        let mut req = api_request::builder().with_path("/path/to/end").build();
        req.add_query_parameter("access_token", "tok");
        req
    }

    async fn run(reply: std::result::Result<HttpResponse, TransportFailure>) -> Result<ApiResponse> {
        Transport::new(ScriptedClient::replying(reply)).get(&request()).await
    }

    #[tokio::test]
    async fn success_unwraps_result() {
        let resp = run(text(200, "OK", r#"{"err":0,"result":{"id":1234}}"#)).await.unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, json!({"id": 1234}));
        assert_eq!(resp.header("Content-Type"), Some("application/json"));
    }

    #[tokio::test]
    async fn structured_bodies_skip_parsing() {
        let reply = Ok(HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: Vec::new(),
            body: ResponseBody::Json(json!({"err": 0, "result": [1, 2]})),
        });
        assert_eq!(run(reply).await.unwrap().body, json!([1, 2]));
    }

    #[tokio::test]
    async fn missing_result_is_null() {
        let resp = run(text(200, "OK", r#"{"err":0}"#)).await.unwrap();
        assert_eq!(resp.body, Value::Null);
    }

    #[tokio::test]
    async fn status_200_ignores_envelope_err_flag() {
        let resp = run(text(200, "OK", r#"{"err":1,"message":"odd","result":5}"#)).await.unwrap();
        assert_eq!(resp.body, json!(5));
    }

    #[tokio::test]
    async fn non_200_becomes_api_error() {
        let err = run(text(404, "Not Found", r#"{"err":1,"message":"not found"}"#))
            .await
            .unwrap_err();
        let api = err.as_api_error().expect("api error");
        assert_eq!(api.status_code, 404);
        assert_eq!(api.status_message, "Not Found");
        assert_eq!(api.message, "not found");
    }

    #[tokio::test]
    async fn statuses_above_200_are_errors_even_when_2xx() {
        let err = run(text(201, "Created", r#"{"err":0,"result":{}}"#)).await.unwrap_err();
        assert_eq!(err.as_api_error().unwrap().status_code, 201);
    }

    #[tokio::test]
    async fn malformed_error_body_is_used_as_message() {
        let raw = r#"{err: 1 message: {key: "value"}}"#;
        let err = run(text(400, "Bad Request", raw)).await.unwrap_err();
        assert_eq!(err.to_string(), raw);
        assert_eq!(err.as_api_error().unwrap().status_code, 400);
    }

    #[tokio::test]
    async fn invalid_json_on_success_is_decoding_error() {
        let err = run(text(200, "OK", "string")).await.unwrap_err();
        assert!(matches!(err, RollbarError::Decoding(_)));
        assert_eq!(err.to_string(), "Invalid JSON response from server.");
    }

    #[tokio::test]
    async fn timeout_is_classified() {
        let err = run(Err(TransportFailure::Timeout)).await.unwrap_err();
        assert!(matches!(err, RollbarError::Transport(TransportErrorKind::Timeout)));
        assert_eq!(err.to_string(), "Request timed out.");
    }

    #[tokio::test]
    async fn other_failures_are_generic() {
        let err = run(Err(TransportFailure::Other("Fake error".to_string()))).await.unwrap_err();
        assert!(matches!(err, RollbarError::Transport(TransportErrorKind::Other)));
        assert_eq!(err.to_string(), "Request error.");
    }

    #[tokio::test]
    async fn each_verb_dispatches_once_with_its_method() {
        let client = ScriptedClient::default();
        let transport = Transport::new(client);
        let req = request();

        let _ = transport.get(&req).await;
        let _ = transport.post(&req).await;
        let _ = transport.put(&req).await;
        let _ = transport.patch(&req).await;
        let _ = transport.delete(&req).await;

        let methods: Vec<_> = transport.client().calls().into_iter().map(|(m, _)| m).collect();
        assert_eq!(
            methods,
            vec![
                HttpMethod::Get,
                HttpMethod::Post,
                HttpMethod::Put,
                HttpMethod::Patch,
                HttpMethod::Delete
            ]
        );
    }

    #[tokio::test]
    async fn unroutable_request_never_reaches_client() {
        let transport = Transport::new(ScriptedClient::default());
        let req = crate::RequestBuilder::new().with_path("/x").build();
        let err = transport.get(&req).await.unwrap_err();
        assert!(matches!(err, RollbarError::Configuration(_)));
        assert!(transport.client().calls().is_empty());
    }

    #[test]
    fn into_body_decodes_typed_results() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Item {
            id: u64,
        }
        let resp = ApiResponse {
            status_code: 200,
            headers: Vec::new(),
            body: json!([{"id": 1}, {"id": 2}]),
        };
        assert_eq!(resp.clone().into_body::<Vec<Item>>().unwrap(), vec![Item { id: 1 }, Item { id: 2 }]);
        assert!(matches!(resp.into_body::<Item>(), Err(RollbarError::Decoding(Some(_)))));
    }
}
