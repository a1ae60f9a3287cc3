//! Account access tokens.
//!
//! Rollbar account tokens come in read and write scopes. Both are required to
//! construct a client; they are only ever written into the `access_token`
//! query parameter of outgoing requests.

use std::fmt;

use serde_json::Value;

use crate::error::{Result, RollbarError};
use crate::request::Request;

pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Which of the two tokens a call needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    Read,
    Write,
}

/// The read/write token pair. Immutable once constructed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessTokens {
    read: String,
    write: String,
}

impl AccessTokens {
    pub fn new(read: impl Into<String>, write: impl Into<String>) -> Result<Self> {
        let (read, write) = (read.into(), write.into());
        if read.is_empty() || write.is_empty() {
            return Err(RollbarError::configuration(
                "You must provide both read and write account access tokens.",
            ));
        }
        Ok(Self { read, write })
    }

    pub(crate) fn apply(&self, scope: TokenScope, request: &mut Request) {
        let token = match scope {
            TokenScope::Read => &self.read,
            TokenScope::Write => &self.write,
        };
        request.add_query_parameter(ACCESS_TOKEN_PARAM, token.as_str());
    }
}

impl fmt::Debug for AccessTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokens")
            .field("read", &"[REDACTED]")
            .field("write", &"[REDACTED]")
            .finish()
    }
}

/// Accepts `{"read": "...", "write": "..."}`. Null, non-objects and objects
/// missing either token are configuration errors.
impl TryFrom<&Value> for AccessTokens {
    type Error = RollbarError;

    fn try_from(value: &Value) -> Result<Self> {
        let tokens = match value {
            Value::Null => {
                return Err(RollbarError::configuration("You must provide account access tokens."))
            }
            Value::Object(tokens) => tokens,
            _ => {
                return Err(RollbarError::configuration(
                    "You must provide both read and write account access tokens.",
                ))
            }
        };

        let token = |key: &str| tokens.get(key).and_then(Value::as_str).unwrap_or_default();
        Self::new(token("read"), token("write"))
    }
}
