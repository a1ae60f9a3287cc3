//! Service client exposing one method per Rollbar account endpoint.
//!
//! # Design
//! Every endpoint follows the same four steps: build a request from the
//! target's factory, inject the read or write token as `access_token`,
//! dispatch with the endpoint's verb, and return the transport's result
//! unchanged. Argument checks happen before anything is built, so a rejected
//! call never reaches the network.

use std::fmt::Display;

use serde::Serialize;
use serde_json::{json, Value};

use crate::api_request::ApiTarget;
use crate::auth::{AccessTokens, TokenScope};
use crate::error::{Result, RollbarError};
use crate::http::{HttpClient, HttpMethod};
use crate::request::{Params, RequestBuilder};
use crate::transport::{ApiResponse, Transport};

/// Client for the Rollbar account-management API.
#[derive(Debug, Clone)]
pub struct RollbarClient<C> {
    tokens: AccessTokens,
    target: ApiTarget,
    transport: Transport<C>,
}

impl<C: HttpClient> RollbarClient<C> {
    pub fn new(tokens: AccessTokens, http: C) -> Self {
        Self {
            tokens,
            target: ApiTarget::default(),
            transport: Transport::new(http),
        }
    }

    /// Construct from a `{"read": ..., "write": ...}` credentials value.
    pub fn from_credentials(credentials: &Value, http: C) -> Result<Self> {
        let tokens = AccessTokens::try_from(credentials)?;
        Ok(Self::new(tokens, http))
    }

    /// Send requests somewhere other than the public API.
    pub fn with_target(mut self, target: ApiTarget) -> Self {
        self.target = target;
        self
    }

    pub fn target(&self) -> &ApiTarget {
        &self.target
    }

    pub fn transport(&self) -> &Transport<C> {
        &self.transport
    }

    fn path(&self, path: impl Into<String>) -> RequestBuilder {
        self.target.builder().with_path(path)
    }

    async fn send(&self, method: HttpMethod, scope: TokenScope, builder: RequestBuilder) -> Result<ApiResponse> {
        let mut request = builder.build();
        self.tokens.apply(scope, &mut request);
        self.transport.dispatch(method, &request).await
    }

    // --- projects ---

    pub async fn list_projects(&self) -> Result<ApiResponse> {
        self.send(HttpMethod::Get, TokenScope::Read, self.path("/projects")).await
    }

    pub async fn get_project(&self, project_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/project/{project_id}"));
        self.send(HttpMethod::Get, TokenScope::Read, builder).await
    }

    pub async fn delete_project(&self, project_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/project/{project_id}"));
        self.send(HttpMethod::Delete, TokenScope::Write, builder).await
    }

    /// Create a project. Naming rules are enforced by the server.
    pub async fn create_project(&self, name: &str) -> Result<ApiResponse> {
        let builder = self
            .path("/projects")
            .with_body_parameters(object(json!({ "name": name })));
        self.send(HttpMethod::Post, TokenScope::Write, builder).await
    }

    pub async fn list_project_access_tokens(&self, project_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/project/{project_id}/access_tokens"));
        self.send(HttpMethod::Get, TokenScope::Read, builder).await
    }

    /// Update a project access token's rate limit. `None` sends an empty
    /// object, leaving both settings unchanged.
    pub async fn update_access_token_rate_limit<T: Serialize + ?Sized>(
        &self,
        project_id: impl Display,
        access_token: impl Display,
        options: Option<&T>,
    ) -> Result<ApiResponse> {
        let body = match options {
            Some(options) => options_object(options, "Rate limit options must be an object.")?,
            None => Params::new(),
        };
        let builder = self
            .path(format!("/project/{project_id}/access_token/{access_token}"))
            .with_body_parameters(body);
        self.send(HttpMethod::Patch, TokenScope::Write, builder).await
    }

    // --- teams ---

    pub async fn list_teams(&self) -> Result<ApiResponse> {
        self.send(HttpMethod::Get, TokenScope::Read, self.path("/teams")).await
    }

    pub async fn get_team(&self, team_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/team/{team_id}"));
        self.send(HttpMethod::Get, TokenScope::Read, builder).await
    }

    /// Create a team from `{name, access_level}`.
    pub async fn create_team<T: Serialize + ?Sized>(&self, options: &T) -> Result<ApiResponse> {
        let body = options_object(
            options,
            "Options must be an object containing parameters name and access_level.",
        )?;
        let builder = self.path("/teams").with_body_parameters(body);
        self.send(HttpMethod::Post, TokenScope::Write, builder).await
    }

    pub async fn delete_team(&self, team_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/team/{team_id}"));
        self.send(HttpMethod::Delete, TokenScope::Write, builder).await
    }

    pub async fn is_project_in_team(&self, team_id: impl Display, project_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/team/{team_id}/project/{project_id}"));
        self.send(HttpMethod::Get, TokenScope::Read, builder).await
    }

    pub async fn add_project_to_team(&self, team_id: impl Display, project_id: impl Display) -> Result<ApiResponse> {
        let builder = self
            .path(format!("/team/{team_id}/project/{project_id}"))
            .with_headers(object(json!({ "Content-Type": "application/json" })));
        self.send(HttpMethod::Put, TokenScope::Write, builder).await
    }

    pub async fn remove_project_from_team(
        &self,
        team_id: impl Display,
        project_id: impl Display,
    ) -> Result<ApiResponse> {
        let builder = self.path(format!("/team/{team_id}/project/{project_id}"));
        self.send(HttpMethod::Delete, TokenScope::Write, builder).await
    }

    pub async fn list_team_members(&self, team_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/team/{team_id}/users"));
        self.send(HttpMethod::Get, TokenScope::Read, builder).await
    }

    pub async fn check_team_membership(&self, team_id: impl Display, user_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/team/{team_id}/user/{user_id}"));
        self.send(HttpMethod::Get, TokenScope::Read, builder).await
    }

    pub async fn add_user_to_team(&self, team_id: impl Display, user_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/team/{team_id}/user/{user_id}"));
        self.send(HttpMethod::Put, TokenScope::Write, builder).await
    }

    pub async fn remove_user_from_team(&self, team_id: impl Display, user_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/team/{team_id}/user/{user_id}"));
        self.send(HttpMethod::Delete, TokenScope::Write, builder).await
    }

    // --- invites ---

    /// Invite a user to a team. `options` must be an object with an `email`.
    pub async fn invite_user_to_team<T: Serialize + ?Sized>(
        &self,
        team_id: impl Display,
        options: &T,
    ) -> Result<ApiResponse> {
        const MESSAGE: &str = "Options must be an object containing an email address.";
        let body = options_object(options, MESSAGE)?;
        if !body.get("email").is_some_and(Value::is_string) {
            return Err(RollbarError::argument(MESSAGE));
        }
        let builder = self
            .path(format!("/team/{team_id}/invites"))
            .with_body_parameters(body);
        self.send(HttpMethod::Post, TokenScope::Write, builder).await
    }

    pub async fn get_invite(&self, invite_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/invite/{invite_id}"));
        self.send(HttpMethod::Get, TokenScope::Read, builder).await
    }

    pub async fn list_invites(&self, team_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/team/{team_id}/invites"));
        self.send(HttpMethod::Get, TokenScope::Read, builder).await
    }

    pub async fn cancel_invite(&self, invite_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/invite/{invite_id}"));
        self.send(HttpMethod::Delete, TokenScope::Write, builder).await
    }

    // --- users ---

    pub async fn list_users(&self) -> Result<ApiResponse> {
        self.send(HttpMethod::Get, TokenScope::Read, self.path("/users")).await
    }

    pub async fn get_user(&self, user_id: impl Display) -> Result<ApiResponse> {
        let builder = self.path(format!("/user/{user_id}"));
        self.send(HttpMethod::Get, TokenScope::Read, builder).await
    }
}

#[cfg(feature = "reqwest-client")]
impl RollbarClient<crate::http::ReqwestClient> {
    /// Build a reqwest-backed client from `ROLLBAR_READ_TOKEN`,
    /// `ROLLBAR_WRITE_TOKEN` and the `ApiTarget::from_env` variables.
    pub fn from_env() -> Result<Self> {
        let token = |name: &str| std::env::var(name).unwrap_or_default();
        let tokens = AccessTokens::new(token("ROLLBAR_READ_TOKEN"), token("ROLLBAR_WRITE_TOKEN"))?;
        let http = crate::http::ReqwestClient::new()?;
        Ok(Self::new(tokens, http).with_target(ApiTarget::from_env()))
    }
}

/// Serialize caller options and require a JSON object.
fn options_object<T: Serialize + ?Sized>(options: &T, message: &str) -> Result<Params> {
    match serde_json::to_value(options) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(RollbarError::argument(message)),
    }
}

/// Literal object bodies and headers built inside this module.
fn object(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}
