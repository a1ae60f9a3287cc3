//! Domain DTOs for the Rollbar account API.
//!
//! # Design
//! Result types are lenient: fields the service may omit are `Option` or
//! defaulted so a new server-side field never breaks decoding. Payload types
//! serialize to the exact body the endpoint expects and can be passed
//! straight to the `RollbarClient` methods that take options.

use serde::{Deserialize, Serialize};

/// A project in the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub account_id: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date_created: Option<u64>,
    #[serde(default)]
    pub date_modified: Option<u64>,
}

/// A project-level access token and its rate-limit settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAccessToken {
    pub project_id: u64,
    pub access_token: String,
    pub name: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub rate_limit_window_count: Option<u64>,
    #[serde(default)]
    pub rate_limit_window_size: Option<u64>,
}

/// Access level granted to a team's members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Standard,
    Light,
    View,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
    pub access_level: AccessLevel,
    #[serde(default)]
    pub account_id: Option<u64>,
}

/// An outstanding or redeemed invitation to a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub id: u64,
    pub team_id: u64,
    pub to_email: String,
    pub status: String,
    #[serde(default)]
    pub from_user_id: Option<u64>,
    #[serde(default)]
    pub date_created: Option<u64>,
    #[serde(default)]
    pub date_redeemed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
}

/// Body for `create_team`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeam {
    pub name: String,
    pub access_level: AccessLevel,
}

/// Body for `update_access_token_rate_limit`. Omitted fields are left
/// unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_window_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_window_size: Option<u64>,
}

/// Body for `invite_user_to_team`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteUser {
    pub email: String,
}
