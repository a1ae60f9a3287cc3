//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises the client over
//! real HTTP through `ReqwestClient`. Validates that request building, token
//! injection and envelope handling line up with an actual server.

use std::time::Duration;

use pretty_assertions::assert_eq;
use rollbar_api::{
    AccessLevel, AccessTokens, ApiTarget, CreateTeam, HttpClient, HttpMethod, Invite, InviteUser, Project,
    ProjectAccessToken, RateLimit, RequestOptions, ReqwestClient, RollbarClient, RollbarError, Team,
    TransportErrorKind, TransportFailure, User,
};
use serde_json::json;
use tokio::net::TcpListener;

const READ: &str = "read-token";
const WRITE: &str = "write-token";

async fn start_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener, mock_server::Tokens::new(READ, WRITE)));
    format!("{addr}/api/1")
}

async fn client() -> RollbarClient<ReqwestClient> {
    let host = start_server().await;
    let tokens = AccessTokens::new(READ, WRITE).unwrap();
    RollbarClient::new(tokens, ReqwestClient::new().unwrap()).with_target(ApiTarget::new("http", host))
}

#[tokio::test]
async fn project_lifecycle() {
    let client = client().await;

    // Step 1: list — should be empty.
    let resp = client.list_projects().await.unwrap();
    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.body, json!([]));

    // Step 2: create.
    let created: Project = client
        .create_project("Sample-Project")
        .await
        .unwrap()
        .into_body()
        .unwrap();
    assert_eq!(created.name, "Sample-Project");

    // Step 3: get.
    let fetched: Project = client.get_project(created.id).await.unwrap().into_body().unwrap();
    assert_eq!(fetched, created);

    // Step 4: access tokens and rate limits.
    let tokens: Vec<ProjectAccessToken> = client
        .list_project_access_tokens(created.id)
        .await
        .unwrap()
        .into_body()
        .unwrap();
    assert_eq!(tokens.len(), 2);
    let limits = RateLimit {
        rate_limit_window_count: Some(1000),
        rate_limit_window_size: Some(60),
    };
    let updated: ProjectAccessToken = client
        .update_access_token_rate_limit(created.id, &tokens[0].access_token, Some(&limits))
        .await
        .unwrap()
        .into_body()
        .unwrap();
    assert_eq!(updated.rate_limit_window_count, Some(1000));
    assert_eq!(updated.rate_limit_window_size, Some(60));

    // Step 5: delete, then get is a 404 API error.
    client.delete_project(created.id).await.unwrap();
    let err = client.get_project(created.id).await.unwrap_err();
    let api = err.as_api_error().expect("api error");
    assert_eq!(api.status_code, 404);
    assert_eq!(api.status_message, "Not Found");
    assert_eq!(api.message, "Project not found");
}

#[tokio::test]
async fn team_lifecycle() {
    let client = client().await;

    let team: Team = client
        .create_team(&CreateTeam {
            name: "ops".to_string(),
            access_level: AccessLevel::Standard,
        })
        .await
        .unwrap()
        .into_body()
        .unwrap();
    assert_eq!(team.access_level, AccessLevel::Standard);

    let teams: Vec<Team> = client.list_teams().await.unwrap().into_body().unwrap();
    assert_eq!(teams, vec![team.clone()]);

    let project: Project = client.create_project("api").await.unwrap().into_body().unwrap();
    assert!(client.is_project_in_team(team.id, project.id).await.is_err());
    client.add_project_to_team(team.id, project.id).await.unwrap();
    client.is_project_in_team(team.id, project.id).await.unwrap();
    client.remove_project_from_team(team.id, project.id).await.unwrap();
    assert!(client.is_project_in_team(team.id, project.id).await.is_err());

    let users: Vec<User> = client.list_users().await.unwrap().into_body().unwrap();
    let owner = &users[0];
    let fetched: User = client.get_user(owner.id).await.unwrap().into_body().unwrap();
    assert_eq!(&fetched, owner);

    client.add_user_to_team(team.id, owner.id).await.unwrap();
    client.check_team_membership(team.id, owner.id).await.unwrap();
    let members: Vec<User> = client.list_team_members(team.id).await.unwrap().into_body().unwrap();
    assert_eq!(members, vec![owner.clone()]);
    client.remove_user_from_team(team.id, owner.id).await.unwrap();
    assert!(client.check_team_membership(team.id, owner.id).await.is_err());

    let fetched: Team = client.get_team(team.id).await.unwrap().into_body().unwrap();
    assert_eq!(fetched, team);
    client.delete_team(team.id).await.unwrap();
    assert!(client.get_team(team.id).await.is_err());
}

#[tokio::test]
async fn invite_lifecycle() {
    let client = client().await;
    let team: Team = client
        .create_team(&json!({"name": "devs", "access_level": "light"}))
        .await
        .unwrap()
        .into_body()
        .unwrap();

    let invite = InviteUser {
        email: "dev@example.com".to_string(),
    };
    let created: Invite = client
        .invite_user_to_team(team.id, &invite)
        .await
        .unwrap()
        .into_body()
        .unwrap();
    assert_eq!(created.to_email, "dev@example.com");
    assert_eq!(created.status, "pending");

    let listed: Vec<Invite> = client.list_invites(team.id).await.unwrap().into_body().unwrap();
    assert_eq!(listed, vec![created.clone()]);

    client.cancel_invite(created.id).await.unwrap();
    let fetched: Invite = client.get_invite(created.id).await.unwrap().into_body().unwrap();
    assert_eq!(fetched.status, "canceled");
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_server() {
    let client = client().await;
    let err = client.invite_user_to_team(1234, "not-an-object").await.unwrap_err();
    assert!(matches!(err, RollbarError::Argument(_)));
}

#[tokio::test]
async fn project_names_are_validated_by_the_server() {
    let client = client().await;
    let err = client.create_project("1project").await.unwrap_err();
    let api = err.as_api_error().expect("api error");
    assert_eq!(api.status_code, 422);
}

#[tokio::test]
async fn read_token_cannot_mutate() {
    let host = start_server().await;
    // Both scopes hold the read token, so writes are refused.
    let tokens = AccessTokens::new(READ, READ).unwrap();
    let client = RollbarClient::new(tokens, ReqwestClient::new().unwrap()).with_target(ApiTarget::new("http", host));

    client.list_projects().await.unwrap();
    let err = client.create_project("web").await.unwrap_err();
    assert_eq!(err.as_api_error().unwrap().status_code, 403);
}

#[tokio::test]
async fn unresponsive_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let tokens = AccessTokens::new(READ, WRITE).unwrap();
    let http = ReqwestClient::with_timeout(Duration::from_millis(200)).unwrap();
    let client = RollbarClient::new(tokens, http).with_target(ApiTarget::new("http", addr.to_string()));

    let err = client.list_projects().await.unwrap_err();
    assert!(matches!(err, RollbarError::Transport(TransportErrorKind::Timeout)));
    assert_eq!(err.to_string(), "Request timed out.");
}

#[tokio::test]
async fn refused_connection_is_a_request_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();

    let tokens = AccessTokens::new(READ, WRITE).unwrap();
    let client = RollbarClient::new(tokens, ReqwestClient::new().unwrap())
        .with_target(ApiTarget::new("http", addr.to_string()));

    let err = client.list_projects().await.unwrap_err();
    assert!(matches!(err, RollbarError::Transport(TransportErrorKind::Other)));
    assert_eq!(err.to_string(), "Request error.");
}

#[tokio::test]
async fn transport_failure_reason_omits_the_access_token() {
    let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
    let options = RequestOptions {
        uri: format!("http://{addr}/projects"),
        query: Some(vec![("access_token".to_string(), "SECRET-WRITE-TOKEN".to_string())]),
        headers: None,
        body: None,
        json: true,
    };

    let failure = ReqwestClient::new()
        .unwrap()
        .execute(HttpMethod::Get, options)
        .await
        .unwrap_err();
    match failure {
        TransportFailure::Other(reason) => assert!(!reason.contains("SECRET-WRITE-TOKEN"), "leaked: {reason}"),
        TransportFailure::Timeout => panic!("expected a connection error"),
    }
}
