use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_PREFIX: &str = "/api/1";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: u64,
    pub account_id: u64,
    pub name: String,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProjectAccessToken {
    pub project_id: u64,
    pub access_token: String,
    pub name: String,
    pub scopes: Vec<String>,
    pub status: String,
    pub rate_limit_window_count: Option<u64>,
    pub rate_limit_window_size: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: u64,
    pub account_id: u64,
    pub name: String,
    pub access_level: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Invite {
    pub id: u64,
    pub team_id: u64,
    pub from_user_id: u64,
    pub to_email: String,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
}

#[derive(Deserialize)]
struct CreateProject {
    name: String,
}

#[derive(Deserialize)]
struct CreateTeam {
    name: String,
    access_level: String,
}

#[derive(Deserialize)]
struct UpdateRateLimit {
    rate_limit_window_count: Option<u64>,
    rate_limit_window_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CreateInvite {
    email: String,
}

#[derive(Deserialize)]
struct AccessQuery {
    access_token: Option<String>,
}

/// Account tokens the server accepts.
#[derive(Clone, Debug)]
pub struct Tokens {
    pub read: String,
    pub write: String,
}

impl Tokens {
    pub fn new(read: impl Into<String>, write: impl Into<String>) -> Self {
        Self {
            read: read.into(),
            write: write.into(),
        }
    }
}

pub const ACCOUNT_ID: u64 = 1;
pub const OWNER_ID: u64 = 1;

#[derive(Debug)]
pub struct Store {
    next_id: u64,
    projects: BTreeMap<u64, Project>,
    access_tokens: BTreeMap<u64, Vec<ProjectAccessToken>>,
    teams: BTreeMap<u64, Team>,
    team_projects: BTreeSet<(u64, u64)>,
    team_users: BTreeSet<(u64, u64)>,
    invites: BTreeMap<u64, Invite>,
    users: BTreeMap<u64, User>,
}

impl Store {
    /// Empty account with a single owner user.
    pub fn new() -> Self {
        let owner = User {
            id: OWNER_ID,
            username: "owner".to_string(),
            email: "owner@example.com".to_string(),
        };
        Self {
            next_id: 100,
            projects: BTreeMap::new(),
            access_tokens: BTreeMap::new(),
            teams: BTreeMap::new(),
            team_projects: BTreeSet::new(),
            team_users: BTreeSet::new(),
            invites: BTreeMap::new(),
            users: BTreeMap::from([(OWNER_ID, owner)]),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn project(&self, id: u64) -> Result<&Project, Failure> {
        self.projects.get(&id).ok_or_else(|| Failure::not_found("Project not found"))
    }

    fn team(&self, id: u64) -> Result<&Team, Failure> {
        self.teams.get(&id).ok_or_else(|| Failure::not_found("Team not found"))
    }

    fn user(&self, id: u64) -> Result<&User, Failure> {
        self.users.get(&id).ok_or_else(|| Failure::not_found("User not found"))
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct AppState {
    tokens: Arc<Tokens>,
    store: Arc<RwLock<Store>>,
}

/// Error envelope: `{"err": 1, "message": ...}` with a non-200 status.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        tracing::debug!(status = %self.status, message = %self.message, "rejecting request");
        (self.status, Json(json!({"err": 1, "message": self.message}))).into_response()
    }
}

type Reply = Result<Json<Value>, Failure>;

fn ok(result: impl Serialize) -> Reply {
    let result = serde_json::to_value(result)
        .map_err(|e| Failure::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(json!({"err": 0, "result": result})))
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, Failure> {
    serde_json::from_str(body).map_err(|e| Failure::invalid(format!("Invalid request body: {e}")))
}

/// Path parameters whose rejection is an error envelope, so a malformed id
/// gets a 400 `{"err": 1}` body instead of axum's plain-text reply.
struct Ids<T>(T);

impl<S, T> FromRequestParts<S> for Ids<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| Ids(value))
            .map_err(|rejection| Failure::new(StatusCode::BAD_REQUEST, rejection.body_text()))
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Scope {
    Read,
    Write,
}

fn authorize(state: &AppState, query: &AccessQuery, scope: Scope) -> Result<(), Failure> {
    let token = query.access_token.as_deref().unwrap_or_default();
    let tokens = &state.tokens;
    if token == tokens.write || (scope == Scope::Read && token == tokens.read) {
        Ok(())
    } else if token == tokens.read {
        Err(Failure::new(StatusCode::FORBIDDEN, "Insufficient privileges"))
    } else {
        Err(Failure::new(StatusCode::UNAUTHORIZED, "Invalid access token"))
    }
}

pub fn app(tokens: Tokens) -> Router {
    let state = AppState {
        tokens: Arc::new(tokens),
        store: Arc::new(RwLock::new(Store::new())),
    };
    let api = Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/project/{project}", get(get_project).delete(delete_project))
        .route("/project/{project}/access_tokens", get(list_access_tokens))
        .route(
            "/project/{project}/access_token/{token}",
            axum::routing::patch(update_rate_limit),
        )
        .route("/teams", get(list_teams).post(create_team))
        .route("/team/{team}", get(get_team).delete(delete_team))
        .route(
            "/team/{team}/project/{project}",
            get(team_has_project).put(add_team_project).delete(remove_team_project),
        )
        .route("/team/{team}/users", get(list_team_members))
        .route(
            "/team/{team}/user/{user}",
            get(team_has_user).put(add_team_user).delete(remove_team_user),
        )
        .route("/team/{team}/invites", get(list_invites).post(create_invite))
        .route("/invite/{id}", get(get_invite).delete(cancel_invite))
        .route("/users", get(list_users))
        .route("/user/{id}", get(get_user));

    Router::new().nest(API_PREFIX, api).with_state(state)
}

pub async fn run(listener: TcpListener, tokens: Tokens) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock Rollbar API listening");
    }
    axum::serve(listener, app(tokens)).await
}

// --- projects ---

async fn list_projects(State(state): State<AppState>, Query(q): Query<AccessQuery>) -> Reply {
    authorize(&state, &q, Scope::Read)?;
    let store = state.store.read().await;
    ok(store.projects.values().collect::<Vec<_>>())
}

async fn create_project(State(state): State<AppState>, Query(q): Query<AccessQuery>, body: String) -> Reply {
    authorize(&state, &q, Scope::Write)?;
    let input: CreateProject = parse(&body)?;
    let valid = input.name.chars().next().is_some_and(char::is_alphabetic) && input.name.len() <= 32;
    if !valid {
        return Err(Failure::invalid("Invalid project name"));
    }

    let mut store = state.store.write().await;
    if store.projects.values().any(|p| p.name == input.name) {
        return Err(Failure::invalid("Project with this name already exists"));
    }
    let project = Project {
        id: store.next_id(),
        account_id: ACCOUNT_ID,
        name: input.name,
        status: "enabled".to_string(),
    };
    let tokens = ["post_server_item", "read"]
        .into_iter()
        .map(|scope| ProjectAccessToken {
            project_id: project.id,
            access_token: Uuid::new_v4().simple().to_string(),
            name: scope.to_string(),
            scopes: vec![scope.to_string()],
            status: "enabled".to_string(),
            rate_limit_window_count: None,
            rate_limit_window_size: None,
        })
        .collect();
    store.access_tokens.insert(project.id, tokens);
    store.projects.insert(project.id, project.clone());
    ok(project)
}

async fn get_project(State(state): State<AppState>, Ids(id): Ids<u64>, Query(q): Query<AccessQuery>) -> Reply {
    authorize(&state, &q, Scope::Read)?;
    let store = state.store.read().await;
    ok(store.project(id)?)
}

async fn delete_project(
    State(state): State<AppState>,
    Ids(id): Ids<u64>,
    Query(q): Query<AccessQuery>,
) -> Reply {
    authorize(&state, &q, Scope::Write)?;
    let mut store = state.store.write().await;
    store.project(id)?;
    store.projects.remove(&id);
    store.access_tokens.remove(&id);
    store.team_projects.retain(|&(_, project)| project != id);
    ok(json!({}))
}

async fn list_access_tokens(
    State(state): State<AppState>,
    Ids(id): Ids<u64>,
    Query(q): Query<AccessQuery>,
) -> Reply {
    authorize(&state, &q, Scope::Read)?;
    let store = state.store.read().await;
    store.project(id)?;
    ok(store.access_tokens.get(&id).cloned().unwrap_or_default())
}

async fn update_rate_limit(
    State(state): State<AppState>,
    Ids((id, token)): Ids<(u64, String)>,
    Query(q): Query<AccessQuery>,
    body: String,
) -> Reply {
    authorize(&state, &q, Scope::Write)?;
    let input: UpdateRateLimit = parse(&body)?;
    let mut store = state.store.write().await;
    store.project(id)?;
    let entry = store
        .access_tokens
        .get_mut(&id)
        .and_then(|tokens| tokens.iter_mut().find(|t| t.access_token == token))
        .ok_or_else(|| Failure::not_found("Access token not found"))?;
    if let Some(count) = input.rate_limit_window_count {
        entry.rate_limit_window_count = Some(count);
    }
    if let Some(size) = input.rate_limit_window_size {
        entry.rate_limit_window_size = Some(size);
    }
    ok(entry.clone())
}

// --- teams ---

async fn list_teams(State(state): State<AppState>, Query(q): Query<AccessQuery>) -> Reply {
    authorize(&state, &q, Scope::Read)?;
    let store = state.store.read().await;
    ok(store.teams.values().collect::<Vec<_>>())
}

async fn create_team(State(state): State<AppState>, Query(q): Query<AccessQuery>, body: String) -> Reply {
    authorize(&state, &q, Scope::Write)?;
    let input: CreateTeam = parse(&body)?;
    if !matches!(input.access_level.as_str(), "standard" | "light" | "view") {
        return Err(Failure::invalid("Invalid access level"));
    }
    let mut store = state.store.write().await;
    let team = Team {
        id: store.next_id(),
        account_id: ACCOUNT_ID,
        name: input.name,
        access_level: input.access_level,
    };
    store.teams.insert(team.id, team.clone());
    ok(team)
}

async fn get_team(State(state): State<AppState>, Ids(id): Ids<u64>, Query(q): Query<AccessQuery>) -> Reply {
    authorize(&state, &q, Scope::Read)?;
    let store = state.store.read().await;
    ok(store.team(id)?)
}

async fn delete_team(State(state): State<AppState>, Ids(id): Ids<u64>, Query(q): Query<AccessQuery>) -> Reply {
    authorize(&state, &q, Scope::Write)?;
    let mut store = state.store.write().await;
    store.team(id)?;
    store.teams.remove(&id);
    store.team_projects.retain(|&(team, _)| team != id);
    store.team_users.retain(|&(team, _)| team != id);
    store.invites.retain(|_, invite| invite.team_id != id);
    ok(json!({}))
}

async fn team_has_project(
    State(state): State<AppState>,
    Ids((team, project)): Ids<(u64, u64)>,
    Query(q): Query<AccessQuery>,
) -> Reply {
    authorize(&state, &q, Scope::Read)?;
    let store = state.store.read().await;
    if !store.team_projects.contains(&(team, project)) {
        return Err(Failure::not_found("Project is not in team"));
    }
    ok(json!({"team_id": team, "project_id": project}))
}

async fn add_team_project(
    State(state): State<AppState>,
    Ids((team, project)): Ids<(u64, u64)>,
    Query(q): Query<AccessQuery>,
) -> Reply {
    authorize(&state, &q, Scope::Write)?;
    let mut store = state.store.write().await;
    store.team(team)?;
    store.project(project)?;
    store.team_projects.insert((team, project));
    ok(json!({"team_id": team, "project_id": project}))
}

async fn remove_team_project(
    State(state): State<AppState>,
    Ids((team, project)): Ids<(u64, u64)>,
    Query(q): Query<AccessQuery>,
) -> Reply {
    authorize(&state, &q, Scope::Write)?;
    let mut store = state.store.write().await;
    if !store.team_projects.remove(&(team, project)) {
        return Err(Failure::not_found("Project is not in team"));
    }
    ok(json!({}))
}

async fn list_team_members(
    State(state): State<AppState>,
    Ids(team): Ids<u64>,
    Query(q): Query<AccessQuery>,
) -> Reply {
    authorize(&state, &q, Scope::Read)?;
    let store = state.store.read().await;
    store.team(team)?;
    let members: Vec<_> = store
        .team_users
        .iter()
        .filter(|&&(t, _)| t == team)
        .filter_map(|(_, user)| store.users.get(user))
        .collect();
    ok(members)
}

async fn team_has_user(
    State(state): State<AppState>,
    Ids((team, user)): Ids<(u64, u64)>,
    Query(q): Query<AccessQuery>,
) -> Reply {
    authorize(&state, &q, Scope::Read)?;
    let store = state.store.read().await;
    if !store.team_users.contains(&(team, user)) {
        return Err(Failure::not_found("User is not a member of team"));
    }
    ok(json!({"team_id": team, "user_id": user}))
}

async fn add_team_user(
    State(state): State<AppState>,
    Ids((team, user)): Ids<(u64, u64)>,
    Query(q): Query<AccessQuery>,
) -> Reply {
    authorize(&state, &q, Scope::Write)?;
    let mut store = state.store.write().await;
    store.team(team)?;
    store.user(user)?;
    store.team_users.insert((team, user));
    ok(json!({"team_id": team, "user_id": user}))
}

async fn remove_team_user(
    State(state): State<AppState>,
    Ids((team, user)): Ids<(u64, u64)>,
    Query(q): Query<AccessQuery>,
) -> Reply {
    authorize(&state, &q, Scope::Write)?;
    let mut store = state.store.write().await;
    if !store.team_users.remove(&(team, user)) {
        return Err(Failure::not_found("User is not a member of team"));
    }
    ok(json!({}))
}

// --- invites ---

async fn list_invites(State(state): State<AppState>, Ids(team): Ids<u64>, Query(q): Query<AccessQuery>) -> Reply {
    authorize(&state, &q, Scope::Read)?;
    let store = state.store.read().await;
    store.team(team)?;
    ok(store.invites.values().filter(|i| i.team_id == team).collect::<Vec<_>>())
}

async fn create_invite(
    State(state): State<AppState>,
    Ids(team): Ids<u64>,
    Query(q): Query<AccessQuery>,
    body: String,
) -> Reply {
    authorize(&state, &q, Scope::Write)?;
    let input: CreateInvite = parse(&body)?;
    if !input.email.contains('@') {
        return Err(Failure::invalid("Invalid email address"));
    }
    let mut store = state.store.write().await;
    store.team(team)?;
    let invite = Invite {
        id: store.next_id(),
        team_id: team,
        from_user_id: OWNER_ID,
        to_email: input.email,
        status: "pending".to_string(),
    };
    store.invites.insert(invite.id, invite.clone());
    ok(invite)
}

async fn get_invite(State(state): State<AppState>, Ids(id): Ids<u64>, Query(q): Query<AccessQuery>) -> Reply {
    authorize(&state, &q, Scope::Read)?;
    let store = state.store.read().await;
    let invite = store
        .invites
        .get(&id)
        .ok_or_else(|| Failure::not_found("Invite not found"))?;
    ok(invite)
}

async fn cancel_invite(State(state): State<AppState>, Ids(id): Ids<u64>, Query(q): Query<AccessQuery>) -> Reply {
    authorize(&state, &q, Scope::Write)?;
    let mut store = state.store.write().await;
    let invite = store
        .invites
        .get_mut(&id)
        .ok_or_else(|| Failure::not_found("Invite not found"))?;
    if invite.status != "pending" {
        return Err(Failure::invalid("Invite is not pending"));
    }
    invite.status = "canceled".to_string();
    ok(json!({}))
}

// --- users ---

async fn list_users(State(state): State<AppState>, Query(q): Query<AccessQuery>) -> Reply {
    authorize(&state, &q, Scope::Read)?;
    let store = state.store.read().await;
    ok(store.users.values().collect::<Vec<_>>())
}

async fn get_user(State(state): State<AppState>, Ids(id): Ids<u64>, Query(q): Query<AccessQuery>) -> Reply {
    authorize(&state, &q, Scope::Read)?;
    let store = state.store.read().await;
    ok(store.user(id)?)
}
