//! Axum-based HTTP server for the notes API.
//!
//! Surface:
//! - Public: the web client at `/`, `/health`, `/signup`, `/login`
//! - Bearer-protected (single guard, see [`crate::auth::require_auth`]):
//!   `/me`, `/account`, `/notes` CRUD, `/notes/{id}/pin`, `/notes/{id}/archive`
//!
//! Body limits and request timeouts are applied router-wide; every error
//! leaves as a `{"error": "..."}` JSON body via [`crate::error::JotterError`].

pub mod ui;

use anyhow::Context;
use axum::{
    extract::rejection::JsonRejection,
    extract::{Extension, Path, State},
    http::{header, StatusCode},
    response::Json,
    routing::{delete, get, patch, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::auth::{require_auth, AuthUser, TokenSigner};
use crate::config::Config;
use crate::db::{Note, NoteStatus, Store, User};
use crate::error::{JotterError, Result};

/// Maximum request body size (64KB) — prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout — notes round-trips are store-bound and fast
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub tokens: TokenSigner,
}

/// Uniform shape for message-style responses.
type ApiResponse = (StatusCode, Json<serde_json::Value>);

/// Build the full application router over the given state.
pub fn router(state: AppState) -> Router {
    // ── CORS — allow browser clients to connect from any origin ──
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let protected = Router::new()
        .route("/me", get(handle_me))
        .route("/account", delete(handle_delete_account))
        .route("/notes", get(handle_list_notes))
        .route("/notes", post(handle_create_note))
        .route("/notes/{id}", get(handle_get_note))
        .route("/notes/{id}", put(handle_update_note))
        .route("/notes/{id}", delete(handle_delete_note))
        .route("/notes/{id}/pin", patch(handle_pin_note))
        .route("/notes/{id}/archive", patch(handle_archive_note))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .route("/", get(ui::handle_index))
        .route("/health", get(handle_health))
        .route("/signup", post(handle_signup))
        .route("/login", post(handle_login))
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

/// Open the store, bind, and serve until interrupted.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let secret = config.token_secret()?;

    let db_path = config.database_path()?;
    let store = Store::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    tracing::info!(db = %db_path.display(), "Store initialized");

    let state = AppState {
        store,
        tokens: TokenSigner::new(&secret, config.token_ttl_secs()),
    };

    let host = &config.server.host;
    if host == "0.0.0.0" {
        tracing::warn!("Binding to all interfaces — server is reachable from the network");
    }

    let addr: SocketAddr = format!("{host}:{}", config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_port = listener.local_addr()?.port();

    println!("🦀 Jotter listening on http://{host}:{actual_port}");
    println!("  GET    /            — web client");
    println!("  POST   /signup      — create an account");
    println!("  POST   /login       — exchange credentials for a bearer token");
    println!("  GET    /notes       — list notes (bearer token required)");
    println!("  POST   /notes       — create a note");
    println!("  PUT    /notes/{{id}}  — edit a note");
    println!("  PATCH  /notes/{{id}}/pin, /notes/{{id}}/archive");
    println!("  GET    /health      — health check");
    println!("  Press Ctrl+C to stop.\n");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// AXUM HANDLERS
// ══════════════════════════════════════════════════════════════════════════════

/// Request body for signup.
#[derive(Deserialize)]
struct SignupBody {
    name: String,
    email: String,
    password: String,
}

/// Request body for login.
#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

/// Request body for note creation.
#[derive(Deserialize)]
struct CreateNoteBody {
    title: String,
    content: String,
    category: Option<String>,
}

/// Request body for a full note update. `status` lets a client move a
/// note back to `active` without a dedicated endpoint.
#[derive(Deserialize)]
struct UpdateNoteBody {
    title: String,
    content: String,
    category: String,
    status: Option<NoteStatus>,
}

/// Map a malformed/missing JSON body to a 400 instead of axum's default 422.
fn parse_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match body {
        Ok(Json(b)) => Ok(b),
        Err(e) => Err(JotterError::Validation(format!("Invalid request: {e}"))),
    }
}

/// GET /health — always public
async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /signup — create a new user account.
async fn handle_signup(
    State(state): State<AppState>,
    body: std::result::Result<Json<SignupBody>, JsonRejection>,
) -> Result<ApiResponse> {
    let body = parse_body(body)?;
    let user = state
        .store
        .create_user(&body.name, &body.email, &body.password)?;
    tracing::info!(user_id = %user.id, "New user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user_id": user.id,
        })),
    ))
}

/// POST /login — exchange credentials for a signed bearer token.
async fn handle_login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginBody>, JsonRejection>,
) -> Result<ApiResponse> {
    let body = parse_body(body)?;
    let user = state
        .store
        .authenticate_user(&body.email, &body.password)?;
    let token = state.tokens.issue(&user.id);
    tracing::info!(user_id = %user.id, "User logged in");

    Ok((
        StatusCode::OK,
        Json(json!({
            "token": token,
            "user_id": user.id,
            "name": user.name,
        })),
    ))
}

/// GET /me — profile of the authenticated user.
async fn handle_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<User>> {
    let user = state
        .store
        .user_by_id(&auth.user_id)?
        .ok_or(JotterError::NotFound("User"))?;
    Ok(Json(user))
}

/// DELETE /account — remove the authenticated user; notes cascade.
async fn handle_delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<ApiResponse> {
    if state.store.delete_user(&auth.user_id)? {
        tracing::info!(user_id = %auth.user_id, "Account deleted");
    }
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Account deleted successfully" })),
    ))
}

/// GET /notes — all notes owned by the caller.
async fn handle_list_notes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<Note>>> {
    Ok(Json(state.store.list_notes(&auth.user_id)?))
}

/// GET /notes/{id}
async fn handle_get_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Note>> {
    let note = state
        .store
        .get_note(&auth.user_id, id)?
        .ok_or(JotterError::NotFound("Note"))?;
    Ok(Json(note))
}

/// POST /notes — create a note; category defaults to "Personal".
async fn handle_create_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    body: std::result::Result<Json<CreateNoteBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>)> {
    let body = parse_body(body)?;
    let note = state.store.create_note(
        &auth.user_id,
        &body.title,
        &body.content,
        body.category.as_deref(),
    )?;
    tracing::debug!(user_id = %auth.user_id, note_id = note.id, "Note created");
    Ok((StatusCode::CREATED, Json(note)))
}

/// PUT /notes/{id} — full update; 404 when no owned note matches.
async fn handle_update_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    body: std::result::Result<Json<UpdateNoteBody>, JsonRejection>,
) -> Result<Json<Note>> {
    let body = parse_body(body)?;
    let note = state
        .store
        .update_note(
            &auth.user_id,
            id,
            &body.title,
            &body.content,
            &body.category,
            body.status,
        )?
        .ok_or(JotterError::NotFound("Note"))?;
    Ok(Json(note))
}

/// DELETE /notes/{id} — confirmation either way; deleting an absent
/// note is a no-op, not an error.
async fn handle_delete_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<ApiResponse> {
    if state.store.delete_note(&auth.user_id, id)? {
        tracing::debug!(user_id = %auth.user_id, note_id = id, "Note deleted");
    }
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Note deleted successfully" })),
    ))
}

/// PATCH /notes/{id}/pin
async fn handle_pin_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<ApiResponse> {
    if !state
        .store
        .set_note_status(&auth.user_id, id, NoteStatus::Pinned)?
    {
        return Err(JotterError::NotFound("Note"));
    }
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Note pinned successfully" })),
    ))
}

/// PATCH /notes/{id}/archive
async fn handle_archive_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<ApiResponse> {
    if !state
        .store
        .set_note_status(&auth.user_id, id, NoteStatus::Archived)?
    {
        return Err(JotterError::NotFound("Note"));
    }
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Note archived successfully" })),
    ))
}
