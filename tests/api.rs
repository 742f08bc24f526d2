//! End-to-end API tests: a real server on a loopback port, a real SQLite
//! file in a temp directory, requests through reqwest.

use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use jotter::auth::{TokenSigner, DEFAULT_TOKEN_TTL_SECS};
use jotter::db::Store;
use jotter::server::{router, AppState};

struct TestApp {
    base: String,
    client: Client,
    tokens: TokenSigner,
    _tmp: TempDir,
}

async fn spawn_app() -> TestApp {
    let tmp = TempDir::new().unwrap();
    let store = Store::open(&tmp.path().join("jotter.db")).unwrap();
    let tokens = TokenSigner::new("integration-test-secret", DEFAULT_TOKEN_TTL_SECS);
    let state = AppState {
        store,
        tokens: tokens.clone(),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    TestApp {
        base: format!("http://127.0.0.1:{port}"),
        client: Client::new(),
        tokens,
        _tmp: tmp,
    }
}

impl TestApp {
    async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> reqwest::Response {
        let mut req = self.client.request(method, format!("{}{path}", self.base));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        req.send().await.unwrap()
    }

    async fn signup(&self, name: &str, email: &str, password: &str) -> reqwest::Response {
        self.request(
            Method::POST,
            "/signup",
            None,
            Some(&json!({ "name": name, "email": email, "password": password })),
        )
        .await
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.request(
            Method::POST,
            "/login",
            None,
            Some(&json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Signup + login, returning (token, user_id).
    async fn register(&self, name: &str, email: &str) -> (String, String) {
        let res = self.signup(name, email, "secret-pw").await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = self.login(email, "secret-pw").await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        (
            body["token"].as_str().unwrap().to_string(),
            body["user_id"].as_str().unwrap().to_string(),
        )
    }

    async fn create_note(&self, token: &str, body: Value) -> reqwest::Response {
        self.request(Method::POST, "/notes", Some(token), Some(&body))
            .await
    }

    async fn list_notes(&self, token: &str) -> Vec<Value> {
        let res = self.request(Method::GET, "/notes", Some(token), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }
}

async fn error_of(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let app = spawn_app().await;

    let res = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_index_serves_web_client() {
    let app = spawn_app().await;

    let res = app.request(Method::GET, "/", None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let content_type = res.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let body = res.text().await.unwrap();
    assert!(body.contains("Jotter"));
}

#[tokio::test]
async fn test_signup_and_login_flow() {
    let app = spawn_app().await;

    // Signup
    let res = app.signup("Ada", "ada@example.com", "hunter2").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User registered successfully");
    assert!(body["user_id"].as_str().is_some());

    // Login
    let res = app.login("ada@example.com", "hunter2").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap();
    assert_eq!(body["name"], "Ada");

    // The token opens the protected surface
    let notes = app.list_notes(token).await;
    assert!(notes.is_empty());
}

#[tokio::test]
async fn test_signup_rejects_duplicate_email() {
    let app = spawn_app().await;

    let res = app.signup("Ada", "ada@example.com", "pw-one").await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app.signup("Eve", "ada@example.com", "pw-two").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(res).await, "Email is already registered");

    // Emails are normalized, so a case variant is still a duplicate
    let res = app.signup("Eve", "ADA@Example.com", "pw-two").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_validation_persists_nothing() {
    let app = spawn_app().await;

    // Blank fields
    let res = app.signup("", "", "").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(res).await, "Name, email and password are required");

    // Malformed email
    let res = app.signup("Ada", "not-an-email", "pw").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(res).await, "Invalid email address");

    // Missing field entirely
    let res = app
        .request(
            Method::POST,
            "/signup",
            None,
            Some(&json!({ "email": "ada@example.com", "password": "pw" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // None of the attempts created an account
    let res = app.login("not-an-email", "pw").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = spawn_app().await;
    app.register("Ada", "ada@example.com").await;

    // Wrong password and unknown email produce the same response
    let res = app.login("ada@example.com", "wrong").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(res).await, "Invalid email or password");

    let res = app.login("nobody@example.com", "wrong").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(res).await, "Invalid email or password");
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let app = spawn_app().await;

    for (method, path) in [
        (Method::GET, "/notes"),
        (Method::POST, "/notes"),
        (Method::GET, "/notes/1"),
        (Method::PUT, "/notes/1"),
        (Method::DELETE, "/notes/1"),
        (Method::PATCH, "/notes/1/pin"),
        (Method::PATCH, "/notes/1/archive"),
        (Method::GET, "/me"),
        (Method::DELETE, "/account"),
    ] {
        let res = app.request(method.clone(), path, None, None).await;
        assert_eq!(
            res.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {path} without a token"
        );
        assert_eq!(error_of(res).await, "Token not provided");
    }
}

#[tokio::test]
async fn test_invalid_token_is_403() {
    let app = spawn_app().await;
    let (token, _) = app.register("Ada", "ada@example.com").await;

    // Flip the first character of the signed token
    let mut tampered = token.clone();
    let first = if tampered.starts_with('A') { "B" } else { "A" };
    tampered.replace_range(0..1, first);

    let res = app
        .request(Method::GET, "/notes", Some(&tampered), None)
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_of(res).await, "Invalid token");

    // Garbage is rejected the same way
    let res = app
        .request(Method::GET, "/notes", Some("not-a-token"), None)
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_expired_token_is_403() {
    let app = spawn_app().await;
    let (_, user_id) = app.register("Ada", "ada@example.com").await;

    // Correctly signed, expired long ago
    let expired = app.tokens.issue_with_expiry(&user_id, 1);
    let res = app
        .request(Method::GET, "/notes", Some(&expired), None)
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_of(res).await, "Token has expired");
}

#[tokio::test]
async fn test_note_lifecycle() {
    let app = spawn_app().await;
    let (token, _) = app.register("Ada", "ada@example.com").await;

    // Create with defaults
    let res = app
        .create_note(&token, json!({ "title": "T", "content": "C" }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let note: Value = res.json().await.unwrap();
    let id = note["id"].as_i64().unwrap();
    assert_eq!(note["category"], "Personal");
    assert_eq!(note["status"], "active");

    // Fetch it back
    let res = app
        .request(Method::GET, &format!("/notes/{id}"), Some(&token), None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched["title"], "T");
    assert_eq!(fetched["content"], "C");

    // Pin: status flips, category stays at its default
    let res = app
        .request(Method::PATCH, &format!("/notes/{id}/pin"), Some(&token), None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Note pinned successfully");

    let notes = app.list_notes(&token).await;
    assert_eq!(notes[0]["status"], "pinned");
    assert_eq!(notes[0]["category"], "Personal");

    // Full update without a status keeps the note pinned
    let res = app
        .request(
            Method::PUT,
            &format!("/notes/{id}"),
            Some(&token),
            Some(&json!({ "title": "T2", "content": "C2", "category": "Work" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["title"], "T2");
    assert_eq!(updated["category"], "Work");
    assert_eq!(updated["status"], "pinned");
    assert!(updated["updated_at"].as_str().unwrap() >= updated["created_at"].as_str().unwrap());

    // Restore to active through a full update
    let res = app
        .request(
            Method::PUT,
            &format!("/notes/{id}"),
            Some(&token),
            Some(&json!({
                "title": "T2", "content": "C2", "category": "Work", "status": "active"
            })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let restored: Value = res.json().await.unwrap();
    assert_eq!(restored["status"], "active");

    // Archive
    let res = app
        .request(
            Method::PATCH,
            &format!("/notes/{id}/archive"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    // Delete, then the note is gone
    let res = app
        .request(Method::DELETE, &format!("/notes/{id}"), Some(&token), None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Note deleted successfully");

    let res = app
        .request(Method::GET, &format!("/notes/{id}"), Some(&token), None)
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(res).await, "Note not found");

    // Deleting again is still a confirmation
    let res = app
        .request(Method::DELETE, &format!("/notes/{id}"), Some(&token), None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_note_validation_persists_nothing() {
    let app = spawn_app().await;
    let (token, _) = app.register("Ada", "ada@example.com").await;

    let res = app
        .create_note(&token, json!({ "title": "", "content": "" }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(res).await, "Title and content are required");

    let res = app
        .create_note(&token, json!({ "title": "only a title" }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert!(app.list_notes(&token).await.is_empty());
}

#[tokio::test]
async fn test_custom_category_is_kept() {
    let app = spawn_app().await;
    let (token, _) = app.register("Ada", "ada@example.com").await;

    let res = app
        .create_note(
            &token,
            json!({ "title": "T", "content": "C", "category": "Study" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let note: Value = res.json().await.unwrap();
    assert_eq!(note["category"], "Study");
}

#[tokio::test]
async fn test_update_absent_note_is_404() {
    let app = spawn_app().await;
    let (token, _) = app.register("Ada", "ada@example.com").await;

    let res = app
        .request(
            Method::PUT,
            "/notes/9999",
            Some(&token),
            Some(&json!({ "title": "T", "content": "C", "category": "Personal" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(res).await, "Note not found");
}

#[tokio::test]
async fn test_pin_is_idempotent() {
    let app = spawn_app().await;
    let (token, _) = app.register("Ada", "ada@example.com").await;

    let res = app
        .create_note(
            &token,
            json!({ "title": "T", "content": "C", "category": "Work" }),
        )
        .await;
    let note: Value = res.json().await.unwrap();
    let id = note["id"].as_i64().unwrap();

    for _ in 0..2 {
        let res = app
            .request(Method::PATCH, &format!("/notes/{id}/pin"), Some(&token), None)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let notes = app.list_notes(&token).await;
    assert_eq!(notes[0]["status"], "pinned");
    assert_eq!(notes[0]["category"], "Work");
}

#[tokio::test]
async fn test_cross_user_isolation() {
    let app = spawn_app().await;
    let (ada, _) = app.register("Ada", "ada@example.com").await;
    let (eve, _) = app.register("Eve", "eve@example.com").await;

    let res = app
        .create_note(&ada, json!({ "title": "Ada's", "content": "private" }))
        .await;
    let note: Value = res.json().await.unwrap();
    let id = note["id"].as_i64().unwrap();

    // Eve cannot see, edit, pin, or fetch it
    assert!(app.list_notes(&eve).await.is_empty());

    let res = app
        .request(Method::GET, &format!("/notes/{id}"), Some(&eve), None)
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .request(
            Method::PUT,
            &format!("/notes/{id}"),
            Some(&eve),
            Some(&json!({ "title": "hijack", "content": "x", "category": "Other" })),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app
        .request(Method::PATCH, &format!("/notes/{id}/pin"), Some(&eve), None)
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Eve's delete is a no-op and Ada's note survives untouched
    let res = app
        .request(Method::DELETE, &format!("/notes/{id}"), Some(&eve), None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let notes = app.list_notes(&ada).await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["title"], "Ada's");
}

#[tokio::test]
async fn test_me_returns_profile_without_secrets() {
    let app = spawn_app().await;
    let (token, user_id) = app.register("Ada", "ada@example.com").await;

    let res = app.request(Method::GET, "/me", Some(&token), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], user_id.as_str());
    assert_eq!(body["name"], "Ada");
    assert_eq!(body["email"], "ada@example.com");
    assert!(body.get("password_hash").is_none());
    assert!(body.get("salt").is_none());
}

#[tokio::test]
async fn test_delete_account_cascades() {
    let app = spawn_app().await;
    let (token, _) = app.register("Ada", "ada@example.com").await;

    for i in 0..3 {
        let res = app
            .create_note(&token, json!({ "title": format!("n{i}"), "content": "c" }))
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = app
        .request(Method::DELETE, "/account", Some(&token), None)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Account deleted successfully");

    // Credentials are gone
    let res = app.login("ada@example.com", "secret-pw").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // The old token still verifies cryptographically, but the data is gone
    let res = app.request(Method::GET, "/me", Some(&token), None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(app.list_notes(&token).await.is_empty());

    // Creating through the stale token is a clean 404, not a server error
    let res = app
        .create_note(&token, json!({ "title": "T", "content": "C" }))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_of(res).await, "User not found");

    // The email is free again
    let res = app.signup("Ada II", "ada@example.com", "new-pw").await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = spawn_app().await;
    let (token, _) = app.register("Ada", "ada@example.com").await;

    let huge = "x".repeat(70_000);
    let res = app
        .create_note(&token, json!({ "title": "T", "content": huge }))
        .await;
    assert!(res.status().is_client_error());
    assert!(app.list_notes(&token).await.is_empty());
}

#[tokio::test]
async fn test_cors_preflight_allows_browser_clients() {
    let app = spawn_app().await;

    let res = app
        .client
        .request(Method::OPTIONS, format!("{}/notes", app.base))
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "authorization")
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
}
