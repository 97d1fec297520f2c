//! Integration tests — ephemeral PostgreSQL, the real router, and a
//! scripted language model.
//!
//! Tests skip (with a note on stderr) when no PostgreSQL installation is
//! found on PATH.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use lingua_api::{AppState, config::ApiConfig};
use lingua_core::db::{DbError, EphemeralPostgres};
use lingua_core::llm::{LanguageModel, LlmError};
use lingua_core::prompt::Persona;

/// Model whose next reply is set by the test.
struct ScriptedModel {
    reply: Mutex<String>,
}

impl ScriptedModel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(String::new()),
        })
    }

    fn set_reply(&self, raw: &str) {
        *self.reply.lock().unwrap() = raw.to_string();
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, _system_prompt: &str, _user_text: &str) -> Result<String, LlmError> {
        Ok(self.reply.lock().unwrap().clone())
    }
}

struct TestApp {
    app: Router,
    model: Arc<ScriptedModel>,
    // Keeps the database alive for the duration of the test.
    _db: EphemeralPostgres,
}

impl TestApp {
    /// Spawn an ephemeral database and build the router. `None` means
    /// PostgreSQL is unavailable and the test should be skipped.
    async fn spawn() -> Option<Self> {
        let db = match EphemeralPostgres::start().await {
            Ok(db) => db,
            Err(DbError::PgConfigNotFound) => {
                eprintln!("skipping: PostgreSQL not found on PATH");
                return None;
            }
            Err(e) => panic!("ephemeral PostgreSQL failed: {e}"),
        };

        let pool = sqlx::PgPool::connect(&db.connection_url())
            .await
            .expect("connect to ephemeral PG");
        lingua_api::migrate(&pool).await.expect("migrations");

        let model = ScriptedModel::new();
        let state = AppState {
            pool,
            config: ApiConfig {
                bind_addr: "127.0.0.1:0".into(),
                pg_connection_url: db.connection_url(),
                jwt_secret: "test-secret".into(),
                openai_api_key: "unused".into(),
                openai_base_url: None,
                chat_model: None,
                persona: Persona::Tutor,
            },
            llm: model.clone(),
        };

        Some(Self {
            app: lingua_api::router(state),
            model,
            _db: db,
        })
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        cookie: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, Option<String>, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.app.clone().oneshot(req).await.expect("request");
        let status = resp.status();
        let set_cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.to_string());
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse JSON body")
        };
        (status, set_cookie, json)
    }

    /// Register a user and return their session cookie.
    async fn register(&self, email: &str) -> String {
        let (status, cookie, _) = self
            .request(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": "a strong password",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        cookie.expect("session cookie")
    }

    async fn create_conversation(&self, cookie: &str, native: &str, target: &str) -> String {
        let (status, _, json) = self
            .request(
                "POST",
                "/api/conversations",
                Some(cookie),
                Some(serde_json::json!({
                    "title": format!("Learning {target}"),
                    "nativeLanguage": native,
                    "targetLanguage": target,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        json["id"].as_str().expect("conversation id").to_string()
    }
}

#[tokio::test]
async fn conversation_crud_roundtrip() {
    let Some(t) = TestApp::spawn().await else {
        return;
    };
    let cookie = t.register("crud@example.com").await;

    // Create echoes the submitted values.
    let (status, _, created) = t
        .request(
            "POST",
            "/api/conversations",
            Some(&cookie),
            Some(serde_json::json!({
                "title": "Trip prep",
                "nativeLanguage": "English",
                "targetLanguage": "Spanish",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Trip prep");
    assert_eq!(created["nativeLanguage"], "English");
    assert_eq!(created["targetLanguage"], "Spanish");
    let id = created["id"].as_str().unwrap().to_string();

    // Fetch returns the same values plus an empty message list.
    let (status, _, fetched) = t
        .request("GET", &format!("/api/conversations/{id}"), Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["conversation"]["title"], "Trip prep");
    assert_eq!(fetched["conversation"]["nativeLanguage"], "English");
    assert_eq!(fetched["conversation"]["targetLanguage"], "Spanish");
    assert_eq!(fetched["messages"].as_array().unwrap().len(), 0);

    // List contains it.
    let (status, _, list) = t
        .request("GET", "/api/conversations", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Validation failure on empty title.
    let (status, _, _) = t
        .request(
            "POST",
            "/api/conversations",
            Some(&cookie),
            Some(serde_json::json!({
                "title": "  ",
                "nativeLanguage": "English",
                "targetLanguage": "Spanish",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Delete, then the conversation is gone.
    let (status, _, _) = t
        .request(
            "DELETE",
            &format!("/api/conversations/{id}"),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = t
        .request("GET", &format!("/api/conversations/{id}"), Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn message_turn_persists_pair_and_transliteration() {
    let Some(t) = TestApp::spawn().await else {
        return;
    };
    let cookie = t.register("turns@example.com").await;
    let id = t.create_conversation(&cookie, "English", "Spanish").await;
    let messages_path = format!("/api/conversations/{id}/messages");

    t.model.set_reply(
        r#"{"userTarget":"Hola","aiTarget":"¡Hola! ¿Qué tal?","aiNative":"Hi! How's it going?"}"#,
    );
    let (status, _, pair) = t
        .request(
            "POST",
            &messages_path,
            Some(&cookie),
            Some(serde_json::json!({ "content": "Hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let pair = pair.as_array().unwrap();
    assert_eq!(pair.len(), 2);
    assert_eq!(pair[0]["role"], "user");
    assert_eq!(pair[0]["nativeContent"], "Hi");
    assert_eq!(pair[0]["targetContent"], "Hola");
    assert_eq!(pair[1]["role"], "assistant");
    assert_eq!(pair[1]["nativeContent"], "Hi! How's it going?");
    assert_eq!(pair[1]["targetContent"], "¡Hola! ¿Qué tal?");

    // A supplied transliteration is appended to the assistant target text.
    t.model.set_reply(
        r#"{"userTarget":"Hola","aiTarget":"¡Hola! ¿Qué tal?","aiTransliteration":"Hola, ke tal","aiNative":"Hi! How's it going?"}"#,
    );
    let (status, _, pair) = t
        .request(
            "POST",
            &messages_path,
            Some(&cookie),
            Some(serde_json::json!({ "content": "Hi again" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        pair[1]["targetContent"],
        "¡Hola! ¿Qué tal?\n(Hola, ke tal)"
    );

    // A reply missing aiTarget is an internal error and persists nothing.
    t.model
        .set_reply(r#"{"userTarget":"Hola","aiNative":"Hi"}"#);
    let (status, _, _) = t
        .request(
            "POST",
            &messages_path,
            Some(&cookie),
            Some(serde_json::json!({ "content": "third" })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // Empty content is a validation error before any model call.
    let (status, _, _) = t
        .request(
            "POST",
            &messages_path,
            Some(&cookie),
            Some(serde_json::json!({ "content": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A wrong-typed body also gets a 400 with a JSON message body.
    let (status, _, body) = t
        .request(
            "POST",
            &messages_path,
            Some(&cookie),
            Some(serde_json::json!({ "content": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    // Still exactly the two successful turns, in creation order.
    let (_, _, fetched) = t
        .request("GET", &format!("/api/conversations/{id}"), Some(&cookie), None)
        .await;
    let messages = fetched["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[2]["nativeContent"], "Hi again");

    // Deleting the conversation takes its messages with it.
    let (status, _, _) = t
        .request(
            "DELETE",
            &format!("/api/conversations/{id}"),
            Some(&cookie),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = t
        .request("GET", &format!("/api/conversations/{id}"), Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ownership_and_auth_are_enforced() {
    let Some(t) = TestApp::spawn().await else {
        return;
    };
    let owner = t.register("owner@example.com").await;
    let other = t.register("other@example.com").await;
    let id = t.create_conversation(&owner, "English", "Japanese").await;
    let messages_path = format!("/api/conversations/{id}/messages");

    t.model.set_reply(
        r#"{"userTarget":"x","aiTarget":"y","aiNative":"z"}"#,
    );

    // No session at all.
    let (status, _, _) = t
        .request(
            "POST",
            &messages_path,
            None,
            Some(serde_json::json!({ "content": "Hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Someone else's session: rejected, nothing persisted.
    let (status, _, _) = t
        .request(
            "POST",
            &messages_path,
            Some(&other),
            Some(serde_json::json!({ "content": "Hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, _, fetched) = t
        .request("GET", &format!("/api/conversations/{id}"), Some(&owner), None)
        .await;
    assert_eq!(fetched["messages"].as_array().unwrap().len(), 0);

    // The other user's listing does not leak the conversation.
    let (_, _, list) = t
        .request("GET", "/api/conversations", Some(&other), None)
        .await;
    assert_eq!(list.as_array().unwrap().len(), 0);

    // Nonexistent conversation is Not-Found even for a valid session.
    let missing = uuid::Uuid::now_v7();
    let (status, _, _) = t
        .request(
            "POST",
            &format!("/api/conversations/{missing}/messages"),
            Some(&owner),
            Some(serde_json::json!({ "content": "Hi" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Wrong password logs nobody in.
    let (status, cookie, _) = t
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(serde_json::json!({
                "email": "owner@example.com",
                "password": "not the password",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());
}
