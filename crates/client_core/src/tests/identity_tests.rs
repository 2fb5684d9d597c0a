use super::*;
use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    Json, Router,
};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct MockState {
    verified: Arc<Mutex<bool>>,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn handle(
    State(state): State<MockState>,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().to_string();
    state.requests.lock().await.push((path.clone(), body.clone()));

    if query.get("key").map(String::as_str) != Some("test-key") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"message": "API_KEY_INVALID"}})),
        );
    }

    match path.as_str() {
        "/v1/accounts:signUp" => (
            StatusCode::OK,
            Json(json!({
                "localId": "uid-new",
                "idToken": "signup-token",
                "refreshToken": "refresh-1",
                "email": body["email"],
            })),
        ),
        "/v1/accounts:signInWithPassword" => {
            if body["password"] == "correct" {
                (
                    StatusCode::OK,
                    Json(json!({"localId": "uid-1", "idToken": "login-token"})),
                )
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": {"message": "INVALID_LOGIN_CREDENTIALS"}})),
                )
            }
        }
        "/v1/accounts:sendOobCode" => (StatusCode::OK, Json(json!({"email": "a@b.c"}))),
        "/v1/accounts:lookup" => {
            let verified = *state.verified.lock().await;
            (
                StatusCode::OK,
                Json(json!({"users": [{"localId": "uid-1", "emailVerified": verified}]})),
            )
        }
        "/token" => (
            StatusCode::OK,
            Json(json!({"id_token": "refreshed-token", "user_id": "uid-new"})),
        ),
        _ => (StatusCode::NOT_FOUND, Json(json!({}))),
    }
}

async fn spawn_mock() -> (String, MockState) {
    let state = MockState::default();
    let app = Router::new().fallback(handle).with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}"), state)
}

fn provider(base: &str, key: &str) -> RestIdentityProvider {
    RestIdentityProvider::new(&format!("{base}/v1"), &format!("{base}/token"), key)
        .expect("provider")
}

#[tokio::test]
async fn authenticate_reports_verification_from_lookup() {
    let (base, state) = spawn_mock().await;
    *state.verified.lock().await = true;

    let identity = provider(&base, "test-key")
        .authenticate("a@b.c", "correct")
        .await
        .expect("login");
    assert_eq!(
        identity,
        AuthenticatedIdentity {
            identity_id: "uid-1".into(),
            token: "login-token".into(),
            email_verified: true,
        }
    );
}

#[tokio::test]
async fn provider_error_message_is_surfaced_verbatim() {
    let (base, _state) = spawn_mock().await;
    let err = provider(&base, "test-key")
        .authenticate("a@b.c", "wrong")
        .await
        .expect_err("bad credentials");
    assert_eq!(err.to_string(), "INVALID_LOGIN_CREDENTIALS");

    let err = provider(&base, "other-key")
        .create_identity("a@b.c", "pw")
        .await
        .expect_err("bad key");
    assert_eq!(err.to_string(), "API_KEY_INVALID");
}

#[tokio::test]
async fn signup_then_verify_flow_uses_handle_tokens() {
    let (base, state) = spawn_mock().await;
    let provider = provider(&base, "test-key");

    let handle = provider
        .create_identity("new@b.c", "pw")
        .await
        .expect("signup");
    assert_eq!(handle.identity_id, "uid-new");
    assert_eq!(handle.email, "new@b.c");

    provider
        .send_verification_message(&handle)
        .await
        .expect("send");
    assert!(!provider.reload_identity(&handle).await.expect("reload").verified);

    *state.verified.lock().await = true;
    assert!(provider.reload_identity(&handle).await.expect("reload").verified);
    assert_eq!(
        provider.identity_token(&handle).await.expect("token"),
        "refreshed-token"
    );

    let requests = state.requests.lock().await;
    let oob = requests
        .iter()
        .find(|(path, _)| path == "/v1/accounts:sendOobCode")
        .expect("oob request");
    assert_eq!(oob.1["requestType"], "VERIFY_EMAIL");
    assert_eq!(oob.1["idToken"], "signup-token");
}

#[tokio::test]
async fn identity_token_without_refresh_token_reuses_id_token() {
    let provider = RestIdentityProvider::new("http://127.0.0.1:9/v1", "http://127.0.0.1:9/token", "k")
        .expect("provider");
    let handle = IdentityHandle {
        identity_id: "uid".into(),
        email: "a@b.c".into(),
        id_token: "tok".into(),
        refresh_token: None,
    };
    assert_eq!(provider.identity_token(&handle).await.expect("token"), "tok");
    provider.end_session().await.expect("end session");
}

#[test]
fn rejects_invalid_base_url() {
    assert!(RestIdentityProvider::new("not a url", "http://x/token", "k").is_err());
}
