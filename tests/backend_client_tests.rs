use serde_json::json;
use telepanel::api::{ApiError, Backend, BackendClient, MessageStatus, TELEGRAM_ACCOUNT_TYPE};
use telepanel::core::store::{self, AUTH_TOKEN_KEY, LocalStore, SharedStore};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_string_contains, header, method, path, query_param},
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Client against `server` with an optional stored token.
fn client_for(server: &MockServer, token: Option<&str>) -> (BackendClient, SharedStore) {
    let store = LocalStore::in_memory().into_shared();
    if let Some(token) = token {
        store::lock(&store).set(AUTH_TOKEN_KEY, token);
    }
    (BackendClient::new(server.uri(), store.clone()), store)
}

fn user_json() -> serde_json::Value {
    json!({"id": 7, "username": "operator", "email": "op@example.com"})
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_ok_and_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;
    let (client, _) = client_for(&server, None);
    assert!(client.check_health().await);

    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&down)
        .await;
    let (client, _) = client_for(&down, None);
    assert!(!client.check_health().await);
}

#[tokio::test]
async fn test_health_unreachable_is_false() {
    let store = LocalStore::in_memory().into_shared();
    // Nothing listens on port 9 locally
    let client = BackendClient::new("http://127.0.0.1:9", store);
    assert!(!client.check_health().await);
}

// ============================================================================
// Operator auth
// ============================================================================

#[tokio::test]
async fn test_login_posts_form_and_persists_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/"))
        .and(body_string_contains("username=op%40example.com"))
        .and(body_string_contains("password=secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"user": user_json(), "token": "tok-1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_for(&server, None);
    let auth = client.login("op@example.com", "secret").await.unwrap();
    assert_eq!(auth.user.id, "7");
    assert_eq!(auth.user.username, "operator");
    assert_eq!(store::lock(&store).get(AUTH_TOKEN_KEY).as_deref(), Some("tok-1"));
}

#[tokio::test]
async fn test_login_failure_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Incorrect email or password"})),
        )
        .mount(&server)
        .await;

    let (client, store) = client_for(&server, None);
    let err = client.login("op@example.com", "nope").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.message_or("Failed to login"), "Incorrect email or password");
    assert!(store::lock(&store).get(AUTH_TOKEN_KEY).is_none());
}

#[tokio::test]
async fn test_register_sends_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register/"))
        .and(body_json(json!({
            "username": "operator",
            "email": "op@example.com",
            "password": "pw"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"user": user_json(), "token": "tok-2"})),
        )
        .mount(&server)
        .await;

    let (client, store) = client_for(&server, None);
    client.register("operator", "op@example.com", "pw").await.unwrap();
    assert_eq!(store::lock(&store).get(AUTH_TOKEN_KEY).as_deref(), Some("tok-2"));
}

#[tokio::test]
async fn test_current_user_uses_bearer_and_clears_rejected_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/"))
        .and(header("authorization", "Bearer good"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": user_json()})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, Some("good"));
    assert_eq!(client.current_user().await.unwrap().username, "operator");

    let (client, store) = client_for(&server, Some("stale"));
    assert!(client.current_user().await.unwrap_err().is_unauthorized());
    assert!(store::lock(&store).get(AUTH_TOKEN_KEY).is_none());
}

#[tokio::test]
async fn test_current_user_without_token_skips_network() {
    let server = MockServer::start().await;
    let (client, _) = client_for(&server, None);
    assert_eq!(client.current_user().await, Err(ApiError::MissingToken));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

// ============================================================================
// Telegram data
// ============================================================================

#[tokio::test]
async fn test_list_accounts_accepts_strings_and_objects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list_accounts/"))
        .and(query_param("type", TELEGRAM_ACCOUNT_TYPE))
        .and(header("authorization", "Bearer t"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accounts": ["+100", {"phone": "+200", "isActive": false}]
        })))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, Some("t"));
    let accounts = client.list_accounts(Some(TELEGRAM_ACCOUNT_TYPE)).await.unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].phone, "+100");
    assert_eq!(accounts[1].is_active, Some(false));
}

#[tokio::test]
async fn test_get_chats_decodes_optional_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_chats/"))
        .and(query_param("phone", "+100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chats": [
                {"id": 1, "name": "Alice", "unread_count": 3, "lastMessage": "hey", "online": true},
                {"id": 2, "name": "Bob"}
            ]
        })))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, Some("t"));
    let chats = client.get_chats("+100").await.unwrap();
    assert_eq!(chats[0].unread_count, 3);
    assert_eq!(chats[0].last_message.as_deref(), Some("hey"));
    assert_eq!(chats[1].unread_count, 0);
    assert_eq!(chats[1].online, None);
}

#[tokio::test]
async fn test_get_chats_session_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_chats/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Session is no longer valid. Please log in again.",
            "code": "session_invalid"
        })))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, Some("t"));
    let err = client.get_chats("+100").await.unwrap_err();
    assert!(err.is_session_invalid());
}

#[tokio::test]
async fn test_get_messages_query_and_missing_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_messages/"))
        .and(query_param("phone", "+100"))
        .and(query_param("chat_id", "42"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"id": 9, "text": "hi", "date": "2024-05-01T12:00:00Z", "out": false, "sender_id": 42}
            ]
        })))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, Some("t"));
    let messages = client.get_messages("+100", 42).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "hi");
    assert_eq!(messages[0].status, MessageStatus::Read);

    let bare = MockServer::start().await;
    let (client, _) = client_for(&bare, Some("t"));
    assert!(client.get_messages("+100", 42).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_send_message_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send_message/"))
        .and(body_json(json!({"phone": "+100", "recipient": "Alice", "message": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "sent"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, Some("t"));
    let reply = client.send_message("+100", "Alice", "hello").await.unwrap();
    assert_eq!(reply.message.as_deref(), Some("sent"));
}

#[tokio::test]
async fn test_telegram_login_steps() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/start_login/"))
        .and(body_json(json!({"phone": "+100", "force_code": true})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "code_sent", "message": "Code sent"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/complete_login/"))
        .and(body_json(json!({"phone": "+100", "code": "000"})))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "PHONE_CODE_INVALID"})),
        )
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, Some("t"));
    let reply = client.start_login("+100").await.unwrap();
    assert_eq!(reply.message.as_deref(), Some("Code sent"));

    let err = client.complete_login("+100", "000").await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.message_or("Failed to complete login"), "PHONE_CODE_INVALID");
}

#[tokio::test]
async fn test_undecodable_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_chats/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server, Some("t"));
    assert!(matches!(
        client.get_chats("+100").await,
        Err(ApiError::Decode(_))
    ));
}
