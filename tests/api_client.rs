use std::time::Duration;

use mindful_companion::api::{CompanionApi, HttpApiClient, SignupRequest};
use mindful_companion::error::{ApiError, ErrorKind};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpApiClient {
    HttpApiClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn chat_sends_bearer_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot"))
        .and(header("Authorization", "Bearer tok"))
        .and(body_json(json!({"username": "sam", "message": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Hi Sam"})))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .post_chat(Some("tok"), "sam", "hello")
        .await
        .unwrap();
    assert_eq!(reply, "Hi Sam");
}

#[tokio::test]
async fn chat_without_response_text_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "hmm"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .post_chat(None, "guest", "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Malformed(_)));
    assert_eq!(err.kind(), ErrorKind::Server);
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/goals"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_goals("tok").await.unwrap_err();
    assert!(matches!(err, ApiError::Malformed(_)));
}

#[tokio::test]
async fn error_status_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/goals"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).get_goals("stale").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_eq!(err.server_message(), Some("Token expired"));
}

#[tokio::test]
async fn goals_are_parsed_in_server_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/goals"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "b", "title": "Sleep", "completed": true, "createdAt": "2024-09-30T08:00:00Z"},
            {"_id": "a", "title": "Walk", "completed": false}
        ])))
        .mount(&server)
        .await;

    let goals = client_for(&server).get_goals("tok").await.unwrap();
    let ids: Vec<_> = goals.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(ids, ["b", "a"]);
    assert!(goals[0].completed);
    assert!(goals[0].created_at.is_some());
}

#[tokio::test]
async fn duplicate_ids_from_server_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/goals/add"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"goals": [
            {"_id": "a", "title": "Walk", "completed": false},
            {"_id": "a", "title": "Run", "completed": false}
        ]})))
        .mount(&server)
        .await;

    let err = client_for(&server).post_goal("tok", "Run").await.unwrap_err();
    assert!(matches!(err, ApiError::Malformed(_)));
}

#[tokio::test]
async fn completion_escapes_the_goal_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/goals/complete/g%201"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).put_goal_complete("tok", "g 1").await.unwrap();
}

#[tokio::test]
async fn signup_and_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .and(body_json(json!({"username": "sam", "email": "sam@example.org", "password": "pw"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"message": "Welcome!"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": "tok", "userId": "u1"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let message = client
        .signup(&SignupRequest {
            username: "sam".into(),
            email: "sam@example.org".into(),
            password: "pw".into(),
        })
        .await
        .unwrap();
    assert_eq!(message.as_deref(), Some("Welcome!"));

    let reply = client.login("sam", "pw").await.unwrap();
    assert_eq!(reply.token, "tok");
    assert_eq!(reply.user_id, "u1");
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let client = HttpApiClient::new(
        Url::parse("http://127.0.0.1:9").unwrap(),
        Duration::from_secs(1),
    )
    .unwrap();
    let err = client.get_goals("tok").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}
