use std::sync::Arc;
use std::time::Duration;

use mindful_companion::api::HttpApiClient;
use mindful_companion::error::{LoadError, SubmitError};
use mindful_companion::preferences::{MemoryPreferenceStore, PreferenceStore, keys};
use mindful_companion::session::{
    ConversationSession, GoalListSession, Message, SessionContext, TurnState,
};
use mindful_companion::ui::{HistoryNavigator, Route};
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct App {
    server: MockServer,
    api: Arc<HttpApiClient>,
    nav: Arc<HistoryNavigator>,
    ctx: SessionContext,
}

async fn signed_in_app() -> App {
    let server = MockServer::start().await;
    let api = Arc::new(
        HttpApiClient::new(Url::parse(&server.uri()).unwrap(), Duration::from_secs(2)).unwrap(),
    );
    let store = Arc::new(MemoryPreferenceStore::new());
    store.set_string(keys::TOKEN, "tok").unwrap();
    store.set_string(keys::USERNAME, "sam").unwrap();
    let nav = Arc::new(HistoryNavigator::starting_at(Route::Main));
    let ctx = SessionContext::new(store, nav.clone(), Duration::from_millis(500));
    App {
        server,
        api,
        nav,
        ctx,
    }
}

#[tokio::test]
async fn anxious_message_with_server_error_keeps_only_user_message() {
    let app = signed_in_app().await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "model offline"})))
        .mount(&app.server)
        .await;
    let mut session = ConversationSession::personal_friend(app.api.clone(), app.ctx.clone());

    let err = session.submit("I feel anxious").await.unwrap_err();

    assert!(matches!(err, SubmitError::ReplyFailed(_)));
    assert_eq!(session.current_log(), &[Message::user("I feel anxious")]);
    assert_eq!(session.state(), TurnState::Idle);
}

#[tokio::test]
async fn conversation_grows_one_pair_per_reply() {
    let app = signed_in_app().await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "I hear you."})))
        .expect(2)
        .mount(&app.server)
        .await;
    let mut session = ConversationSession::personal_friend(app.api.clone(), app.ctx.clone());

    session.submit("rough day").await.unwrap();
    session.submit("thanks").await.unwrap();

    assert_eq!(
        session.current_log(),
        &[
            Message::user("rough day"),
            Message::agent("I hear you."),
            Message::user("thanks"),
            Message::agent("I hear you."),
        ]
    );
}

#[tokio::test]
async fn slow_backend_times_out_the_reply() {
    let app = signed_in_app().await;
    Mock::given(method("POST"))
        .and(path("/api/chatbot"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"response": "late"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&app.server)
        .await;
    let mut session = ConversationSession::personal_friend(app.api.clone(), app.ctx.clone());

    let err = session.submit("hello?").await.unwrap_err();

    assert!(matches!(err, SubmitError::Timeout));
    assert_eq!(session.current_log().len(), 1);
}

#[tokio::test]
async fn goal_tracker_round_trip() {
    let app = signed_in_app().await;
    Mock::given(method("GET"))
        .and(path("/api/goals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/goals/add"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"goals": [
            {"_id": "g1", "title": "Exercise", "completed": false}
        ]})))
        .mount(&app.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/goals/complete/g1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Goal completed"})))
        .expect(1)
        .mount(&app.server)
        .await;
    let mut session = GoalListSession::new(app.api.clone(), app.ctx.clone());

    assert!(session.load().await.unwrap().is_empty());
    session.add_goal("Exercise").await.unwrap();
    assert_eq!(session.goals().len(), 1);
    assert_eq!(session.goals()[0].title, "Exercise");
    assert!(!session.goals()[0].completed);

    session.complete_goal("g1").await.unwrap();
    assert!(session.goals()[0].completed);
    assert_eq!(session.completing_id(), None);
}

#[tokio::test]
async fn failed_reload_keeps_the_list() {
    let app = signed_in_app().await;
    Mock::given(method("GET"))
        .and(path("/api/goals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "g1", "title": "Walk", "completed": false}
        ])))
        .up_to_n_times(1)
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/goals"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.server)
        .await;
    let mut session = GoalListSession::new(app.api.clone(), app.ctx.clone());

    session.load().await.unwrap();
    let err = session.load().await.unwrap_err();

    assert!(matches!(err, LoadError::LoadFailed(_)));
    assert_eq!(session.goals().len(), 1);
    assert_eq!(app.nav.current(), Route::Main);
}
