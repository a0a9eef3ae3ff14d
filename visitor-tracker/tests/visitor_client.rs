use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use visitor_tracker::client::session::{VISITOR_NAME, VISITOR_TRACKED};
use visitor_tracker::client::{
    Environment, FileSession, MemorySession, NamePrompt, PromptState, Reporter, SessionStore,
};
use visitor_tracker::GeoLocator;

fn environment() -> Environment {
    Environment {
        user_agent: "track-visitor/test".into(),
        screen_resolution: "120x40".into(),
        language: "en-IN".into(),
        timezone: "Asia/Kolkata".into(),
        referrer: "Direct".into(),
        page_url: "https://example.dev/".into(),
    }
}

fn reporter(geo: &MockServer, site: &MockServer) -> Reporter {
    let client = reqwest::Client::new();
    Reporter::new(
        client.clone(),
        format!("{}/api/track-visitor", site.uri()),
        GeoLocator::new(client, geo.uri()),
    )
}

#[tokio::test]
async fn answered_prompt_reports_once_and_marks_the_session() {
    let geo = MockServer::start().await;
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ip": "203.0.113.7", "city": "Pune", "country_name": "India"
        })))
        .mount(&geo)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/track-visitor"))
        .and(body_partial_json(json!({
            "name": "Asha",
            "ipAddress": "203.0.113.7",
            "location": "Pune, India",
            "screenResolution": "120x40"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&site)
        .await;

    let mut store = MemorySession::new();
    let mut prompt = NamePrompt::mount(&store);
    prompt.open();
    let name = prompt.submit(&mut store, "Asha").unwrap().unwrap();

    let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 5).unwrap();
    let ok = reporter(&geo, &site)
        .report(&mut store, environment().record(Some(&name), now))
        .await;

    assert!(ok);
    assert_eq!(store.get(VISITOR_TRACKED).as_deref(), Some("true"));
    assert_eq!(NamePrompt::mount(&store).state(), PromptState::Hidden);
}

#[tokio::test]
async fn lookup_failure_still_sends_with_unknowns() {
    let geo = MockServer::start().await;
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&geo)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&site)
        .await;

    let mut store = MemorySession::new();
    let ok = reporter(&geo, &site)
        .report(&mut store, environment().record(Some("Anonymous"), Utc::now()))
        .await;
    assert!(ok);

    let reqs = site.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&reqs[0].body).unwrap();
    assert_eq!(sent["ipAddress"], "Unknown");
    assert_eq!(sent["location"], "Unknown, Unknown");
}

#[tokio::test]
async fn endpoint_failure_is_swallowed_and_not_marked() {
    let geo = MockServer::start().await;
    let site = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&site)
        .await;

    let mut store = MemorySession::new();
    let ok = reporter(&geo, &site)
        .report(&mut store, environment().record(None, Utc::now()))
        .await;
    assert!(!ok);
    assert!(!store.is_set(VISITOR_TRACKED));
}

#[test]
fn skipped_prompt_stays_hidden_across_file_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut store = FileSession::open(&path);
    let mut prompt = NamePrompt::mount(&store);
    prompt.open();
    assert_eq!(prompt.skip(&mut store).unwrap().as_deref(), Some("Anonymous"));

    let reopened = FileSession::open(&path);
    assert_eq!(reopened.get(VISITOR_NAME).as_deref(), Some("Anonymous"));
    assert_eq!(NamePrompt::mount(&reopened).state(), PromptState::Hidden);
}
