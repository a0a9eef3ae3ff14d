//! `POST /api/track-visitor`: resolve the caller, email a summary, answer 200.

use std::any::Any;
use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::config::TrackerConfig;
use crate::email;
use crate::geo::{GeoLocator, UNKNOWN};
use crate::mailer::{Dispatch, Mailer};
use crate::record::VisitorRecord;

pub const TRACK_PATH: &str = "/api/track-visitor";

pub struct AppState {
    pub geo: GeoLocator,
    pub mailer: Mailer,
}

impl AppState {
    pub fn from_config(cfg: &TrackerConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(cfg.timeout()).build()?;
        Ok(AppState {
            geo: GeoLocator::new(client.clone(), cfg.geo_api_base.clone()),
            mailer: Mailer::new(
                client,
                cfg.email_api_url.clone(),
                cfg.resend_api_key.clone(),
                cfg.notification_from.clone(),
                cfg.notification_email.clone(),
            ),
        })
    }
}

/// Routes only, without middleware.
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            TRACK_PATH,
            post(track_visitor).fallback(method_not_allowed),
        )
        .with_state(state)
}

/// Request tracing, and a JSON 500 for anything that panics below.
pub fn layered(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(internal_error))
        .layer(TraceLayer::new_for_http())
}

pub fn router(state: Arc<AppState>) -> Router {
    layered(routes(state))
}

/// First `x-forwarded-for` hop, else `x-real-ip`, else `Unknown`. Values
/// that are not IP addresses are ignored.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = header_str(headers, "x-forwarded-for").and_then(|v| v.split(',').next());
    let real = header_str(headers, "x-real-ip");
    forwarded
        .and_then(parse_ip)
        .or_else(|| real.and_then(parse_ip))
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn parse_ip(s: &str) -> Option<IpAddr> {
    s.trim().parse().ok()
}

async fn track_visitor(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(record): Json<VisitorRecord>,
) -> Json<Value> {
    let ip = client_ip(&headers);
    let location = state.geo.locate(&ip).await.to_string();
    tracing::info!(%ip, %location, name = record.display_name().unwrap_or("-"), "visit");

    let subject = email::subject(&record, &location);
    let html = email::render_html(&record, &location, &ip);
    match state.mailer.send(&subject, &html).await {
        Ok(Dispatch::Sent) => tracing::debug!("notification sent"),
        Ok(Dispatch::Skipped) => tracing::debug!("email not configured, notification skipped"),
        Err(e) => tracing::error!("notification failed: {e}"),
    }

    Json(json!({ "success": true, "message": "Visitor tracked" }))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "message": "Method not allowed" })),
    )
}

fn internal_error(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("request handler panicked: {detail}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "message": "Internal server error" })),
    )
        .into_response()
}
