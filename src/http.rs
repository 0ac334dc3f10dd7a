use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::error;

use crate::aggregate::{self, SurveySummary};
use crate::catalog::SurveyCategory;
use crate::store::{self, Answer, ResponseRecord};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub catalog: Arc<Vec<SurveyCategory>>,
    pub allowed_origins: Arc<Vec<String>>,
    pub limiter: Arc<RateLimiter>,
}

/// Client-facing failures. Messages are deliberately generic; the
/// underlying cause is only logged.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Responses are required")]
    MissingResponses,
    #[error("Failed to save survey")]
    SaveFailed,
    #[error("Failed to fetch surveys")]
    FetchFailed,
    #[error("Too many requests, please try again later.")]
    RateLimited,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingResponses => StatusCode::BAD_REQUEST,
            ApiError::SaveFailed | ApiError::FetchFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitSurvey {
    pub responses: Option<HashMap<String, Answer>>,
}

async fn submit_survey(
    State(state): State<AppState>,
    Json(payload): Json<SubmitSurvey>,
) -> Result<Json<ResponseRecord>, ApiError> {
    // Only absence of the key is rejected; an empty answer set is fine.
    let responses = payload.responses.ok_or(ApiError::MissingResponses)?;
    let conn = state.db.lock().await;
    match store::insert_response(&conn, responses) {
        Ok(record) => Ok(Json(record)),
        Err(err) => {
            error!("error saving survey: {err}");
            Err(ApiError::SaveFailed)
        }
    }
}

async fn list_surveys(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResponseRecord>>, ApiError> {
    let conn = state.db.lock().await;
    match store::list_responses(&conn) {
        Ok(records) => Ok(Json(records)),
        Err(err) => {
            error!("error fetching surveys: {err}");
            Err(ApiError::FetchFailed)
        }
    }
}

async fn survey_summary(State(state): State<AppState>) -> Result<Json<SurveySummary>, ApiError> {
    let records = {
        let conn = state.db.lock().await;
        store::list_responses(&conn).map_err(|err| {
            error!("error fetching surveys: {err}");
            ApiError::FetchFailed
        })?
    };
    Ok(Json(aggregate::summarize(&records, &state.catalog)))
}

async fn catalog_handler(State(state): State<AppState>) -> Json<Vec<SurveyCategory>> {
    Json((*state.catalog).clone())
}

#[derive(Debug, Deserialize)]
struct TalliesParams {
    question: String,
    top: Option<usize>,
}

#[derive(Debug, Serialize)]
struct TalliesResponse {
    question: String,
    tallies: Vec<aggregate::TallyShare>,
}

/// Chart data for one question, optionally truncated to the top N.
async fn question_tallies(
    State(state): State<AppState>,
    Query(params): Query<TalliesParams>,
) -> Result<Json<TalliesResponse>, ApiError> {
    let records = {
        let conn = state.db.lock().await;
        store::list_responses(&conn).map_err(|err| {
            error!("error fetching surveys: {err}");
            ApiError::FetchFailed
        })?
    };
    let counts = aggregate::tallies_for_question(&records, &state.catalog, &params.question);
    let ranked = match params.top {
        Some(n) => aggregate::top_n(&counts, n),
        None => aggregate::top_n(&counts, counts.iter().count()),
    };
    let tallies = ranked
        .into_iter()
        .map(|tally| aggregate::TallyShare {
            percent: aggregate::percentage_of(tally.count, &counts),
            name: tally.name,
            count: tally.count,
        })
        .collect();
    Ok(Json(TalliesResponse {
        question: params.question,
        tallies,
    }))
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket limiter keyed by client IP. Sized to the original
/// policy of 100 requests per 15-minute window.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    capacity: f64,
    refill_per_sec: f64,
}

impl RateLimiter {
    pub fn new(capacity: f64, refill_per_sec: f64) -> Self {
        RateLimiter {
            buckets: Mutex::new(HashMap::new()),
            capacity,
            refill_per_sec,
        }
    }

    pub async fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: self.capacity,
            last_refill: now,
        });
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

async fn rate_limit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let key = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    if !state.limiter.allow(&key).await {
        return ApiError::RateLimited.into_response();
    }
    next.run(req).await
}

async fn cors_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let origin = req
        .headers()
        .get("origin")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let allowed = origin
        .as_ref()
        .is_some_and(|o| state.allowed_origins.iter().any(|a| a == o));

    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        if allowed {
            if let Some(origin_value) = origin {
                if let Ok(value) = HeaderValue::from_str(&origin_value) {
                    resp.headers_mut().insert("access-control-allow-origin", value);
                }
                resp.headers_mut().insert(
                    "access-control-allow-methods",
                    HeaderValue::from_static("GET,POST,OPTIONS"),
                );
                resp.headers_mut().insert(
                    "access-control-allow-headers",
                    HeaderValue::from_static("content-type"),
                );
            }
        }
        return resp;
    }

    let mut resp = next.run(req).await;
    if allowed {
        if let Some(origin_value) = origin {
            if let Ok(value) = HeaderValue::from_str(&origin_value) {
                resp.headers_mut().insert("access-control-allow-origin", value);
            }
            resp.headers_mut()
                .insert("vary", HeaderValue::from_static("Origin"));
        }
    }
    resp
}

pub fn build_router(state: AppState) -> Router {
    // Middleware order mirrors the original server: rate limit first,
    // then CORS, then the JSON routes.
    Router::new()
        .route("/api/surveys", post(submit_survey).get(list_surveys))
        .route("/api/surveys/summary", get(survey_summary))
        .route("/api/surveys/tallies", get(question_tallies))
        .route("/api/catalog", get(catalog_handler))
        .layer(from_fn_with_state(state.clone(), cors_middleware))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::{build_router, AppState, RateLimiter};
    use crate::catalog::survey_catalog;
    use crate::store;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use rusqlite::Connection;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    fn test_app() -> axum::Router {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        store::init_schema(&conn).expect("init schema");
        build_router(AppState {
            db: Arc::new(Mutex::new(conn)),
            catalog: Arc::new(survey_catalog()),
            allowed_origins: Arc::new(vec!["http://localhost:5173".to_string()]),
            limiter: Arc::new(RateLimiter::new(100.0, 100.0 / 900.0)),
        })
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/surveys")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("build request")
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("parse body")
    }

    #[tokio::test]
    async fn submit_then_list_returns_the_record() {
        let app = test_app();

        let resp = app
            .clone()
            .oneshot(post_json(r#"{"responses":{"Q1":"A"}}"#))
            .await
            .expect("submit");
        assert_eq!(resp.status(), StatusCode::OK);
        let created = body_json(resp).await;
        assert_eq!(created["answers"]["Q1"], "A");
        assert!(created["id"].is_string());
        assert!(created["createdAt"].is_string());

        let resp = app.oneshot(get("/api/surveys")).await.expect("list");
        assert_eq!(resp.status(), StatusCode::OK);
        let listed = body_json(resp).await;
        let records = listed.as_array().expect("array body");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["answers"]["Q1"], "A");
    }

    #[tokio::test]
    async fn missing_responses_key_is_rejected() {
        let app = test_app();
        let resp = app.oneshot(post_json("{}")).await.expect("submit");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Responses are required");
    }

    #[tokio::test]
    async fn empty_responses_object_is_accepted() {
        let app = test_app();
        let resp = app
            .oneshot(post_json(r#"{"responses":{}}"#))
            .await
            .expect("submit");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn summary_aggregates_submitted_answers() {
        let app = test_app();
        let question = "How would you rate team communication?";
        for answer in ["Good", "Good", "Excellent"] {
            let body = format!(r#"{{"responses":{{"{question}":"{answer}"}}}}"#);
            let resp = app.clone().oneshot(post_json(&body)).await.expect("submit");
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = app
            .oneshot(get("/api/surveys/summary"))
            .await
            .expect("summary");
        assert_eq!(resp.status(), StatusCode::OK);
        let summary = body_json(resp).await;
        assert_eq!(summary["totalResponses"], 3);

        let questions = summary["categories"]
            .as_array()
            .expect("categories")
            .iter()
            .flat_map(|c| c["questions"].as_array().expect("questions").iter())
            .collect::<Vec<&serde_json::Value>>();
        let team_comm = questions
            .iter()
            .find(|q| q["text"] == question)
            .expect("question in summary");
        assert_eq!(team_comm["answered"], 3);
        assert_eq!(team_comm["tallies"][0]["name"], "Good");
        assert_eq!(team_comm["tallies"][0]["count"], 2);
        assert_eq!(team_comm["tallies"][0]["percent"], 67);
    }

    #[tokio::test]
    async fn tallies_endpoint_ranks_and_truncates() {
        let app = test_app();
        let question = "Which areas slow down your development process the most?";
        for picks in [
            r#"["Unclear Requirements","Outdated Documentation"]"#,
            r#"["Unclear Requirements"]"#,
            r#"["Inefficient Testing"]"#,
        ] {
            let body = format!(r#"{{"responses":{{"{question}":{picks}}}}}"#);
            let resp = app.clone().oneshot(post_json(&body)).await.expect("submit");
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let uri = format!(
            "/api/surveys/tallies?top=1&question={}",
            question.replace(' ', "%20").replace('?', "%3F")
        );
        let resp = app.oneshot(get(&uri)).await.expect("tallies");
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["question"], question);
        let tallies = body["tallies"].as_array().expect("tallies array");
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0]["name"], "Unclear Requirements");
        assert_eq!(tallies[0]["count"], 2);
        assert_eq!(tallies[0]["percent"], 50);
    }

    #[tokio::test]
    async fn catalog_endpoint_serves_the_static_definition() {
        let app = test_app();
        let resp = app.oneshot(get("/api/catalog")).await.expect("catalog");
        assert_eq!(resp.status(), StatusCode::OK);
        let catalog = body_json(resp).await;
        let categories = catalog.as_array().expect("array body");
        assert_eq!(categories.len(), 8);
        assert_eq!(categories[0]["category"], "Technical Workflows");
        assert_eq!(categories[0]["questions"][0]["type"], "rating");
    }

    #[tokio::test]
    async fn preflight_from_allowed_origin_gets_cors_headers() {
        let app = test_app();
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/surveys")
            .header("origin", "http://localhost:5173")
            .body(Body::empty())
            .expect("build request");
        let resp = app.oneshot(req).await.expect("preflight");
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:5173")
        );
    }

    #[tokio::test]
    async fn unknown_origin_gets_no_cors_headers() {
        let app = test_app();
        let req = Request::builder()
            .uri("/api/surveys")
            .header("origin", "http://evil.example")
            .body(Body::empty())
            .expect("build request");
        let resp = app.oneshot(req).await.expect("request");
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn limiter_denies_once_tokens_run_out() {
        let limiter = RateLimiter::new(2.0, 0.0);
        assert!(limiter.allow("client").await);
        assert!(limiter.allow("client").await);
        assert!(!limiter.allow("client").await);
        // Other clients have their own bucket.
        assert!(limiter.allow("other").await);
    }
}
