//! HTTP server for the disaster response dashboard.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                              |
//! |--------|-----------------------|------------------------------------------|
//! | GET    | `/`, `/index`         | Overview page                            |
//! | GET    | `/go?query=`          | Classification result page               |
//! | GET    | `/health`             | Health check                             |
//! | GET    | `/api/genre_counts`   | Messages per genre                       |
//! | GET    | `/api/labels_count`   | Positive messages per label              |
//! | GET    | `/api/predict/{text}` | Labels ranked by predicted probability   |
//! | GET    | `/api/logs`           | SSE stream for real-time logs            |
//!
//! Any other path is served from the static directory, when configured.

use axum::{
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Html, Json, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, path::Path as FsPath, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use super::html::{render_go, render_index};
use super::logs::{log_error, LOG_BROADCASTER};
use super::state::AppState;
use super::types::{error_response, GenreCountsResponse, GoParams, LabelsCountResponse, PredictResponse};
use crate::config::ServeConfig;
use crate::error::ServerResult;

type ApiError = (StatusCode, Json<Value>);

/// Build the application router.
pub fn build_router(state: Arc<AppState>, static_dir: Option<&FsPath>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let router = Router::new()
        .route("/", get(index))
        .route("/index", get(index))
        .route("/go", get(go))
        .route("/health", get(health))
        .route("/api/genre_counts", get(genre_counts))
        .route("/api/labels_count", get(labels_count))
        .route("/api/predict/{query}", get(predict))
        .route("/api/logs", get(sse_logs))
        .with_state(state);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(cors)
}

/// Load state, then start the HTTP server
pub async fn start_server(config: ServeConfig) -> ServerResult<()> {
    let state = Arc::new(AppState::load(&config).await?);
    let app = build_router(state, config.static_dir.as_deref());

    let addr = config.socket_addr();
    println!("🚀 Disaster response server running on http://{}", addr);
    println!("   GET  /                   - Overview");
    println!("   GET  /go?query=          - Classify a message");
    println!("   GET  /api/genre_counts   - Messages per genre");
    println!("   GET  /api/labels_count   - Messages per label");
    println!("   GET  /api/predict/{{text}} - Ranked label scores");
    println!("   GET  /api/logs           - SSE log stream");
    println!("   GET  /health             - Health check");
    if let Some(dir) = &config.static_dir {
        println!("   Static files from {}", dir.display());
    }
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "disaster-response",
        "version": env!("CARGO_PKG_VERSION"),
        "model": {
            "id": state.model.id,
            "trainedAt": state.model.trained_at,
            "labels": state.model.labels().len(),
        },
        "messages": state.dataset.len(),
    }))
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_index(
        &state.dataset.genre_counts(),
        &state.dataset.label_counts(),
    ))
}

async fn go(State(state): State<Arc<AppState>>, Query(params): Query<GoParams>) -> Html<String> {
    let query = params.query.trim();
    if query.is_empty() {
        return Html(render_go("", &[]));
    }
    let classification = state.model.classify(query);
    Html(render_go(query, &classification))
}

async fn genre_counts(State(state): State<Arc<AppState>>) -> Json<GenreCountsResponse> {
    Json(GenreCountsResponse::from(&state.dataset))
}

async fn labels_count(State(state): State<Arc<AppState>>) -> Json<LabelsCountResponse> {
    Json(LabelsCountResponse::from(&state.dataset))
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Path(query): Path<String>,
) -> Result<Json<PredictResponse>, ApiError> {
    let query = non_empty(&query)?;
    Ok(Json(PredictResponse::from(state.model.rank(query))))
}

fn non_empty(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        log_error("Rejected empty query");
        return Err((StatusCode::BAD_REQUEST, Json(error_response("Query must not be empty"))));
    }
    Ok(trimmed)
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::model::tests::toy_corpus;
    use crate::classifier::{HyperParams, ModelArtifact, TextClassifier};
    use crate::models::{Dataset, MessageRecord, TextColumn};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> Arc<AppState> {
        let (texts, labels, names) = toy_corpus();
        let params = HyperParams {
            max_df: 1.0,
            n_estimators: 5,
            min_samples_split: 2,
        };
        let classifier = TextClassifier::fit(&texts, &labels, names.clone(), &params, 42).unwrap();
        let model = ModelArtifact::new(classifier, params, 42, TextColumn::Message, 0.0, 0.0);

        let genres = ["news", "direct", "social"];
        let records = texts
            .into_iter()
            .zip(labels)
            .enumerate()
            .map(|(i, (message, labels))| MessageRecord {
                id: i as i64,
                message,
                original: None,
                genre: genres[i % 3].to_string(),
                labels,
            })
            .collect();

        Arc::new(AppState::new(Dataset::new(names, records), model))
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let response = build_router(state(), None)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn get_text(uri: &str) -> (StatusCode, String) {
        let response = build_router(state(), None)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_genre_counts() {
        let (status, json) = get_json("/api/genre_counts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["genre_names"], json!(["direct", "news", "social"]));
        assert_eq!(json["genre_counts"], json!([12, 12, 12]));
    }

    #[tokio::test]
    async fn test_labels_count() {
        let (status, json) = get_json("/api/labels_count").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["labels_name"], json!(["Related", "Water", "Food"]));
        assert_eq!(json["labels_count"], json!([24, 12, 12]));
    }

    #[tokio::test]
    async fn test_predict_ranked() {
        let (status, json) = get_json("/api/predict/flood%20water%20shortage").await;
        assert_eq!(status, StatusCode::OK);

        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        let scores: Vec<f64> = results.iter().map(|r| r[1].as_f64().unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert!(results.iter().all(|r| r[0].is_string()));
    }

    #[tokio::test]
    async fn test_predict_blank_query() {
        let (status, json) = get_json("/api/predict/%20%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    async fn test_go_page() {
        let (status, html) = get_text("/go?query=we%20need%20clean%20water").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("MESSAGE: we need clean water"));
        assert!(html.contains("Water</span>"));
        assert!(html.contains("Food</span>"));
    }

    #[tokio::test]
    async fn test_go_without_query_renders_form() {
        let (status, html) = get_text("/go").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Enter a message to classify."));

        let (status, html) = get_text("/go?query=%20%20").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<form action=\"/go\""));
        assert!(!html.contains("MESSAGE:"));
    }

    #[tokio::test]
    async fn test_index_page() {
        let (status, html) = get_text("/index").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Distribution of Message Genres"));
        assert!(html.contains("news (12)"));
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["messages"], 36);
    }

    #[tokio::test]
    async fn test_unknown_path_without_static_dir() {
        let (status, _) = get_text("/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
