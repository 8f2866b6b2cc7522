use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{
    error::AppError,
    render::{
        charts::{ChartKind, ChartQuery, Figure},
        page,
    },
    services::ingest::read_upload_form,
    AppState,
};

pub fn routes(allowed_origins: &[String]) -> Router<Arc<AppState>> {
    let router = Router::new()
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/analyze", post(analyze))
        .route("/charts/:kind", get(chart));

    match cors_layer(allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// Cross-origin reads are only granted to explicitly configured origins.
fn cors_layer(allowed_origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600)),
    )
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(page::render(&state.dashboard.snapshot(), None))
}

async fn upload(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let start = std::time::Instant::now();
    let outcome = match read_upload_form(multipart).await {
        Ok((source, candidates)) => state.dashboard.upload(source, candidates).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(view) => {
            tracing::info!("Upload handled in {:?}", start.elapsed());
            Html(page::render(&view, None)).into_response()
        }
        Err(e) => page_with_error(&state, e),
    }
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Form(toggled): Form<Vec<(String, String)>>,
) -> Response {
    let start = std::time::Instant::now();
    match state.dashboard.analyze(toggled).await {
        Ok(view) => {
            tracing::info!("Analysis handled in {:?}", start.elapsed());
            Html(page::render(&view, None)).into_response()
        }
        Err(e) => page_with_error(&state, e),
    }
}

async fn chart(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<Figure>, AppError> {
    let kind: ChartKind = kind.parse()?;
    tracing::debug!("Redrawing {:?} with {:?}", kind, query);
    state.dashboard.chart(kind, &query).map(Json)
}

/// Re-renders the current state with the error shown as a notification.
fn page_with_error(state: &AppState, error: AppError) -> Response {
    let status = error.status();
    if status.is_server_error() {
        tracing::error!("{}", error);
    } else {
        tracing::warn!("{}", error);
    }
    let html = page::render(&state.dashboard.snapshot(), Some(&error.user_message()));
    (status, Html(html)).into_response()
}
