use crate::infra::AppState;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use feedback_reports::error::AppError;
use feedback_reports::reports::download::content_disposition;
use feedback_reports::reports::{
    export_csv, export_json, AggregateRenderer, Downloadable, EvaluationResult,
    PerStudentRenderer, ReportError,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct ReportRequest {
    #[serde(default)]
    pub(crate) source_filename: Option<String>,
    pub(crate) result: EvaluationResult,
}

pub(crate) fn report_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/reports/aggregate", post(aggregate_endpoint))
        .route("/api/v1/reports/per-student", post(per_student_endpoint))
        .route("/api/v1/reports/json", post(json_export_endpoint))
        .route("/api/v1/reports/csv", post(csv_export_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn aggregate_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ReportRequest>,
) -> Result<Response, AppError> {
    let base_name = state.base_name(payload.source_filename.as_deref());
    let settings = state.render_settings();
    let result = payload.result;

    let rendered = run_blocking(move || AggregateRenderer::new(settings).render(&result, &base_name))
        .await?;
    Ok(match rendered {
        Some(document) => attachment(&document),
        None => nothing_to_download(),
    })
}

pub(crate) async fn per_student_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ReportRequest>,
) -> Result<Response, AppError> {
    if payload.result.is_empty() {
        return Ok(nothing_to_download());
    }
    let base_name = state.base_name(payload.source_filename.as_deref());
    let settings = state.render_settings();
    let result = payload.result;

    let packed = run_blocking(move || {
        PerStudentRenderer::new(settings)
            .render_all(&result, &base_name)?
            .finalize()
    })
    .await?;
    Ok(attachment(&packed))
}

pub(crate) async fn json_export_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ReportRequest>,
) -> Result<Response, AppError> {
    if payload.result.is_empty() {
        return Ok(nothing_to_download());
    }
    let base_name = state.base_name(payload.source_filename.as_deref());
    let export = export_json(&payload.result, &base_name)?;
    Ok(attachment(&export))
}

pub(crate) async fn csv_export_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ReportRequest>,
) -> Result<Response, AppError> {
    if payload.result.is_empty() {
        return Ok(nothing_to_download());
    }
    let base_name = state.base_name(payload.source_filename.as_deref());
    let export = export_csv(&payload.result, &base_name)?;
    Ok(attachment(&export))
}

/// Renders off the async workers; rendering is CPU-bound and synchronous.
pub(crate) async fn run_blocking<T, F>(job: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, ReportError> + Send + 'static,
    T: Send + 'static,
{
    let joined = tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
    Ok(joined?)
}

fn attachment(artifact: &dyn Downloadable) -> Response {
    let content_type = HeaderValue::from_str(artifact.content_type().as_ref())
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(artifact.filename()))
        .unwrap_or(HeaderValue::from_static("attachment"));
    info!(
        filename = artifact.filename(),
        size = artifact.bytes().len(),
        "serving download"
    );

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes().to_vec(),
    )
        .into_response()
}

fn nothing_to_download() -> Response {
    info!("nothing to download");
    StatusCode::NO_CONTENT.into_response()
}
