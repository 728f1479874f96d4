//! Route handlers

use super::error::ApiError;
use super::pixel::Pixel;
use super::AppState;
use crate::counter::{CounterError, CounterKey};
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

/// `GET /`
pub async fn identity(State(state): State<AppState>) -> Response {
    Json(json!({ "name": &*state.service_name })).into_response()
}

/// `GET /hit/{namespace}/{resource}`: always 200 with a pixel
pub async fn hit(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
    headers: HeaderMap,
) -> Pixel {
    let Ok(Path((namespace, resource))) = path else {
        return Pixel::Warning;
    };

    if let Some(required) = state.required_user_agent.as_deref() {
        let agent = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !agent.to_lowercase().contains(&required.to_lowercase()) {
            debug!(namespace = %namespace, resource = %resource, agent = %agent, "Hit rejected: user agent");
            return Pixel::Warning;
        }
    }

    let key = match CounterKey::new(&namespace, &resource) {
        Ok(key) => key,
        Err(e) => {
            debug!(namespace = %namespace, resource = %resource, error = %e, "Hit rejected");
            return Pixel::Warning;
        }
    };

    match state.engine.apply_hit(&key, state.clock.now()).await {
        Ok(_) => Pixel::Success,
        Err(e) => {
            warn!(key = %key, error = %e, "Hit not recorded");
            Pixel::Failure
        }
    }
}

/// `GET /~/counts/{namespace}`
pub async fn counts(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(namespace) = path.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let listing = state.query.list_counts(&namespace).await?;
    Ok(Json(listing).into_response())
}

/// `GET /~/value/{namespace}/{resource}`
pub async fn value(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
) -> Result<Response, ApiError> {
    let key = key_from_path(path)?;
    match state.query.get_record(&key).await? {
        Some(record) => Ok(Json(record).into_response()),
        None => Err(ApiError::not_found()),
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    secret: Option<String>,
}

/// `DELETE /~/delete/{namespace}/{resource}?secret=...`
pub async fn delete_record(
    State(state): State<AppState>,
    path: Result<Path<(String, String)>, PathRejection>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let provided = params.ok().and_then(|Query(p)| p.secret);
    if !secret_matches(state.secret.as_deref(), provided.as_deref()) {
        warn!("Delete refused: invalid secret");
        return Err(CounterError::Unauthorized.into());
    }

    let key = key_from_path(path)?;
    state.query.delete_record(&key).await?;
    Ok(Json(json!({
        "message": "Deleted",
        "namespace": key.namespace(),
        "resource": key.resource(),
    }))
    .into_response())
}

/// Fallback for unmatched paths and methods
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

fn key_from_path(path: Result<Path<(String, String)>, PathRejection>) -> Result<CounterKey, ApiError> {
    let Path((namespace, resource)) = path.map_err(|e| ApiError::bad_request(e.body_text()))?;
    CounterKey::new(&namespace, &resource).map_err(|e| CounterError::from(e).into())
}

/// Deletes are refused outright when no secret is configured
fn secret_matches(expected: Option<&str>, provided: Option<&str>) -> bool {
    match (expected, provided) {
        (Some(expected), Some(provided)) => {
            bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
        }
        _ => false,
    }
}
