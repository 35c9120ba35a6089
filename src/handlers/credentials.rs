use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::state::AppState;

/// Checks the service token and returns the viewer id the session gateway
/// put in `x-user-id`.
fn authenticate_viewer(headers: &HeaderMap, expected_token: &str) -> Result<i64, AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }

    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or(AppError::Unauthorized)
}

// GET /api/viewer/credentials
#[derive(Serialize)]
pub struct CredentialResponse {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
}

pub async fn list_credentials(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<CredentialResponse>>, AppError> {
    let viewer_id = authenticate_viewer(&headers, &state.config.api_token)?;

    let credentials = {
        let db = state.conn()?;
        queries::list_credentials(&db, viewer_id)?
    };

    Ok(Json(
        credentials
            .into_iter()
            .map(|c| CredentialResponse { id: c.id, kind: c.kind })
            .collect(),
    ))
}

// POST /api/viewer/delete-credential
#[derive(Deserialize)]
pub struct DeleteCredentialRequest {
    pub id: i64,
}

pub async fn delete_credential(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<DeleteCredentialRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let viewer_id = authenticate_viewer(&headers, &state.config.api_token)?;
    if body.id <= 0 {
        return Err(AppError::BadRequest("credential id must be positive".to_string()));
    }

    let deleted = {
        let db = state.conn()?;
        queries::delete_credential(&db, body.id, viewer_id)?
    };

    if deleted {
        tracing::info!(credential_id = body.id, viewer_id, "credential deleted");
        Ok(Json(serde_json::json!({"ok": true})))
    } else {
        Err(AppError::NotFound("credential".to_string()))
    }
}
