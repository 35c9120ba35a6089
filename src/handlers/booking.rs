use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::services::booking::{self, EventTypePage, RequestContext, UserEventTypes};
use crate::state::AppState;

const DEFAULT_LOCALE: &str = "en";

/// First language tag of `Accept-Language`, without its quality value.
pub fn request_locale(headers: &HeaderMap) -> String {
    headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|tag| tag.split(';').next().unwrap_or("").trim())
        .filter(|tag| !tag.is_empty() && *tag != "*")
        .unwrap_or(DEFAULT_LOCALE)
        .to_string()
}

// GET /api/booking/user-event-types
#[derive(Deserialize)]
pub struct UserEventTypesQuery {
    #[serde(default)]
    pub username: String,
}

pub async fn user_event_types(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<UserEventTypesQuery>,
) -> Result<Json<Option<UserEventTypes>>, AppError> {
    let locale = request_locale(&headers);
    let span = tracing::info_span!("user_event_types", username = %query.username, %locale);

    let result = span.in_scope(|| -> Result<_, AppError> {
        let db = state.conn()?;
        let ctx = RequestContext::new(&db, locale.as_str());
        booking::user_event_types(&ctx, &query.username).map_err(AppError::from)
    })?;

    Ok(Json(result))
}

// GET /api/booking/event-type
#[derive(Deserialize)]
pub struct EventTypeQuery {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub slug: String,
    pub date: Option<String>,
}

pub async fn event_type_by_username(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<EventTypeQuery>,
) -> Result<Json<Option<EventTypePage>>, AppError> {
    let locale = request_locale(&headers);
    let span = tracing::info_span!(
        "event_type_by_username",
        username = %query.username,
        slug = %query.slug,
        %locale
    );

    let result = span.in_scope(|| -> Result<_, AppError> {
        let db = state.conn()?;
        let ctx = RequestContext::new(&db, locale.as_str());
        booking::event_type_by_username(&ctx, &query.username, &query.slug, query.date.as_deref())
            .map_err(AppError::from)
    })?;

    Ok(Json(result))
}
