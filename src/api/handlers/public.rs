//! Unauthenticated endpoints.

use super::HandlerResult;
use crate::{
    api::AppState,
    core::announcement::{self, PUBLIC_LIMIT},
    entities::announcement as announcement_entity,
};
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

/// Query of the public feed.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// Maximum entries, defaults to three
    pub limit: Option<u64>,
}

/// GET /v1/public/announcements
pub async fn announcements(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> HandlerResult<Vec<announcement_entity::Model>> {
    let limit = query.limit.unwrap_or(PUBLIC_LIMIT);
    Ok(Json(announcement::published_announcements(&state.db, Some(limit)).await?))
}

/// GET /v1/public/announcements/all
pub async fn all_announcements(State(state): State<AppState>) -> HandlerResult<Vec<announcement_entity::Model>> {
    Ok(Json(announcement::published_announcements(&state.db, None).await?))
}
