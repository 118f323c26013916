//! Sign-up, sign-in, sessions and the profile photo.

use super::{CreatedResult, EmptyResult, HandlerResult, UploadQuery, UploadResponse, check_upload};
use crate::{
    api::{
        AppState,
        extract::{Caller, MaybeCaller},
    },
    core::{
        auth::{self, SessionInfo, SignUpRequest},
        guards::{self, GuardDecision},
    },
    entities::{Role, user},
    storage,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

/// Body of `POST /v1/auth/signin`.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    /// Login email
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Current session as seen by the front end's router.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Signed-in profile, if any
    pub user: Option<user::Model>,
    /// Role of the signed-in user
    pub role: Option<Role>,
    /// Where an auth page should send this caller
    pub redirect: GuardDecision,
}

/// POST /v1/auth/signup
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> CreatedResult<user::Model> {
    let profile = auth::sign_up(&state.db, &state.policy, request).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /v1/auth/signin
pub async fn sign_in(State(state): State<AppState>, Json(request): Json<SignInRequest>) -> HandlerResult<SessionInfo> {
    let session = auth::sign_in(&state.db, &state.policy, &request.email, &request.password).await?;
    Ok(Json(session))
}

/// POST /v1/auth/signout
pub async fn sign_out(State(state): State<AppState>, caller: Caller) -> EmptyResult {
    auth::sign_out(&state.db, &caller.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/auth/session
pub async fn session(MaybeCaller(caller): MaybeCaller) -> Json<SessionView> {
    let role = caller.as_ref().map(|u| u.role);
    let redirect = guards::redirect_authenticated(caller.as_ref().map(|u| Some(u.role)));
    Json(SessionView {
        user: caller,
        role,
        redirect,
    })
}

/// PUT /v1/auth/profile-photo?fileName=...
///
/// The request body is the raw image.
pub async fn upload_profile_photo(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> HandlerResult<UploadResponse> {
    check_upload(&body, state.settings.storage.max_upload_bytes)?;
    let path = storage::profile_photo_path(&caller.user.id, &query.file_name)?;
    state.storage.put(&path, &body).await?;
    auth::set_photo_url(&state.db, &caller.user.id, &path).await?;
    Ok(Json(UploadResponse { path }))
}
