//! The two privileged account endpoints, called like remote functions.

use super::HandlerResult;
use crate::{
    api::{AppState, extract::MaybeCaller},
    core::accounts::{self, AccountResponse, CreateTeacherAccount, ResetTeacherPassword},
};
use axum::{Json, extract::State};

/// POST /v1/functions/createTeacherAccount
pub async fn create_teacher_account(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
    Json(data): Json<CreateTeacherAccount>,
) -> HandlerResult<AccountResponse> {
    let response = accounts::create_teacher_account(&state.db, &state.policy, caller.as_ref(), data).await?;
    Ok(Json(response))
}

/// POST /v1/functions/resetTeacherPassword
pub async fn reset_teacher_password(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
    Json(data): Json<ResetTeacherPassword>,
) -> HandlerResult<AccountResponse> {
    let response = accounts::reset_teacher_password(&state.db, &state.policy, caller.as_ref(), data).await?;
    Ok(Json(response))
}
