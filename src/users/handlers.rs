use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CreateUserRequest, UserAccountsResponse, UserResponse};
use super::services;
use crate::{error::LedgerError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", get(get_user))
        .route("/users/:id/accounts", get(list_accounts))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, LedgerError> {
    let Json(payload) = payload?;
    let user = services::create_user(&state, &payload.email).await?;
    Ok(Json(UserResponse { user }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, LedgerError> {
    let user = services::get_user(&state, id).await?;
    Ok(Json(UserResponse { user }))
}

#[instrument(skip(state))]
pub async fn list_accounts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserAccountsResponse>, LedgerError> {
    let accounts = services::accounts_for_user(&state, id).await?;
    Ok(Json(UserAccountsResponse { accounts }))
}
