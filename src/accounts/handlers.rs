use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{AccountResponse, AccountWithBalance, CreateAccountRequest};
use super::services;
use crate::{error::LedgerError, state::AppState};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts/:account_number", get(get_account))
}

#[instrument(skip(state))]
pub async fn create_account(
    State(state): State<AppState>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<Json<AccountResponse>, LedgerError> {
    let Json(payload) = payload?;
    let account = services::create_account(&state, payload.user_id).await?;
    Ok(Json(AccountResponse { account }))
}

#[instrument(skip(state))]
pub async fn get_account(
    State(state): State<AppState>,
    Path(account_number): Path<String>,
) -> Result<Json<AccountWithBalance>, LedgerError> {
    services::get_account(&state, &account_number).await.map(Json)
}
