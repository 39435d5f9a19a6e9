use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::dto::{CreateTransactionRequest, StatusResponse};
use super::services;
use crate::{error::LedgerError, state::AppState};

pub fn transaction_routes() -> Router<AppState> {
    Router::new().route("/transactions", post(create_transaction))
}

#[instrument(skip(state, payload))]
pub async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, LedgerError> {
    let Json(payload) = payload?;
    services::create_transaction(&state, payload).await?;
    Ok(Json(StatusResponse { status: "ok" }))
}
