//! Error taxonomy of the ledger services and its HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::StoreError;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or missing input; storage is never touched.
    #[error("{0}")]
    InvalidRequest(String),

    #[error("user {0} not found")]
    UserNotFound(Uuid),

    #[error("account {0} not found")]
    AccountNotFound(String),

    #[error("email already taken")]
    EmailTaken(String),

    /// An account number is unknown, or source and destination are the same.
    #[error("could not resolve source and destination accounts")]
    AccountResolutionFailed,

    /// The reference was already applied; retrying verbatim will not help.
    #[error("duplicate transaction request")]
    DuplicateTransaction(String),

    #[error("insufficient balance")]
    InsufficientFunds { balance: i64, amount: i64 },

    #[error("constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("failed to create transaction line: {0}")]
    LineCreationFailed(#[source] StoreError),

    #[error("balance of account {0} is out of range")]
    BalanceOverflow(Uuid),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => LedgerError::StoreUnavailable(msg),
            StoreError::DuplicateReference(_)
            | StoreError::DuplicateAccountNumber(_)
            | StoreError::DuplicateEmail(_)
            | StoreError::ConstraintViolation(_) => LedgerError::ConstraintViolation(e.to_string()),
        }
    }
}

impl From<JsonRejection> for LedgerError {
    fn from(rejection: JsonRejection) -> Self {
        LedgerError::InvalidRequest(rejection.body_text())
    }
}

impl LedgerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::InvalidRequest(_) | LedgerError::AccountResolutionFailed => {
                StatusCode::BAD_REQUEST
            }
            LedgerError::UserNotFound(_) | LedgerError::AccountNotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::EmailTaken(_) | LedgerError::DuplicateTransaction(_) => StatusCode::CONFLICT,
            LedgerError::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::ConstraintViolation(_)
            | LedgerError::LineCreationFailed(_)
            | LedgerError::BalanceOverflow(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // server faults keep their details in the logs only
        let message = if status.is_server_error() {
            match self {
                LedgerError::StoreUnavailable(_) => "service temporarily unavailable".to_string(),
                _ => "internal error".to_string(),
            }
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
