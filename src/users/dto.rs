use serde::{Deserialize, Serialize};

use crate::ledger::repo_types::{Account, User};

/// Request body for signup.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserAccountsResponse {
    pub accounts: Vec<Account>,
}
