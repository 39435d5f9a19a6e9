use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::repo_types::Account;

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub account: Account,
}

/// Account plus its balance, derived from the ledger at read time.
#[derive(Debug, Serialize)]
pub struct AccountWithBalance {
    pub account: Account,
    pub balance_minor: i64,
    pub balance: String, // major units, e.g. "200.00"
}
