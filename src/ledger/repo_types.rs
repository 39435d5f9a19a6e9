use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::StoreError;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Ledger account; `account_number` is the nine-digit external identifier.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_number: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub reference: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Debit,
    Credit,
}

impl Purpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Purpose::Debit => "debit",
            Purpose::Credit => "credit",
        }
    }
}

impl std::str::FromStr for Purpose {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(Purpose::Debit),
            "credit" => Ok(Purpose::Credit),
            other => Err(StoreError::ConstraintViolation(format!(
                "unknown line purpose `{other}`"
            ))),
        }
    }
}

/// Raw `transaction_lines` row; `purpose` is stored as text.
#[derive(Debug, FromRow)]
pub struct TransactionLineRow {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub amount: i64,
    pub purpose: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLine {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub amount: i64, // minor units
    pub purpose: Purpose,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<TransactionLineRow> for TransactionLine {
    type Error = StoreError;

    fn try_from(r: TransactionLineRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            transaction_id: r.transaction_id,
            account_id: r.account_id,
            amount: r.amount,
            purpose: r.purpose.parse()?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
