//! Persistence capabilities of the ledger.
//!
//! Every operation runs inside a [`UnitOfWork`] obtained from a
//! [`LedgerStore`]. Nothing a unit of work does is visible to anyone else
//! until [`UnitOfWork::commit`] returns `Ok`, and dropping or rolling back a
//! unit of work discards all of it.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::error::LedgerError;

pub mod account_number;
pub mod balance;
pub mod memory;
pub mod money;
pub mod postgres;
pub mod repo_types;

use repo_types::{Account, Purpose, Transaction, TransactionLine, User};

pub const USER_EMAIL_KEY: &str = "users_email_key";
pub const ACCOUNT_NUMBER_KEY: &str = "accounts_account_number_key";
pub const TRANSACTION_REFERENCE_KEY: &str = "transactions_reference_key";
pub const LINE_ACCOUNT_KEY: &str = "transaction_lines_transaction_id_account_id_key";

/// Width of the `VARCHAR` columns holding emails and references.
pub const MAX_TEXT_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transaction reference `{0}` already exists")]
    DuplicateReference(String),
    #[error("account number `{0}` already exists")]
    DuplicateAccountNumber(String),
    #[error("email `{0}` already exists")]
    DuplicateEmail(String),
    #[error("constraint violated: {0}")]
    ConstraintViolation(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait UserStore: Send {
    async fn create_user(&mut self, email: &str) -> Result<User, StoreError>;
    async fn user_by_id(&mut self, user_id: Uuid) -> Result<Option<User>, StoreError>;
    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait AccountStore: Send {
    /// Fails with `DuplicateAccountNumber` when the number is taken and with
    /// `ConstraintViolation` when `user_id` does not exist.
    async fn create_account(
        &mut self,
        user_id: Uuid,
        account_number: &str,
    ) -> Result<Account, StoreError>;

    /// Returns the accounts matching `account_numbers`. Unknown numbers are
    /// simply absent, so callers compare the returned length.
    async fn resolve_accounts(
        &mut self,
        account_numbers: &[String],
    ) -> Result<Vec<Account>, StoreError>;

    async fn accounts_by_user(&mut self, user_id: Uuid) -> Result<Vec<Account>, StoreError>;

    /// Takes an exclusive lock on the account row until the unit of work ends.
    async fn lock_account(&mut self, account_id: Uuid) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TransactionStore: Send {
    /// Fails with `DuplicateReference` when `reference` was already used.
    async fn create_transaction(&mut self, reference: &str) -> Result<Transaction, StoreError>;

    /// Appends one side of a transaction. Lines can never be changed or
    /// removed afterwards.
    async fn append_line(
        &mut self,
        transaction_id: Uuid,
        account_id: Uuid,
        amount: i64,
        purpose: Purpose,
    ) -> Result<TransactionLine, StoreError>;

    async fn lines_for_account(
        &mut self,
        account_id: Uuid,
    ) -> Result<Vec<TransactionLine>, StoreError>;

    async fn lines_for_transaction(
        &mut self,
        transaction_id: Uuid,
    ) -> Result<Vec<TransactionLine>, StoreError>;
}

#[async_trait]
pub trait UnitOfWork: UserStore + AccountStore + TransactionStore {
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;
}

/// Ends a unit of work: commits when `result` is `Ok`, rolls back otherwise.
/// A failed commit replaces the result; a failed rollback is only logged.
pub async fn finish<T>(
    uow: Box<dyn UnitOfWork>,
    result: Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = uow.rollback().await {
                warn!(error = %rollback, cause = %e, "rollback failed");
            }
            Err(e)
        }
    }
}
