use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::account_number::is_well_formed;
use super::repo_types::{Account, Purpose, Transaction, TransactionLine, User};
use super::{
    AccountStore, LedgerStore, StoreError, TransactionStore, UnitOfWork, UserStore,
    LINE_ACCOUNT_KEY, MAX_TEXT_LEN,
};

#[derive(Debug, Default, Clone)]
pub(crate) struct Tables {
    pub users: Vec<User>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub lines: Vec<TransactionLine>,
}

/// In-process ledger with the same constraints as the Postgres schema.
///
/// A unit of work holds the store lock for its whole lifetime and works on a
/// staged copy of the tables, so units of work are fully serialized and a
/// rollback is just dropping the copy.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn snapshot(&self) -> Tables {
        self.tables.lock().await.clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, staged }))
    }
}

fn check_width(column: &str, value: &str) -> Result<(), StoreError> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(StoreError::ConstraintViolation(format!(
            "{column} is longer than {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl UserStore for MemoryUnitOfWork {
    async fn create_user(&mut self, email: &str) -> Result<User, StoreError> {
        check_width("email", email)?;
        if self.staged.users.iter().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail(email.to_string()));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.staged.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_id(&mut self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.staged.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.staged.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl AccountStore for MemoryUnitOfWork {
    async fn create_account(
        &mut self,
        user_id: Uuid,
        account_number: &str,
    ) -> Result<Account, StoreError> {
        if !self.staged.users.iter().any(|u| u.id == user_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "user {user_id} does not exist"
            )));
        }
        if !is_well_formed(account_number) {
            return Err(StoreError::ConstraintViolation(format!(
                "malformed account number `{account_number}`"
            )));
        }
        if self
            .staged
            .accounts
            .iter()
            .any(|a| a.account_number == account_number)
        {
            return Err(StoreError::DuplicateAccountNumber(account_number.to_string()));
        }
        let now = OffsetDateTime::now_utc();
        let account = Account {
            id: Uuid::new_v4(),
            user_id,
            account_number: account_number.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.staged.accounts.push(account.clone());
        Ok(account)
    }

    async fn resolve_accounts(
        &mut self,
        account_numbers: &[String],
    ) -> Result<Vec<Account>, StoreError> {
        let mut found: Vec<Account> = self
            .staged
            .accounts
            .iter()
            .filter(|a| account_numbers.contains(&a.account_number))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        Ok(found)
    }

    async fn accounts_by_user(&mut self, user_id: Uuid) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .staged
            .accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn lock_account(&mut self, _account_id: Uuid) -> Result<(), StoreError> {
        // the unit of work already holds the whole store
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for MemoryUnitOfWork {
    async fn create_transaction(&mut self, reference: &str) -> Result<Transaction, StoreError> {
        check_width("reference", reference)?;
        if self
            .staged
            .transactions
            .iter()
            .any(|t| t.reference == reference)
        {
            return Err(StoreError::DuplicateReference(reference.to_string()));
        }
        let now = OffsetDateTime::now_utc();
        let transaction = Transaction {
            id: Uuid::new_v4(),
            reference: reference.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.staged.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn append_line(
        &mut self,
        transaction_id: Uuid,
        account_id: Uuid,
        amount: i64,
        purpose: Purpose,
    ) -> Result<TransactionLine, StoreError> {
        if amount <= 0 {
            return Err(StoreError::ConstraintViolation(format!(
                "line amount must be positive, got {amount}"
            )));
        }
        if !self.staged.transactions.iter().any(|t| t.id == transaction_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "transaction {transaction_id} does not exist"
            )));
        }
        if !self.staged.accounts.iter().any(|a| a.id == account_id) {
            return Err(StoreError::ConstraintViolation(format!(
                "account {account_id} does not exist"
            )));
        }
        if self
            .staged
            .lines
            .iter()
            .any(|l| l.transaction_id == transaction_id && l.account_id == account_id)
        {
            return Err(StoreError::ConstraintViolation(LINE_ACCOUNT_KEY.to_string()));
        }
        let now = OffsetDateTime::now_utc();
        let line = TransactionLine {
            id: Uuid::new_v4(),
            transaction_id,
            account_id,
            amount,
            purpose,
            created_at: now,
            updated_at: now,
        };
        self.staged.lines.push(line.clone());
        Ok(line)
    }

    async fn lines_for_account(
        &mut self,
        account_id: Uuid,
    ) -> Result<Vec<TransactionLine>, StoreError> {
        Ok(self
            .staged
            .lines
            .iter()
            .filter(|l| l.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn lines_for_transaction(
        &mut self,
        transaction_id: Uuid,
    ) -> Result<Vec<TransactionLine>, StoreError> {
        Ok(self
            .staged
            .lines
            .iter()
            .filter(|l| l.transaction_id == transaction_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
