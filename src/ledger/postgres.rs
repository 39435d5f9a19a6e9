use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction as PgTransaction};
use tracing::debug;
use uuid::Uuid;

use super::repo_types::{Account, Purpose, Transaction, TransactionLine, TransactionLineRow, User};
use super::{
    AccountStore, LedgerStore, StoreError, TransactionStore, UnitOfWork, UserStore,
    ACCOUNT_NUMBER_KEY, TRANSACTION_REFERENCE_KEY, USER_EMAIL_KEY,
};

/// Postgres-backed ledger. Schema and store-level invariants live in
/// `migrations/`.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedger {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

pub struct PgUnitOfWork {
    tx: PgTransaction<'static, Postgres>,
}

/// Classifies a sqlx error. Data exceptions (SQLSTATE class 22) and
/// integrity failures (class 23, which also covers the append-only triggers)
/// become constraint errors; anything else is reported as the store being
/// unavailable.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let sqlx::Error::Database(db) = &err else {
        return StoreError::Unavailable(err.to_string());
    };

    let code = db.code().map(|c| c.into_owned()).unwrap_or_default();
    debug!(%code, constraint = ?db.constraint(), message = db.message(), "database error");

    if db.is_unique_violation() {
        let detail = db.message().to_string();
        return match db.constraint() {
            Some(TRANSACTION_REFERENCE_KEY) => StoreError::DuplicateReference(detail),
            Some(ACCOUNT_NUMBER_KEY) => StoreError::DuplicateAccountNumber(detail),
            Some(USER_EMAIL_KEY) => StoreError::DuplicateEmail(detail),
            _ => StoreError::ConstraintViolation(detail),
        };
    }
    if code.starts_with("22") || code.starts_with("23") {
        return StoreError::ConstraintViolation(db.message().to_string());
    }
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl UserStore for PgUnitOfWork {
    async fn create_user(&mut self, email: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email)
            VALUES ($1)
            RETURNING id, email, created_at, updated_at
            "#,
        )
        .bind(email)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match map_sqlx_error(e) {
            StoreError::DuplicateEmail(_) => StoreError::DuplicateEmail(email.to_string()),
            other => other,
        })
    }

    async fn user_by_id(&mut self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"SELECT id, email, created_at, updated_at FROM users WHERE id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)
    }

    async fn user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"SELECT id, email, created_at, updated_at FROM users WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl AccountStore for PgUnitOfWork {
    async fn create_account(
        &mut self,
        user_id: Uuid,
        account_number: &str,
    ) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (user_id, account_number)
            VALUES ($1, $2)
            RETURNING id, user_id, account_number, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(account_number)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match map_sqlx_error(e) {
            StoreError::DuplicateAccountNumber(_) => {
                StoreError::DuplicateAccountNumber(account_number.to_string())
            }
            other => other,
        })
    }

    async fn resolve_accounts(
        &mut self,
        account_numbers: &[String],
    ) -> Result<Vec<Account>, StoreError> {
        if account_numbers.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, user_id, account_number, created_at, updated_at
              FROM accounts
             WHERE account_number = ANY($1)
             ORDER BY account_number
            "#,
        )
        .bind(account_numbers)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)
    }

    async fn accounts_by_user(&mut self, user_id: Uuid) -> Result<Vec<Account>, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, user_id, account_number, created_at, updated_at
              FROM accounts
             WHERE user_id = $1
             ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)
    }

    async fn lock_account(&mut self, account_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(r#"SELECT id FROM accounts WHERE id = $1 FOR NO KEY UPDATE"#)
            .bind(account_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for PgUnitOfWork {
    async fn create_transaction(&mut self, reference: &str) -> Result<Transaction, StoreError> {
        sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (reference)
            VALUES ($1)
            RETURNING id, reference, created_at, updated_at
            "#,
        )
        .bind(reference)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match map_sqlx_error(e) {
            StoreError::DuplicateReference(_) => StoreError::DuplicateReference(reference.to_string()),
            other => other,
        })
    }

    async fn append_line(
        &mut self,
        transaction_id: Uuid,
        account_id: Uuid,
        amount: i64,
        purpose: Purpose,
    ) -> Result<TransactionLine, StoreError> {
        let row = sqlx::query_as::<_, TransactionLineRow>(
            r#"
            INSERT INTO transaction_lines (transaction_id, account_id, amount, purpose)
            VALUES ($1, $2, $3, $4)
            RETURNING id, transaction_id, account_id, amount, purpose, created_at, updated_at
            "#,
        )
        .bind(transaction_id)
        .bind(account_id)
        .bind(amount)
        .bind(purpose.as_str())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        row.try_into()
    }

    async fn lines_for_account(
        &mut self,
        account_id: Uuid,
    ) -> Result<Vec<TransactionLine>, StoreError> {
        let rows = sqlx::query_as::<_, TransactionLineRow>(
            r#"
            SELECT id, transaction_id, account_id, amount, purpose, created_at, updated_at
              FROM transaction_lines
             WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        rows.into_iter().map(TransactionLine::try_from).collect()
    }

    async fn lines_for_transaction(
        &mut self,
        transaction_id: Uuid,
    ) -> Result<Vec<TransactionLine>, StoreError> {
        let rows = sqlx::query_as::<_, TransactionLineRow>(
            r#"
            SELECT id, transaction_id, account_id, amount, purpose, created_at, updated_at
              FROM transaction_lines
             WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        rows.into_iter().map(TransactionLine::try_from).collect()
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(map_sqlx_error)
    }
}

/// These run against a real database: `DATABASE_URL=... cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    async fn ledger() -> (PgPool, PgLedger) {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect");
        sqlx::migrate!("./migrations").run(&pool).await.expect("migrate");
        (pool.clone(), PgLedger::new(pool))
    }

    fn unique(prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::new_v4())
    }

    async fn committed_line(store: &PgLedger) -> TransactionLine {
        let mut uow = store.begin().await.unwrap();
        let user = uow.create_user(&format!("{}@x.com", unique("pg"))).await.unwrap();
        let n1 = format!("{:09}", rand::random::<u32>() % 1_000_000_000);
        let n2 = format!("{:09}", rand::random::<u32>() % 1_000_000_000);
        let a = uow.create_account(user.id, &n1).await.unwrap();
        let b = uow.create_account(user.id, &n2).await.unwrap();
        let txn = uow.create_transaction(&unique("ref")).await.unwrap();
        let line = uow.append_line(txn.id, a.id, 500, Purpose::Debit).await.unwrap();
        uow.append_line(txn.id, b.id, 500, Purpose::Credit).await.unwrap();
        uow.commit().await.unwrap();
        line
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn raw_update_of_a_line_is_rejected() {
        let (pool, store) = ledger().await;
        let line = committed_line(&store).await;

        let err = sqlx::query("UPDATE transaction_lines SET amount = 1 WHERE id = $1")
            .bind(line.id)
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(map_sqlx_error(err), StoreError::ConstraintViolation(_)));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn raw_delete_of_a_line_is_rejected() {
        let (pool, store) = ledger().await;
        let line = committed_line(&store).await;

        let err = sqlx::query("DELETE FROM transaction_lines WHERE id = $1")
            .bind(line.id)
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(map_sqlx_error(err), StoreError::ConstraintViolation(_)));

        let err = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(line.transaction_id)
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(map_sqlx_error(err), StoreError::ConstraintViolation(_)));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn duplicate_reference_is_classified() {
        let (_pool, store) = ledger().await;
        let reference = unique("dup");

        let mut uow = store.begin().await.unwrap();
        uow.create_transaction(&reference).await.unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let err = uow.create_transaction(&reference).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateReference(r) if r == reference));
        uow.rollback().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn non_positive_amount_is_a_constraint_violation() {
        let (_pool, store) = ledger().await;
        let line = committed_line(&store).await;

        let mut uow = store.begin().await.unwrap();
        let txn = uow.create_transaction(&unique("zero")).await.unwrap();
        let err = uow
            .append_line(txn.id, line.account_id, 0, Purpose::Credit)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn overlong_reference_is_a_constraint_violation() {
        let (_pool, store) = ledger().await;

        let mut uow = store.begin().await.unwrap();
        let err = uow
            .create_transaction(&"r".repeat(crate::ledger::MAX_TEXT_LEN + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn committed_lines_read_back_per_transaction() {
        let (_pool, store) = ledger().await;
        let line = committed_line(&store).await;

        let mut uow = store.begin().await.unwrap();
        let lines = uow.lines_for_transaction(line.transaction_id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().any(|l| l.id == line.id && l.purpose == Purpose::Debit));
        assert!(lines.iter().any(|l| l.purpose == Purpose::Credit && l.amount == line.amount));
    }
}
