use tracing::{info, warn};
use uuid::Uuid;

use super::dto::AccountWithBalance;
use crate::error::LedgerError;
use crate::ledger::account_number::{generate_account_number, is_well_formed};
use crate::ledger::balance::account_balance;
use crate::ledger::money::format_major_units;
use crate::ledger::repo_types::Account;
use crate::ledger::{finish, AccountStore, StoreError, UnitOfWork, UserStore};
use crate::state::AppState;

enum Attempt {
    Created(Account),
    Collision,
}

/// Opens an account with a fresh random number for an existing user.
pub async fn create_account(st: &AppState, user_id: Uuid) -> Result<Account, LedgerError> {
    create_account_with(st, user_id, generate_account_number).await
}

/// Each attempt runs in its own unit of work, so a collision never poisons
/// the next try.
pub(crate) async fn create_account_with(
    st: &AppState,
    user_id: Uuid,
    mut next_number: impl FnMut() -> String + Send,
) -> Result<Account, LedgerError> {
    let attempts = st.config.account_number_attempts;
    for attempt in 1..=attempts {
        let account_number = next_number();
        let mut uow = st.store.begin().await?;
        match insert_account(uow.as_mut(), user_id, &account_number).await {
            Ok(Attempt::Created(account)) => {
                uow.commit().await?;
                info!(%user_id, account_number = %account.account_number, "account created");
                return Ok(account);
            }
            Ok(Attempt::Collision) => {
                warn!(%user_id, %account_number, attempt, "account number collision");
                if let Err(e) = uow.rollback().await {
                    warn!(error = %e, "rollback failed");
                }
            }
            Err(e) => return finish(uow, Err(e)).await,
        }
    }
    Err(LedgerError::ConstraintViolation(format!(
        "no free account number after {attempts} attempts"
    )))
}

async fn insert_account(
    uow: &mut dyn UnitOfWork,
    user_id: Uuid,
    account_number: &str,
) -> Result<Attempt, LedgerError> {
    if uow.user_by_id(user_id).await?.is_none() {
        return Err(LedgerError::UserNotFound(user_id));
    }
    match uow.create_account(user_id, account_number).await {
        Ok(account) => Ok(Attempt::Created(account)),
        Err(StoreError::DuplicateAccountNumber(_)) => Ok(Attempt::Collision),
        Err(e) => Err(e.into()),
    }
}

pub async fn get_account(
    st: &AppState,
    account_number: &str,
) -> Result<AccountWithBalance, LedgerError> {
    let account_number = account_number.trim();
    if !is_well_formed(account_number) {
        return Err(LedgerError::InvalidRequest(
            "account number must be nine digits".into(),
        ));
    }

    let mut uow = st.store.begin().await?;
    let result = load_with_balance(uow.as_mut(), account_number).await;
    finish(uow, result).await
}

async fn load_with_balance(
    uow: &mut dyn UnitOfWork,
    account_number: &str,
) -> Result<AccountWithBalance, LedgerError> {
    let account = uow
        .resolve_accounts(&[account_number.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))?;
    let balance_minor = account_balance(uow, account.id).await?;
    Ok(AccountWithBalance {
        account,
        balance_minor,
        balance: format_major_units(balance_minor),
    })
}
