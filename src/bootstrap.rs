use tracing::info;

use crate::config::GenesisConfig;
use crate::error::LedgerError;
use crate::ledger::{finish, AccountStore, UnitOfWork, UserStore};
use crate::state::AppState;

/// Creates the genesis owner and account if they are missing. Safe to run on
/// every start.
pub async fn seed_genesis(st: &AppState) -> Result<(), LedgerError> {
    let mut uow = st.store.begin().await?;
    let result = ensure_genesis(uow.as_mut(), &st.config.genesis).await;
    finish(uow, result).await
}

async fn ensure_genesis(
    uow: &mut dyn UnitOfWork,
    genesis: &GenesisConfig,
) -> Result<(), LedgerError> {
    let owner = match uow.user_by_email(&genesis.owner_email).await? {
        Some(user) => user,
        None => uow.create_user(&genesis.owner_email).await?,
    };

    let existing = uow
        .resolve_accounts(std::slice::from_ref(&genesis.account_number))
        .await?;
    match existing.first() {
        Some(account) if account.user_id != owner.id => Err(LedgerError::ConstraintViolation(
            format!(
                "genesis account {} belongs to another user",
                genesis.account_number
            ),
        )),
        Some(_) => Ok(()),
        None => {
            uow.create_account(owner.id, &genesis.account_number).await?;
            info!(account_number = %genesis.account_number, "genesis account created");
            Ok(())
        }
    }
}
