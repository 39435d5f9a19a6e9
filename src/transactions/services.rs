//! Transaction orchestration.
//!
//! A request is validated and normalized without touching storage, then
//! applied inside a single unit of work: resolve both accounts, record the
//! transaction under its reference, check the source balance (skipped for
//! the genesis account) and append the debit and credit lines. Any failure
//! rolls the whole unit of work back.

use std::collections::BTreeSet;

use tracing::{error, info, warn};

use super::dto::{CreateTransactionRequest, Transfer};
use crate::error::LedgerError;
use crate::ledger::balance::account_balance;
use crate::ledger::repo_types::{Purpose, Transaction};
use crate::ledger::{finish, AccountStore, StoreError, TransactionStore, UnitOfWork};
use crate::state::AppState;

pub async fn create_transaction(
    st: &AppState,
    req: CreateTransactionRequest,
) -> Result<Transaction, LedgerError> {
    let genesis = st.genesis_account_number();
    let transfer = req.validate(genesis)?;

    let mut uow = st.store.begin().await?;
    let result = apply_transfer(uow.as_mut(), genesis, &transfer).await;
    match finish(uow, result).await {
        Ok(transaction) => {
            info!(
                transaction_id = %transaction.id,
                reference = %transfer.reference,
                from = %transfer.from,
                to = %transfer.to,
                amount = transfer.amount,
                "transaction committed"
            );
            Ok(transaction)
        }
        Err(e) => {
            if e.status_code().is_server_error() {
                error!(error = %e, reference = %transfer.reference, "transaction failed");
            } else {
                warn!(error = %e, reference = %transfer.reference, "transaction rejected");
            }
            Err(e)
        }
    }
}

async fn apply_transfer(
    uow: &mut dyn UnitOfWork,
    genesis: &str,
    t: &Transfer,
) -> Result<Transaction, LedgerError> {
    // a set, so that from == to resolves to a single account and is rejected
    let numbers: Vec<String> = BTreeSet::from([t.from.clone(), t.to.clone()])
        .into_iter()
        .collect();
    let accounts = uow.resolve_accounts(&numbers).await?;
    if accounts.len() != 2 {
        return Err(LedgerError::AccountResolutionFailed);
    }
    let source = accounts
        .iter()
        .find(|a| a.account_number == t.from)
        .ok_or(LedgerError::AccountResolutionFailed)?;
    let destination = accounts
        .iter()
        .find(|a| a.account_number == t.to)
        .ok_or(LedgerError::AccountResolutionFailed)?;

    let transaction = uow
        .create_transaction(&t.reference)
        .await
        .map_err(|e| match e {
            StoreError::DuplicateReference(reference) => LedgerError::DuplicateTransaction(reference),
            other => other.into(),
        })?;

    if t.from != genesis {
        // serializes concurrent debits of the same account
        uow.lock_account(source.id).await?;
        let balance = account_balance(&mut *uow, source.id).await?;
        if balance < t.amount {
            return Err(LedgerError::InsufficientFunds {
                balance,
                amount: t.amount,
            });
        }
    }

    uow.append_line(transaction.id, source.id, t.amount, Purpose::Debit)
        .await
        .map_err(LedgerError::LineCreationFailed)?;
    uow.append_line(transaction.id, destination.id, t.amount, Purpose::Credit)
        .await
        .map_err(LedgerError::LineCreationFailed)?;

    Ok(transaction)
}
