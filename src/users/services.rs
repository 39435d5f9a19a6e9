use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::ledger::repo_types::{Account, User};
use crate::ledger::{finish, AccountStore, StoreError, UserStore, MAX_TEXT_LEN};
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.chars().count() <= MAX_TEXT_LEN && EMAIL_RE.is_match(email)
}

/// Trimmed and lowercased, or `None` if it is not a usable address.
pub(crate) fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    is_valid_email(&email).then_some(email)
}

pub async fn create_user(st: &AppState, email: &str) -> Result<User, LedgerError> {
    let email = normalize_email(email)
        .ok_or_else(|| LedgerError::InvalidRequest("invalid email".into()))?;

    let mut uow = st.store.begin().await?;
    let result = uow.create_user(&email).await.map_err(|e| match e {
        StoreError::DuplicateEmail(email) => {
            warn!(%email, "email already registered");
            LedgerError::EmailTaken(email)
        }
        other => other.into(),
    });
    let user = finish(uow, result).await?;

    info!(user_id = %user.id, email = %user.email, "user created");
    Ok(user)
}

pub async fn get_user(st: &AppState, user_id: Uuid) -> Result<User, LedgerError> {
    let mut uow = st.store.begin().await?;
    let result = uow
        .user_by_id(user_id)
        .await
        .map_err(LedgerError::from)
        .and_then(|u| u.ok_or(LedgerError::UserNotFound(user_id)));
    finish(uow, result).await
}

pub async fn accounts_for_user(st: &AppState, user_id: Uuid) -> Result<Vec<Account>, LedgerError> {
    let mut uow = st.store.begin().await?;
    let result = match uow.user_by_id(user_id).await {
        Ok(Some(_)) => uow.accounts_by_user(user_id).await.map_err(LedgerError::from),
        Ok(None) => Err(LedgerError::UserNotFound(user_id)),
        Err(e) => Err(e.into()),
    };
    finish(uow, result).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::seeded_state;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a x@y.com"));
        assert!(!is_valid_email(""));
    }

    #[tokio::test]
    async fn create_normalizes_and_rejects_duplicates() {
        let (state, _) = seeded_state().await;
        let user = create_user(&state, "  A@X.com ").await.unwrap();
        assert_eq!(user.email, "a@x.com");

        let err = create_user(&state, "a@x.com").await.unwrap_err();
        assert!(matches!(err, LedgerError::EmailTaken(e) if e == "a@x.com"));

        let err = create_user(&state, "nope").await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn overlong_email_is_rejected_before_storage() {
        let (state, ledger) = seeded_state().await;
        let users_before = ledger.snapshot().await.users.len();

        let email = format!("{}@x.com", "a".repeat(MAX_TEXT_LEN - 5));
        assert_eq!(email.len(), MAX_TEXT_LEN + 1);
        let err = create_user(&state, &email).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRequest(_)));
        assert_eq!(ledger.snapshot().await.users.len(), users_before);

        let fits = format!("{}@x.com", "a".repeat(MAX_TEXT_LEN - 6));
        create_user(&state, &fits).await.unwrap();
    }

    #[test]
    fn normalizes_email() {
        assert_eq!(normalize_email("  Bank@X.Com ").as_deref(), Some("bank@x.com"));
        assert_eq!(normalize_email("bank"), None);
    }

    #[tokio::test]
    async fn lookup_unknown_user() {
        let (state, _) = seeded_state().await;
        let id = Uuid::new_v4();
        assert!(matches!(
            get_user(&state, id).await,
            Err(LedgerError::UserNotFound(u)) if u == id
        ));
        assert!(matches!(
            accounts_for_user(&state, id).await,
            Err(LedgerError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn fetches_created_user() {
        let (state, _) = seeded_state().await;
        let user = create_user(&state, "b@x.com").await.unwrap();
        let found = get_user(&state, user.id).await.unwrap();
        assert_eq!(found.email, "b@x.com");
        assert!(accounts_for_user(&state, user.id).await.unwrap().is_empty());
    }
}
