use anyhow::{bail, Context};
use serde::Deserialize;

use crate::ledger::account_number::is_well_formed;
use crate::users::services::normalize_email;

pub const DEFAULT_GENESIS_ACCOUNT_NUMBER: &str = "000000000";
pub const DEFAULT_GENESIS_OWNER_EMAIL: &str = "primary@accounts.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

/// Reserved account that funds deposits; exempt from the balance check.
#[derive(Debug, Clone, Deserialize)]
pub struct GenesisConfig {
    pub account_number: String,
    pub owner_email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub genesis: GenesisConfig,
    pub account_number_attempts: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let store = match get("LEDGER_STORE").as_deref() {
            None | Some("postgres") => StoreKind::Postgres,
            Some("memory") => StoreKind::Memory,
            Some(other) => bail!("LEDGER_STORE must be `postgres` or `memory`, got `{other}`"),
        };

        let database_url = get("DATABASE_URL");
        if store == StoreKind::Postgres && database_url.is_none() {
            bail!("DATABASE_URL is required when LEDGER_STORE=postgres");
        }

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v.parse::<u32>().context("DB_MAX_CONNECTIONS")?,
            None => 10,
        };

        let raw_owner_email =
            get("GENESIS_OWNER_EMAIL").unwrap_or_else(|| DEFAULT_GENESIS_OWNER_EMAIL.into());
        let Some(owner_email) = normalize_email(&raw_owner_email) else {
            bail!("GENESIS_OWNER_EMAIL is not a valid email, got `{raw_owner_email}`");
        };
        let genesis = GenesisConfig {
            account_number: get("GENESIS_ACCOUNT_NUMBER")
                .unwrap_or_else(|| DEFAULT_GENESIS_ACCOUNT_NUMBER.into()),
            owner_email,
        };
        if !is_well_formed(&genesis.account_number) {
            bail!(
                "GENESIS_ACCOUNT_NUMBER must be nine digits, got `{}`",
                genesis.account_number
            );
        }

        let account_number_attempts = match get("ACCOUNT_NUMBER_ATTEMPTS") {
            Some(v) => v.parse::<u32>().context("ACCOUNT_NUMBER_ATTEMPTS")?,
            None => 5,
        };
        if account_number_attempts == 0 {
            bail!("ACCOUNT_NUMBER_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            store,
            database_url,
            db_max_connections,
            genesis,
            account_number_attempts,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            store: StoreKind::Memory,
            database_url: None,
            db_max_connections: 1,
            genesis: GenesisConfig {
                account_number: DEFAULT_GENESIS_ACCOUNT_NUMBER.into(),
                owner_email: DEFAULT_GENESIS_OWNER_EMAIL.into(),
            },
            account_number_attempts: 5,
        }
    }
}
