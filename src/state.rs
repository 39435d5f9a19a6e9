use std::sync::Arc;

use crate::config::{AppConfig, StoreKind};
use crate::db;
use crate::ledger::{memory::MemoryLedger, postgres::PgLedger, LedgerStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store = match config.store {
            StoreKind::Postgres => {
                let pool = db::connect(&config).await?;
                Arc::new(PgLedger::new(pool)) as Arc<dyn LedgerStore>
            }
            StoreKind::Memory => {
                tracing::warn!("using in-memory ledger; nothing survives a restart");
                Arc::new(MemoryLedger::new()) as Arc<dyn LedgerStore>
            }
        };
        Ok(Self::from_parts(store, Arc::new(config)))
    }

    pub fn from_parts(store: Arc<dyn LedgerStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    pub fn genesis_account_number(&self) -> &str {
        &self.config.genesis.account_number
    }
}
