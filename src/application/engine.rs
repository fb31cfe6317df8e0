use crate::application::locks::AccountLocks;
use crate::domain::account::{Account, Amount, Balance};
use crate::domain::catalog::Catalog;
use crate::domain::identity::Identity;
use crate::domain::ledger::{CommitBatch, LedgerEntry, Receiver};
use crate::domain::ports::{AccountStore, Storage, StorageHandle, TransferLedger};
use crate::domain::report::EmployeeInfo;
use crate::error::{LedgerError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Tunables for [`TransactionEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Upper bound for a whole operation, lock waits included.
    pub op_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_secs(5),
        }
    }
}

/// Moves coins between accounts and into the catalog sink.
///
/// Each mutating operation runs Validate → Debit → Credit (or sink) →
/// Record → Commit. Everything after validation is staged into one
/// [`CommitBatch`] and handed to [`Storage::commit`], which is the final
/// await point of the operation: a failed, timed out or dropped operation
/// leaves no partial state behind.
///
/// Cloning is cheap and clones share storage, catalog and locks.
#[derive(Clone)]
pub struct TransactionEngine {
    storage: StorageHandle,
    catalog: Arc<Catalog>,
    locks: AccountLocks,
    config: EngineConfig,
}

impl TransactionEngine {
    /// Creates a new `TransactionEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `storage` - Backend holding accounts and the transfer ledger.
    /// * `catalog` - Price list used by purchases.
    pub fn new(storage: StorageHandle, catalog: Arc<Catalog>) -> Self {
        Self::with_config(storage, catalog, EngineConfig::default())
    }

    pub fn with_config(storage: StorageHandle, catalog: Arc<Catalog>, config: EngineConfig) -> Self {
        Self {
            storage,
            catalog,
            locks: AccountLocks::new(),
            config,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Moves `amount` coins from `actor` to `receiver` and returns the
    /// sender's new balance.
    #[instrument(skip(self, actor), fields(sender = %actor), err(level = "debug"))]
    pub async fn transfer(&self, actor: &Identity, receiver: &str, amount: i64) -> Result<Balance> {
        self.bounded(self.run_transfer(actor.name(), receiver, amount))
            .await
    }

    /// Spends the catalog price of `item` from `actor`'s balance and adds
    /// one unit of it to their inventory.
    ///
    /// Returns the ledger entry recording the purchase.
    #[instrument(skip(self, actor), fields(buyer = %actor), err(level = "debug"))]
    pub async fn purchase(&self, actor: &Identity, item: &str) -> Result<LedgerEntry> {
        self.bounded(self.run_purchase(actor.name(), item)).await
    }

    pub async fn account(&self, name: &str) -> Result<Account> {
        self.bounded(async {
            let _guards = self.locks.acquire(&[name]).await;
            self.require_account(name).await
        })
        .await
    }

    /// Every committed movement `name` took part in, oldest first.
    pub async fn history(&self, name: &str) -> Result<Vec<LedgerEntry>> {
        self.bounded(self.storage.history_for(name)).await
    }

    /// Balance, inventory and coin history of `actor` as one consistent view.
    pub async fn info(&self, actor: &Identity) -> Result<EmployeeInfo> {
        self.bounded(async {
            let _guards = self.locks.acquire(&[actor.name()]).await;
            let account = self.require_account(actor.name()).await?;
            let history = self.storage.history_for(actor.name()).await?;
            Ok(EmployeeInfo::from_history(&account, &history))
        })
        .await
    }

    async fn run_transfer(&self, sender: &str, receiver: &str, amount: i64) -> Result<Balance> {
        let amount = Amount::new(amount)?;
        if sender == receiver {
            return Err(LedgerError::SelfTransfer(sender.to_string()));
        }

        let _guards = self.locks.acquire(&[sender, receiver]).await;
        self.require_account(sender).await?;
        self.require_account(receiver).await?;

        let mut batch = CommitBatch::new();
        batch
            .debit(sender, amount)
            .credit(receiver, amount)
            .record(sender, Receiver::Account(receiver.to_string()), amount);

        let receipt = self.storage.commit(batch).await?;
        let balance = receipt
            .balance_of(sender)
            .ok_or_else(|| LedgerError::internal("commit did not return the sender"))?;

        info!(
            sender,
            receiver,
            amount = amount.value(),
            balance = balance.value(),
            "transfer committed"
        );
        Ok(balance)
    }

    async fn run_purchase(&self, buyer: &str, item: &str) -> Result<LedgerEntry> {
        let price = self.catalog.price_of(item)?;

        let _guards = self.locks.acquire(&[buyer]).await;
        self.require_account(buyer).await?;

        let mut batch = CommitBatch::new();
        batch
            .debit(buyer, price)
            .record(buyer, Receiver::CatalogSink, price)
            .grant_item(buyer, item);

        let receipt = self.storage.commit(batch).await?;
        let entry = receipt
            .entries
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::internal("commit returned no ledger entry"))?;

        info!(buyer, item, price = price.value(), entry = entry.id, "purchase committed");
        Ok(entry)
    }

    async fn require_account(&self, name: &str) -> Result<Account> {
        self.storage
            .get(name)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(name.to_string()))
    }

    async fn bounded<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.config.op_timeout, op)
            .await
            .map_err(|_| LedgerError::Timeout(self.config.op_timeout))?
    }
}
