use crate::domain::account::{Account, Amount, Balance};
use crate::domain::ledger::{CommitBatch, CommitReceipt, LedgerEntry, Receiver};
use crate::domain::ports::{AccountStore, Storage, TransferLedger};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    transfers: Vec<LedgerEntry>,
}

/// A thread-safe in-memory store for accounts and the transfer ledger.
///
/// Both tables sit behind one `Arc<RwLock<..>>` so a commit can update
/// balances and append ledger entries under a single write guard. Cloning
/// shares the underlying state.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn get(&self, name: &str) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(name).cloned())
    }

    async fn create(&self, name: &str, secret_hash: &str) -> Result<Account> {
        let account = Account::new(name, secret_hash)?;
        let mut state = self.state.write().await;
        if state.accounts.contains_key(name) {
            return Err(LedgerError::AlreadyExists(name.to_string()));
        }
        state.accounts.insert(account.name.clone(), account.clone());
        Ok(account)
    }

    async fn apply_delta(&self, name: &str, delta: i64) -> Result<Balance> {
        let mut batch = CommitBatch::new();
        batch.apply_delta(name, delta);
        let receipt = self.commit(batch).await?;
        receipt
            .balance_of(name)
            .ok_or_else(|| LedgerError::internal(format!("commit did not return `{name}`")))
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        let mut accounts: Vec<Account> = state.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(accounts)
    }
}

#[async_trait]
impl TransferLedger for InMemoryStore {
    async fn record(
        &self,
        sender: &str,
        receiver: Receiver,
        amount: Amount,
    ) -> Result<LedgerEntry> {
        let mut batch = CommitBatch::new();
        batch.record(sender, receiver, amount);
        let receipt = self.commit(batch).await?;
        receipt
            .entries
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::internal("commit returned no ledger entry"))
    }

    async fn history_for(&self, name: &str) -> Result<Vec<LedgerEntry>> {
        let state = self.state.read().await;
        Ok(state
            .transfers
            .iter()
            .filter(|entry| entry.involves(name))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Storage for InMemoryStore {
    async fn commit(&self, batch: CommitBatch) -> Result<CommitReceipt> {
        // No await past this point: the guard makes the batch all-or-nothing.
        let mut state = self.state.write().await;
        let accounts = batch.stage(|name| Ok(state.accounts.get(name).cloned()))?;

        let first_id = state.transfers.len() as u64 + 1;
        let entries: Vec<LedgerEntry> = batch
            .into_entries()
            .into_iter()
            .zip(first_id..)
            .map(|(pending, id)| pending.into_entry(id))
            .collect();

        for account in &accounts {
            state.accounts.insert(account.name.clone(), account.clone());
        }
        state.transfers.extend(entries.iter().cloned());

        Ok(CommitReceipt { accounts, entries })
    }
}
