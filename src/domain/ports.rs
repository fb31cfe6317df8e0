use super::account::{Account, Amount, Balance};
use super::identity::Identity;
use super::ledger::{CommitBatch, CommitReceipt, LedgerEntry, Receiver};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Source of truth for account balances.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<Account>>;

    /// Inserts a new account holding the starting balance.
    ///
    /// Fails with `AlreadyExists` if the name is taken.
    async fn create(&self, name: &str, secret_hash: &str) -> Result<Account>;

    /// Atomically adds `delta` to the balance of `name`.
    ///
    /// Fails with `InsufficientFunds` and changes nothing if the result
    /// would be negative.
    async fn apply_delta(&self, name: &str, delta: i64) -> Result<Balance>;

    async fn all_accounts(&self) -> Result<Vec<Account>>;
}

/// Append-only log of committed coin movements.
#[async_trait]
pub trait TransferLedger: Send + Sync {
    async fn record(&self, sender: &str, receiver: Receiver, amount: Amount)
    -> Result<LedgerEntry>;

    /// Entries where `name` is sender or receiver, in commit order.
    async fn history_for(&self, name: &str) -> Result<Vec<LedgerEntry>>;
}

/// A backend holding both accounts and ledger, able to commit a batch
/// spanning the two atomically.
#[async_trait]
pub trait Storage: AccountStore + TransferLedger {
    /// Validates and applies every mutation in `batch`, or none of them.
    ///
    /// Implementations perform the check-and-write without yielding, so a
    /// caller dropping this future observes either the full commit or no
    /// change at all.
    async fn commit(&self, batch: CommitBatch) -> Result<CommitReceipt>;
}

pub type StorageHandle = Arc<dyn Storage>;

/// External collaborator that turns credentials into identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, name: &str, secret: &str) -> Result<Identity>;

    /// Signs in `name`, provisioning a new account on first sight.
    async fn ensure_account_exists(&self, name: &str, secret: &str) -> Result<Account>;
}

pub type IdentityProviderBox = Box<dyn IdentityProvider>;
