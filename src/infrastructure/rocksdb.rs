use crate::domain::account::{Account, Amount, Balance};
use crate::domain::ledger::{CommitBatch, CommitReceipt, LedgerEntry, Receiver};
use crate::domain::ports::{AccountStore, Storage, TransferLedger};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Column Family for storing account states, keyed by name.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for ledger entries, keyed by big-endian sequence id.
pub const CF_TRANSFERS: &str = "transfers";
/// Column Family indexing ledger entries by participant name.
pub const CF_TRANSFERS_BY_ACCOUNT: &str = "transfers_by_account";

/// A persistent store implementation using RocksDB.
///
/// Accounts and ledger entries live in separate Column Families. A commit
/// writes all of them through one `WriteBatch`, which RocksDB applies
/// atomically across families.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    /// Next ledger sequence id. Holding this lock serializes check-and-write.
    sequence: Arc<Mutex<u64>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures the required column families exist and resumes the ledger
    /// sequence after the last persisted entry.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_ACCOUNTS, CF_TRANSFERS, CF_TRANSFERS_BY_ACCOUNT]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;
        let store = Self {
            db: Arc::new(db),
            sequence: Arc::new(Mutex::new(1)),
        };

        let next_id = store.last_entry_id()?.map_or(1, |id| id + 1);
        *store.lock_sequence()? = next_id;

        Ok(store)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LedgerError::internal(format!("column family `{name}` not found")))
    }

    fn lock_sequence(&self) -> Result<MutexGuard<'_, u64>> {
        self.sequence
            .lock()
            .map_err(|_| LedgerError::internal("commit lock poisoned"))
    }

    fn last_entry_id(&self) -> Result<Option<u64>> {
        let cf = self.cf(CF_TRANSFERS)?;
        match self.db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (key, _) = item?;
                Ok(Some(decode_id(&key)?))
            }
            None => Ok(None),
        }
    }

    fn load_account(&self, name: &str) -> Result<Option<Account>> {
        let cf = self.cf(CF_ACCOUNTS)?;
        match self.db.get_cf(cf, name.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn load_entry(&self, id: u64) -> Result<LedgerEntry> {
        let cf = self.cf(CF_TRANSFERS)?;
        let bytes = self
            .db
            .get_cf(cf, id.to_be_bytes())?
            .ok_or_else(|| LedgerError::internal(format!("ledger entry {id} missing from index")))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Prefix of every index key belonging to `name`: length-prefixed so that
/// one name can never be a prefix of another's keys.
fn index_prefix(name: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(4 + name.len());
    prefix.extend_from_slice(&(name.len() as u32).to_be_bytes());
    prefix.extend_from_slice(name.as_bytes());
    prefix
}

fn index_key(name: &str, id: u64) -> Vec<u8> {
    let mut key = index_prefix(name);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn decode_id(bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LedgerError::internal("malformed ledger key"))?;
    Ok(u64::from_be_bytes(raw))
}

#[async_trait]
impl AccountStore for RocksDBStore {
    async fn get(&self, name: &str) -> Result<Option<Account>> {
        self.load_account(name)
    }

    async fn create(&self, name: &str, secret_hash: &str) -> Result<Account> {
        let account = Account::new(name, secret_hash)?;
        let _guard = self.lock_sequence()?;
        if self.load_account(name)?.is_some() {
            return Err(LedgerError::AlreadyExists(name.to_string()));
        }

        let cf = self.cf(CF_ACCOUNTS)?;
        self.db
            .put_cf(cf, account.name.as_bytes(), serde_json::to_vec(&account)?)?;
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
        let cf = self.cf(CF_ACCOUNTS)?;
        let mut accounts = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            accounts.push(serde_json::from_slice(&value)?);
        }
        Ok(accounts)
    }
}

#[async_trait]
impl TransferLedger for RocksDBStore {
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
        let cf = self.cf(CF_TRANSFERS_BY_ACCOUNT)?;
        let prefix = index_prefix(name);

        let mut entries = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix.as_slice(), Direction::Forward));
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            entries.push(self.load_entry(decode_id(&key[prefix.len()..])?)?);
        }
        Ok(entries)
    }
}

#[async_trait]
impl Storage for RocksDBStore {
    async fn commit(&self, batch: CommitBatch) -> Result<CommitReceipt> {
        let mut next_id = self.lock_sequence()?;
        let accounts = batch.stage(|name| self.load_account(name))?;

        let accounts_cf = self.cf(CF_ACCOUNTS)?;
        let transfers_cf = self.cf(CF_TRANSFERS)?;
        let index_cf = self.cf(CF_TRANSFERS_BY_ACCOUNT)?;

        let mut write = WriteBatch::default();
        for account in &accounts {
            write.put_cf(accounts_cf, account.name.as_bytes(), serde_json::to_vec(account)?);
        }

        let entries: Vec<LedgerEntry> = batch
            .into_entries()
            .into_iter()
            .zip(*next_id..)
            .map(|(pending, id)| pending.into_entry(id))
            .collect();
        for entry in &entries {
            write.put_cf(transfers_cf, entry.id.to_be_bytes(), serde_json::to_vec(entry)?);
            write.put_cf(index_cf, index_key(&entry.sender, entry.id), b"");
            if let Some(receiver) = entry.receiver.account()
                && receiver != entry.sender
            {
                write.put_cf(index_cf, index_key(receiver, entry.id), b"");
            }
        }

        self.db.write(write)?;
        *next_id += entries.len() as u64;

        Ok(CommitReceipt { accounts, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn amount(value: i64) -> Amount {
        Amount::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_ACCOUNTS).is_some());
        assert!(store.db.cf_handle(CF_TRANSFERS).is_some());
        assert!(store.db.cf_handle(CF_TRANSFERS_BY_ACCOUNT).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_account_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let account = store.create("alice", "hash").await.unwrap();
        assert_eq!(store.get("alice").await.unwrap().unwrap(), account);
        assert!(store.get("bob").await.unwrap().is_none());
        assert!(matches!(
            store.create("alice", "hash").await,
            Err(LedgerError::AlreadyExists(_))
        ));

        assert_eq!(store.apply_delta("alice", -990).await.unwrap(), Balance::new(10));
        assert!(matches!(
            store.apply_delta("alice", -11).await,
            Err(LedgerError::InsufficientFunds { .. })
        ));
        assert_eq!(store.all_accounts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rocksdb_history_does_not_leak_across_names() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        for name in ["al", "alice", "bob"] {
            store.create(name, "hash").await.unwrap();
        }

        store
            .record("alice", Receiver::Account("bob".into()), amount(5))
            .await
            .unwrap();
        store
            .record("al", Receiver::CatalogSink, amount(7))
            .await
            .unwrap();

        let al = store.history_for("al").await.unwrap();
        assert_eq!(al.len(), 1);
        assert_eq!(al[0].amount, amount(7));
        assert_eq!(store.history_for("bob").await.unwrap().len(), 1);
        assert_eq!(store.history_for("alice").await.unwrap()[0].id, 1);
    }

    #[tokio::test]
    async fn test_rocksdb_failed_commit_leaves_no_trace() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        store.create("alice", "hash").await.unwrap();

        let mut transfer = CommitBatch::new();
        transfer
            .debit("alice", amount(100))
            .credit("ghost", amount(100))
            .record("alice", Receiver::Account("ghost".into()), amount(100));
        assert!(matches!(
            store.commit(transfer).await,
            Err(LedgerError::AccountNotFound(name)) if name == "ghost"
        ));

        let mut purchase = CommitBatch::new();
        purchase
            .debit("alice", amount(5000))
            .record("alice", Receiver::CatalogSink, amount(5000))
            .grant_item("alice", "cup");
        assert!(matches!(
            store.commit(purchase).await,
            Err(LedgerError::InsufficientFunds { .. })
        ));

        let account = store.get("alice").await.unwrap().unwrap();
        assert_eq!(account.balance, Balance::new(1000));
        assert_eq!(account.inventory.quantity("cup"), 0);
        assert!(store.history_for("alice").await.unwrap().is_empty());
        assert!(store.history_for("ghost").await.unwrap().is_empty());

        let entry = store
            .record("alice", Receiver::CatalogSink, amount(1))
            .await
            .unwrap();
        assert_eq!(entry.id, 1);
    }

    #[tokio::test]
    async fn test_rocksdb_sequence_resumes_after_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            store.create("alice", "hash").await.unwrap();
            store
                .record("alice", Receiver::CatalogSink, amount(1))
                .await
                .unwrap();
            store
                .record("alice", Receiver::CatalogSink, amount(2))
                .await
                .unwrap();
        }

        let store = RocksDBStore::open(dir.path()).unwrap();
        let entry = store
            .record("alice", Receiver::CatalogSink, amount(3))
            .await
            .unwrap();
        assert_eq!(entry.id, 3);
        assert_eq!(store.history_for("alice").await.unwrap().len(), 3);
    }
}
