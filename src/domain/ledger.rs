use super::account::{Account, Amount, Balance};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Destination of a coin movement.
///
/// Purchases move coins out of circulation into the catalog sink, which is
/// stored and serialized as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Receiver {
    Account(String),
    CatalogSink,
}

impl Receiver {
    pub fn as_str(&self) -> &str {
        match self {
            Receiver::Account(name) => name,
            Receiver::CatalogSink => "",
        }
    }

    pub fn account(&self) -> Option<&str> {
        match self {
            Receiver::Account(name) => Some(name),
            Receiver::CatalogSink => None,
        }
    }
}

impl From<&str> for Receiver {
    fn from(name: &str) -> Self {
        if name.is_empty() {
            Receiver::CatalogSink
        } else {
            Receiver::Account(name.to_string())
        }
    }
}

impl fmt::Display for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Receiver::Account(name) => f.write_str(name),
            Receiver::CatalogSink => f.write_str("<catalog>"),
        }
    }
}

impl Serialize for Receiver {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Receiver {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Receiver::from(name.as_str()))
    }
}

/// One committed coin movement. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Store-assigned sequence number, increasing in commit order.
    pub id: u64,
    pub sender: String,
    pub receiver: Receiver,
    pub amount: Amount,
}

impl LedgerEntry {
    pub fn involves(&self, name: &str) -> bool {
        self.sender == name || self.receiver.account() == Some(name)
    }

    pub fn is_purchase(&self) -> bool {
        self.receiver == Receiver::CatalogSink
    }
}

/// A ledger entry waiting for its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub sender: String,
    pub receiver: Receiver,
    pub amount: Amount,
}

impl PendingEntry {
    pub fn into_entry(self, id: u64) -> LedgerEntry {
        LedgerEntry {
            id,
            sender: self.sender,
            receiver: self.receiver,
            amount: self.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BalanceDelta {
    name: String,
    delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ItemGrant {
    name: String,
    item: String,
}

/// Mutations that a store must apply all together or not at all.
///
/// The engine stages debit, credit, item grants and ledger entries here;
/// a store validates the whole batch against current state inside a single
/// critical section and only then writes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitBatch {
    deltas: Vec<BalanceDelta>,
    grants: Vec<ItemGrant>,
    entries: Vec<PendingEntry>,
}

impl CommitBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_delta(&mut self, name: &str, delta: i64) -> &mut Self {
        self.deltas.push(BalanceDelta {
            name: name.to_string(),
            delta,
        });
        self
    }

    pub fn debit(&mut self, name: &str, amount: Amount) -> &mut Self {
        self.apply_delta(name, amount.debit())
    }

    pub fn credit(&mut self, name: &str, amount: Amount) -> &mut Self {
        self.apply_delta(name, amount.credit())
    }

    pub fn grant_item(&mut self, name: &str, item: &str) -> &mut Self {
        self.grants.push(ItemGrant {
            name: name.to_string(),
            item: item.to_string(),
        });
        self
    }

    pub fn record(&mut self, sender: &str, receiver: Receiver, amount: Amount) -> &mut Self {
        self.entries.push(PendingEntry {
            sender: sender.to_string(),
            receiver,
            amount,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty() && self.grants.is_empty() && self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PendingEntry] {
        &self.entries
    }

    /// Consumes the batch, yielding the pending ledger entries in order.
    pub fn into_entries(self) -> Vec<PendingEntry> {
        self.entries
    }

    /// Computes the post-commit state of every account the batch touches.
    ///
    /// `load` returns the currently committed account. Deltas are applied in
    /// staging order; the first missing account or negative balance aborts
    /// with nothing returned, so the caller writes either everything or
    /// nothing. Accounts referenced only by ledger entries must exist but are
    /// not returned.
    pub fn stage<F>(&self, mut load: F) -> Result<Vec<Account>>
    where
        F: FnMut(&str) -> Result<Option<Account>>,
    {
        let mut touched: BTreeMap<String, Account> = BTreeMap::new();

        for BalanceDelta { name, delta } in &self.deltas {
            let account = Self::working_copy(&mut touched, &mut load, name)?;
            account.apply_delta(*delta)?;
        }

        for ItemGrant { name, item } in &self.grants {
            let account = Self::working_copy(&mut touched, &mut load, name)?;
            account.inventory.add(item);
        }

        for entry in &self.entries {
            for name in [Some(entry.sender.as_str()), entry.receiver.account()]
                .into_iter()
                .flatten()
            {
                if !touched.contains_key(name) && load(name)?.is_none() {
                    return Err(LedgerError::AccountNotFound(name.to_string()));
                }
            }
        }

        Ok(touched.into_values().collect())
    }

    fn working_copy<'a, F>(
        touched: &'a mut BTreeMap<String, Account>,
        load: &mut F,
        name: &str,
    ) -> Result<&'a mut Account>
    where
        F: FnMut(&str) -> Result<Option<Account>>,
    {
        if !touched.contains_key(name) {
            let account = load(name)?.ok_or_else(|| LedgerError::AccountNotFound(name.to_string()))?;
            touched.insert(name.to_string(), account);
        }
        touched
            .get_mut(name)
            .ok_or_else(|| LedgerError::AccountNotFound(name.to_string()))
    }
}

/// What a successful commit wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    pub accounts: Vec<Account>,
    pub entries: Vec<LedgerEntry>,
}

impl CommitReceipt {
    pub fn balance_of(&self, name: &str) -> Option<Balance> {
        self.accounts
            .iter()
            .find(|account| account.name == name)
            .map(|account| account.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn accounts(balances: &[(&str, u64)]) -> HashMap<String, Account> {
        balances
            .iter()
            .map(|(name, balance)| {
                let mut account = Account::new(name, "hash").unwrap();
                account.balance = Balance::new(*balance);
                (name.to_string(), account)
            })
            .collect()
    }

    fn amount(value: i64) -> Amount {
        Amount::new(value).unwrap()
    }

    #[test]
    fn test_receiver_serializes_sink_as_empty_string() {
        let sink = serde_json::to_string(&Receiver::CatalogSink).unwrap();
        assert_eq!(sink, r#""""#);

        let parsed: Receiver = serde_json::from_str(r#""bob""#).unwrap();
        assert_eq!(parsed, Receiver::Account("bob".into()));
        let parsed: Receiver = serde_json::from_str(r#""""#).unwrap();
        assert_eq!(parsed, Receiver::CatalogSink);
    }

    #[test]
    fn test_entry_involves_both_participants() {
        let entry = PendingEntry {
            sender: "alice".into(),
            receiver: Receiver::Account("bob".into()),
            amount: amount(10),
        }
        .into_entry(1);

        assert!(entry.involves("alice"));
        assert!(entry.involves("bob"));
        assert!(!entry.involves("carol"));
        assert!(!entry.involves(""));
        assert!(!entry.is_purchase());
    }

    #[test]
    fn test_stage_transfer() {
        let state = accounts(&[("alice", 1000), ("bob", 1000)]);
        let mut batch = CommitBatch::new();
        batch
            .debit("alice", amount(100))
            .credit("bob", amount(100))
            .record("alice", Receiver::Account("bob".into()), amount(100));

        let staged = batch.stage(|name| Ok(state.get(name).cloned())).unwrap();
        assert_eq!(staged.len(), 2);
        assert_eq!(staged[0].balance, Balance::new(900));
        assert_eq!(staged[1].balance, Balance::new(1100));
    }

    #[test]
    fn test_stage_insufficient_funds() {
        let state = accounts(&[("alice", 50)]);
        let mut batch = CommitBatch::new();
        batch.debit("alice", amount(80)).grant_item("alice", "t-shirt");

        let result = batch.stage(|name| Ok(state.get(name).cloned()));
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds { balance: 50, requested: 80, .. })
        ));
    }

    #[test]
    fn test_stage_missing_receiver_fails_whole_batch() {
        let state = accounts(&[("alice", 1000)]);
        let mut batch = CommitBatch::new();
        batch.debit("alice", amount(10)).credit("ghost", amount(10));

        let result = batch.stage(|name| Ok(state.get(name).cloned()));
        assert!(matches!(result, Err(LedgerError::AccountNotFound(name)) if name == "ghost"));
    }

    #[test]
    fn test_stage_accumulates_deltas_on_same_account() {
        let state = accounts(&[("alice", 100)]);
        let mut batch = CommitBatch::new();
        batch.apply_delta("alice", -60).apply_delta("alice", -60);

        assert!(batch.stage(|name| Ok(state.get(name).cloned())).is_err());
    }

    #[test]
    fn test_stage_entry_only_checks_participants() {
        let state = accounts(&[("alice", 100)]);
        let mut batch = CommitBatch::new();
        batch.record("alice", Receiver::CatalogSink, amount(5));
        assert!(batch.stage(|name| Ok(state.get(name).cloned())).unwrap().is_empty());

        let mut batch = CommitBatch::new();
        batch.record("alice", Receiver::Account("nobody".into()), amount(5));
        assert!(matches!(
            batch.stage(|name| Ok(state.get(name).cloned())),
            Err(LedgerError::AccountNotFound(_))
        ));
    }
}
