use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Coins granted to every account when it is first provisioned.
pub const STARTING_BALANCE: Balance = Balance(1000);

/// A non-negative coin count held by an account.
///
/// Arithmetic goes through [`Balance::apply`], which refuses to produce a
/// negative value instead of wrapping or saturating.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Balance(pub u64);

/// A strictly positive number of coins moved by a single operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(u64);

impl Amount {
    pub fn new(value: i64) -> Result<Self> {
        if value > 0 {
            Ok(Self(value as u64))
        } else {
            Err(LedgerError::InvalidAmount(value))
        }
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Signed delta that removes this amount from a balance.
    pub fn debit(&self) -> i64 {
        -(self.0 as i64)
    }

    /// Signed delta that adds this amount to a balance.
    pub fn credit(&self) -> i64 {
        self.0 as i64
    }
}

impl TryFrom<i64> for Amount {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0 as i64
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Balance {
    pub const ZERO: Self = Self(0);

    pub fn new(coins: u64) -> Self {
        Self(coins)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Adds a signed delta, returning `None` if the result would be negative
    /// or would not fit in the balance.
    pub fn apply(self, delta: i64) -> Option<Self> {
        if delta < 0 {
            self.0.checked_sub(delta.unsigned_abs()).map(Self)
        } else {
            self.0.checked_add(delta as u64).map(Self)
        }
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One line of the derived inventory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub quantity: u32,
}

/// Items acquired by an account, keyed by catalog name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory(BTreeMap<String, u32>);

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: &str) {
        *self.0.entry(item.to_string()).or_insert(0) += 1;
    }

    pub fn quantity(&self, item: &str) -> u32 {
        self.0.get(item).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// List form used by reports, ordered by item name.
    pub fn items(&self) -> Vec<InventoryItem> {
        self.0
            .iter()
            .map(|(kind, quantity)| InventoryItem {
                kind: kind.clone(),
                quantity: *quantity,
            })
            .collect()
    }
}

/// An employee account.
///
/// `name` is the primary key and never changes. `balance` and `inventory`
/// only change through a committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    /// Credential hash, only interpreted by the identity provider.
    pub secret_hash: String,
    pub balance: Balance,
    #[serde(default)]
    pub inventory: Inventory,
}

impl Account {
    /// Builds a freshly provisioned account holding [`STARTING_BALANCE`].
    pub fn new(name: &str, secret_hash: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(LedgerError::InvalidName);
        }
        Ok(Self {
            name: name.to_string(),
            secret_hash: secret_hash.to_string(),
            balance: STARTING_BALANCE,
            inventory: Inventory::new(),
        })
    }

    /// Applies a signed delta, leaving the account untouched on failure.
    pub fn apply_delta(&mut self, delta: i64) -> Result<Balance> {
        match self.balance.apply(delta) {
            Some(balance) => {
                self.balance = balance;
                Ok(balance)
            }
            None if delta < 0 => Err(LedgerError::InsufficientFunds {
                name: self.name.clone(),
                balance: self.balance.value(),
                requested: delta.unsigned_abs(),
            }),
            None => Err(LedgerError::internal(format!(
                "balance overflow on `{}`",
                self.name
            ))),
        }
    }
}
