use super::account::Amount;
use crate::error::{LedgerError, Result};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;

const MERCH: [(&str, i64); 10] = [
    ("t-shirt", 80),
    ("cup", 20),
    ("book", 50),
    ("pen", 10),
    ("powerbank", 200),
    ("hoody", 300),
    ("umbrella", 200),
    ("socks", 10),
    ("wallet", 50),
    ("pink-hoody", 500),
];

/// Immutable price list of purchasable items.
///
/// Built once at startup and shared behind an `Arc`; lookups take `&self`
/// only, so any number of tasks can read it concurrently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    prices: HashMap<String, Amount>,
}

impl Catalog {
    /// Builds a catalog, rejecting blank names and non-positive prices.
    pub fn new<I, S>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut prices = HashMap::new();
        for (name, price) in items {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(LedgerError::InvalidName);
            }
            prices.insert(name, Amount::new(price)?);
        }
        Ok(Self { prices })
    }

    /// The default merch price list.
    pub fn merch() -> Self {
        Self::new(MERCH).expect("merch price list is valid")
    }

    /// Loads a catalog from a JSON object mapping item names to prices.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: BTreeMap<String, i64> = serde_json::from_reader(reader)?;
        Self::new(raw)
    }

    pub fn price_of(&self, item: &str) -> Result<Amount> {
        self.prices
            .get(item)
            .copied()
            .ok_or_else(|| LedgerError::ItemNotFound(item.to_string()))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::merch()
    }
}
