use super::account::{Account, InventoryItem};
use super::ledger::LedgerEntry;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedCoins {
    pub from_user: String,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentCoins {
    /// Empty for purchases.
    pub to_user: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoinHistory {
    pub received: Vec<ReceivedCoins>,
    pub sent: Vec<SentCoins>,
}

/// Balance, owned items and coin history of one employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInfo {
    pub coins: u64,
    pub inventory: Vec<InventoryItem>,
    pub coin_history: CoinHistory,
}

impl EmployeeInfo {
    /// Derives the report from an account and its ledger history.
    pub fn from_history(account: &Account, history: &[LedgerEntry]) -> Self {
        let mut coin_history = CoinHistory::default();
        for entry in history {
            if entry.sender == account.name {
                coin_history.sent.push(SentCoins {
                    to_user: entry.receiver.as_str().to_string(),
                    amount: entry.amount.value(),
                });
            } else if entry.receiver.account() == Some(account.name.as_str()) {
                coin_history.received.push(ReceivedCoins {
                    from_user: entry.sender.clone(),
                    amount: entry.amount.value(),
                });
            }
        }

        Self {
            coins: account.balance.value(),
            inventory: account.inventory.items(),
            coin_history,
        }
    }
}
