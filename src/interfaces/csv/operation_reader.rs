use crate::domain::command::{Command, Credentials};
use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Auth,
    Send,
    Buy,
}

/// One row of an operations file: `type, employee, password, target, amount`.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone)]
pub struct OperationRecord {
    pub r#type: OperationType,
    pub employee: String,
    pub password: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
}

impl TryFrom<OperationRecord> for Command {
    type Error = LedgerError;

    fn try_from(record: OperationRecord) -> Result<Self> {
        let credentials = Credentials {
            name: record.employee,
            secret: record.password,
        };
        let target = record.target.filter(|target| !target.is_empty());

        match record.r#type {
            OperationType::Auth => Ok(Command::SignIn(credentials)),
            OperationType::Send => {
                let to = target.ok_or_else(|| {
                    LedgerError::MalformedOperation("send is missing a receiver".to_string())
                })?;
                let amount = record.amount.ok_or_else(|| {
                    LedgerError::MalformedOperation("send is missing an amount".to_string())
                })?;
                Ok(Command::SendCoins {
                    credentials,
                    to,
                    amount,
                })
            }
            OperationType::Buy => {
                let item = target.ok_or_else(|| {
                    LedgerError::MalformedOperation("buy is missing an item".to_string())
                })?;
                Ok(Command::BuyItem { credentials, item })
            }
        }
    }
}

/// Reads commands from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<Command>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    /// Creates a new `OperationReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads, deserializes and validates rows.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize::<OperationRecord>()
            .map(|result| result.map_err(LedgerError::from).and_then(Command::try_from))
    }
}
