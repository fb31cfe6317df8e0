use crate::domain::account::Account;
use crate::domain::report::EmployeeInfo;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct BalanceRow<'a> {
    name: &'a str,
    balance: u64,
}

#[derive(Debug, Serialize)]
struct InfoRow<'a> {
    name: &'a str,
    info: &'a EmployeeInfo,
}

/// Writes the final account report.
pub struct AccountWriter<W: Write> {
    out: W,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Writes `name,balance` rows in the order given.
    pub fn write_accounts(&mut self, accounts: &[Account]) -> Result<()> {
        let mut writer = csv::Writer::from_writer(&mut self.out);
        for account in accounts {
            writer.serialize(BalanceRow {
                name: &account.name,
                balance: account.balance.value(),
            })?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Writes a pretty JSON array of `{name, info}` objects.
    pub fn write_infos(&mut self, infos: &[(String, EmployeeInfo)]) -> Result<()> {
        let rows: Vec<InfoRow<'_>> = infos
            .iter()
            .map(|(name, info)| InfoRow { name, info })
            .collect();
        serde_json::to_writer_pretty(&mut self.out, &rows)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
