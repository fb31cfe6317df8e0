use crate::application::engine::TransactionEngine;
use crate::domain::account::{Account, Balance};
use crate::domain::command::Command;
use crate::domain::ledger::LedgerEntry;
use crate::domain::ports::IdentityProviderBox;
use crate::error::Result;

/// Result of a successfully executed [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    SignedIn(Account),
    Sent { balance: Balance },
    Bought(LedgerEntry),
}

/// Authenticates commands and dispatches them to the engine.
pub struct CommandRunner {
    engine: TransactionEngine,
    identity: IdentityProviderBox,
}

impl CommandRunner {
    pub fn new(engine: TransactionEngine, identity: IdentityProviderBox) -> Self {
        Self { engine, identity }
    }

    pub fn engine(&self) -> &TransactionEngine {
        &self.engine
    }

    pub async fn execute(&self, command: Command) -> Result<CommandOutcome> {
        let credentials = command.credentials();
        match &command {
            Command::SignIn(_) => {
                let account = self
                    .identity
                    .ensure_account_exists(&credentials.name, &credentials.secret)
                    .await?;
                Ok(CommandOutcome::SignedIn(account))
            }
            Command::SendCoins { to, amount, .. } => {
                let actor = self
                    .identity
                    .authenticate(&credentials.name, &credentials.secret)
                    .await?;
                let balance = self.engine.transfer(&actor, to, *amount).await?;
                Ok(CommandOutcome::Sent { balance })
            }
            Command::BuyItem { item, .. } => {
                let actor = self
                    .identity
                    .authenticate(&credentials.name, &credentials.secret)
                    .await?;
                let entry = self.engine.purchase(&actor, item).await?;
                Ok(CommandOutcome::Bought(entry))
            }
        }
    }
}
