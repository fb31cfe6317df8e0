/// Name and secret presented by the caller of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub name: String,
    pub secret: String,
}

/// A request from an employee, not yet authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in, provisioning the account on first use.
    SignIn(Credentials),
    SendCoins {
        credentials: Credentials,
        to: String,
        amount: i64,
    },
    BuyItem {
        credentials: Credentials,
        item: String,
    },
}

impl Command {
    pub fn credentials(&self) -> &Credentials {
        match self {
            Command::SignIn(credentials)
            | Command::SendCoins { credentials, .. }
            | Command::BuyItem { credentials, .. } => credentials,
        }
    }
}
