//! Domain model: accounts, the catalog, ledger entries and the ports the
//! engine talks to.

pub mod account;
pub mod catalog;
pub mod command;
pub mod identity;
pub mod ledger;
pub mod ports;
pub mod report;
