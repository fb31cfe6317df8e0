//! Application layer containing the core business logic orchestration.
//!
//! [`engine::TransactionEngine`] performs transfers and purchases as atomic
//! units over a [`Storage`](crate::domain::ports::Storage) backend, using
//! per-account locks from [`locks`] to serialize work on the same account.
//! [`runner::CommandRunner`] authenticates incoming commands and feeds them
//! to the engine.

pub mod engine;
pub mod locks;
pub mod runner;
