#![allow(dead_code)]

use coinshop::application::engine::TransactionEngine;
use coinshop::domain::catalog::Catalog;
use coinshop::domain::ports::AccountStore;
use coinshop::infrastructure::in_memory::InMemoryStore;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use std::sync::Arc;

/// Argon2 memory cost small enough to keep CLI tests fast.
pub const TEST_HASH_MEMORY_KIB: &str = "64";

/// Engine over a fresh in-memory store with the merch catalog and the given
/// accounts already provisioned.
pub async fn engine_with(names: &[&str]) -> (TransactionEngine, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    for name in names {
        store.create(name, "hash").await.unwrap();
    }
    let engine = TransactionEngine::new(store.clone(), Arc::new(Catalog::merch()));
    (engine, store)
}

pub async fn balance_of(store: &InMemoryStore, name: &str) -> u64 {
    store.get(name).await.unwrap().unwrap().balance.value()
}

/// Writes an operations file with the standard header.
pub fn write_operations(path: &Path, rows: &[[&str; 5]]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["type", "employee", "password", "target", "amount"])?;
    for row in rows {
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(())
}
