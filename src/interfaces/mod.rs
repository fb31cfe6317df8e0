//! Batch file adapters used by the binary.

pub mod csv;
