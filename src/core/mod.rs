//! Core - constants, network selection and wallet value types

pub mod keys;
pub mod network;
pub mod types;

pub use network::{BackendCatalog, NetworkSelection, SENTINEL_URL};
pub use types::{BalanceSnapshot, BuiltTx, Confirmation, Direction, TransactionRecord, Txid};
