// 9.0: the ledger service. one struct owns epochs, shares, layers, and the event
// log; every public operation is an atomic, serializable transaction with
// validate -> mutate -> external-transfer ordering. deterministic, no background
// mutation, no external I/O beyond the asset-ledger seam.

mod config;
mod core;
mod layers;
mod liquidity;
mod results;
mod views;

pub use config::LedgerConfig;
pub use core::Ledger;
pub use results::{ErrorClass, LedgerError};
