// liquidity-ledger: epoch-based liquidity ledger for a leveraged trading protocol.
// accounting-first architecture: exact integer share math takes priority.
// all computation is deterministic with no external I/O beyond the asset seam.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x types.rs: primitives: Address, EpochId, LayerId, PRECISION, mul_div
//   2.x epoch.rs: epoch records + arena, current pointer, free-asset aggregate
//   3.x shares.rs: per-LP scaled balances, aggregates, materialize pointer
//   4.x split.rs: lazy epoch split (locked remainder + rollover epoch)
//   5.x materialize.rs: bounded per-LP split-chain walk
//   6.x layer.rs: trade layer records and allocation slices
//   7.x asset.rs: external asset-ledger seam (mocked for tests/sim)
//   8.x events.rs: state transition events for audit
//   9.x ledger/: the service: deposits, withdrawals, layers, views

// core ledger modules
pub mod epoch;
pub mod events;
pub mod layer;
pub mod ledger;
pub mod materialize;
pub mod shares;
pub mod split;
pub mod types;

// integration modules
pub mod asset;

// re exports for convenience
pub use asset::{AssetError, AssetLedger, MockAsset};
pub use epoch::{Epoch, EpochStore};
pub use events::*;
pub use layer::{Allocation, LayerStatus, TradeLayer};
pub use ledger::{ErrorClass, Ledger, LedgerConfig, LedgerError};
pub use materialize::{MaterializeError, MaterializeOutcome, MaterializeStep, MAX_MATERIALIZE_HOPS};
pub use shares::{LpAccount, ShareLedger};
pub use split::{SplitError, SplitOutcome};
pub use types::*;
