// 9.0.2: errors and result classification for ledger operations.
//
// every public operation aborts whole with one of these; there is no partial
// mutation and no automatic retry. `class()` maps each variant onto the failure
// taxonomy callers branch on (the position engine decides whether to retry with
// different parameters).

use crate::asset::AssetError;
use crate::materialize::MaterializeError;
use crate::split::SplitError;
use crate::types::{Address, EpochId, LayerId};
use serde::{Deserialize, Serialize};

/// Coarse failure taxonomy for callers that do not care about the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Malformed input: zero address, zero or undersized amount.
    Validation,
    /// The ledger is consistent but cannot cover the request.
    InsufficientResource,
    /// The target record is not in a state that permits the operation.
    InvalidState,
    /// A materialize call skipped ahead of the LP's progress pointer.
    Sequencing,
    /// The ledger itself is inconsistent; a bug, never a caller mistake.
    Internal,
    /// Propagated failure from the external asset ledger.
    Asset,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    // -- validation --
    #[error("zero address")]
    ZeroAddress,

    #[error("amount must be positive")]
    ZeroAmount,

    #[error("deposit of {amount} is below the minimum of {minimum}")]
    AmountBelowMinimum { amount: u128, minimum: u128 },

    // -- insufficient resource --
    #[error("{0} is not a known liquidity provider")]
    UnknownProvider(Address),

    #[error("global free assets {available} cannot back {requested}")]
    InsufficientGlobalLiquidity { requested: u128, available: u128 },

    #[error("{epoch_id} holds {available} free assets, {requested} requested")]
    InsufficientEpochLiquidity {
        epoch_id: EpochId,
        requested: u128,
        available: u128,
    },

    #[error("available balance {available} cannot cover {requested}")]
    InsufficientAvailability { requested: u128, available: u128 },

    #[error("{lp} holds {held} shares in {epoch_id}, {requested} required")]
    InsufficientEpochShares {
        lp: Address,
        epoch_id: EpochId,
        requested: u128,
        held: u128,
    },

    #[error("{0} has no remaining backing to claim")]
    BackingExhausted(LayerId),

    #[error("computed allocation for {0} is zero")]
    ZeroAllocation(LayerId),

    #[error("pool asset balance {actual} is below the {required} this settlement needs")]
    Underfunded { required: u128, actual: u128 },

    // -- invalid state --
    #[error("{0} not found")]
    EpochNotFound(EpochId),

    #[error("{0} is already frozen; cannot lock from it")]
    EpochAlreadyFrozen(EpochId),

    #[error("{0} not found")]
    LayerNotFound(LayerId),

    #[error("{layer_id} is {actual}, operation requires {expected}")]
    InvalidLayerStatus {
        layer_id: LayerId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("allocation for {0} already claimed")]
    AlreadyClaimed(LayerId),

    #[error("no allocation to release for {0}")]
    NothingToRelease(LayerId),

    #[error("{0} has no claimed allocations; cannot activate")]
    NoAllocations(LayerId),

    // -- sequencing --
    #[error("materialize must target {expected}, got {requested}")]
    MaterializeOutOfOrder {
        expected: EpochId,
        requested: EpochId,
    },

    // -- internal --
    #[error("share arithmetic overflowed")]
    ArithmeticOverflow,

    // -- wrapped collaborator/component errors --
    #[error("split error: {0}")]
    Split(#[from] SplitError),

    #[error("materialize error: {0}")]
    Materialize(#[from] MaterializeError),

    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
}

impl LedgerError {
    pub fn class(&self) -> ErrorClass {
        use LedgerError::*;
        match self {
            ZeroAddress | ZeroAmount | AmountBelowMinimum { .. } => ErrorClass::Validation,

            UnknownProvider(_)
            | InsufficientGlobalLiquidity { .. }
            | InsufficientEpochLiquidity { .. }
            | InsufficientAvailability { .. }
            | InsufficientEpochShares { .. }
            | BackingExhausted(_)
            | ZeroAllocation(_)
            | Underfunded { .. } => ErrorClass::InsufficientResource,

            EpochNotFound(_)
            | EpochAlreadyFrozen(_)
            | LayerNotFound(_)
            | InvalidLayerStatus { .. }
            | AlreadyClaimed(_)
            | NothingToRelease(_)
            | NoAllocations(_) => ErrorClass::InvalidState,

            MaterializeOutOfOrder { .. } => ErrorClass::Sequencing,

            ArithmeticOverflow => ErrorClass::Internal,

            Split(e) => match e {
                SplitError::Overflow(_) => ErrorClass::Internal,
                _ => ErrorClass::InvalidState,
            },
            Materialize(e) => match e {
                MaterializeError::EpochNotFound(_) => ErrorClass::InvalidState,
                _ => ErrorClass::Internal,
            },
            Asset(_) => ErrorClass::Asset,
        }
    }
}
