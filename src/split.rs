// 4.0 split.rs: the lazy split. converts a frozen epoch into a locked remainder
// plus a fresh rollover epoch by rewriting epoch metadata only. no per-LP balance
// is touched here; individual positions stay recorded against the original epoch
// id until that LP chooses to materialize. this keeps splits O(1) regardless of
// how many LPs hold the epoch.

use serde::{Deserialize, Serialize};

use crate::epoch::EpochStore;
use crate::types::{mul_div, EpochId};

/// What a split produced. The rollover side takes the residual of the floor
/// division, so truncation never loses a share unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitOutcome {
    pub epoch_id: EpochId,
    pub locked_shares: u128,
    pub rollover_shares: u128,
    pub rollover_epoch_id: EpochId,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SplitError {
    #[error("{0} not found")]
    EpochNotFound(EpochId),

    #[error("{0} is not frozen; only frozen epochs can be split")]
    NotFrozen(EpochId),

    #[error("{0} has already been split")]
    AlreadySplit(EpochId),

    #[error("share arithmetic overflowed splitting {0}")]
    Overflow(EpochId),
}

/// Splits a frozen epoch. Invoked only from the layer-locking path, after the
/// locked portion has been moved from `free_assets` to `locked_assets`.
///
/// `locked_shares = total_shares * locked / (free + locked)` floored; the new
/// rollover epoch receives the residual shares together with the remaining free
/// assets, and becomes the store's current epoch.
pub fn split_epoch(store: &mut EpochStore, epoch_id: EpochId) -> Result<SplitOutcome, SplitError> {
    let epoch = store
        .get(epoch_id)
        .ok_or(SplitError::EpochNotFound(epoch_id))?;

    if !epoch.frozen {
        return Err(SplitError::NotFrozen(epoch_id));
    }
    if epoch.split {
        return Err(SplitError::AlreadySplit(epoch_id));
    }

    let total = epoch.total_assets();
    let original_shares = epoch.total_shares;
    let locked_shares = if total == 0 {
        0
    } else {
        mul_div(original_shares, epoch.locked_assets, total)
            .ok_or(SplitError::Overflow(epoch_id))?
    };
    // residual absorbs rounding: rollover never loses a unit to truncation
    let rollover_shares = original_shares - locked_shares;
    let carried_free = epoch.free_assets;

    let rollover_epoch_id = store.create_epoch(rollover_shares, carried_free);

    let epoch = store
        .get_mut(epoch_id)
        .ok_or(SplitError::EpochNotFound(epoch_id))?;
    epoch.pre_split_total_shares = original_shares;
    epoch.total_shares = locked_shares;
    epoch.free_assets = 0;
    epoch.split = true;
    epoch.rollover_epoch_id = rollover_epoch_id;

    store.set_current(rollover_epoch_id);

    Ok(SplitOutcome {
        epoch_id,
        locked_shares,
        rollover_shares,
        rollover_epoch_id,
    })
}
