// 5.0 materialize.rs: the deferred half of the lazy split. per LP, on demand,
// walks forward through the split chain and converts that LP's virtual rollover
// shares into concrete balances in the epochs that now exist. bounded to 10 hops
// per call so no single invocation can be made arbitrarily expensive by a long
// chain; the caller re-invokes from the returned stop point to continue.

use serde::{Deserialize, Serialize};

use crate::epoch::EpochStore;
use crate::shares::ShareLedger;
use crate::types::{mul_div, Address, EpochId};

/// Per-call hop bound on the split-chain walk.
pub const MAX_MATERIALIZE_HOPS: usize = 10;

/// One concretized split link: the LP's balance in `from_epoch` was rewritten to
/// `locked_shares` and `rollover_shares` were credited into `to_epoch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializeStep {
    pub from_epoch: EpochId,
    pub locked_shares: u128,
    pub rollover_shares: u128,
    pub to_epoch: EpochId,
}

/// Where the walk stopped and what it rewrote along the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializeOutcome {
    pub stopped_at: EpochId,
    pub steps: Vec<MaterializeStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MaterializeError {
    #[error("{0} not found")]
    EpochNotFound(EpochId),

    #[error("{0} is split but records zero pre-split shares")]
    CorruptSplitMetadata(EpochId),

    #[error("share arithmetic overflowed materializing through {0}")]
    Overflow(EpochId),
}

/// Walks the split chain for one LP starting at `from`, at most
/// [`MAX_MATERIALIZE_HOPS`] links. At each split epoch with pre-split supply `O`
/// and locked supply `L`, an LP balance `s` becomes `s * L / O` (floor) in place,
/// with the residual credited to the rollover epoch. Stops at the hop cap, the
/// end of the chain, or the first unsplit epoch, and reports the stop point so
/// the caller can advance the LP's progress pointer.
///
/// Idempotent: re-running from the stop point with no new splits rewrites
/// nothing, because the walk halts immediately on the unsplit epoch.
pub fn materialize_shares(
    store: &EpochStore,
    shares: &mut ShareLedger,
    lp: Address,
    from: EpochId,
) -> Result<MaterializeOutcome, MaterializeError> {
    let mut cursor = from;
    let mut steps = Vec::new();

    for _ in 0..MAX_MATERIALIZE_HOPS {
        let epoch = store
            .get(cursor)
            .ok_or(MaterializeError::EpochNotFound(cursor))?;

        if !epoch.split {
            break;
        }
        if epoch.pre_split_total_shares == 0 {
            // split metadata without a recorded pre-split supply signals a bug;
            // fail loudly rather than divide by zero or silently skip
            return Err(MaterializeError::CorruptSplitMetadata(cursor));
        }

        let next = epoch.rollover_epoch_id;
        let held = shares.balance(lp, cursor);
        let locked = mul_div(held, epoch.total_shares, epoch.pre_split_total_shares)
            .ok_or(MaterializeError::Overflow(cursor))?;
        let rollover = held - locked;

        shares.set_balance(lp, cursor, locked);
        shares.credit_rollover(lp, next, rollover);

        steps.push(MaterializeStep {
            from_epoch: cursor,
            locked_shares: locked,
            rollover_shares: rollover,
            to_epoch: next,
        });

        if next.is_none() {
            break;
        }
        cursor = next;
    }

    Ok(MaterializeOutcome {
        stopped_at: cursor,
        steps,
    })
}
