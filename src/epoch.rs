// 2.0 epoch.rs: epoch records and the arena that owns them. epochs are created with
// monotonically increasing ids starting at 1 and never deleted, so historical splits
// stay auditable and virtual-projection views can walk the chain at any time.

use serde::{Deserialize, Serialize};

use crate::types::{EpochId, PRECISION};

/// A time-sliced cohort of pooled liquidity with its own share accounting.
///
/// Invariant at creation, and immediately after any split affecting the record:
/// `total_shares == PRECISION * (free_assets + locked_assets)`. Once `split` is set
/// the record is a locked remainder: `free_assets` is 0 (moved to the rollover
/// epoch) and `total_shares` counts only the locked side. `split` is never cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epoch {
    pub id: EpochId,
    /// Scaled share supply of this epoch.
    pub total_shares: u128,
    /// Unlocked assets, token units.
    pub free_assets: u128,
    /// Assets locked as trade-layer backing, token units.
    pub locked_assets: u128,
    /// Set when part of the epoch is locked for a layer; a frozen epoch no longer
    /// takes direct deposits because the current pointer moves on at split time.
    pub frozen: bool,
    /// One-way flag: this epoch has been divided into locked remainder + rollover.
    pub split: bool,
    /// Share supply recorded at the moment of the split; 0 unless `split`.
    pub pre_split_total_shares: u128,
    /// Forward link to the epoch holding the unlocked remainder; NONE until split.
    pub rollover_epoch_id: EpochId,
}

impl Epoch {
    pub fn new(id: EpochId, total_shares: u128, free_assets: u128) -> Self {
        Self {
            id,
            total_shares,
            free_assets,
            locked_assets: 0,
            frozen: false,
            split: false,
            pre_split_total_shares: 0,
            rollover_epoch_id: EpochId::NONE,
        }
    }

    pub fn total_assets(&self) -> u128 {
        self.free_assets + self.locked_assets
    }

    /// Share-supply/asset consistency at the points the ledger promises it.
    pub fn shares_match_assets(&self) -> bool {
        self.total_shares == PRECISION * self.total_assets()
    }
}

/// Arena of epoch records plus the current-epoch pointer and a cached aggregate of
/// free (unlocked) assets across all epochs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStore {
    epochs: Vec<Epoch>,
    current: EpochId,
    total_free_assets: u128,
}

impl EpochStore {
    /// Starts with epoch 1 empty and current.
    pub fn new() -> Self {
        Self {
            epochs: vec![Epoch::new(EpochId(1), 0, 0)],
            current: EpochId(1),
            total_free_assets: 0,
        }
    }

    /// Appends a fresh unfrozen, unsplit epoch and returns its id. Does not touch
    /// the free-asset aggregate; the assets were already counted in the epoch the
    /// caller carved them out of.
    pub fn create_epoch(&mut self, total_shares: u128, free_assets: u128) -> EpochId {
        let id = EpochId(self.epochs.len() as u64 + 1);
        self.epochs.push(Epoch::new(id, total_shares, free_assets));
        id
    }

    pub fn get(&self, id: EpochId) -> Option<&Epoch> {
        if id.is_none() {
            return None;
        }
        self.epochs.get(id.0 as usize - 1)
    }

    pub fn get_mut(&mut self, id: EpochId) -> Option<&mut Epoch> {
        if id.is_none() {
            return None;
        }
        self.epochs.get_mut(id.0 as usize - 1)
    }

    pub fn contains(&self, id: EpochId) -> bool {
        self.get(id).is_some()
    }

    pub fn current_id(&self) -> EpochId {
        self.current
    }

    pub fn set_current(&mut self, id: EpochId) {
        debug_assert!(self.contains(id));
        self.current = id;
    }

    pub fn current(&self) -> &Epoch {
        // the pointer always names a live record: epoch 1 exists from construction
        // and set_current only ever takes ids returned by create_epoch
        &self.epochs[self.current.0 as usize - 1]
    }

    pub fn current_mut(&mut self) -> &mut Epoch {
        &mut self.epochs[self.current.0 as usize - 1]
    }

    pub fn epoch_count(&self) -> usize {
        self.epochs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Epoch> {
        self.epochs.iter()
    }

    /// Cached sum of free assets across all epochs.
    pub fn total_free_assets(&self) -> u128 {
        self.total_free_assets
    }

    pub fn add_free_assets(&mut self, amount: u128) {
        self.total_free_assets += amount;
    }

    /// Defensive floor-at-zero decrement on the aggregate counter.
    pub fn sub_free_assets(&mut self, amount: u128) {
        self.total_free_assets = self.total_free_assets.saturating_sub(amount);
    }
}

impl Default for EpochStore {
    fn default() -> Self {
        Self::new()
    }
}
