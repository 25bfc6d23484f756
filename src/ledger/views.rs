// 9.4: read-only projections. none of these mutate state; the virtual ones walk
// split metadata so callers (and the claim path) can price an LP's position in a
// split epoch without that LP ever materializing.

use super::core::Ledger;
use super::results::LedgerError;
use crate::asset::AssetLedger;
use crate::epoch::Epoch;
use crate::layer::TradeLayer;
use crate::materialize::MaterializeError;
use crate::shares::LpAccount;
use crate::types::{mul_div, Address, EpochId, LayerId, PRECISION};

impl<A: AssetLedger> Ledger<A> {
    /// Total LP balance in token units: `total_shares / PRECISION`.
    pub fn balance_of(&self, lp: Address) -> u128 {
        self.shares
            .account(lp)
            .map(|a| a.total_shares / PRECISION)
            .unwrap_or(0)
    }

    /// Token units not currently backing a layer, floored at zero.
    pub fn available_balance(&self, lp: Address) -> u128 {
        self.shares.account(lp).map(|a| a.available()).unwrap_or(0)
    }

    /// Concrete scaled share balance recorded in one epoch.
    pub fn share_balance(&self, lp: Address, epoch_id: EpochId) -> u128 {
        self.shares.balance(lp, epoch_id)
    }

    /// The virtual projection of `lp`'s recorded balance in `epoch_id` onto the
    /// locked portion of that epoch: `s * total_shares / pre_split_total_shares`
    /// once split, the raw balance otherwise.
    pub fn effective_locked_shares(
        &self,
        lp: Address,
        epoch_id: EpochId,
    ) -> Result<u128, LedgerError> {
        let epoch = self
            .epochs
            .get(epoch_id)
            .ok_or(LedgerError::EpochNotFound(epoch_id))?;
        let held = self.shares.balance(lp, epoch_id);

        if !epoch.split {
            return Ok(held);
        }
        if epoch.pre_split_total_shares == 0 {
            return Err(MaterializeError::CorruptSplitMetadata(epoch_id).into());
        }
        mul_div(held, epoch.total_shares, epoch.pre_split_total_shares)
            .ok_or(LedgerError::ArithmeticOverflow)
    }

    /// Token units `lp` could withdraw from `epoch_id` right now based on its
    /// concrete shares there: `s * free_assets / total_shares`, zero when either
    /// side is zero. Ignores cross-epoch utilization; the withdraw path checks it.
    pub fn withdrawable_in_epoch(&self, lp: Address, epoch_id: EpochId) -> u128 {
        let Some(epoch) = self.epochs.get(epoch_id) else {
            return 0;
        };
        let held = self.shares.balance(lp, epoch_id);
        if held == 0 || epoch.total_shares == 0 {
            return 0;
        }
        mul_div(held, epoch.free_assets, epoch.total_shares).unwrap_or(0)
    }

    /// Cached aggregate of free assets across all epochs.
    pub fn total_free_assets(&self) -> u128 {
        self.epochs.total_free_assets()
    }

    pub fn current_epoch_id(&self) -> EpochId {
        self.epochs.current_id()
    }

    pub fn current_epoch(&self) -> &Epoch {
        self.epochs.current()
    }

    pub fn get_epoch(&self, epoch_id: EpochId) -> Option<&Epoch> {
        self.epochs.get(epoch_id)
    }

    pub fn epoch_count(&self) -> usize {
        self.epochs.epoch_count()
    }

    pub fn epochs_iter(&self) -> impl Iterator<Item = &Epoch> {
        self.epochs.iter()
    }

    pub fn get_trade_layer(&self, layer_id: LayerId) -> Option<&TradeLayer> {
        self.layers.get(&layer_id)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn get_provider(&self, lp: Address) -> Option<&LpAccount> {
        self.shares.account(lp)
    }

    pub fn provider_count(&self) -> usize {
        self.shares.provider_count()
    }

    /// Token units of a layer's backing attributed to `lp` (0 if never claimed
    /// or already released).
    pub fn allocation_of(&self, lp: Address, layer_id: LayerId) -> u128 {
        self.layers
            .get(&layer_id)
            .map(|l| l.allocation(lp).amount)
            .unwrap_or(0)
    }

    /// Sum of one LP's concrete per-epoch balances; equals the LP aggregate at
    /// every observable point. Exposed for invariant checks.
    pub fn concrete_share_total(&self, lp: Address) -> u128 {
        self.shares.concrete_total(lp)
    }
}
