// 3.0 shares.rs: per-LP share accounting. concrete balances are keyed by
// (address, epoch); each LP also carries cross-epoch aggregates and the progress
// pointer for lazy materialization. the conservation rule is that the sum of an
// LP's per-epoch balances always equals that LP's total_shares.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{Address, EpochId, PRECISION};

/// Cross-epoch aggregates for one liquidity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LpAccount {
    /// Scaled shares summed across every epoch the LP holds.
    pub total_shares: u128,
    /// Token units currently backing open trade layers.
    pub accumulated_utilization: u128,
    /// How far this LP's virtual position has been walked and concretized.
    /// Materialize calls must target exactly this epoch.
    pub last_materialized: EpochId,
}

impl LpAccount {
    pub fn new(current_epoch: EpochId) -> Self {
        Self {
            total_shares: 0,
            accumulated_utilization: 0,
            last_materialized: current_epoch,
        }
    }

    /// Withdrawable/claimable headroom in token units: total minus what already
    /// backs layers, floored at zero.
    pub fn available(&self) -> u128 {
        (self.total_shares / PRECISION).saturating_sub(self.accumulated_utilization)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShareLedger {
    providers: HashMap<Address, LpAccount>,
    balances: HashMap<(Address, EpochId), u128>,
}

impl ShareLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self, lp: Address) -> Option<&LpAccount> {
        self.providers.get(&lp)
    }

    pub fn account_mut(&mut self, lp: Address) -> Option<&mut LpAccount> {
        self.providers.get_mut(&lp)
    }

    /// Returns the account, registering the LP on first sight with the
    /// materialization pointer anchored at the given epoch.
    pub fn register(&mut self, lp: Address, current_epoch: EpochId) -> &mut LpAccount {
        self.providers
            .entry(lp)
            .or_insert_with(|| LpAccount::new(current_epoch))
    }

    pub fn is_known(&self, lp: Address) -> bool {
        self.providers.contains_key(&lp)
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn providers(&self) -> impl Iterator<Item = (&Address, &LpAccount)> {
        self.providers.iter()
    }

    /// Concrete (materialized) scaled balance in one epoch. zero if never credited.
    pub fn balance(&self, lp: Address, epoch: EpochId) -> u128 {
        self.balances.get(&(lp, epoch)).copied().unwrap_or(0)
    }

    /// Adds shares to an epoch balance and the LP aggregate.
    pub fn credit(&mut self, lp: Address, epoch: EpochId, shares: u128) {
        if shares == 0 {
            return;
        }
        *self.balances.entry((lp, epoch)).or_insert(0) += shares;
        if let Some(account) = self.providers.get_mut(&lp) {
            account.total_shares += shares;
        }
    }

    /// Removes shares from an epoch balance and the LP aggregate. The caller has
    /// already validated coverage; this is an exact subtraction, never a clamp,
    /// because a specific LP's owed balance must not silently shrink.
    pub fn debit(&mut self, lp: Address, epoch: EpochId, shares: u128) {
        if shares == 0 {
            return;
        }
        let balance = self.balances.entry((lp, epoch)).or_insert(0);
        debug_assert!(*balance >= shares);
        *balance -= shares;
        if let Some(account) = self.providers.get_mut(&lp) {
            debug_assert!(account.total_shares >= shares);
            account.total_shares -= shares;
        }
    }

    /// Rewrites one epoch balance in place without touching the LP aggregate.
    /// Used by materialization, which conserves the aggregate by construction
    /// (the residual moves to the rollover epoch in the same step).
    pub fn set_balance(&mut self, lp: Address, epoch: EpochId, shares: u128) {
        self.balances.insert((lp, epoch), shares);
    }

    /// Moves the rollover residual into the destination epoch, aggregate unchanged.
    pub fn credit_rollover(&mut self, lp: Address, epoch: EpochId, shares: u128) {
        if shares == 0 {
            return;
        }
        *self.balances.entry((lp, epoch)).or_insert(0) += shares;
    }

    /// Sum of one LP's concrete per-epoch balances. equals the LP aggregate at
    /// every observable point; exposed for tests and debug assertions.
    pub fn concrete_total(&self, lp: Address) -> u128 {
        self.balances
            .iter()
            .filter(|((owner, _), _)| *owner == lp)
            .map(|(_, shares)| shares)
            .sum()
    }
}
