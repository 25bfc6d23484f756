// 9.2: LP-side operations. deposits mint scaled shares into the current epoch,
// withdrawals burn concretely-held shares out of a specific epoch, and
// materialize advances one LP's lazy split walk. each operation validates fully
// before any ledger mutation; external transfers sit at the edges (pull before
// mutation on deposit, push after mutation on withdrawal).

use super::core::Ledger;
use super::results::LedgerError;
use crate::asset::AssetLedger;
use crate::events::{DepositEvent, EventPayload, MaterializedEvent, WithdrawEvent};
use crate::materialize::{materialize_shares, MaterializeOutcome};
use crate::types::{Address, EpochId, PRECISION};

impl<A: AssetLedger> Ledger<A> {
    /// Deposits `amount` token units for `lp`, minting `amount * PRECISION`
    /// shares in the current epoch. The first deposit for an address anchors
    /// that LP's materialization pointer at the current epoch.
    pub fn deposit(&mut self, lp: Address, amount: u128) -> Result<(), LedgerError> {
        if lp.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if amount < self.config.min_deposit {
            return Err(LedgerError::AmountBelowMinimum {
                amount,
                minimum: self.config.min_deposit,
            });
        }
        let shares = amount
            .checked_mul(PRECISION)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        // pull the funds first; a failed pull aborts with no ledger mutation
        let pool = self.address;
        self.asset.transfer_from(lp, pool, amount)?;

        let epoch_id = self.epochs.current_id();
        self.shares.register(lp, epoch_id);
        self.shares.credit(lp, epoch_id, shares);

        let epoch = self.epochs.current_mut();
        epoch.free_assets += amount;
        epoch.total_shares += shares;
        self.epochs.add_free_assets(amount);

        self.emit_event(EventPayload::Deposit(DepositEvent {
            lp,
            epoch_id,
            amount,
            shares,
        }));

        Ok(())
    }

    /// Withdraws `amount` token units against the LP's concretely-held, unlocked
    /// shares in exactly `epoch_id`. Virtual rollover positions cannot satisfy a
    /// withdrawal; the LP materializes first to reach them.
    pub fn withdraw_from_epoch(
        &mut self,
        lp: Address,
        epoch_id: EpochId,
        amount: u128,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        if !self.epochs.contains(epoch_id) {
            return Err(LedgerError::EpochNotFound(epoch_id));
        }
        let account = self
            .shares
            .account(lp)
            .ok_or(LedgerError::UnknownProvider(lp))?;

        let available = account.available();
        if amount > available {
            return Err(LedgerError::InsufficientAvailability {
                requested: amount,
                available,
            });
        }

        let epoch = self
            .epochs
            .get(epoch_id)
            .ok_or(LedgerError::EpochNotFound(epoch_id))?;
        if epoch.free_assets < amount {
            return Err(LedgerError::InsufficientEpochLiquidity {
                epoch_id,
                requested: amount,
                available: epoch.free_assets,
            });
        }

        let shares = amount
            .checked_mul(PRECISION)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let held = self.shares.balance(lp, epoch_id);
        if held < shares {
            return Err(LedgerError::InsufficientEpochShares {
                lp,
                epoch_id,
                requested: shares,
                held,
            });
        }

        // effects: burn the shares, shrink the epoch and global free-asset
        // counters (floored at zero on the asset counters only)
        self.shares.debit(lp, epoch_id, shares);
        let epoch = self
            .epochs
            .get_mut(epoch_id)
            .ok_or(LedgerError::EpochNotFound(epoch_id))?;
        epoch.total_shares = epoch.total_shares.saturating_sub(shares);
        epoch.free_assets = epoch.free_assets.saturating_sub(amount);
        self.epochs.sub_free_assets(amount);

        // interact: pay out. epoch free assets were validated above, so the
        // pool balance covers this for any conforming asset ledger.
        self.asset.transfer(lp, amount)?;

        self.emit_event(EventPayload::Withdraw(WithdrawEvent {
            lp,
            epoch_id,
            amount,
            shares,
        }));

        Ok(())
    }

    /// Advances `lp`'s materialization walk. `epoch_id` must equal the LP's
    /// recorded progress pointer; an LP cannot skip ahead or replay an older
    /// position in the chain. Walks at most 10 split links, then parks the
    /// pointer wherever it stopped. Calling again with no new splits is a no-op.
    pub fn materialize(
        &mut self,
        lp: Address,
        epoch_id: EpochId,
    ) -> Result<MaterializeOutcome, LedgerError> {
        let account = self
            .shares
            .account(lp)
            .ok_or(LedgerError::UnknownProvider(lp))?;
        if account.last_materialized != epoch_id {
            return Err(LedgerError::MaterializeOutOfOrder {
                expected: account.last_materialized,
                requested: epoch_id,
            });
        }

        let outcome = materialize_shares(&self.epochs, &mut self.shares, lp, epoch_id)?;

        if let Some(account) = self.shares.account_mut(lp) {
            account.last_materialized = outcome.stopped_at;
        }

        for step in &outcome.steps {
            self.emit_event(EventPayload::Materialized(MaterializedEvent {
                lp,
                from_epoch: step.from_epoch,
                locked_shares: step.locked_shares,
                rollover_shares: step.rollover_shares,
            }));
        }

        Ok(outcome)
    }
}
