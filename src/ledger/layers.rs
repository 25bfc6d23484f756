// 9.3: trade layer operations. creating a layer locks liquidity out of the
// current epoch and immediately splits it, so the funding epoch is fixed the
// moment the layer exists. claims distribute that already-committed backing
// among LPs proportionally to their locked shares, computed virtually through
// split metadata so no LP ever has to materialize to participate. closing
// settles realized PnL back into the funding epoch's free assets.

use super::core::Ledger;
use super::results::LedgerError;
use crate::asset::AssetLedger;
use crate::events::{
    AllocationClaimedEvent, AllocationReleasedEvent, EpochCreatedEvent, EpochSplitEvent,
    EventPayload, TradeLayerActivatedEvent, TradeLayerClosedEvent, TradeLayerCreatedEvent,
};
use crate::layer::{Allocation, LayerStatus, TradeLayer};
use crate::split::split_epoch;
use crate::types::{mul_div, Address, EpochId, LayerId};

impl<A: AssetLedger> Ledger<A> {
    /// Moves `amount` from the current epoch's free assets into its locked
    /// assets, freezes it, and splits it. The current pointer advances to the
    /// fresh rollover epoch; the now-locked original is returned as the funding
    /// epoch for the layer being created.
    fn lock_from_current_epoch(&mut self, amount: u128) -> Result<EpochId, LedgerError> {
        let epoch_id = self.epochs.current_id();
        let epoch = self.epochs.current();

        if epoch.frozen {
            return Err(LedgerError::EpochAlreadyFrozen(epoch_id));
        }
        if epoch.free_assets < amount {
            return Err(LedgerError::InsufficientEpochLiquidity {
                epoch_id,
                requested: amount,
                available: epoch.free_assets,
            });
        }

        let epoch = self.epochs.current_mut();
        epoch.free_assets -= amount;
        epoch.locked_assets += amount;
        epoch.frozen = true;
        self.epochs.sub_free_assets(amount);

        let outcome = split_epoch(&mut self.epochs, epoch_id)?;

        self.emit_event(EventPayload::EpochCreated(EpochCreatedEvent {
            epoch_id: outcome.rollover_epoch_id,
        }));
        self.emit_event(EventPayload::EpochSplit(EpochSplitEvent {
            epoch_id,
            locked_shares: outcome.locked_shares,
            rollover_epoch_id: outcome.rollover_epoch_id,
        }));

        Ok(epoch_id)
    }

    /// Creates a trade layer backed by `required_backing` token units locked out
    /// of the current epoch. The full backing is committed here; claims only
    /// distribute it among LPs.
    pub fn create_trade_layer(&mut self, required_backing: u128) -> Result<LayerId, LedgerError> {
        if required_backing == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let available = self.epochs.total_free_assets();
        if available < required_backing {
            return Err(LedgerError::InsufficientGlobalLiquidity {
                requested: required_backing,
                available,
            });
        }

        let funding_epoch_id = self.lock_from_current_epoch(required_backing)?;

        let layer_id = self.allocate_layer_id();
        let layer = TradeLayer::new(
            layer_id,
            required_backing,
            funding_epoch_id,
            self.current_time,
        );
        self.layers.insert(layer_id, layer);

        self.emit_event(EventPayload::TradeLayerCreated(TradeLayerCreatedEvent {
            layer_id,
            funding_epoch_id,
            required_backing,
        }));

        Ok(layer_id)
    }

    /// Claims `lp`'s proportional slice of an open layer's backing.
    ///
    /// The LP's effective locked shares in the funding epoch are projected
    /// virtually: `s * total_shares / pre_split_total_shares` once the epoch has
    /// split, the raw balance otherwise. The allocation is
    /// `effective * required_backing / total_shares`, capped at the remaining
    /// backing, and must come out positive.
    pub fn claim_layer_allocation(
        &mut self,
        lp: Address,
        layer_id: LayerId,
    ) -> Result<u128, LedgerError> {
        let layer = self
            .layers
            .get(&layer_id)
            .ok_or(LedgerError::LayerNotFound(layer_id))?;
        if layer.status != LayerStatus::Open {
            return Err(LedgerError::InvalidLayerStatus {
                layer_id,
                expected: LayerStatus::Open.as_str(),
                actual: layer.status.as_str(),
            });
        }
        if layer.has_claimed(lp) {
            return Err(LedgerError::AlreadyClaimed(layer_id));
        }
        let account = self
            .shares
            .account(lp)
            .ok_or(LedgerError::UnknownProvider(lp))?;
        let available = account.available();

        let funding_epoch_id = layer.funding_epoch_id;
        let required_backing = layer.required_backing;
        let remaining_backing = layer.remaining_backing;

        let effective = self.effective_locked_shares(lp, funding_epoch_id)?;
        let epoch = self
            .epochs
            .get(funding_epoch_id)
            .ok_or(LedgerError::EpochNotFound(funding_epoch_id))?;
        if epoch.total_shares == 0 {
            return Err(LedgerError::ZeroAllocation(layer_id));
        }

        let proportional = mul_div(effective, required_backing, epoch.total_shares)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let allocation = proportional.min(remaining_backing);
        if allocation == 0 {
            if remaining_backing == 0 {
                return Err(LedgerError::BackingExhausted(layer_id));
            }
            return Err(LedgerError::ZeroAllocation(layer_id));
        }
        if allocation > available {
            return Err(LedgerError::InsufficientAvailability {
                requested: allocation,
                available,
            });
        }

        let layer = self
            .layers
            .get_mut(&layer_id)
            .ok_or(LedgerError::LayerNotFound(layer_id))?;
        layer.allocations.insert(
            lp,
            Allocation {
                amount: allocation,
                claimed: true,
            },
        );
        layer.total_allocated += allocation;
        layer.remaining_backing -= allocation;

        if let Some(account) = self.shares.account_mut(lp) {
            account.accumulated_utilization += allocation;
        }

        self.emit_event(EventPayload::AllocationClaimed(AllocationClaimedEvent {
            layer_id,
            lp,
            amount: allocation,
        }));

        Ok(allocation)
    }

    /// Open -> Active. requires at least one claimed allocation.
    pub fn activate_trade_layer(&mut self, layer_id: LayerId) -> Result<(), LedgerError> {
        let layer = self
            .layers
            .get_mut(&layer_id)
            .ok_or(LedgerError::LayerNotFound(layer_id))?;
        if layer.status != LayerStatus::Open {
            return Err(LedgerError::InvalidLayerStatus {
                layer_id,
                expected: LayerStatus::Open.as_str(),
                actual: layer.status.as_str(),
            });
        }
        if layer.total_allocated == 0 {
            return Err(LedgerError::NoAllocations(layer_id));
        }
        layer.status = LayerStatus::Active;

        self.emit_event(EventPayload::TradeLayerActivated(TradeLayerActivatedEvent {
            layer_id,
        }));

        Ok(())
    }

    /// Settles a layer from Open or Active.
    ///
    /// `lp_gains = true`: the trader lost; the funding epoch's free assets grow
    /// by principal + `pnl_amount`. The caller must have pre-funded the pool's
    /// asset balance with the profit (the principal never left).
    ///
    /// `lp_gains = false`: the trader won; the pool forfeits up to the locked
    /// principal. Whatever survives returns to the funding epoch's free assets
    /// and the absorbed loss is paid out to `counterparty`.
    ///
    /// Either way the layer becomes Closed and LPs unwind their utilization
    /// individually via [`Ledger::release_allocation`].
    pub fn close_trade_layer(
        &mut self,
        layer_id: LayerId,
        pnl_amount: u128,
        lp_gains: bool,
        counterparty: Address,
    ) -> Result<(), LedgerError> {
        let layer = self
            .layers
            .get(&layer_id)
            .ok_or(LedgerError::LayerNotFound(layer_id))?;
        if layer.status == LayerStatus::Closed {
            return Err(LedgerError::InvalidLayerStatus {
                layer_id,
                expected: "open or active",
                actual: layer.status.as_str(),
            });
        }
        let funding_epoch_id = layer.funding_epoch_id;
        let required_backing = layer.required_backing;

        let epoch = self
            .epochs
            .get(funding_epoch_id)
            .ok_or(LedgerError::EpochNotFound(funding_epoch_id))?;
        // floor at zero: never pull more principal than the epoch still records
        let locked_amount = required_backing.min(epoch.locked_assets);

        let (returned, payout) = if lp_gains {
            let credited = locked_amount
                .checked_add(pnl_amount)
                .ok_or(LedgerError::ArithmeticOverflow)?;
            (credited, 0)
        } else {
            let survived = locked_amount.saturating_sub(pnl_amount);
            (survived, locked_amount - survived)
        };

        if !lp_gains && payout > 0 && counterparty.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }

        // the pool must already hold every token this settlement promises:
        // existing free assets, the amount being returned, and the payout
        let required_balance = self
            .epochs
            .total_free_assets()
            .checked_add(returned)
            .and_then(|v| v.checked_add(payout))
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let actual_balance = self.asset.balance_of(self.address);
        if actual_balance < required_balance {
            return Err(LedgerError::Underfunded {
                required: required_balance,
                actual: actual_balance,
            });
        }

        let epoch = self
            .epochs
            .get_mut(funding_epoch_id)
            .ok_or(LedgerError::EpochNotFound(funding_epoch_id))?;
        epoch.locked_assets -= locked_amount;
        epoch.free_assets += returned;
        self.epochs.add_free_assets(returned);

        let layer = self
            .layers
            .get_mut(&layer_id)
            .ok_or(LedgerError::LayerNotFound(layer_id))?;
        layer.status = LayerStatus::Closed;

        if payout > 0 {
            self.asset.transfer(counterparty, payout)?;
        }

        self.emit_event(EventPayload::TradeLayerClosed(TradeLayerClosedEvent {
            layer_id,
            lp_gains,
            returned_to_pool: returned,
            paid_out: payout,
        }));

        Ok(())
    }

    /// Unwinds `lp`'s utilization for a closed layer. One shot: the allocation
    /// and claimed flag are zeroed together, and a second call fails.
    pub fn release_allocation(
        &mut self,
        lp: Address,
        layer_id: LayerId,
    ) -> Result<u128, LedgerError> {
        let layer = self
            .layers
            .get_mut(&layer_id)
            .ok_or(LedgerError::LayerNotFound(layer_id))?;
        if layer.status != LayerStatus::Closed {
            return Err(LedgerError::InvalidLayerStatus {
                layer_id,
                expected: LayerStatus::Closed.as_str(),
                actual: layer.status.as_str(),
            });
        }
        let allocation = layer.allocation(lp);
        if allocation.amount == 0 {
            return Err(LedgerError::NothingToRelease(layer_id));
        }

        layer.allocations.insert(lp, Allocation::default());

        if let Some(account) = self.shares.account_mut(lp) {
            account.accumulated_utilization = account
                .accumulated_utilization
                .saturating_sub(allocation.amount);
        }

        self.emit_event(EventPayload::AllocationReleased(AllocationReleasedEvent {
            layer_id,
            lp,
            amount: allocation.amount,
        }));

        Ok(allocation.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MockAsset;
    use crate::ledger::config::LedgerConfig;
    use crate::types::PRECISION;

    const POOL: Address = Address(100);
    const ALICE: Address = Address(1);
    const BOB: Address = Address(2);
    const ENGINE: Address = Address(50);

    fn two_lp_ledger() -> Ledger<MockAsset> {
        let mut asset = MockAsset::new(POOL);
        asset.mint(ALICE, 1_000);
        asset.approve(ALICE, POOL, 1_000);
        asset.mint(BOB, 1_000);
        asset.approve(BOB, POOL, 1_000);
        let mut ledger = Ledger::new(LedgerConfig::default(), POOL, asset);
        ledger.deposit(ALICE, 60).unwrap();
        ledger.deposit(BOB, 40).unwrap();
        ledger
    }

    #[test]
    fn create_layer_freezes_and_splits() {
        let mut ledger = two_lp_ledger();
        let layer_id = ledger.create_trade_layer(40).unwrap();

        let layer = ledger.get_trade_layer(layer_id).unwrap();
        assert_eq!(layer.funding_epoch_id, EpochId(1));
        assert_eq!(layer.status, LayerStatus::Open);
        assert_eq!(layer.remaining_backing, 40);

        let funding = ledger.get_epoch(EpochId(1)).unwrap();
        assert!(funding.frozen && funding.split);
        assert_eq!(funding.total_shares, 40 * PRECISION);
        assert_eq!(funding.locked_assets, 40);
        assert_eq!(funding.free_assets, 0);

        assert_eq!(ledger.current_epoch_id(), EpochId(2));
        assert_eq!(ledger.get_epoch(EpochId(2)).unwrap().free_assets, 60);
        assert_eq!(ledger.total_free_assets(), 60);
    }

    #[test]
    fn create_layer_requires_global_liquidity() {
        let mut ledger = two_lp_ledger();
        let err = ledger.create_trade_layer(101).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientGlobalLiquidity {
                requested: 101,
                available: 100
            }
        );
        assert_eq!(ledger.create_trade_layer(0), Err(LedgerError::ZeroAmount));
    }

    #[test]
    fn claims_are_proportional_to_locked_shares() {
        let mut ledger = two_lp_ledger();
        let layer_id = ledger.create_trade_layer(40).unwrap();

        // alice holds 60%, bob 40% of the funding epoch's pre-split shares
        let alice_alloc = ledger.claim_layer_allocation(ALICE, layer_id).unwrap();
        let bob_alloc = ledger.claim_layer_allocation(BOB, layer_id).unwrap();

        assert_eq!(alice_alloc, 24);
        assert_eq!(bob_alloc, 16);

        let layer = ledger.get_trade_layer(layer_id).unwrap();
        assert_eq!(layer.total_allocated, 40);
        assert_eq!(layer.remaining_backing, 0);
        assert_eq!(
            ledger.get_provider(ALICE).unwrap().accumulated_utilization,
            24
        );
    }

    #[test]
    fn claim_twice_rejected() {
        let mut ledger = two_lp_ledger();
        let layer_id = ledger.create_trade_layer(40).unwrap();
        ledger.claim_layer_allocation(ALICE, layer_id).unwrap();
        assert_eq!(
            ledger.claim_layer_allocation(ALICE, layer_id),
            Err(LedgerError::AlreadyClaimed(layer_id))
        );
    }

    #[test]
    fn claim_requires_known_provider() {
        let mut ledger = two_lp_ledger();
        let layer_id = ledger.create_trade_layer(40).unwrap();
        assert_eq!(
            ledger.claim_layer_allocation(Address(9), layer_id),
            Err(LedgerError::UnknownProvider(Address(9)))
        );
    }

    #[test]
    fn claim_without_shares_in_funding_epoch_is_zero() {
        let mut ledger = two_lp_ledger();
        let layer_id = ledger.create_trade_layer(40).unwrap();

        // carol deposits after the split; she holds nothing in the funding epoch
        let carol = Address(3);
        ledger.asset_mut().mint(carol, 100);
        ledger.asset_mut().approve(carol, POOL, 100);
        ledger.deposit(carol, 100).unwrap();

        assert_eq!(
            ledger.claim_layer_allocation(carol, layer_id),
            Err(LedgerError::ZeroAllocation(layer_id))
        );
    }

    #[test]
    fn activate_requires_allocations() {
        let mut ledger = two_lp_ledger();
        let layer_id = ledger.create_trade_layer(40).unwrap();

        assert_eq!(
            ledger.activate_trade_layer(layer_id),
            Err(LedgerError::NoAllocations(layer_id))
        );

        ledger.claim_layer_allocation(ALICE, layer_id).unwrap();
        ledger.activate_trade_layer(layer_id).unwrap();
        assert_eq!(
            ledger.get_trade_layer(layer_id).unwrap().status,
            LayerStatus::Active
        );

        // claims close once active
        assert!(matches!(
            ledger.claim_layer_allocation(BOB, layer_id),
            Err(LedgerError::InvalidLayerStatus { .. })
        ));
    }

    #[test]
    fn profit_close_credits_principal_plus_pnl() {
        let mut ledger = two_lp_ledger();
        let layer_id = ledger.create_trade_layer(40).unwrap();
        ledger.claim_layer_allocation(ALICE, layer_id).unwrap();
        ledger.activate_trade_layer(layer_id).unwrap();

        // trader lost 10; the engine pays the profit into the pool first
        ledger.asset_mut().mint(POOL, 10);
        ledger.close_trade_layer(layer_id, 10, true, ENGINE).unwrap();

        let funding = ledger.get_epoch(EpochId(1)).unwrap();
        assert_eq!(funding.locked_assets, 0);
        assert_eq!(funding.free_assets, 50);
        assert_eq!(ledger.total_free_assets(), 110);
        assert!(ledger.get_trade_layer(layer_id).unwrap().is_settled());
    }

    #[test]
    fn profit_close_requires_prefunding() {
        let mut ledger = two_lp_ledger();
        let layer_id = ledger.create_trade_layer(40).unwrap();
        ledger.claim_layer_allocation(ALICE, layer_id).unwrap();

        let err = ledger
            .close_trade_layer(layer_id, 10, true, ENGINE)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Underfunded { .. }));
        // nothing moved
        assert_eq!(ledger.total_free_assets(), 60);
        assert_eq!(
            ledger.get_trade_layer(layer_id).unwrap().status,
            LayerStatus::Open
        );
    }

    #[test]
    fn partial_loss_close_returns_remainder_and_pays_out() {
        let mut ledger = two_lp_ledger();
        let layer_id = ledger.create_trade_layer(40).unwrap();
        ledger.claim_layer_allocation(ALICE, layer_id).unwrap();
        ledger.activate_trade_layer(layer_id).unwrap();

        ledger.close_trade_layer(layer_id, 15, false, ENGINE).unwrap();

        let funding = ledger.get_epoch(EpochId(1)).unwrap();
        assert_eq!(funding.free_assets, 25);
        assert_eq!(funding.locked_assets, 0);
        assert_eq!(ledger.total_free_assets(), 85);
        assert_eq!(ledger.asset().balance_of(ENGINE), 15);
        assert_eq!(ledger.asset().balance_of(POOL), 85);
    }

    #[test]
    fn total_loss_close_forfeits_principal() {
        let mut ledger = two_lp_ledger();
        let layer_id = ledger.create_trade_layer(40).unwrap();
        ledger.claim_layer_allocation(ALICE, layer_id).unwrap();
        ledger.activate_trade_layer(layer_id).unwrap();

        // loss exceeds the principal: payout caps at the locked amount
        ledger.close_trade_layer(layer_id, 55, false, ENGINE).unwrap();

        let funding = ledger.get_epoch(EpochId(1)).unwrap();
        assert_eq!(funding.free_assets, 0);
        assert_eq!(funding.locked_assets, 0);
        assert_eq!(ledger.total_free_assets(), 60);
        assert_eq!(ledger.asset().balance_of(ENGINE), 40);
    }

    #[test]
    fn close_twice_rejected() {
        let mut ledger = two_lp_ledger();
        let layer_id = ledger.create_trade_layer(40).unwrap();
        ledger.claim_layer_allocation(ALICE, layer_id).unwrap();
        ledger.close_trade_layer(layer_id, 0, false, ENGINE).unwrap();

        assert!(matches!(
            ledger.close_trade_layer(layer_id, 0, false, ENGINE),
            Err(LedgerError::InvalidLayerStatus { .. })
        ));
    }

    #[test]
    fn release_unwinds_utilization_once() {
        let mut ledger = two_lp_ledger();
        let layer_id = ledger.create_trade_layer(40).unwrap();
        ledger.claim_layer_allocation(ALICE, layer_id).unwrap();

        // cannot release before close
        assert!(matches!(
            ledger.release_allocation(ALICE, layer_id),
            Err(LedgerError::InvalidLayerStatus { .. })
        ));

        ledger.asset_mut().mint(POOL, 10);
        ledger.close_trade_layer(layer_id, 10, true, ENGINE).unwrap();

        let released = ledger.release_allocation(ALICE, layer_id).unwrap();
        assert_eq!(released, 24);
        assert_eq!(
            ledger.get_provider(ALICE).unwrap().accumulated_utilization,
            0
        );

        assert_eq!(
            ledger.release_allocation(ALICE, layer_id),
            Err(LedgerError::NothingToRelease(layer_id))
        );
        // an LP that never claimed has nothing to release either
        assert_eq!(
            ledger.release_allocation(BOB, layer_id),
            Err(LedgerError::NothingToRelease(layer_id))
        );
    }

    #[test]
    fn second_layer_funds_from_the_rollover_epoch() {
        let mut ledger = two_lp_ledger();
        let first = ledger.create_trade_layer(40).unwrap();
        let second = ledger.create_trade_layer(30).unwrap();

        assert_eq!(
            ledger.get_trade_layer(first).unwrap().funding_epoch_id,
            EpochId(1)
        );
        assert_eq!(
            ledger.get_trade_layer(second).unwrap().funding_epoch_id,
            EpochId(2)
        );
        assert_eq!(ledger.current_epoch_id(), EpochId(3));
        assert_eq!(ledger.total_free_assets(), 30);
    }
}
