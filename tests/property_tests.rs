//! Property-based tests for the ledger's accounting invariants.
//!
//! These tests verify invariants hold under random inputs.

use liquidity_ledger::*;
use proptest::prelude::*;

const POOL: Address = Address(1_000);

fn build_ledger(deposits: &[u128]) -> (Ledger<MockAsset>, Vec<Address>) {
    let mut asset = MockAsset::new(POOL);
    let lps: Vec<Address> = (0..deposits.len() as u64).map(|i| Address(i + 1)).collect();
    for (lp, &amount) in lps.iter().zip(deposits) {
        asset.mint(*lp, amount);
        asset.approve(*lp, POOL, amount);
    }
    let mut ledger = Ledger::new(LedgerConfig::default(), POOL, asset);
    for (lp, &amount) in lps.iter().zip(deposits) {
        ledger.deposit(*lp, amount).unwrap();
    }
    (ledger, lps)
}

/// Locks `pct` percent of the current free assets into a fresh layer, skipping
/// percentages that round to zero backing.
fn lock_fraction(ledger: &mut Ledger<MockAsset>, pct: u128) -> Option<LayerId> {
    let backing = ledger.total_free_assets() * pct / 100;
    if backing == 0 {
        return None;
    }
    Some(ledger.create_trade_layer(backing).unwrap())
}

fn materialize_fully(ledger: &mut Ledger<MockAsset>, lp: Address) {
    loop {
        let pointer = ledger.get_provider(lp).unwrap().last_materialized;
        let outcome = ledger.materialize(lp, pointer).unwrap();
        if outcome.steps.len() < MAX_MATERIALIZE_HOPS {
            break;
        }
    }
}

fn deposits_strategy() -> impl Strategy<Value = Vec<u128>> {
    prop::collection::vec(1u128..=10_000, 1..6)
}

fn split_pcts_strategy() -> impl Strategy<Value = Vec<u128>> {
    prop::collection::vec(1u128..=90, 1..8)
}

proptest! {
    /// After any split, locked + rollover shares equal the original supply exactly.
    #[test]
    fn split_conserves_shares(
        deposits in deposits_strategy(),
        pcts in split_pcts_strategy(),
    ) {
        let (mut ledger, _) = build_ledger(&deposits);

        for pct in pcts {
            let before = ledger.current_epoch().total_shares;
            let epoch_id = ledger.current_epoch_id();
            if lock_fraction(&mut ledger, pct).is_none() {
                continue;
            }
            let original = ledger.get_epoch(epoch_id).unwrap();
            let rollover = ledger.get_epoch(original.rollover_epoch_id).unwrap();
            prop_assert_eq!(original.total_shares + rollover.total_shares, before);
            prop_assert_eq!(original.pre_split_total_shares, before);
            prop_assert_eq!(original.free_assets, 0);
        }
    }

    /// Per-LP share conservation: the sum of concrete per-epoch balances equals
    /// the LP aggregate before, during, and after materialization.
    #[test]
    fn materialization_conserves_lp_shares(
        deposits in deposits_strategy(),
        pcts in split_pcts_strategy(),
    ) {
        let (mut ledger, lps) = build_ledger(&deposits);

        for pct in pcts {
            lock_fraction(&mut ledger, pct);
            for &lp in &lps {
                let aggregate = ledger.get_provider(lp).unwrap().total_shares;
                prop_assert_eq!(ledger.concrete_share_total(lp), aggregate);
            }
        }

        for &lp in &lps {
            materialize_fully(&mut ledger, lp);
            let aggregate = ledger.get_provider(lp).unwrap().total_shares;
            prop_assert_eq!(ledger.concrete_share_total(lp), aggregate);
        }
    }

    /// A second materialize call with no intervening splits changes nothing.
    #[test]
    fn materialization_is_idempotent(
        deposits in deposits_strategy(),
        pcts in split_pcts_strategy(),
    ) {
        let (mut ledger, lps) = build_ledger(&deposits);
        for pct in pcts {
            lock_fraction(&mut ledger, pct);
        }

        for &lp in &lps {
            materialize_fully(&mut ledger, lp);
            let pointer = ledger.get_provider(lp).unwrap().last_materialized;
            let balances: Vec<u128> = ledger
                .epochs_iter()
                .map(|e| ledger.share_balance(lp, e.id))
                .collect();

            let again = ledger.materialize(lp, pointer).unwrap();
            prop_assert!(again.steps.is_empty());
            prop_assert_eq!(again.stopped_at, pointer);
            let after: Vec<u128> = ledger
                .epochs_iter()
                .map(|e| ledger.share_balance(lp, e.id))
                .collect();
            prop_assert_eq!(balances, after);
        }
    }

    /// Claimed allocations never exceed the layer's required backing, and the
    /// remaining backing is exactly what is left undistributed.
    #[test]
    fn allocation_bound_holds(
        deposits in deposits_strategy(),
        pct in 1u128..=90,
    ) {
        let (mut ledger, lps) = build_ledger(&deposits);
        let Some(layer_id) = lock_fraction(&mut ledger, pct) else {
            return Ok(());
        };

        let mut claimed_total = 0u128;
        for &lp in &lps {
            match ledger.claim_layer_allocation(lp, layer_id) {
                Ok(amount) => {
                    prop_assert!(amount > 0);
                    claimed_total += amount;
                }
                Err(LedgerError::ZeroAllocation(_)) | Err(LedgerError::BackingExhausted(_)) => {}
                Err(other) => return Err(TestCaseError::fail(format!("{other}"))),
            }
        }

        let layer = ledger.get_trade_layer(layer_id).unwrap();
        prop_assert!(claimed_total <= layer.required_backing);
        prop_assert_eq!(layer.total_allocated, claimed_total);
        prop_assert_eq!(layer.remaining_backing, layer.required_backing - claimed_total);
    }

    /// Utilization never exceeds the LP's unscaled share total.
    #[test]
    fn utilization_bound_holds(
        deposits in deposits_strategy(),
        pcts in prop::collection::vec(1u128..=60, 1..4),
    ) {
        let (mut ledger, lps) = build_ledger(&deposits);

        for pct in pcts {
            for &lp in &lps {
                materialize_fully(&mut ledger, lp);
            }
            let Some(layer_id) = lock_fraction(&mut ledger, pct) else {
                continue;
            };
            for &lp in &lps {
                let _ = ledger.claim_layer_allocation(lp, layer_id);
                let account = ledger.get_provider(lp).unwrap();
                prop_assert!(
                    account.accumulated_utilization <= account.total_shares / PRECISION,
                    "utilization {} above {}",
                    account.accumulated_utilization,
                    account.total_shares / PRECISION
                );
            }
        }
    }

    /// The global free-asset cache always matches the sum over epochs, and the
    /// pool's asset balance always covers it.
    #[test]
    fn free_asset_cache_matches_epochs(
        deposits in deposits_strategy(),
        pcts in split_pcts_strategy(),
    ) {
        let (mut ledger, _) = build_ledger(&deposits);

        for pct in pcts {
            lock_fraction(&mut ledger, pct);
            let summed: u128 = ledger.epochs_iter().map(|e| e.free_assets).sum();
            prop_assert_eq!(ledger.total_free_assets(), summed);
            prop_assert!(ledger.asset().balance_of(POOL) >= summed);
        }
    }
}
