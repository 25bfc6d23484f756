//! Liquidity Ledger Simulation.
//!
//! Demonstrates the full ledger lifecycle including deposits, layer creation and
//! the lazy epoch split, proportional claims, profit and loss settlement, and
//! per-LP materialization of deep split chains.

use liquidity_ledger::*;

const POOL: Address = Address(100);
const ENGINE: Address = Address(50);
const ALICE: Address = Address(1);
const BOB: Address = Address(2);

fn main() {
    println!("Epoch Liquidity Ledger Simulation");
    println!("Lazy Splits, Virtual Claims, Exact Integer Accounting\n");

    scenario_1_deposits_and_shares();
    scenario_2_layer_lock_and_split();
    scenario_3_proportional_claims();
    scenario_4_profit_and_loss_settlement();
    scenario_5_deep_chain_materialization();

    println!("\nAll simulations completed successfully.");
}

fn funded_ledger() -> Ledger<MockAsset> {
    let mut asset = MockAsset::new(POOL);
    for lp in [ALICE, BOB] {
        asset.mint(lp, 10_000);
        asset.approve(lp, POOL, 10_000);
    }
    Ledger::new(LedgerConfig::default(), POOL, asset)
}

/// Deposits mint PRECISION-scaled shares into the current epoch.
fn scenario_1_deposits_and_shares() {
    println!("Scenario 1: Deposits and Share Minting\n");

    let mut ledger = funded_ledger();
    ledger.deposit(ALICE, 100).unwrap();
    ledger.deposit(BOB, 50).unwrap();

    println!("  Alice deposits 100, Bob deposits 50");
    println!(
        "  Alice holds {} tokens ({} scaled shares in {})",
        ledger.balance_of(ALICE),
        ledger.share_balance(ALICE, EpochId(1)),
        EpochId(1)
    );
    println!("  Global free assets: {}", ledger.total_free_assets());

    ledger.withdraw_from_epoch(ALICE, EpochId(1), 30).unwrap();
    println!(
        "  Alice withdraws 30 -> balance {}, global free {}\n",
        ledger.balance_of(ALICE),
        ledger.total_free_assets()
    );
}

/// Layer creation locks liquidity and forces the lazy split.
fn scenario_2_layer_lock_and_split() {
    println!("Scenario 2: Layer Lock and Lazy Split\n");

    let mut ledger = funded_ledger();
    ledger.deposit(ALICE, 100).unwrap();

    let layer_id = ledger.create_trade_layer(40).unwrap();
    let funding = ledger.get_trade_layer(layer_id).unwrap().funding_epoch_id;
    let epoch = ledger.get_epoch(funding).unwrap();

    println!("  Locked 40 of 100 into {layer_id}");
    println!(
        "  {} frozen={} split={} locked_shares={}",
        funding, epoch.frozen, epoch.split, epoch.total_shares
    );
    println!(
        "  Current epoch is now {} holding {} free assets",
        ledger.current_epoch_id(),
        ledger.current_epoch().free_assets
    );
    println!(
        "  Alice's concrete shares still sit in {} (no per-LP mutation at split time)\n",
        funding
    );
}

/// Two LPs claim slices of locked backing without materializing.
fn scenario_3_proportional_claims() {
    println!("Scenario 3: Proportional Claims\n");

    let mut ledger = funded_ledger();
    ledger.deposit(ALICE, 60).unwrap();
    ledger.deposit(BOB, 40).unwrap();

    let layer_id = ledger.create_trade_layer(40).unwrap();
    let alice_slice = ledger.claim_layer_allocation(ALICE, layer_id).unwrap();
    let bob_slice = ledger.claim_layer_allocation(BOB, layer_id).unwrap();

    println!("  Layer backed with 40; Alice holds 60%, Bob 40% of the funding epoch");
    println!("  Alice claims {alice_slice}, Bob claims {bob_slice}");

    let layer = ledger.get_trade_layer(layer_id).unwrap();
    println!(
        "  total_allocated={} remaining_backing={}",
        layer.total_allocated, layer.remaining_backing
    );
    println!(
        "  Alice utilization {} of {} total\n",
        ledger.get_provider(ALICE).unwrap().accumulated_utilization,
        ledger.balance_of(ALICE)
    );
}

/// Settlement in both directions, then release.
fn scenario_4_profit_and_loss_settlement() {
    println!("Scenario 4: Profit and Loss Settlement\n");

    let mut ledger = funded_ledger();
    ledger.deposit(ALICE, 100).unwrap();

    // profitable layer: trader lost 10
    let winner = ledger.create_trade_layer(40).unwrap();
    ledger.claim_layer_allocation(ALICE, winner).unwrap();
    ledger.activate_trade_layer(winner).unwrap();
    ledger.asset_mut().mint(POOL, 10);
    ledger.close_trade_layer(winner, 10, true, ENGINE).unwrap();
    println!(
        "  Profit close: funding epoch free assets {} (principal 40 + profit 10)",
        ledger.get_epoch(EpochId(1)).unwrap().free_assets
    );

    ledger.release_allocation(ALICE, winner).unwrap();
    println!(
        "  After release, Alice utilization {}",
        ledger.get_provider(ALICE).unwrap().accumulated_utilization
    );

    // walk alice's shares into the rollover epoch so she can claim the next layer
    ledger.materialize(ALICE, EpochId(1)).unwrap();

    // losing layer: trader won 55, more than the 30 locked -> full forfeit
    let loser = ledger.create_trade_layer(30).unwrap();
    ledger.claim_layer_allocation(ALICE, loser).unwrap();
    ledger.activate_trade_layer(loser).unwrap();
    ledger.close_trade_layer(loser, 55, false, ENGINE).unwrap();

    let funding = ledger.get_trade_layer(loser).unwrap().funding_epoch_id;
    println!(
        "  Total-loss close: {} free assets {}, engine received {}",
        funding,
        ledger.get_epoch(funding).unwrap().free_assets,
        ledger.asset().balance_of(ENGINE)
    );
    println!("  Global free assets: {}\n", ledger.total_free_assets());
}

/// A long split chain walked in bounded hops.
fn scenario_5_deep_chain_materialization() {
    println!("Scenario 5: Deep Chain Materialization\n");

    let mut ledger = funded_ledger();
    ledger.deposit(ALICE, 1_000).unwrap();

    // 12 consecutive layers, each splitting the then-current epoch
    for _ in 0..12 {
        let backing = ledger.total_free_assets() / 10;
        ledger.create_trade_layer(backing).unwrap();
    }
    println!(
        "  Created 12 layers -> {} epochs, current {}",
        ledger.epoch_count(),
        ledger.current_epoch_id()
    );

    let first = ledger.materialize(ALICE, EpochId(1)).unwrap();
    println!(
        "  First materialize call: {} hops, stopped at {}",
        first.steps.len(),
        first.stopped_at
    );

    let second = ledger.materialize(ALICE, first.stopped_at).unwrap();
    println!(
        "  Second call: {} hops, stopped at {}",
        second.steps.len(),
        second.stopped_at
    );
    println!(
        "  Share conservation: concrete total {} == aggregate {}",
        ledger.concrete_share_total(ALICE),
        ledger.get_provider(ALICE).unwrap().total_shares
    );
    println!("  Events generated: {}", ledger.events().len());
}
