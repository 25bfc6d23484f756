// 8.0 events.rs: every state change produces an event. used for audit trails,
// state reconstruction, and notifying external systems. events are for
// observability, never correctness; the ledger's own records are authoritative.

use serde::{Deserialize, Serialize};

use crate::types::{Address, EpochId, LayerId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Epoch events
    EpochCreated(EpochCreatedEvent),
    EpochSplit(EpochSplitEvent),

    // LP events
    Deposit(DepositEvent),
    Withdraw(WithdrawEvent),
    Materialized(MaterializedEvent),

    // Layer events
    TradeLayerCreated(TradeLayerCreatedEvent),
    TradeLayerActivated(TradeLayerActivatedEvent),
    TradeLayerClosed(TradeLayerClosedEvent),
    AllocationClaimed(AllocationClaimedEvent),
    AllocationReleased(AllocationReleasedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochCreatedEvent {
    pub epoch_id: EpochId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochSplitEvent {
    pub epoch_id: EpochId,
    pub locked_shares: u128,
    pub rollover_epoch_id: EpochId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositEvent {
    pub lp: Address,
    pub epoch_id: EpochId,
    pub amount: u128,
    pub shares: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawEvent {
    pub lp: Address,
    pub epoch_id: EpochId,
    pub amount: u128,
    pub shares: u128,
}

/// One concretized split link of an LP's materialization walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializedEvent {
    pub lp: Address,
    pub from_epoch: EpochId,
    pub locked_shares: u128,
    pub rollover_shares: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLayerCreatedEvent {
    pub layer_id: LayerId,
    pub funding_epoch_id: EpochId,
    pub required_backing: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLayerActivatedEvent {
    pub layer_id: LayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLayerClosedEvent {
    pub layer_id: LayerId,
    pub lp_gains: bool,
    /// Token units returned to the funding epoch's free assets.
    pub returned_to_pool: u128,
    /// Token units paid out externally (loss settlements only).
    pub paid_out: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationClaimedEvent {
    pub layer_id: LayerId,
    pub lp: Address,
    pub amount: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationReleasedEvent {
    pub layer_id: LayerId,
    pub lp: Address,
    pub amount: u128,
}
