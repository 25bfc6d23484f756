// 6.0 layer.rs: trade layer records. a layer is one unit of locked liquidity
// backing a trading exposure: funded out of a single epoch at creation, claimed
// proportionally by LPs while Open, settled (profit or loss) on close.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{Address, EpochId, LayerId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerStatus {
    /// Accepting LP claims; not yet trading.
    Open,
    /// Trading; claims are closed.
    Active,
    /// Settled; LPs release their utilization individually.
    Closed,
}

impl LayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerStatus::Open => "open",
            LayerStatus::Active => "active",
            LayerStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for LayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One LP's claimed slice of a layer's backing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Allocation {
    /// Token units of backing attributed to this LP.
    pub amount: u128,
    /// Set on claim, cleared on release. a claimed flag with zero amount never
    /// occurs; release zeroes both together.
    pub claimed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLayer {
    pub id: LayerId,
    /// Token units locked out of the funding epoch at creation.
    pub required_backing: u128,
    /// The epoch (locked by the creation-time split) this layer draws on.
    pub funding_epoch_id: EpochId,
    pub status: LayerStatus,
    /// Sum of claimed per-LP allocations. never exceeds `required_backing`.
    pub total_allocated: u128,
    /// Backing still distributable among LPs. never negative.
    pub remaining_backing: u128,
    pub allocations: HashMap<Address, Allocation>,
    pub created_at: Timestamp,
}

impl TradeLayer {
    pub fn new(
        id: LayerId,
        required_backing: u128,
        funding_epoch_id: EpochId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            required_backing,
            funding_epoch_id,
            status: LayerStatus::Open,
            total_allocated: 0,
            remaining_backing: required_backing,
            allocations: HashMap::new(),
            created_at,
        }
    }

    pub fn allocation(&self, lp: Address) -> Allocation {
        self.allocations.get(&lp).copied().unwrap_or_default()
    }

    pub fn has_claimed(&self, lp: Address) -> bool {
        self.allocation(lp).claimed
    }

    pub fn is_settled(&self) -> bool {
        self.status == LayerStatus::Closed
    }
}
