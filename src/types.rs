// 1.0: all the primitives live here. nothing in the ledger works without these types.
// IDs, addresses, the share scale factor, timestamps. each id is a newtype so the
// compiler catches type mixups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed scale factor for share accounting. shares = token amount * PRECISION.
/// All share math is integer floor division; no floating point anywhere.
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

// 1.1: opaque participant address. LPs, the pool itself, and the trader-side
// counterparty all live in this space. the zero address is never a valid participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub u64);

impl Address {
    pub const ZERO: Address = Address(0);

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

// 1.2: epoch ids are monotonically increasing from 1. id 0 means "no epoch" and is
// the end-of-chain marker in rollover links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EpochId(pub u64);

impl EpochId {
    pub const NONE: EpochId = EpochId(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch#{}", self.0)
    }
}

// 1.3: trade layer ids, monotonically increasing from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

// 1.4: millisecond timestamp. the ledger carries a logical clock; events record it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Floor of `a * b / d` with overflow detection on the intermediate product.
/// Returns None on overflow or when `d` is zero; callers surface both as errors.
pub fn mul_div(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    a.checked_mul(b).map(|p| p / d)
}
