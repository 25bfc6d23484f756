// 7.0 asset.rs: the value-transfer collaborator. the ledger treats the asset as
// an opaque external balance sheet exposing transfer / transferFrom / balanceOf,
// each failing with no state change on insufficient balance or allowance. the
// mock implementation backs tests and the simulation binary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::Address;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("insufficient balance: {holder} has {available}, needs {requested}")]
    InsufficientBalance {
        holder: Address,
        available: u128,
        requested: u128,
    },

    #[error("insufficient allowance: {owner} -> {spender} allows {available}, needs {requested}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        available: u128,
        requested: u128,
    },
}

/// External asset ledger seam. Implementations must be atomic per call: a failed
/// call leaves balances and allowances untouched.
pub trait AssetLedger {
    /// Moves `amount` from the pool's own balance to `to`.
    fn transfer(&mut self, to: Address, amount: u128) -> Result<(), AssetError>;

    /// Moves `amount` from `from` to `to`, consuming `from`'s allowance toward `to`.
    fn transfer_from(&mut self, from: Address, to: Address, amount: u128) -> Result<(), AssetError>;

    fn balance_of(&self, holder: Address) -> u128;
}

/// In-memory asset ledger for tests and simulation. The pool address is fixed at
/// construction so `transfer` debits the right holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockAsset {
    pool: Address,
    balances: HashMap<Address, u128>,
    /// (owner, spender) -> remaining allowance.
    allowances: HashMap<(Address, Address), u128>,
}

impl MockAsset {
    pub fn new(pool: Address) -> Self {
        Self {
            pool,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    pub fn mint(&mut self, holder: Address, amount: u128) {
        *self.balances.entry(holder).or_insert(0) += amount;
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: u128) {
        self.allowances.insert((owner, spender), amount);
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.allowances.get(&(owner, spender)).copied().unwrap_or(0)
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: u128) -> Result<(), AssetError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(AssetError::InsufficientBalance {
                holder: from,
                available,
                requested: amount,
            });
        }
        *self.balances.entry(from).or_insert(0) -= amount;
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }
}

impl AssetLedger for MockAsset {
    fn transfer(&mut self, to: Address, amount: u128) -> Result<(), AssetError> {
        self.move_balance(self.pool, to, amount)
    }

    fn transfer_from(&mut self, from: Address, to: Address, amount: u128) -> Result<(), AssetError> {
        let allowed = self.allowance(from, to);
        if allowed < amount {
            return Err(AssetError::InsufficientAllowance {
                owner: from,
                spender: to,
                available: allowed,
                requested: amount,
            });
        }
        // check the balance before consuming allowance so a failure is a no-op
        let available = self.balance_of(from);
        if available < amount {
            return Err(AssetError::InsufficientBalance {
                holder: from,
                available,
                requested: amount,
            });
        }
        self.allowances.insert((from, to), allowed - amount);
        self.move_balance(from, to, amount)
    }

    fn balance_of(&self, holder: Address) -> u128 {
        self.balances.get(&holder).copied().unwrap_or(0)
    }
}
