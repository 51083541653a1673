//! The calling contract's frame as seen by a bridge.

use alloy_primitives::{Address, Bytes};

/// Caller identity, raw input, and the remaining VM gas budget of one call.
#[derive(Debug, Clone)]
pub struct Contract {
    pub caller: Address,
    pub address: Address,
    pub input: Bytes,
    gas: u64,
}

impl Contract {
    pub fn new(caller: Address, address: Address, input: Bytes, gas: u64) -> Self {
        Self {
            caller,
            address,
            input,
            gas,
        }
    }

    pub fn gas(&self) -> u64 {
        self.gas
    }

    /// Debits `amount` from the budget; returns `false` without deducting
    /// if the budget is insufficient.
    pub fn use_gas(&mut self, amount: u64) -> bool {
        if self.gas < amount {
            return false;
        }
        self.gas -= amount;
        true
    }

    /// Consumes whatever budget remains. Gas spent up to a failure is never
    /// refunded.
    pub fn consume_all(&mut self) {
        self.gas = 0;
    }

    /// Read-only view handed to state-aware actions.
    pub fn frame(&self) -> FrameInfo {
        FrameInfo {
            caller: self.caller,
            address: self.address,
            gas: self.gas,
        }
    }
}

/// Snapshot of the frame metadata an action may read: who is calling, which
/// bridge address was invoked, and how much budget remains.
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo {
    pub caller: Address,
    pub address: Address,
    pub gas: u64,
}
