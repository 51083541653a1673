//! Gas configuration and metering for native store access.
//!
//! The ledger side of a bridge call is metered independently of the virtual
//! machine's gas budget: every key-value access charges a flat cost plus a
//! per-byte cost against the call's [`GasMeter`]. The engine reconciles the
//! metered total against the VM budget after the action completes.

use thiserror::Error;

/// Raised when a gas meter exceeds its limit.
///
/// The meter never panics: exceeding the limit is an ordinary error value
/// propagated with `?` through keepers and adapters, so the engine can
/// convert it into a clean out-of-gas failure at its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("out of gas in location: {descriptor}")]
pub struct OutOfGas {
    /// Which charge tripped the limit.
    pub descriptor: &'static str,
}

/// Flat and per-byte costs for key-value store access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GasConfig {
    pub read_cost_flat: u64,
    pub read_cost_per_byte: u64,
    pub write_cost_flat: u64,
    pub write_cost_per_byte: u64,
    pub delete_cost: u64,
}

impl GasConfig {
    /// Default costs for persistent store access.
    pub const fn kv_default() -> Self {
        Self {
            read_cost_flat: 1000,
            read_cost_per_byte: 3,
            write_cost_flat: 2000,
            write_cost_per_byte: 30,
            delete_cost: 1000,
        }
    }

    /// Default costs for transient store access.
    pub const fn transient_default() -> Self {
        Self {
            read_cost_flat: 100,
            read_cost_per_byte: 0,
            write_cost_flat: 200,
            write_cost_per_byte: 3,
            delete_cost: 100,
        }
    }

    /// A config that charges nothing. Installed after an out-of-gas fault so
    /// cleanup paths cannot fault again.
    pub const fn free() -> Self {
        Self {
            read_cost_flat: 0,
            read_cost_per_byte: 0,
            write_cost_flat: 0,
            write_cost_per_byte: 0,
            delete_cost: 0,
        }
    }
}

/// Tracks gas consumption against an optional limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasMeter {
    limit: Option<u64>,
    consumed: u64,
}

impl GasMeter {
    /// A meter that errors once `limit` is exceeded.
    pub const fn limited(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            consumed: 0,
        }
    }

    /// A meter that only tallies, used for the transaction-level ledger
    /// context whose budget is enforced elsewhere.
    pub const fn infinite() -> Self {
        Self {
            limit: None,
            consumed: 0,
        }
    }

    /// Charges `amount`, failing if the limit is exceeded. The consumed
    /// total is retained past the limit so callers can still observe how
    /// much was attempted.
    pub fn consume(&mut self, amount: u64, descriptor: &'static str) -> Result<(), OutOfGas> {
        self.consumed = self.consumed.saturating_add(amount);
        if let Some(limit) = self.limit {
            if self.consumed > limit {
                return Err(OutOfGas { descriptor });
            }
        }
        Ok(())
    }

    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }
}
