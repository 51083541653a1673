//! Shared value types crossing the bridge boundary.

use std::{fmt, str::FromStr};

use alloy_primitives::{keccak256, Address, U256};

use crate::errors::Error;

/// A native coin amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    pub denom: String,
    pub amount: U256,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: U256) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

/// Canonical coin string: decimal amount immediately followed by the denom,
/// e.g. `"1000uatom"`. This is the form carried in event attributes.
impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| Error::native(format!("invalid coin expression: {s:?}")))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() || denom.is_empty() {
            return Err(Error::native(format!("invalid coin expression: {s:?}")));
        }
        let amount = U256::from_str_radix(amount, 10)
            .map_err(|err| Error::native(format!("invalid coin amount: {err}")))?;
        Ok(Self::new(denom, amount))
    }
}

/// Deterministic address of a named module account (bonded pool, gov,
/// distribution, ...). Native transfers to and from these accounts are what
/// the balance reconciler projects back into the VM view.
pub fn module_address(name: &str) -> Address {
    let mut preimage = Vec::with_capacity(7 + name.len());
    preimage.extend_from_slice(b"module/");
    preimage.extend_from_slice(name.as_bytes());
    Address::from_slice(&keccak256(&preimage)[12..])
}

/// Cursor-style pagination request forwarded to module queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub key: Vec<u8>,
    pub offset: u64,
    pub limit: u64,
    pub count_total: bool,
    pub reverse: bool,
}

/// Pagination cursor returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResponse {
    pub next_key: Vec<u8>,
    pub total: u64,
}

impl PageResponse {
    /// Builds the caller-facing page from the module's native pagination
    /// result; absence maps to an empty page.
    pub fn from_native(resp: Option<(Vec<u8>, u64)>) -> Self {
        match resp {
            Some((next_key, total)) => Self { next_key, total },
            None => Self::default(),
        }
    }
}
