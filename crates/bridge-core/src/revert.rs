//! Standard revert payload encoding.
//!
//! A failed call returns `keccak("Error(string)")[0..4] ++ abiEncode(reason)`
//! so any caller speaking the standard contract-call error convention can
//! decode the reason. Encoding is a pure function of the message; no gas or
//! ledger work happens here.

use alloy_primitives::Bytes;
use alloy_sol_types::{Revert, SolError};

/// `keccak("Error(string)")[0..4]`.
pub const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

pub fn encode(reason: &str) -> Bytes {
    Revert::from(reason).abi_encode().into()
}

pub fn decode(payload: &[u8]) -> Option<String> {
    Revert::abi_decode(payload).ok().map(|revert| revert.reason)
}
