//! Method routing: selector extraction and read-only protection.
//!
//! Two selector encodings exist among the bridges: a single leading byte
//! for the ordinal-enum bank bridge, and the standard 4-byte big-endian
//! function selector for the ABI-typed bridges. The write-protection check
//! runs here, before any gas accounting or ledger access.

use crate::errors::{Error, Result};

/// Splits the 4-byte selector from the input.
pub fn split_method_id(input: &[u8]) -> Result<([u8; 4], &[u8])> {
    if input.len() < 4 {
        return Err(Error::InputTooShort);
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&input[..4]);
    Ok((selector, &input[4..]))
}

/// Splits the single-byte method ordinal from the input.
pub fn split_method_byte(input: &[u8]) -> Result<(u8, &[u8])> {
    match input.split_first() {
        Some((method, rest)) => Ok((*method, rest)),
        None => Err(Error::InputTooShort),
    }
}

/// Splits the 4-byte selector and rejects mutating methods in a read-only
/// call context before anything else happens.
pub fn parse_method(
    input: &[u8],
    readonly: bool,
    is_transaction: impl Fn([u8; 4]) -> bool,
) -> Result<([u8; 4], &[u8])> {
    let (selector, args) = split_method_id(input)?;
    if readonly && is_transaction(selector) {
        return Err(Error::WriteProtection);
    }
    Ok((selector, args))
}

/// Single-byte variant of [`parse_method`].
pub fn parse_method_byte(
    input: &[u8],
    readonly: bool,
    is_transaction: impl Fn(u8) -> bool,
) -> Result<(u8, &[u8])> {
    let (method, args) = split_method_byte(input)?;
    if readonly && is_transaction(method) {
        return Err(Error::WriteProtection);
    }
    Ok((method, args))
}
