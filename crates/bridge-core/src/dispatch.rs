//! Typed dispatch helpers: decode, invoke, encode.
//!
//! Pure glue between the router and an adapter's handler. No gas, snapshot,
//! or balance logic lives here; that is strictly the engine's job around
//! these helpers.

use alloy_sol_types::{SolCall, SolValue};
use bridge_state::{Context, StateDb};

use crate::{
    contract::FrameInfo,
    errors::{Error, Result},
};

/// Decodes the argument bytes into a typed call, runs a pure function of
/// (context, typed args), and ABI-encodes the typed result.
pub fn run<C, R, F>(ctx: &mut Context, input: &[u8], f: F) -> Result<Vec<u8>>
where
    C: SolCall,
    R: SolValue,
    F: FnOnce(&mut Context, C) -> Result<R>,
{
    let call = C::abi_decode_raw(input).map_err(|err| Error::native(err.to_string()))?;
    let out = f(ctx, call)?;
    Ok(out.abi_encode())
}

/// Same as [`run`] for actions that additionally need the VM state handle
/// and the calling frame's metadata, e.g. to emit VM-visible log events or
/// read caller identity.
pub fn run_with_state_db<C, R, F>(
    ctx: &mut Context,
    state_db: &StateDb,
    frame: FrameInfo,
    input: &[u8],
    f: F,
) -> Result<Vec<u8>>
where
    C: SolCall,
    R: SolValue,
    F: FnOnce(&mut Context, C, &StateDb, FrameInfo) -> Result<R>,
{
    let call = C::abi_decode_raw(input).map_err(|err| Error::native(err.to_string()))?;
    let out = f(ctx, call, state_db, frame)?;
    Ok(out.abi_encode())
}
