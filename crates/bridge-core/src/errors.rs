//! Error taxonomy of the native-action engine.

use alloy_primitives::hex;
use bridge_state::{OutOfGas, StateError};
use thiserror::Error;

/// Errors surfaced by the engine and its bridges.
///
/// Every variant is handled locally at the engine boundary by converting it
/// into a standard revert payload; none of them escapes `run_native_action`
/// as a fault. Messages match the host conventions callers already decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Call input shorter than the method selector.
    #[error("input too short")]
    InputTooShort,

    /// Selector does not match any known operation for the bridge.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// A mutating method was invoked in a read-only call context.
    #[error("write protection")]
    WriteProtection,

    /// Caller identity does not satisfy the operation's authorization rule.
    #[error("unauthorized")]
    Unauthorized,

    /// The VM budget was exhausted reconciling the metered ledger cost, or
    /// the ledger gas meter tripped during the action.
    #[error("out of gas")]
    OutOfGas,

    /// The ledger rejected the request for business-logic reasons; the
    /// message is forwarded verbatim into the revert payload.
    #[error("{0}")]
    Native(String),
}

impl Error {
    pub fn native(msg: impl Into<String>) -> Self {
        Self::Native(msg.into())
    }

    pub fn unknown_selector(selector: [u8; 4]) -> Self {
        Self::UnknownMethod(format!("0x{}", hex::encode(selector)))
    }

    pub fn unknown_ordinal(method: u8) -> Self {
        Self::UnknownMethod(method.to_string())
    }
}

impl From<OutOfGas> for Error {
    fn from(_: OutOfGas) -> Self {
        Self::OutOfGas
    }
}

impl From<StateError> for Error {
    fn from(err: StateError) -> Self {
        Self::Native(err.to_string())
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
