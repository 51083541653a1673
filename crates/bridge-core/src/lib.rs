//! Shared machinery of the native-module bridges: the execution engine,
//! method routing, typed dispatch, balance reconciliation, and the keeper
//! trait boundaries.
//!
//! A bridge built on this crate is a [`Precompile`] plus a set of typed
//! handlers: the host calls [`PrecompiledContract::run`], the bridge routes
//! the selector, and the engine wraps the chosen handler in snapshot, gas,
//! and balance management. See the `bridge-precompiles` crate for the
//! concrete bridges.

pub mod balance;
pub mod contract;
pub mod dispatch;
pub mod errors;
pub mod keepers;
pub mod precompile;
pub mod revert;
pub mod router;
pub mod types;

pub use balance::{BalanceHandler, BalanceHandlerFactory};
pub use contract::{Contract, FrameInfo};
pub use errors::{Error, Result};
pub use precompile::{Outcome, Precompile, PrecompiledContract};
pub use types::{module_address, Coin, PageRequest, PageResponse};
