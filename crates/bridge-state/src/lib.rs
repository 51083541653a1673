//! # Host-state model for the native-module bridge
//!
//! The execution engine in `bridge-core` runs against two units of work at
//! once: the virtual machine's journaled call state and the ledger's
//! transactional multi-store. This crate models that collaborator surface,
//! the pieces the engine consumes at its interface boundary:
//!
//! - [`MemStore`] / [`CacheStore`]: the layered multi-store with
//!   snapshot/restore and an at-most-once flush per transaction
//! - [`GasMeter`] / [`GasConfig`]: metered ledger gas with flat + per-byte
//!   store access costs
//! - [`EventManager`]: the deterministic, truncatable event log
//! - [`StateDb`] / [`Context`]: the journaled transaction state and the
//!   per-invocation ledger context derived from it
//!
//! Everything here is single-threaded and deterministic: no clocks, no
//! I/O, ordered maps only.

pub mod events;
pub mod gas;
pub mod statedb;
pub mod store;

pub use events::{
    Attribute, Event, EventManager, ATTR_AMOUNT, ATTR_RECEIVER, ATTR_SPENDER, EVENT_COIN_RECEIVED,
    EVENT_COIN_SPENT,
};
pub use gas::{GasConfig, GasMeter, OutOfGas};
pub use statedb::{balance_key, Context, Log, MultiStoreSnapshot, StateDb, StateError, BANK_MODULE};
pub use store::{CacheStore, MemStore, StoreSnapshot};
