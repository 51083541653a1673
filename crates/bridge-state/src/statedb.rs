//! Journaled state database linking the VM balance view with the ledger's
//! scratch store.
//!
//! A host VM would compose nested precompile rollbacks through its own
//! call stack and state journal; since that collaborator is modeled rather
//! than reused, the journal is explicit here: every reversible effect
//! pushes an entry, a call frame records the
//! journal length at entry, and reverting to that mark unwinds everything
//! later entries did, including the ledger store snapshot and event-log
//! truncation registered by nested bridge calls.
//!
//! [`StateDb`] is a cheap clonable handle (`Rc<RefCell<_>>`); execution is
//! single-threaded and synchronous by design, and re-entrant bridge calls
//! each hold their own handle to the same transaction state.

use std::{
    cell::RefCell,
    collections::{BTreeSet, HashMap},
    rc::Rc,
};

use alloy_primitives::{Address, Bytes, B256, U256};
use thiserror::Error;

use crate::{
    events::{Event, EventManager},
    gas::{GasConfig, GasMeter, OutOfGas},
    store::{CacheStore, MemStore, StoreSnapshot},
};

/// Module name of the bank store, shared with the keepers at the interface
/// boundary so VM balance flushes and native balance reads agree on keys.
pub const BANK_MODULE: &str = "bank";

/// Storage key for an account's balance of `denom` in the bank module.
pub fn balance_key(address: &Address, denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + 20 + denom.len());
    key.extend_from_slice(b"balance/");
    key.extend_from_slice(address.as_slice());
    key.extend_from_slice(denom.as_bytes());
    key
}

/// VM balance arithmetic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("balance overflow")]
    BalanceOverflow,
    #[error("insufficient balance")]
    InsufficientBalance,
}

/// An EVM-visible log record emitted by a bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Point-in-time marker for the ledger multi-store, paired by the engine
/// with the event-log length at the same instant. Consumed exactly once:
/// either dropped on commit or used to roll back.
#[derive(Debug, Clone)]
pub struct MultiStoreSnapshot {
    store: StoreSnapshot,
    transient: StoreSnapshot,
}

#[derive(Debug)]
enum JournalEntry {
    /// A bridge call registered its ledger snapshot; undo restores the
    /// scratch store and truncates the event log.
    PrecompileCall {
        snapshot: MultiStoreSnapshot,
        events_len: usize,
    },
    /// A VM balance write; undo restores the previous value.
    BalanceSet {
        address: Address,
        prev: Option<U256>,
    },
    LogAppended,
}

#[derive(Debug)]
struct Inner {
    base: MemStore,
    store: CacheStore,
    transient: CacheStore,
    events: EventManager,
    /// Transaction-level ledger gas tally; per-call meters are seeded from
    /// its consumed total.
    tx_gas: GasMeter,
    balances: HashMap<Address, U256>,
    /// Accounts whose VM balance changed during this transaction. Never
    /// cleared before commit: each scratch-context flush rewrites them all
    /// so the store stays consistent even after a partial rollback.
    dirty: BTreeSet<Address>,
    journal: Vec<JournalEntry>,
    logs: Vec<Log>,
    evm_denom: String,
}

/// Journaled transaction state shared by the VM view and the ledger view.
#[derive(Debug, Clone)]
pub struct StateDb {
    inner: Rc<RefCell<Inner>>,
}

impl StateDb {
    pub fn new(evm_denom: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                base: MemStore::default(),
                store: CacheStore::default(),
                transient: CacheStore::default(),
                events: EventManager::default(),
                tx_gas: GasMeter::infinite(),
                balances: HashMap::new(),
                dirty: BTreeSet::new(),
                journal: Vec::new(),
                logs: Vec::new(),
                evm_denom: evm_denom.into(),
            })),
        }
    }

    /// Denomination of the gas token, shared by the balance reconciler and
    /// the bank bridge.
    pub fn evm_denom(&self) -> String {
        self.inner.borrow().evm_denom.clone()
    }

    // === VM balance view ===

    pub fn balance(&self, address: Address) -> U256 {
        self.inner
            .borrow()
            .balances
            .get(&address)
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Sets a VM balance, journaled so an enclosing revert restores it.
    pub fn set_balance(&self, address: Address, amount: U256) {
        let mut inner = self.inner.borrow_mut();
        let prev = inner.balances.insert(address, amount);
        inner.dirty.insert(address);
        inner.journal.push(JournalEntry::BalanceSet { address, prev });
    }

    pub fn add_balance(&self, address: Address, amount: U256) -> Result<(), StateError> {
        let new_balance = self
            .balance(address)
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow)?;
        self.set_balance(address, new_balance);
        Ok(())
    }

    pub fn sub_balance(&self, address: Address, amount: U256) -> Result<(), StateError> {
        let new_balance = self
            .balance(address)
            .checked_sub(amount)
            .ok_or(StateError::InsufficientBalance)?;
        self.set_balance(address, new_balance);
        Ok(())
    }

    /// Genesis-style balance seed: not journaled, marks the account dirty so
    /// the first scratch-context flush makes it visible to the ledger.
    pub fn seed_balance(&self, address: Address, amount: U256) {
        let mut inner = self.inner.borrow_mut();
        inner.balances.insert(address, amount);
        inner.dirty.insert(address);
    }

    // === VM logs ===

    pub fn add_log(&self, log: Log) {
        let mut inner = self.inner.borrow_mut();
        inner.logs.push(log);
        inner.journal.push(JournalEntry::LogAppended);
    }

    pub fn logs(&self) -> Vec<Log> {
        self.inner.borrow().logs.clone()
    }

    // === Scratch-context plumbing consumed by the engine ===

    /// Records the scratch store's current state. Paired with
    /// [`StateDb::events_len`] by the engine at call entry.
    pub fn multi_store_snapshot(&self) -> MultiStoreSnapshot {
        let inner = self.inner.borrow();
        MultiStoreSnapshot {
            store: inner.store.snapshot(),
            transient: inner.transient.snapshot(),
        }
    }

    pub fn events_len(&self) -> usize {
        self.inner.borrow().events.len()
    }

    /// Registers a bridge call's rollback marker on the journal, so that if
    /// the surrounding VM call later reverts, this ledger mutation is rolled
    /// back in lock-step.
    pub fn record_precompile_call(&self, snapshot: MultiStoreSnapshot, events_len: usize) {
        self.inner.borrow_mut().journal.push(JournalEntry::PrecompileCall {
            snapshot,
            events_len,
        });
    }

    /// Flushes the dirty VM balances into the bank store so the native
    /// action sees up-to-date state, charging the transaction-level gas
    /// tally for each write.
    pub fn commit_cache_ctx(&self) {
        let inner = &mut *self.inner.borrow_mut();
        let denom = inner.evm_denom.clone();
        for address in &inner.dirty {
            let amount = inner.balances.get(address).copied().unwrap_or(U256::ZERO);
            let key = balance_key(address, &denom);
            let cfg = GasConfig::kv_default();
            let cost = cfg.write_cost_flat + cfg.write_cost_per_byte * (key.len() as u64 + 32);
            // infinite meter, cannot fail
            let _ = inner.tx_gas.consume(cost, "scratch context flush");
            inner
                .store
                .set(BANK_MODULE, key, amount.to_be_bytes::<32>().to_vec());
        }
    }

    /// Ledger gas consumed so far in this transaction, used to seed each
    /// call's metered scope.
    pub fn native_gas_consumed(&self) -> u64 {
        self.inner.borrow().tx_gas.consumed()
    }

    /// Opens a per-invocation ledger context over the scratch store.
    pub fn cache_context(
        &self,
        gas_meter: GasMeter,
        kv_gas_config: GasConfig,
        transient_kv_gas_config: GasConfig,
    ) -> Context {
        Context {
            state: Rc::clone(&self.inner),
            gas_meter,
            kv_gas_config,
            transient_kv_gas_config,
        }
    }

    // === Call-frame snapshots (modeled host journal) ===

    /// Marks the current journal position; nested calls compose by each
    /// taking their own mark.
    pub fn snapshot(&self) -> usize {
        self.inner.borrow().journal.len()
    }

    /// Unwinds every journal entry past `mark`, newest first.
    pub fn revert_to_snapshot(&self, mark: usize) {
        let inner = &mut *self.inner.borrow_mut();
        while inner.journal.len() > mark {
            let Some(entry) = inner.journal.pop() else {
                break;
            };
            match entry {
                JournalEntry::PrecompileCall {
                    snapshot,
                    events_len,
                } => {
                    inner.store.restore(snapshot.store);
                    inner.transient.restore(snapshot.transient);
                    inner.events.truncate(events_len);
                }
                JournalEntry::BalanceSet { address, prev } => match prev {
                    Some(amount) => {
                        inner.balances.insert(address, amount);
                    }
                    None => {
                        inner.balances.remove(&address);
                        inner.dirty.remove(&address);
                    }
                },
                JournalEntry::LogAppended => {
                    inner.logs.pop();
                }
            }
        }
    }

    // === Transaction end ===

    /// Flushes the scratch store into the underlying multi-store. Called at
    /// most once per transaction, and only when it succeeds.
    pub fn commit(&self) {
        let inner = &mut *self.inner.borrow_mut();
        let mut store = std::mem::take(&mut inner.store);
        store.write(&mut inner.base);
        inner.transient = CacheStore::default();
        inner.journal.clear();
        tracing::trace!(
            target: "bridge_state",
            gas = inner.tx_gas.consumed(),
            "transaction committed"
        );
    }

    /// Number of flushes the underlying store has seen.
    pub fn base_write_count(&self) -> u64 {
        self.inner.borrow().base.write_count()
    }

    /// Raw, unmetered read of the scratch store, for wiring and assertions.
    pub fn store_get(&self, module: &str, key: &[u8]) -> Option<Vec<u8>> {
        let inner = self.inner.borrow();
        inner.store.get(&inner.base, module, key).map(<[u8]>::to_vec)
    }
}

/// Per-invocation ledger execution context: the scratch store and event log
/// of the transaction plus this call's own gas meter and gas configs.
///
/// Created fresh for each call by the engine and discarded at call end.
/// Every store access charges flat + per-byte gas before touching the data.
#[derive(Debug)]
pub struct Context {
    state: Rc<RefCell<Inner>>,
    gas_meter: GasMeter,
    kv_gas_config: GasConfig,
    transient_kv_gas_config: GasConfig,
}

impl Context {
    pub fn kv_get(&mut self, module: &str, key: &[u8]) -> Result<Option<Vec<u8>>, OutOfGas> {
        let cfg = self.kv_gas_config;
        self.read(module, key, cfg, false)
    }

    pub fn kv_set(&mut self, module: &str, key: Vec<u8>, value: Vec<u8>) -> Result<(), OutOfGas> {
        let cfg = self.kv_gas_config;
        self.write(module, key, value, cfg, false)
    }

    pub fn kv_delete(&mut self, module: &str, key: &[u8]) -> Result<(), OutOfGas> {
        self.gas_meter
            .consume(self.kv_gas_config.delete_cost, "kv delete")?;
        self.state.borrow_mut().store.delete(module, key);
        Ok(())
    }

    pub fn transient_get(&mut self, module: &str, key: &[u8]) -> Result<Option<Vec<u8>>, OutOfGas> {
        let cfg = self.transient_kv_gas_config;
        self.read(module, key, cfg, true)
    }

    pub fn transient_set(
        &mut self,
        module: &str,
        key: Vec<u8>,
        value: Vec<u8>,
    ) -> Result<(), OutOfGas> {
        let cfg = self.transient_kv_gas_config;
        self.write(module, key, value, cfg, true)
    }

    fn read(
        &mut self,
        module: &str,
        key: &[u8],
        cfg: GasConfig,
        transient: bool,
    ) -> Result<Option<Vec<u8>>, OutOfGas> {
        self.gas_meter.consume(cfg.read_cost_flat, "read flat")?;
        let value = {
            let inner = self.state.borrow();
            let store = if transient { &inner.transient } else { &inner.store };
            store.get(&inner.base, module, key).map(<[u8]>::to_vec)
        };
        let size = key.len() + value.as_ref().map_or(0, Vec::len);
        self.gas_meter
            .consume(cfg.read_cost_per_byte * size as u64, "read per byte")?;
        Ok(value)
    }

    fn write(
        &mut self,
        module: &str,
        key: Vec<u8>,
        value: Vec<u8>,
        cfg: GasConfig,
        transient: bool,
    ) -> Result<(), OutOfGas> {
        self.gas_meter.consume(cfg.write_cost_flat, "write flat")?;
        self.gas_meter.consume(
            cfg.write_cost_per_byte * (key.len() + value.len()) as u64,
            "write per byte",
        )?;
        let mut inner = self.state.borrow_mut();
        let store = if transient {
            &mut inner.transient
        } else {
            &mut inner.store
        };
        store.set(module, key, value);
        Ok(())
    }

    // === Events ===

    pub fn emit_event(&mut self, event: Event) {
        self.state.borrow_mut().events.emit(event);
    }

    pub fn events_len(&self) -> usize {
        self.state.borrow().events.len()
    }

    /// Events appended after `len`, in emission order.
    pub fn events_since(&self, len: usize) -> Vec<Event> {
        self.state.borrow().events.events()[len..].to_vec()
    }

    // === Gas ===

    pub fn gas_meter(&self) -> &GasMeter {
        &self.gas_meter
    }

    pub fn gas_meter_mut(&mut self) -> &mut GasMeter {
        &mut self.gas_meter
    }

    /// Installs zeroed gas configs so cleanup after an out-of-gas fault
    /// cannot fault again.
    pub fn reset_gas_configs(&mut self) {
        self.kv_gas_config = GasConfig::free();
        self.transient_kv_gas_config = GasConfig::free();
    }

    pub fn evm_denom(&self) -> String {
        self.state.borrow().evm_denom.clone()
    }
}
