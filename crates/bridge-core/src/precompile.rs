//! The shared native-action execution engine.
//!
//! Every chain-module bridge runs its ledger work through
//! [`Precompile::run_native_action`], which reconciles the VM's
//! gas-metered, revert-on-error call with the ledger's transactional
//! multi-store in a fixed order:
//!
//! 1. register a multi-store snapshot plus event-log mark on the state
//!    journal, so an enclosing VM revert rolls the ledger back in lock-step
//! 2. commit the scratch context so the action sees up-to-date state
//! 3. open a metered ledger gas scope seeded with the gas the transaction
//!    already consumed, bounded by the VM budget
//! 4. run the action
//! 5. debit exactly the metered ledger cost from the VM budget
//! 6. project any native balance movements back into the VM view
//!
//! Any failure reverts this call's journal entries and is encoded as a
//! standard revert payload; out-of-gas additionally consumes the frame's
//! remaining budget, and is never allowed to escape as a fault.

use alloy_primitives::{Address, Bytes};
use bridge_state::{Context, GasConfig, GasMeter, StateDb};

use crate::{
    balance::BalanceHandlerFactory,
    contract::Contract,
    errors::{Error, Result},
    revert,
};

/// Terminal result of one bridge call: raw output on success, encoded
/// revert payload on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Bytes),
    Revert(Bytes),
}

impl Outcome {
    /// Encodes an error as a revert outcome without touching the ledger.
    pub fn revert_with(err: &Error) -> Self {
        Self::Revert(revert::encode(&err.to_string()))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn output(&self) -> &Bytes {
        match self {
            Self::Success(bytes) | Self::Revert(bytes) => bytes,
        }
    }

    /// Decoded human-readable reason, if this is a revert.
    pub fn revert_reason(&self) -> Option<String> {
        match self {
            Self::Success(_) => None,
            Self::Revert(payload) => revert::decode(payload),
        }
    }
}

/// Static per-bridge configuration: gas cost parameters, the fixed mount
/// address, and the optional balance reconciler. Immutable after
/// construction and shared read-only across all calls to the bridge.
#[derive(Debug, Clone)]
pub struct Precompile {
    pub kv_gas_config: GasConfig,
    pub transient_kv_gas_config: GasConfig,
    pub contract_address: Address,
    pub balance_handler: Option<BalanceHandlerFactory>,
}

impl Precompile {
    pub fn new(contract_address: Address) -> Self {
        Self {
            kv_gas_config: GasConfig::kv_default(),
            transient_kv_gas_config: GasConfig::transient_default(),
            contract_address,
            balance_handler: None,
        }
    }

    pub fn with_balance_handler(mut self, factory: BalanceHandlerFactory) -> Self {
        self.balance_handler = Some(factory);
        self
    }

    pub fn address(&self) -> Address {
        self.contract_address
    }

    /// Advisory minimum gas for a call with this input. Pure: no ledger
    /// access, no state mutation.
    pub fn required_gas(&self, input: &[u8], is_transaction: bool) -> u64 {
        let cfg = &self.kv_gas_config;
        if is_transaction {
            cfg.write_cost_flat + cfg.write_cost_per_byte * input.len() as u64
        } else {
            cfg.read_cost_flat + cfg.read_cost_per_byte * input.len() as u64
        }
    }

    /// Runs a native action with snapshot, gas, and balance management
    /// around it. Every failure rolls the ledger back to the entry snapshot
    /// and is returned as an encoded revert payload.
    pub fn run_native_action<A>(
        &self,
        state_db: &StateDb,
        contract: &mut Contract,
        action: A,
    ) -> Outcome
    where
        A: FnOnce(&mut Context) -> Result<Vec<u8>>,
    {
        let frame_mark = state_db.snapshot();
        match self.execute_native_action(state_db, contract, action) {
            Ok(output) => Outcome::Success(output.into()),
            Err(err) => {
                state_db.revert_to_snapshot(frame_mark);
                if err == Error::OutOfGas {
                    // gas spent up to the failure point is never refunded
                    contract.consume_all();
                }
                tracing::debug!(
                    target: "precompile",
                    address = %self.contract_address,
                    %err,
                    "native action reverted"
                );
                Outcome::revert_with(&err)
            }
        }
    }

    fn execute_native_action<A>(
        &self,
        state_db: &StateDb,
        contract: &mut Contract,
        action: A,
    ) -> Result<Vec<u8>>
    where
        A: FnOnce(&mut Context) -> Result<Vec<u8>>,
    {
        // snapshot before any change, registered on the journal so an
        // enclosing revert discards this call's ledger mutations too
        let snapshot = state_db.multi_store_snapshot();
        let events_len = state_db.events_len();
        state_db.record_precompile_call(snapshot, events_len);

        // flush pending VM state so the action sees up-to-date balances
        state_db.commit_cache_ctx();

        let initial_gas = state_db.native_gas_consumed();

        // metered scope bounded by the VM budget, seeded with the ledger
        // gas already consumed so those costs are not lost
        let mut ctx = state_db.cache_context(
            GasMeter::limited(contract.gas()),
            self.kv_gas_config,
            self.transient_kv_gas_config,
        );
        ctx.gas_meter_mut()
            .consume(initial_gas, "creating a new gas meter")?;

        let mut handler = self.balance_handler.as_ref().map(BalanceHandlerFactory::handler);
        if let Some(handler) = handler.as_mut() {
            handler.before_balance_change(&ctx);
        }

        let output = match action(&mut ctx) {
            Ok(output) => output,
            Err(Error::OutOfGas) => {
                // the recoverable ledger gas fault: neutralize the gas
                // configs so no cleanup path can fault again, then surface
                // a clean out-of-gas failure
                ctx.reset_gas_configs();
                return Err(Error::OutOfGas);
            }
            Err(err) => return Err(err),
        };

        let cost = ctx.gas_meter().consumed().saturating_sub(initial_gas);
        if !contract.use_gas(cost) {
            return Err(Error::OutOfGas);
        }

        if let Some(handler) = handler.as_ref() {
            handler.after_balance_change(&ctx, state_db)?;
        }

        Ok(output)
    }
}

/// The entry points a bridge exposes to the host virtual machine.
pub trait PrecompiledContract {
    /// Fixed address this bridge is mounted at.
    fn address(&self) -> Address;

    /// Advisory gas floor for the given input; zero on malformed input.
    fn required_gas(&self, input: &[u8]) -> u64;

    /// Executes the call against the shared transaction state.
    fn run(&self, state_db: &StateDb, contract: &mut Contract, readonly: bool) -> Outcome;
}
