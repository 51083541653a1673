//! Staking bridge: delegate, undelegate, redelegate, and delegation
//! queries. Mounted at `0x..0800`.
//!
//! The delegator is always the caller; a contract cannot stake on behalf of
//! another account. Coin movements into and out of the bonded pool happen
//! on the ledger side, so the balance reconciler is attached to project
//! them back into the VM balance view.

use alloy_primitives::{address, Address, U256};
use alloy_sol_types::{sol, SolCall, SolEvent, SolValue};
use bridge_core::{
    balance::BalanceHandlerFactory,
    dispatch,
    errors::{Error, Result},
    keepers::StakingKeeper,
    precompile::{Outcome, Precompile, PrecompiledContract},
    router, Contract, FrameInfo,
};
use bridge_state::{Context, Log, StateDb};

sol! {
    function delegate(string validator, uint256 amount) external returns (bool success);
    function undelegate(string validator, uint256 amount) external returns (uint64 completionHeight);
    function redelegate(string srcValidator, string dstValidator, uint256 amount) external returns (bool success);

    function delegation(address delegator, string validator) external view returns (uint256 amount);
    function bondDenom() external view returns (string denom);

    event Delegate(address indexed delegator, string validator, uint256 amount);
    event Undelegate(address indexed delegator, string validator, uint256 amount, uint64 completionHeight);
    event Redelegate(address indexed delegator, string srcValidator, string dstValidator, uint256 amount);
}

pub const STAKING_PRECOMPILE_ADDR: Address =
    address!("0x0000000000000000000000000000000000000800");

#[derive(Debug, Clone)]
pub struct StakingPrecompile<K> {
    precompile: Precompile,
    keeper: K,
}

impl<K: StakingKeeper> StakingPrecompile<K> {
    pub fn new(keeper: K, evm_denom: impl Into<String>) -> Self {
        Self {
            precompile: Precompile::new(STAKING_PRECOMPILE_ADDR)
                .with_balance_handler(BalanceHandlerFactory::new(evm_denom)),
            keeper,
        }
    }

    fn is_transaction(selector: [u8; 4]) -> bool {
        matches!(
            selector,
            delegateCall::SELECTOR | undelegateCall::SELECTOR | redelegateCall::SELECTOR
        )
    }

    fn execute(
        &self,
        ctx: &mut Context,
        state_db: &StateDb,
        frame: FrameInfo,
        selector: [u8; 4],
        args: &[u8],
    ) -> Result<Vec<u8>> {
        tracing::debug!(
            target: "precompile::staking",
            selector = %alloy_primitives::hex::encode(selector),
            caller = %frame.caller,
            "dispatching"
        );
        match selector {
            delegateCall::SELECTOR => dispatch::run_with_state_db(
                ctx,
                state_db,
                frame,
                args,
                |ctx, call: delegateCall, state, frame| {
                    self.keeper
                        .delegate(ctx, frame.caller, &call.validator, call.amount)?;
                    emit_log(
                        state,
                        Delegate::SIGNATURE_HASH.into(),
                        frame.caller,
                        (call.validator, call.amount).abi_encode(),
                    );
                    Ok(true)
                },
            ),
            undelegateCall::SELECTOR => dispatch::run_with_state_db(
                ctx,
                state_db,
                frame,
                args,
                |ctx, call: undelegateCall, state, frame| {
                    let height = self.keeper.undelegate(
                        ctx,
                        frame.caller,
                        &call.validator,
                        call.amount,
                    )?;
                    emit_log(
                        state,
                        Undelegate::SIGNATURE_HASH.into(),
                        frame.caller,
                        (call.validator, call.amount, height).abi_encode(),
                    );
                    Ok(height)
                },
            ),
            redelegateCall::SELECTOR => dispatch::run_with_state_db(
                ctx,
                state_db,
                frame,
                args,
                |ctx, call: redelegateCall, state, frame| {
                    self.keeper.redelegate(
                        ctx,
                        frame.caller,
                        &call.srcValidator,
                        &call.dstValidator,
                        call.amount,
                    )?;
                    emit_log(
                        state,
                        Redelegate::SIGNATURE_HASH.into(),
                        frame.caller,
                        (call.srcValidator, call.dstValidator, call.amount).abi_encode(),
                    );
                    Ok(true)
                },
            ),
            delegationCall::SELECTOR => {
                dispatch::run(ctx, args, |ctx, call: delegationCall| {
                    self.keeper
                        .delegation(ctx, call.delegator, &call.validator)
                })
            }
            bondDenomCall::SELECTOR => dispatch::run(ctx, args, |ctx, _call: bondDenomCall| {
                self.keeper.bond_denom(ctx)
            }),
            _ => Err(Error::unknown_selector(selector)),
        }
    }
}

fn emit_log(state_db: &StateDb, topic0: alloy_primitives::B256, indexed: Address, data: Vec<u8>) {
    state_db.add_log(Log {
        address: STAKING_PRECOMPILE_ADDR,
        topics: vec![topic0, indexed.into_word()],
        data: data.into(),
    });
}

impl<K: StakingKeeper> PrecompiledContract for StakingPrecompile<K> {
    fn address(&self) -> Address {
        self.precompile.address()
    }

    fn required_gas(&self, input: &[u8]) -> u64 {
        match router::split_method_id(input) {
            Ok((selector, _)) => self
                .precompile
                .required_gas(input, Self::is_transaction(selector)),
            Err(_) => 0,
        }
    }

    fn run(&self, state_db: &StateDb, contract: &mut Contract, readonly: bool) -> Outcome {
        let (selector, args) =
            match router::parse_method(&contract.input, readonly, Self::is_transaction) {
                Ok((selector, args)) => (selector, args.to_vec()),
                Err(err) => return Outcome::revert_with(&err),
            };
        let frame = contract.frame();
        let state = state_db.clone();
        self.precompile
            .run_native_action(state_db, contract, |ctx| {
                self.execute(ctx, &state, frame, selector, &args)
            })
    }
}
