//! Distribution bridge: reward withdrawal and withdraw-address management.
//! Mounted at `0x..0801`.
//!
//! Withdrawn rewards are native transfers out of the distribution module
//! pool, so the balance reconciler is attached.

use alloy_primitives::{address, Address, B256};
use alloy_sol_types::{sol, SolCall, SolEvent, SolValue};
use bridge_core::{
    balance::BalanceHandlerFactory,
    dispatch,
    errors::{Error, Result},
    keepers::DistributionKeeper,
    precompile::{Outcome, Precompile, PrecompiledContract},
    router, Contract, FrameInfo,
};
use bridge_state::{Context, Log, StateDb};

sol! {
    function withdrawDelegatorRewards(string validator) external returns (uint256 amount);
    function setWithdrawAddress(address withdrawAddress) external returns (bool success);

    function delegationRewards(address delegator, string validator) external view returns (uint256 amount);
    function withdrawAddress(address delegator) external view returns (address withdrawAddress);

    event WithdrawDelegatorRewards(address indexed delegator, string validator, uint256 amount);
}

pub const DISTRIBUTION_PRECOMPILE_ADDR: Address =
    address!("0x0000000000000000000000000000000000000801");

#[derive(Debug, Clone)]
pub struct DistributionPrecompile<K> {
    precompile: Precompile,
    keeper: K,
}

impl<K: DistributionKeeper> DistributionPrecompile<K> {
    pub fn new(keeper: K, evm_denom: impl Into<String>) -> Self {
        Self {
            precompile: Precompile::new(DISTRIBUTION_PRECOMPILE_ADDR)
                .with_balance_handler(BalanceHandlerFactory::new(evm_denom)),
            keeper,
        }
    }

    fn is_transaction(selector: [u8; 4]) -> bool {
        matches!(
            selector,
            withdrawDelegatorRewardsCall::SELECTOR | setWithdrawAddressCall::SELECTOR
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
        match selector {
            withdrawDelegatorRewardsCall::SELECTOR => dispatch::run_with_state_db(
                ctx,
                state_db,
                frame,
                args,
                |ctx, call: withdrawDelegatorRewardsCall, state, frame| {
                    let reward = self.keeper.withdraw_delegator_rewards(
                        ctx,
                        frame.caller,
                        &call.validator,
                    )?;
                    tracing::debug!(
                        target: "precompile::distribution",
                        delegator = %frame.caller,
                        validator = %call.validator,
                        amount = %reward.amount,
                        "withdrew rewards"
                    );
                    emit_withdraw_log(state, frame.caller, &call.validator, reward.amount);
                    Ok(reward.amount)
                },
            ),
            setWithdrawAddressCall::SELECTOR => {
                dispatch::run(ctx, args, |ctx, call: setWithdrawAddressCall| {
                    self.keeper
                        .set_withdraw_address(ctx, frame.caller, call.withdrawAddress)?;
                    Ok(true)
                })
            }
            delegationRewardsCall::SELECTOR => {
                dispatch::run(ctx, args, |ctx, call: delegationRewardsCall| {
                    let reward =
                        self.keeper
                            .delegation_rewards(ctx, call.delegator, &call.validator)?;
                    Ok(reward.amount)
                })
            }
            withdrawAddressCall::SELECTOR => {
                dispatch::run(ctx, args, |ctx, call: withdrawAddressCall| {
                    self.keeper.withdraw_address(ctx, call.delegator)
                })
            }
            _ => Err(Error::unknown_selector(selector)),
        }
    }
}

fn emit_withdraw_log(
    state_db: &StateDb,
    delegator: Address,
    validator: &str,
    amount: alloy_primitives::U256,
) {
    let topic0: B256 = WithdrawDelegatorRewards::SIGNATURE_HASH;
    state_db.add_log(Log {
        address: DISTRIBUTION_PRECOMPILE_ADDR,
        topics: vec![topic0, delegator.into_word()],
        data: (validator.to_string(), amount).abi_encode().into(),
    });
}

impl<K: DistributionKeeper> PrecompiledContract for DistributionPrecompile<K> {
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
