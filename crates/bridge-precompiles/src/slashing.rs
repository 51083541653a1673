//! Slashing bridge: unjail and liveness queries. Mounted at `0x..0806`.
//!
//! `unjail` may only be called by the validator's operator account; anyone
//! else gets an unauthorized revert before the keeper is touched.

use alloy_primitives::{address, Address};
use alloy_sol_types::{sol, SolCall, SolEvent, SolValue};
use bridge_core::{
    dispatch,
    errors::{Error, Result},
    keepers::SlashingKeeper,
    precompile::{Outcome, Precompile, PrecompiledContract},
    router, Contract, FrameInfo,
};
use bridge_state::{Context, Log, StateDb};

sol! {
    function unjail(string validator) external returns (bool success);

    function getSigningInfo(string validator) external view
        returns (uint64 startHeight, uint64 jailedUntil, bool tombstoned, uint64 missedBlocks);

    event ValidatorUnjailed(address indexed operator, string validator);
}

pub const SLASHING_PRECOMPILE_ADDR: Address =
    address!("0x0000000000000000000000000000000000000806");

#[derive(Debug, Clone)]
pub struct SlashingPrecompile<K> {
    precompile: Precompile,
    keeper: K,
}

impl<K: SlashingKeeper> SlashingPrecompile<K> {
    pub fn new(keeper: K) -> Self {
        Self {
            precompile: Precompile::new(SLASHING_PRECOMPILE_ADDR),
            keeper,
        }
    }

    fn is_transaction(selector: [u8; 4]) -> bool {
        selector == unjailCall::SELECTOR
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
            unjailCall::SELECTOR => dispatch::run_with_state_db(
                ctx,
                state_db,
                frame,
                args,
                |ctx, call: unjailCall, state, frame| {
                    let operator = self
                        .keeper
                        .validator_operator(ctx, &call.validator)?
                        .ok_or_else(|| {
                            Error::native(format!("validator does not exist: {}", call.validator))
                        })?;
                    if frame.caller != operator {
                        return Err(Error::Unauthorized);
                    }

                    self.keeper.unjail(ctx, &call.validator)?;
                    tracing::debug!(
                        target: "precompile::slashing",
                        validator = %call.validator,
                        %operator,
                        "validator unjailed"
                    );
                    state.add_log(Log {
                        address: SLASHING_PRECOMPILE_ADDR,
                        topics: vec![ValidatorUnjailed::SIGNATURE_HASH, operator.into_word()],
                        data: call.validator.abi_encode().into(),
                    });
                    Ok(true)
                },
            ),
            getSigningInfoCall::SELECTOR => {
                dispatch::run(ctx, args, |ctx, call: getSigningInfoCall| {
                    let info = self
                        .keeper
                        .signing_info(ctx, &call.validator)?
                        .ok_or_else(|| {
                            Error::native(format!(
                                "no signing info for validator: {}",
                                call.validator
                            ))
                        })?;
                    Ok((
                        info.start_height,
                        info.jailed_until,
                        info.tombstoned,
                        info.missed_blocks,
                    ))
                })
            }
            _ => Err(Error::unknown_selector(selector)),
        }
    }
}

impl<K: SlashingKeeper> PrecompiledContract for SlashingPrecompile<K> {
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
