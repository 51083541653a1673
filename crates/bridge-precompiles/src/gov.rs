//! Governance bridge: voting and proposal deposits. Mounted at `0x..0805`.
//!
//! The voter and depositor are always the caller. Deposits move gas-token
//! coins into the governance module account, so the balance reconciler is
//! attached.

use alloy_primitives::{address, Address, Bytes, U256};
use alloy_sol_types::{sol, sol_data, SolCall, SolEvent, SolType, SolValue};
use bridge_core::{
    balance::BalanceHandlerFactory,
    dispatch,
    errors::{Error, Result},
    keepers::GovKeeper,
    precompile::{Outcome, Precompile, PrecompiledContract},
    router, Coin, Contract, FrameInfo, PageRequest,
};
use bridge_state::{Context, Log, StateDb};

sol! {
    function vote(uint64 proposalId, uint8 option) external returns (bool success);
    function deposit(uint64 proposalId, uint256 amount) external returns (bool success);

    function getVote(uint64 proposalId, address voter) external view returns (uint8 option);
    function getDeposit(uint64 proposalId, address depositor) external view returns (uint256 amount);
    function getDeposits(uint64 proposalId, uint64 offset, uint64 limit) external view
        returns (address[] depositors, uint256[] amounts, bytes nextKey, uint64 total);

    event Vote(address indexed voter, uint64 proposalId, uint8 option);
    event Deposit(address indexed depositor, uint64 proposalId, uint256 amount);
}

pub const GOV_PRECOMPILE_ADDR: Address = address!("0x0000000000000000000000000000000000000805");

#[derive(Debug, Clone)]
pub struct GovPrecompile<K> {
    precompile: Precompile,
    keeper: K,
}

impl<K: GovKeeper> GovPrecompile<K> {
    pub fn new(keeper: K, evm_denom: impl Into<String>) -> Self {
        Self {
            precompile: Precompile::new(GOV_PRECOMPILE_ADDR)
                .with_balance_handler(BalanceHandlerFactory::new(evm_denom)),
            keeper,
        }
    }

    fn is_transaction(selector: [u8; 4]) -> bool {
        matches!(selector, voteCall::SELECTOR | depositCall::SELECTOR)
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
            voteCall::SELECTOR => dispatch::run_with_state_db(
                ctx,
                state_db,
                frame,
                args,
                |ctx, call: voteCall, state, frame| {
                    self.keeper
                        .vote(ctx, call.proposalId, frame.caller, call.option)?;
                    tracing::debug!(
                        target: "precompile::gov",
                        voter = %frame.caller,
                        proposal_id = call.proposalId,
                        option = call.option,
                        "vote cast"
                    );
                    state.add_log(Log {
                        address: GOV_PRECOMPILE_ADDR,
                        topics: vec![Vote::SIGNATURE_HASH, frame.caller.into_word()],
                        data: <(sol_data::Uint<64>, sol_data::Uint<8>) as SolType>::abi_encode(
                            &(call.proposalId, call.option),
                        )
                        .into(),
                    });
                    Ok(true)
                },
            ),
            depositCall::SELECTOR => dispatch::run_with_state_db(
                ctx,
                state_db,
                frame,
                args,
                |ctx, call: depositCall, state, frame| {
                    let coin = Coin::new(ctx.evm_denom(), call.amount);
                    self.keeper
                        .deposit(ctx, call.proposalId, frame.caller, &coin)?;
                    tracing::debug!(
                        target: "precompile::gov",
                        depositor = %frame.caller,
                        proposal_id = call.proposalId,
                        amount = %call.amount,
                        "deposit escrowed"
                    );
                    state.add_log(Log {
                        address: GOV_PRECOMPILE_ADDR,
                        topics: vec![Deposit::SIGNATURE_HASH, frame.caller.into_word()],
                        data: (call.proposalId, call.amount).abi_encode().into(),
                    });
                    Ok(true)
                },
            ),
            getVoteCall::SELECTOR => dispatch::run(ctx, args, |ctx, call: getVoteCall| {
                self.keeper
                    .get_vote(ctx, call.proposalId, call.voter)?
                    .map(u16::from)
                    .ok_or_else(|| {
                        Error::native(format!(
                            "no vote found for proposal {} by {}",
                            call.proposalId, call.voter
                        ))
                    })
            }),
            getDepositCall::SELECTOR => dispatch::run(ctx, args, |ctx, call: getDepositCall| {
                self.keeper.get_deposit(ctx, call.proposalId, call.depositor)
            }),
            getDepositsCall::SELECTOR => {
                dispatch::run(ctx, args, |ctx, call: getDepositsCall| {
                    let page = PageRequest {
                        offset: call.offset,
                        limit: call.limit,
                        count_total: true,
                        ..Default::default()
                    };
                    let (entries, page) = self.keeper.deposits(ctx, call.proposalId, &page)?;
                    let (depositors, amounts): (Vec<Address>, Vec<U256>) =
                        entries.into_iter().unzip();
                    Ok((depositors, amounts, Bytes::from(page.next_key), page.total))
                })
            }
            _ => Err(Error::unknown_selector(selector)),
        }
    }
}

impl<K: GovKeeper> PrecompiledContract for GovPrecompile<K> {
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
