//! IBC transfer bridge: escrowed cross-chain transfers. Mounted at
//! `0x..0802`.
//!
//! `transfer` moves the coin from the caller into the channel's
//! deterministic escrow account and returns the packet sequence; the
//! balance reconciler projects the escrow move into the VM view. Packet
//! relay and acknowledgement live entirely on the ledger side.

use alloy_primitives::{address, keccak256, Address};
use alloy_sol_types::{sol, SolCall, SolEvent, SolValue};
use bridge_core::{
    balance::BalanceHandlerFactory,
    dispatch,
    errors::{Error, Result},
    keepers::TransferKeeper,
    precompile::{Outcome, Precompile, PrecompiledContract},
    router, Coin, Contract, FrameInfo,
};
use bridge_state::{Context, Log, StateDb};

sol! {
    function transfer(string channel, string receiver, string denom, uint256 amount)
        external returns (uint64 sequence);

    function escrowAddress(string channel) external view returns (address escrow);
    function denomHash(string trace) external view returns (bytes32 hash);

    event Transfer(address indexed sender, string channel, string receiver, uint256 amount);
}

pub const ICS20_PRECOMPILE_ADDR: Address = address!("0x0000000000000000000000000000000000000802");

/// Deterministic escrow account of one transfer channel.
pub fn escrow_address(channel: &str) -> Address {
    let mut preimage = Vec::with_capacity(9 + channel.len());
    preimage.extend_from_slice(b"transfer/");
    preimage.extend_from_slice(channel.as_bytes());
    Address::from_slice(&keccak256(&preimage)[12..])
}

#[derive(Debug, Clone)]
pub struct Ics20Precompile<K> {
    precompile: Precompile,
    keeper: K,
}

impl<K: TransferKeeper> Ics20Precompile<K> {
    pub fn new(keeper: K, evm_denom: impl Into<String>) -> Self {
        Self {
            precompile: Precompile::new(ICS20_PRECOMPILE_ADDR)
                .with_balance_handler(BalanceHandlerFactory::new(evm_denom)),
            keeper,
        }
    }

    fn is_transaction(selector: [u8; 4]) -> bool {
        selector == transferCall::SELECTOR
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
            transferCall::SELECTOR => dispatch::run_with_state_db(
                ctx,
                state_db,
                frame,
                args,
                |ctx, call: transferCall, state, frame| {
                    let coin = Coin::new(call.denom, call.amount);
                    let sequence = self.keeper.transfer(
                        ctx,
                        &call.channel,
                        frame.caller,
                        &call.receiver,
                        &coin,
                    )?;
                    tracing::debug!(
                        target: "precompile::ics20",
                        sender = %frame.caller,
                        channel = %call.channel,
                        receiver = %call.receiver,
                        amount = %coin.amount,
                        sequence,
                        "transfer escrowed"
                    );
                    state.add_log(Log {
                        address: ICS20_PRECOMPILE_ADDR,
                        topics: vec![Transfer::SIGNATURE_HASH, frame.caller.into_word()],
                        data: (call.channel, call.receiver, call.amount).abi_encode().into(),
                    });
                    Ok(sequence)
                },
            ),
            escrowAddressCall::SELECTOR => {
                dispatch::run(ctx, args, |_ctx, call: escrowAddressCall| {
                    Ok(escrow_address(&call.channel))
                })
            }
            denomHashCall::SELECTOR => dispatch::run(ctx, args, |ctx, call: denomHashCall| {
                self.keeper.denom_hash(ctx, &call.trace)
            }),
            _ => Err(Error::unknown_selector(selector)),
        }
    }
}

impl<K: TransferKeeper> PrecompiledContract for Ics20Precompile<K> {
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
