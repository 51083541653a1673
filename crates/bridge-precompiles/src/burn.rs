//! Burn bridge: permanent gas-token supply reduction. Mounted at
//! `0x..0807`.
//!
//! Two-step burn: the coins first move into the burn module account, then
//! the module balance is burned, reducing total supply. The caller must be
//! the burner account named in the call.

use alloy_primitives::{address, Address, U256};
use alloy_sol_types::{sol, SolCall, SolEvent, SolValue};
use bridge_core::{
    balance::BalanceHandlerFactory,
    dispatch,
    errors::{Error, Result},
    keepers::{BankKeeper, StakingKeeper},
    precompile::{Outcome, Precompile, PrecompiledContract},
    router, Coin, Contract, FrameInfo,
};
use bridge_state::{Context, Log, StateDb};

sol! {
    function burnToken(address burner, uint256 amount) external returns (bool success);

    event TokenBurned(address indexed burner, uint256 amount);
}

pub const BURN_PRECOMPILE_ADDR: Address = address!("0x0000000000000000000000000000000000000807");

/// Module account the coins pass through on their way out of supply.
pub const BURN_MODULE: &str = "nativeburn";

#[derive(Debug, Clone)]
pub struct BurnPrecompile<B, S> {
    precompile: Precompile,
    bank_keeper: B,
    staking_keeper: S,
}

impl<B: BankKeeper, S: StakingKeeper> BurnPrecompile<B, S> {
    pub fn new(bank_keeper: B, staking_keeper: S, evm_denom: impl Into<String>) -> Self {
        Self {
            precompile: Precompile::new(BURN_PRECOMPILE_ADDR)
                .with_balance_handler(BalanceHandlerFactory::new(evm_denom)),
            bank_keeper,
            staking_keeper,
        }
    }

    fn is_transaction(selector: [u8; 4]) -> bool {
        selector == burnTokenCall::SELECTOR
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
            burnTokenCall::SELECTOR => dispatch::run_with_state_db(
                ctx,
                state_db,
                frame,
                args,
                |ctx, call: burnTokenCall, state, frame| {
                    if call.burner.is_zero() {
                        return Err(Error::native("burner address cannot be zero"));
                    }
                    if call.amount.is_zero() {
                        return Err(Error::native("amount must be positive"));
                    }
                    if frame.caller != call.burner {
                        return Err(Error::Unauthorized);
                    }

                    let denom = self.staking_keeper.bond_denom(ctx)?;
                    let coins = [Coin::new(denom, call.amount)];
                    self.bank_keeper
                        .send_to_module(ctx, call.burner, BURN_MODULE, &coins)?;
                    self.bank_keeper.burn_coins(ctx, BURN_MODULE, &coins)?;

                    tracing::debug!(
                        target: "precompile::burn",
                        burner = %call.burner,
                        amount = %call.amount,
                        "tokens burned"
                    );
                    state.add_log(Log {
                        address: BURN_PRECOMPILE_ADDR,
                        topics: vec![TokenBurned::SIGNATURE_HASH, call.burner.into_word()],
                        data: call.amount.abi_encode().into(),
                    });
                    Ok(true)
                },
            ),
            _ => Err(Error::unknown_selector(selector)),
        }
    }
}

impl<B: BankKeeper, S: StakingKeeper> PrecompiledContract for BurnPrecompile<B, S> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, TestBankKeeper, TestStakingKeeper, EVM_DENOM};
    use alloy_sol_types::SolCall;
    use bridge_core::module_address;

    const ALICE: Address = address!("0x00000000000000000000000000000000000000a1");
    const BOB: Address = address!("0x00000000000000000000000000000000000000b1");

    fn setup() -> (BurnPrecompile<TestBankKeeper, TestStakingKeeper>, StateDb) {
        (
            BurnPrecompile::new(TestBankKeeper::default(), TestStakingKeeper, EVM_DENOM),
            StateDb::new(EVM_DENOM),
        )
    }

    fn burn_input(burner: Address, amount: U256) -> Vec<u8> {
        burnTokenCall { burner, amount }.abi_encode()
    }

    #[test]
    fn burn_reduces_balance_and_supply() {
        let (precompile, state) = setup();
        state.seed_balance(ALICE, U256::from(1000u64));
        testutil::seed_supply(&state, EVM_DENOM, U256::from(5000u64));

        let outcome = testutil::call(
            &precompile,
            &state,
            ALICE,
            burn_input(ALICE, U256::from(400u64)),
            false,
        );
        assert!(outcome.is_success(), "{:?}", outcome.revert_reason());

        // burner pays, the pass-through module account ends flat
        assert_eq!(state.balance(ALICE), U256::from(600u64));
        assert_eq!(state.balance(module_address(BURN_MODULE)), U256::ZERO);

        let mut ctx = testutil::free_context(&state);
        let keeper = TestBankKeeper::default();
        assert_eq!(
            keeper.get_supply(&mut ctx, EVM_DENOM).unwrap(),
            U256::from(4600u64)
        );
        assert_eq!(state.logs().len(), 1);
        assert_eq!(state.logs()[0].topics[1], ALICE.into_word());
    }

    #[test]
    fn only_the_burner_account_may_burn() {
        let (precompile, state) = setup();
        state.seed_balance(ALICE, U256::from(1000u64));

        let outcome = testutil::call(
            &precompile,
            &state,
            BOB,
            burn_input(ALICE, U256::from(100u64)),
            false,
        );
        assert_eq!(outcome.revert_reason().as_deref(), Some("unauthorized"));
        assert_eq!(state.balance(ALICE), U256::from(1000u64));
    }

    #[test]
    fn zero_burner_and_zero_amount_are_rejected() {
        let (precompile, state) = setup();
        state.seed_balance(ALICE, U256::from(1000u64));

        let outcome = testutil::call(
            &precompile,
            &state,
            ALICE,
            burn_input(Address::ZERO, U256::from(1u64)),
            false,
        );
        assert_eq!(
            outcome.revert_reason().as_deref(),
            Some("burner address cannot be zero")
        );

        let outcome =
            testutil::call(&precompile, &state, ALICE, burn_input(ALICE, U256::ZERO), false);
        assert_eq!(
            outcome.revert_reason().as_deref(),
            Some("amount must be positive")
        );
    }

    #[test]
    fn failed_burn_rolls_back_the_escrow_step() {
        let (precompile, state) = setup();
        // balance covers the send but supply is too small to burn
        state.seed_balance(ALICE, U256::from(1000u64));
        testutil::seed_supply(&state, EVM_DENOM, U256::from(10u64));

        let outcome = testutil::call(
            &precompile,
            &state,
            ALICE,
            burn_input(ALICE, U256::from(400u64)),
            false,
        );
        assert!(!outcome.is_success());
        assert!(outcome
            .revert_reason()
            .expect("reason")
            .starts_with("supply underflow"));

        // the send-to-module step is rolled back with the burn
        assert_eq!(state.balance(ALICE), U256::from(1000u64));
        assert_eq!(state.balance(module_address(BURN_MODULE)), U256::ZERO);
    }

    #[test]
    fn readonly_call_cannot_burn() {
        let (precompile, state) = setup();
        let outcome = testutil::call(
            &precompile,
            &state,
            ALICE,
            burn_input(ALICE, U256::ONE),
            true,
        );
        assert_eq!(outcome.revert_reason().as_deref(), Some("write protection"));
    }
}
