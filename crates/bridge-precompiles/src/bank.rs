//! Bank bridge: ERC20-style access to bank-module denominations.
//!
//! The simplest bridge on purpose: a single-byte method ordinal followed by
//! packed arguments, so a thin counterpart contract can call it without ABI
//! tooling. Mounted at `0x..0804`.
//!
//! `transferFrom` is restricted: the caller must be the `from` account
//! itself, or the deterministic per-denom counterpart contract address. The
//! gas token is not transferable here at all; it moves through the VM's own
//! transfer path.

use alloy_primitives::{address, keccak256, Address, U256};
use bridge_core::{
    errors::{Error, Result},
    keepers::BankKeeper,
    precompile::{Outcome, Precompile, PrecompiledContract},
    router, Coin, Contract,
};
use bridge_state::{Context, StateDb};

pub const BANK_PRECOMPILE_ADDR: Address = address!("0x0000000000000000000000000000000000000804");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BankMethod {
    Name = 0,
    Symbol = 1,
    Decimals = 2,
    TotalSupply = 3,
    BalanceOf = 4,
    TransferFrom = 5,
}

impl BankMethod {
    fn from_byte(method: u8) -> Result<Self> {
        match method {
            0 => Ok(Self::Name),
            1 => Ok(Self::Symbol),
            2 => Ok(Self::Decimals),
            3 => Ok(Self::TotalSupply),
            4 => Ok(Self::BalanceOf),
            5 => Ok(Self::TransferFrom),
            other => Err(Error::unknown_ordinal(other)),
        }
    }
}

/// Deterministic address of the per-denom counterpart contract, create2
/// style: `keccak(0xff || bank || keccak(denom))[12:]`.
pub fn counterpart_address(bank: Address, denom: &str) -> Address {
    let mut preimage = Vec::with_capacity(1 + 20 + 32);
    preimage.push(0xff);
    preimage.extend_from_slice(bank.as_slice());
    preimage.extend_from_slice(keccak256(denom.as_bytes()).as_slice());
    Address::from_slice(&keccak256(&preimage)[12..])
}

#[derive(Debug, Clone)]
pub struct BankPrecompile<K> {
    precompile: Precompile,
    keeper: K,
}

impl<K: BankKeeper> BankPrecompile<K> {
    pub fn new(keeper: K) -> Self {
        Self {
            precompile: Precompile::new(BANK_PRECOMPILE_ADDR),
            keeper,
        }
    }

    fn is_transaction(method: u8) -> bool {
        method == BankMethod::TransferFrom as u8
    }

    // input: packed string denom
    fn name(&self, ctx: &mut Context, input: &[u8]) -> Result<Vec<u8>> {
        let metadata = self.metadata(ctx, input)?;
        Ok(metadata.name.into_bytes())
    }

    fn symbol(&self, ctx: &mut Context, input: &[u8]) -> Result<Vec<u8>> {
        let metadata = self.metadata(ctx, input)?;
        Ok(metadata.symbol.into_bytes())
    }

    /// Exponent of the display denom unit, as a single byte.
    fn decimals(&self, ctx: &mut Context, input: &[u8]) -> Result<Vec<u8>> {
        let metadata = self.metadata(ctx, input)?;
        let exponent = metadata
            .denom_units
            .iter()
            .find(|unit| unit.denom == metadata.display)
            .map_or(0, |unit| unit.exponent);
        let exponent =
            u8::try_from(exponent).map_err(|_| Error::native("exponent too large"))?;
        Ok(vec![exponent])
    }

    // input: packed string denom, output: 32-byte amount
    fn total_supply(&self, ctx: &mut Context, input: &[u8]) -> Result<Vec<u8>> {
        let denom = denom_str(input)?;
        let supply = self.keeper.get_supply(ctx, denom)?;
        Ok(supply.to_be_bytes::<32>().to_vec())
    }

    // input: packed (address account, string denom), output: 32-byte amount
    fn balance_of(&self, ctx: &mut Context, input: &[u8]) -> Result<Vec<u8>> {
        if input.len() < 20 {
            return Err(Error::InputTooShort);
        }
        let account = Address::from_slice(&input[..20]);
        let denom = denom_str(&input[20..])?;
        let balance = self.keeper.get_balance(ctx, account, denom)?;
        Ok(balance.to_be_bytes::<32>().to_vec())
    }

    // input: packed (address from, address to, uint256 amount, string denom)
    fn transfer_from(&self, ctx: &mut Context, caller: Address, input: &[u8]) -> Result<Vec<u8>> {
        if input.len() < 20 * 2 + 32 {
            return Err(Error::InputTooShort);
        }
        let from = Address::from_slice(&input[..20]);
        let to = Address::from_slice(&input[20..40]);
        let amount = U256::from_be_slice(&input[40..72]);
        let denom = denom_str(&input[72..])?;

        if denom == ctx.evm_denom() {
            return Err(Error::native("cannot transfer gas token with bank precompile"));
        }
        if caller != from && caller != counterpart_address(BANK_PRECOMPILE_ADDR, denom) {
            return Err(Error::Unauthorized);
        }

        self.keeper
            .send_coins(ctx, from, to, &[Coin::new(denom, amount)])?;
        Ok(vec![1])
    }

    fn metadata(
        &self,
        ctx: &mut Context,
        input: &[u8],
    ) -> Result<bridge_core::keepers::DenomMetadata> {
        let denom = denom_str(input)?;
        self.keeper
            .get_denom_metadata(ctx, denom)?
            .ok_or_else(|| Error::native(format!("denom not found: {denom}")))
    }

    fn execute(
        &self,
        ctx: &mut Context,
        caller: Address,
        method: BankMethod,
        input: &[u8],
    ) -> Result<Vec<u8>> {
        tracing::debug!(target: "precompile::bank", ?method, %caller, "dispatching");
        match method {
            BankMethod::Name => self.name(ctx, input),
            BankMethod::Symbol => self.symbol(ctx, input),
            BankMethod::Decimals => self.decimals(ctx, input),
            BankMethod::TotalSupply => self.total_supply(ctx, input),
            BankMethod::BalanceOf => self.balance_of(ctx, input),
            BankMethod::TransferFrom => self.transfer_from(ctx, caller, input),
        }
    }
}

impl<K: BankKeeper> PrecompiledContract for BankPrecompile<K> {
    fn address(&self) -> Address {
        self.precompile.address()
    }

    fn required_gas(&self, input: &[u8]) -> u64 {
        match input.first() {
            Some(&method) => self
                .precompile
                .required_gas(input, Self::is_transaction(method)),
            None => 0,
        }
    }

    fn run(&self, state_db: &StateDb, contract: &mut Contract, readonly: bool) -> Outcome {
        let parsed = router::parse_method_byte(&contract.input, readonly, Self::is_transaction)
            .and_then(|(method, args)| Ok((BankMethod::from_byte(method)?, args.to_vec())));
        let (method, args) = match parsed {
            Ok(parsed) => parsed,
            Err(err) => return Outcome::revert_with(&err),
        };

        let caller = contract.caller;
        self.precompile
            .run_native_action(state_db, contract, |ctx| {
                self.execute(ctx, caller, method, &args)
            })
    }
}

fn denom_str(input: &[u8]) -> Result<&str> {
    core::str::from_utf8(input).map_err(|_| Error::native("denom is not valid utf-8"))
}
