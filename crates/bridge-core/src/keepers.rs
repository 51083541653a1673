//! Trait boundaries of the ledger keepers each bridge consumes.
//!
//! The engine never calls these; each Action Adapter calls exactly the
//! keeper surface its one operation needs. Module business logic (how a
//! delegation or a tally is computed) lives behind these traits and is out
//! of scope here.

use alloy_primitives::{Address, B256, U256};
use bridge_state::Context;

use crate::{
    errors::Result,
    types::{Coin, PageRequest, PageResponse},
};

/// A denomination unit with its exponent relative to the base unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenomUnit {
    pub denom: String,
    pub exponent: u32,
}

/// Denomination metadata registered in the bank module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenomMetadata {
    pub name: String,
    pub symbol: String,
    pub display: String,
    pub denom_units: Vec<DenomUnit>,
}

pub trait BankKeeper {
    fn get_denom_metadata(&self, ctx: &mut Context, denom: &str) -> Result<Option<DenomMetadata>>;
    fn get_supply(&self, ctx: &mut Context, denom: &str) -> Result<U256>;
    fn get_balance(&self, ctx: &mut Context, address: Address, denom: &str) -> Result<U256>;
    fn send_coins(&self, ctx: &mut Context, from: Address, to: Address, coins: &[Coin])
        -> Result<()>;
    fn send_to_module(
        &self,
        ctx: &mut Context,
        from: Address,
        module: &str,
        coins: &[Coin],
    ) -> Result<()>;
    fn burn_coins(&self, ctx: &mut Context, module: &str, coins: &[Coin]) -> Result<()>;
}

pub trait StakingKeeper {
    fn bond_denom(&self, ctx: &mut Context) -> Result<String>;
    fn delegate(
        &self,
        ctx: &mut Context,
        delegator: Address,
        validator: &str,
        amount: U256,
    ) -> Result<()>;
    /// Returns the height at which the unbonding completes.
    fn undelegate(
        &self,
        ctx: &mut Context,
        delegator: Address,
        validator: &str,
        amount: U256,
    ) -> Result<u64>;
    fn redelegate(
        &self,
        ctx: &mut Context,
        delegator: Address,
        src_validator: &str,
        dst_validator: &str,
        amount: U256,
    ) -> Result<()>;
    /// Currently bonded amount of one delegation.
    fn delegation(&self, ctx: &mut Context, delegator: Address, validator: &str) -> Result<U256>;
}

pub trait DistributionKeeper {
    fn withdraw_delegator_rewards(
        &self,
        ctx: &mut Context,
        delegator: Address,
        validator: &str,
    ) -> Result<Coin>;
    fn set_withdraw_address(
        &self,
        ctx: &mut Context,
        delegator: Address,
        withdraw: Address,
    ) -> Result<()>;
    fn withdraw_address(&self, ctx: &mut Context, delegator: Address) -> Result<Address>;
    fn delegation_rewards(
        &self,
        ctx: &mut Context,
        delegator: Address,
        validator: &str,
    ) -> Result<Coin>;
}

pub trait GovKeeper {
    fn vote(&self, ctx: &mut Context, proposal_id: u64, voter: Address, option: u8) -> Result<()>;
    fn deposit(
        &self,
        ctx: &mut Context,
        proposal_id: u64,
        depositor: Address,
        amount: &Coin,
    ) -> Result<()>;
    fn get_vote(&self, ctx: &mut Context, proposal_id: u64, voter: Address) -> Result<Option<u8>>;
    fn get_deposit(&self, ctx: &mut Context, proposal_id: u64, depositor: Address)
        -> Result<U256>;
    /// One page of (depositor, amount) entries in deposit order, plus the
    /// cursor for the following page.
    fn deposits(
        &self,
        ctx: &mut Context,
        proposal_id: u64,
        page: &PageRequest,
    ) -> Result<(Vec<(Address, U256)>, PageResponse)>;
}

/// Liveness record of a validator in the slashing module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningInfo {
    pub start_height: u64,
    pub jailed_until: u64,
    pub tombstoned: bool,
    pub missed_blocks: u64,
}

pub trait SlashingKeeper {
    fn unjail(&self, ctx: &mut Context, validator: &str) -> Result<()>;
    /// Operator account of a validator, used for authorization checks.
    fn validator_operator(&self, ctx: &mut Context, validator: &str) -> Result<Option<Address>>;
    fn signing_info(&self, ctx: &mut Context, validator: &str) -> Result<Option<SigningInfo>>;
}

pub trait TransferKeeper {
    /// Escrows `coin` for a cross-chain transfer over `channel` and returns
    /// the packet sequence.
    fn transfer(
        &self,
        ctx: &mut Context,
        channel: &str,
        sender: Address,
        receiver: &str,
        coin: &Coin,
    ) -> Result<u64>;
    fn denom_hash(&self, ctx: &mut Context, trace: &str) -> Result<B256>;
}
