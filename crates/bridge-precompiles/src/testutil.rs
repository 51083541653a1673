//! In-memory keepers and call harness shared by the bridge tests.
//!
//! The keepers store everything through the metered [`Context`] so gas and
//! rollback behave exactly as they would against real modules, and they emit
//! the canonical `coin_spent` / `coin_received` events the balance
//! reconciler consumes.

use std::collections::HashMap;

use alloy_primitives::{keccak256, Address, B256, U256};
use bridge_core::{
    errors::{Error, Result},
    keepers::{
        BankKeeper, DenomMetadata, DistributionKeeper, GovKeeper, SigningInfo, SlashingKeeper,
        StakingKeeper, TransferKeeper,
    },
    module_address,
    precompile::{Outcome, PrecompiledContract},
    Coin, Contract, PageRequest, PageResponse,
};
use bridge_state::{
    balance_key, Context, Event, GasConfig, GasMeter, StateDb, ATTR_AMOUNT, ATTR_RECEIVER,
    ATTR_SPENDER, BANK_MODULE, EVENT_COIN_RECEIVED, EVENT_COIN_SPENT,
};

pub(crate) const EVM_DENOM: &str = "atest";
pub(crate) const GAS_LIMIT: u64 = 10_000_000;

// === Call harness ===

pub(crate) fn call(
    precompile: &impl PrecompiledContract,
    state: &StateDb,
    caller: Address,
    input: Vec<u8>,
    readonly: bool,
) -> Outcome {
    let mut contract = Contract::new(caller, precompile.address(), input.into(), GAS_LIMIT);
    precompile.run(state, &mut contract, readonly)
}

pub(crate) fn free_context(state: &StateDb) -> Context {
    state.cache_context(GasMeter::infinite(), GasConfig::free(), GasConfig::free())
}

/// Seeds a bank-store balance directly, bypassing gas and events.
pub(crate) fn seed_store_balance(state: &StateDb, address: Address, denom: &str, amount: U256) {
    let mut ctx = free_context(state);
    set_balance(&mut ctx, address, denom, amount).expect("free context");
}

pub(crate) fn seed_supply(state: &StateDb, denom: &str, amount: U256) {
    let mut ctx = free_context(state);
    ctx.kv_set(BANK_MODULE, supply_key(denom), amount.to_be_bytes::<32>().to_vec())
        .expect("free context");
}

// === Bank store primitives ===

fn supply_key(denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(7 + denom.len());
    key.extend_from_slice(b"supply/");
    key.extend_from_slice(denom.as_bytes());
    key
}

pub(crate) fn get_balance(ctx: &mut Context, address: Address, denom: &str) -> Result<U256> {
    let raw = ctx.kv_get(BANK_MODULE, &balance_key(&address, denom))?;
    Ok(raw.map(|bz| U256::from_be_slice(&bz)).unwrap_or(U256::ZERO))
}

pub(crate) fn set_balance(
    ctx: &mut Context,
    address: Address,
    denom: &str,
    amount: U256,
) -> Result<()> {
    ctx.kv_set(
        BANK_MODULE,
        balance_key(&address, denom),
        amount.to_be_bytes::<32>().to_vec(),
    )?;
    Ok(())
}

fn get_supply(ctx: &mut Context, denom: &str) -> Result<U256> {
    let raw = ctx.kv_get(BANK_MODULE, &supply_key(denom))?;
    Ok(raw.map(|bz| U256::from_be_slice(&bz)).unwrap_or(U256::ZERO))
}

fn set_supply(ctx: &mut Context, denom: &str, amount: U256) -> Result<()> {
    ctx.kv_set(BANK_MODULE, supply_key(denom), amount.to_be_bytes::<32>().to_vec())?;
    Ok(())
}

/// Moves one coin between accounts, emitting the canonical bank events.
pub(crate) fn move_coins(ctx: &mut Context, from: Address, to: Address, coin: &Coin) -> Result<()> {
    let from_balance = get_balance(ctx, from, &coin.denom)?;
    let new_from = from_balance.checked_sub(coin.amount).ok_or_else(|| {
        Error::native(format!(
            "spendable balance {from_balance}{} is smaller than {coin}",
            coin.denom
        ))
    })?;
    let to_balance = get_balance(ctx, to, &coin.denom)?;
    let new_to = to_balance
        .checked_add(coin.amount)
        .ok_or_else(|| Error::native("balance overflow"))?;

    set_balance(ctx, from, &coin.denom, new_from)?;
    set_balance(ctx, to, &coin.denom, new_to)?;

    ctx.emit_event(Event::new(
        EVENT_COIN_SPENT,
        [
            (ATTR_SPENDER, from.to_string()),
            (ATTR_AMOUNT, coin.to_string()),
        ],
    ));
    ctx.emit_event(Event::new(
        EVENT_COIN_RECEIVED,
        [
            (ATTR_RECEIVER, to.to_string()),
            (ATTR_AMOUNT, coin.to_string()),
        ],
    ));
    Ok(())
}

// === Bank keeper ===

#[derive(Debug, Default, Clone)]
pub(crate) struct TestBankKeeper {
    metadata: HashMap<String, DenomMetadata>,
}

impl TestBankKeeper {
    pub(crate) fn with_metadata(denom: &str, metadata: DenomMetadata) -> Self {
        let mut keeper = Self::default();
        keeper.metadata.insert(denom.to_string(), metadata);
        keeper
    }
}

impl BankKeeper for TestBankKeeper {
    fn get_denom_metadata(&self, _ctx: &mut Context, denom: &str) -> Result<Option<DenomMetadata>> {
        Ok(self.metadata.get(denom).cloned())
    }

    fn get_supply(&self, ctx: &mut Context, denom: &str) -> Result<U256> {
        get_supply(ctx, denom)
    }

    fn get_balance(&self, ctx: &mut Context, address: Address, denom: &str) -> Result<U256> {
        get_balance(ctx, address, denom)
    }

    fn send_coins(
        &self,
        ctx: &mut Context,
        from: Address,
        to: Address,
        coins: &[Coin],
    ) -> Result<()> {
        for coin in coins {
            move_coins(ctx, from, to, coin)?;
        }
        Ok(())
    }

    fn send_to_module(
        &self,
        ctx: &mut Context,
        from: Address,
        module: &str,
        coins: &[Coin],
    ) -> Result<()> {
        self.send_coins(ctx, from, module_address(module), coins)
    }

    fn burn_coins(&self, ctx: &mut Context, module: &str, coins: &[Coin]) -> Result<()> {
        let account = module_address(module);
        for coin in coins {
            let balance = get_balance(ctx, account, &coin.denom)?;
            let remaining = balance
                .checked_sub(coin.amount)
                .ok_or_else(|| Error::native(format!("insufficient module balance: {coin}")))?;
            set_balance(ctx, account, &coin.denom, remaining)?;

            let supply = get_supply(ctx, &coin.denom)?;
            let remaining_supply = supply
                .checked_sub(coin.amount)
                .ok_or_else(|| Error::native(format!("supply underflow: {coin}")))?;
            set_supply(ctx, &coin.denom, remaining_supply)?;

            ctx.emit_event(Event::new(
                EVENT_COIN_SPENT,
                [
                    (ATTR_SPENDER, account.to_string()),
                    (ATTR_AMOUNT, coin.to_string()),
                ],
            ));
        }
        Ok(())
    }
}

// === Staking keeper ===

pub(crate) const BONDED_POOL: &str = "bonded_tokens_pool";
pub(crate) const UNBONDING_HEIGHT: u64 = 100;

fn delegation_key(delegator: Address, validator: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(11 + 20 + validator.len());
    key.extend_from_slice(b"delegation/");
    key.extend_from_slice(delegator.as_slice());
    key.extend_from_slice(validator.as_bytes());
    key
}

#[derive(Debug, Default, Clone)]
pub(crate) struct TestStakingKeeper;

impl TestStakingKeeper {
    fn get_delegation(ctx: &mut Context, delegator: Address, validator: &str) -> Result<U256> {
        let raw = ctx.kv_get("staking", &delegation_key(delegator, validator))?;
        Ok(raw.map(|bz| U256::from_be_slice(&bz)).unwrap_or(U256::ZERO))
    }

    fn set_delegation(
        ctx: &mut Context,
        delegator: Address,
        validator: &str,
        amount: U256,
    ) -> Result<()> {
        ctx.kv_set(
            "staking",
            delegation_key(delegator, validator),
            amount.to_be_bytes::<32>().to_vec(),
        )?;
        Ok(())
    }
}

impl StakingKeeper for TestStakingKeeper {
    fn bond_denom(&self, ctx: &mut Context) -> Result<String> {
        Ok(ctx.evm_denom())
    }

    fn delegate(
        &self,
        ctx: &mut Context,
        delegator: Address,
        validator: &str,
        amount: U256,
    ) -> Result<()> {
        let denom = self.bond_denom(ctx)?;
        move_coins(
            ctx,
            delegator,
            module_address(BONDED_POOL),
            &Coin::new(denom, amount),
        )?;
        let bonded = Self::get_delegation(ctx, delegator, validator)?;
        Self::set_delegation(ctx, delegator, validator, bonded + amount)
    }

    fn undelegate(
        &self,
        ctx: &mut Context,
        delegator: Address,
        validator: &str,
        amount: U256,
    ) -> Result<u64> {
        let bonded = Self::get_delegation(ctx, delegator, validator)?;
        let remaining = bonded
            .checked_sub(amount)
            .ok_or_else(|| Error::native("delegation smaller than undelegation amount"))?;
        let denom = self.bond_denom(ctx)?;
        move_coins(
            ctx,
            module_address(BONDED_POOL),
            delegator,
            &Coin::new(denom, amount),
        )?;
        Self::set_delegation(ctx, delegator, validator, remaining)?;
        Ok(UNBONDING_HEIGHT)
    }

    fn redelegate(
        &self,
        ctx: &mut Context,
        delegator: Address,
        src_validator: &str,
        dst_validator: &str,
        amount: U256,
    ) -> Result<()> {
        let bonded = Self::get_delegation(ctx, delegator, src_validator)?;
        let remaining = bonded
            .checked_sub(amount)
            .ok_or_else(|| Error::native("delegation smaller than redelegation amount"))?;
        Self::set_delegation(ctx, delegator, src_validator, remaining)?;
        let dst = Self::get_delegation(ctx, delegator, dst_validator)?;
        Self::set_delegation(ctx, delegator, dst_validator, dst + amount)
    }

    fn delegation(&self, ctx: &mut Context, delegator: Address, validator: &str) -> Result<U256> {
        Self::get_delegation(ctx, delegator, validator)
    }
}

// === Distribution keeper ===

pub(crate) const DISTRIBUTION_MODULE: &str = "distribution";

fn reward_key(delegator: Address, validator: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(7 + 20 + validator.len());
    key.extend_from_slice(b"reward/");
    key.extend_from_slice(delegator.as_slice());
    key.extend_from_slice(validator.as_bytes());
    key
}

fn withdraw_addr_key(delegator: Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(9 + 20);
    key.extend_from_slice(b"withdraw/");
    key.extend_from_slice(delegator.as_slice());
    key
}

#[derive(Debug, Default, Clone)]
pub(crate) struct TestDistributionKeeper;

impl TestDistributionKeeper {
    /// Accrues a pending reward for a delegation and funds the module pool.
    pub(crate) fn seed_reward(
        state: &StateDb,
        delegator: Address,
        validator: &str,
        amount: U256,
    ) {
        let mut ctx = free_context(state);
        ctx.kv_set(
            DISTRIBUTION_MODULE,
            reward_key(delegator, validator),
            amount.to_be_bytes::<32>().to_vec(),
        )
        .expect("free context");
        let denom = ctx.evm_denom();
        let pool = module_address(DISTRIBUTION_MODULE);
        let funded = get_balance(&mut ctx, pool, &denom).expect("free context");
        set_balance(&mut ctx, pool, &denom, funded + amount).expect("free context");
    }

    fn pending_reward(ctx: &mut Context, delegator: Address, validator: &str) -> Result<U256> {
        let raw = ctx.kv_get(DISTRIBUTION_MODULE, &reward_key(delegator, validator))?;
        Ok(raw.map(|bz| U256::from_be_slice(&bz)).unwrap_or(U256::ZERO))
    }
}

impl DistributionKeeper for TestDistributionKeeper {
    fn withdraw_delegator_rewards(
        &self,
        ctx: &mut Context,
        delegator: Address,
        validator: &str,
    ) -> Result<Coin> {
        let amount = Self::pending_reward(ctx, delegator, validator)?;
        let coin = Coin::new(ctx.evm_denom(), amount);
        if !amount.is_zero() {
            let recipient = self.withdraw_address(ctx, delegator)?;
            move_coins(ctx, module_address(DISTRIBUTION_MODULE), recipient, &coin)?;
            ctx.kv_set(
                DISTRIBUTION_MODULE,
                reward_key(delegator, validator),
                U256::ZERO.to_be_bytes::<32>().to_vec(),
            )?;
        }
        Ok(coin)
    }

    fn set_withdraw_address(
        &self,
        ctx: &mut Context,
        delegator: Address,
        withdraw: Address,
    ) -> Result<()> {
        ctx.kv_set(
            DISTRIBUTION_MODULE,
            withdraw_addr_key(delegator),
            withdraw.to_vec(),
        )?;
        Ok(())
    }

    fn withdraw_address(&self, ctx: &mut Context, delegator: Address) -> Result<Address> {
        let raw = ctx.kv_get(DISTRIBUTION_MODULE, &withdraw_addr_key(delegator))?;
        Ok(raw
            .map(|bz| Address::from_slice(&bz))
            .unwrap_or(delegator))
    }

    fn delegation_rewards(
        &self,
        ctx: &mut Context,
        delegator: Address,
        validator: &str,
    ) -> Result<Coin> {
        let amount = Self::pending_reward(ctx, delegator, validator)?;
        Ok(Coin::new(ctx.evm_denom(), amount))
    }
}

// === Governance keeper ===

pub(crate) const GOV_MODULE: &str = "gov";

fn vote_key(proposal_id: u64, voter: Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(5 + 8 + 20);
    key.extend_from_slice(b"vote/");
    key.extend_from_slice(&proposal_id.to_be_bytes());
    key.extend_from_slice(voter.as_slice());
    key
}

fn deposit_key(proposal_id: u64, depositor: Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + 8 + 20);
    key.extend_from_slice(b"deposit/");
    key.extend_from_slice(&proposal_id.to_be_bytes());
    key.extend_from_slice(depositor.as_slice());
    key
}

/// Concatenated 20-byte depositor addresses in deposit order.
fn depositors_key(proposal_id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(11 + 8);
    key.extend_from_slice(b"depositors/");
    key.extend_from_slice(&proposal_id.to_be_bytes());
    key
}

#[derive(Debug, Default, Clone)]
pub(crate) struct TestGovKeeper;

impl GovKeeper for TestGovKeeper {
    fn vote(&self, ctx: &mut Context, proposal_id: u64, voter: Address, option: u8) -> Result<()> {
        ctx.kv_set(GOV_MODULE, vote_key(proposal_id, voter), vec![option])?;
        Ok(())
    }

    fn deposit(
        &self,
        ctx: &mut Context,
        proposal_id: u64,
        depositor: Address,
        amount: &Coin,
    ) -> Result<()> {
        move_coins(ctx, depositor, module_address(GOV_MODULE), amount)?;
        let existing = self.get_deposit(ctx, proposal_id, depositor)?;
        ctx.kv_set(
            GOV_MODULE,
            deposit_key(proposal_id, depositor),
            (existing + amount.amount).to_be_bytes::<32>().to_vec(),
        )?;
        if existing.is_zero() {
            let mut index = ctx
                .kv_get(GOV_MODULE, &depositors_key(proposal_id))?
                .unwrap_or_default();
            index.extend_from_slice(depositor.as_slice());
            ctx.kv_set(GOV_MODULE, depositors_key(proposal_id), index)?;
        }
        Ok(())
    }

    fn get_vote(&self, ctx: &mut Context, proposal_id: u64, voter: Address) -> Result<Option<u8>> {
        let raw = ctx.kv_get(GOV_MODULE, &vote_key(proposal_id, voter))?;
        Ok(raw.and_then(|bz| bz.first().copied()))
    }

    fn get_deposit(
        &self,
        ctx: &mut Context,
        proposal_id: u64,
        depositor: Address,
    ) -> Result<U256> {
        let raw = ctx.kv_get(GOV_MODULE, &deposit_key(proposal_id, depositor))?;
        Ok(raw.map(|bz| U256::from_be_slice(&bz)).unwrap_or(U256::ZERO))
    }

    fn deposits(
        &self,
        ctx: &mut Context,
        proposal_id: u64,
        page: &PageRequest,
    ) -> Result<(Vec<(Address, U256)>, PageResponse)> {
        let raw = ctx
            .kv_get(GOV_MODULE, &depositors_key(proposal_id))?
            .unwrap_or_default();
        let all: Vec<Address> = raw.chunks_exact(20).map(Address::from_slice).collect();
        let total = all.len() as u64;

        let start = (page.offset as usize).min(all.len());
        let end = if page.limit == 0 {
            all.len()
        } else {
            (start + page.limit as usize).min(all.len())
        };

        let mut entries = Vec::with_capacity(end - start);
        for depositor in &all[start..end] {
            entries.push((*depositor, self.get_deposit(ctx, proposal_id, *depositor)?));
        }
        let next_key = if end < all.len() {
            (end as u64).to_be_bytes().to_vec()
        } else {
            Vec::new()
        };
        Ok((entries, PageResponse::from_native(Some((next_key, total)))))
    }
}

// === Slashing keeper ===

#[derive(Debug, Default, Clone)]
pub(crate) struct TestSlashingKeeper {
    operators: HashMap<String, Address>,
    infos: HashMap<String, SigningInfo>,
}

impl TestSlashingKeeper {
    pub(crate) fn with_validator(validator: &str, operator: Address, info: SigningInfo) -> Self {
        let mut keeper = Self::default();
        keeper.operators.insert(validator.to_string(), operator);
        keeper.infos.insert(validator.to_string(), info);
        keeper
    }
}

impl SlashingKeeper for TestSlashingKeeper {
    fn unjail(&self, ctx: &mut Context, validator: &str) -> Result<()> {
        if !self.operators.contains_key(validator) {
            return Err(Error::native(format!("validator does not exist: {validator}")));
        }
        let mut key = b"unjailed/".to_vec();
        key.extend_from_slice(validator.as_bytes());
        ctx.kv_set("slashing", key, vec![1])?;
        Ok(())
    }

    fn validator_operator(&self, _ctx: &mut Context, validator: &str) -> Result<Option<Address>> {
        Ok(self.operators.get(validator).copied())
    }

    fn signing_info(&self, _ctx: &mut Context, validator: &str) -> Result<Option<SigningInfo>> {
        Ok(self.infos.get(validator).cloned())
    }
}

pub(crate) fn unjailed(state: &StateDb, validator: &str) -> bool {
    let mut key = b"unjailed/".to_vec();
    key.extend_from_slice(validator.as_bytes());
    state.store_get("slashing", &key).is_some()
}

// === IBC transfer keeper ===

pub(crate) const TRANSFER_MODULE: &str = "transfer";

fn sequence_key(channel: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(9 + channel.len());
    key.extend_from_slice(b"sequence/");
    key.extend_from_slice(channel.as_bytes());
    key
}

#[derive(Debug, Default, Clone)]
pub(crate) struct TestTransferKeeper;

impl TransferKeeper for TestTransferKeeper {
    fn transfer(
        &self,
        ctx: &mut Context,
        channel: &str,
        sender: Address,
        _receiver: &str,
        coin: &Coin,
    ) -> Result<u64> {
        move_coins(ctx, sender, crate::ics20::escrow_address(channel), coin)?;
        let sequence = ctx
            .kv_get(TRANSFER_MODULE, &sequence_key(channel))?
            .map(|bz| u64::from_be_bytes(bz.as_slice().try_into().expect("8-byte sequence")))
            .unwrap_or(0)
            + 1;
        ctx.kv_set(
            TRANSFER_MODULE,
            sequence_key(channel),
            sequence.to_be_bytes().to_vec(),
        )?;
        Ok(sequence)
    }

    fn denom_hash(&self, _ctx: &mut Context, trace: &str) -> Result<B256> {
        Ok(keccak256(trace.as_bytes()))
    }
}
