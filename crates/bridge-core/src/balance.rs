//! Balance reconciliation between the ledger and the VM view.
//!
//! Some bridges cause ledger-level transfers the VM did not originate,
//! such as an IBC escrow move or the staking module pulling coins into the
//! bonded pool.
//! After such an action succeeds, the handler scans the `coin_spent` and
//! `coin_received` events it appended and applies the gas-token deltas to
//! the VM balance view, so a subsequent VM-level balance read reflects the
//! native mutation. Bridges that never move coins outside the VM's own
//! accounting omit the handler entirely.

use alloy_primitives::{Address, U256};
use bridge_state::{
    Context, Event, StateDb, ATTR_AMOUNT, ATTR_RECEIVER, ATTR_SPENDER, EVENT_COIN_RECEIVED,
    EVENT_COIN_SPENT,
};

use crate::{
    errors::{Error, Result},
    types::Coin,
};

/// One ledger-side movement recovered from the action's events.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BalanceChange {
    address: Address,
    amount: U256,
    /// Spent (true) vs received (false).
    spent: bool,
}

/// Per-bridge configuration producing one [`BalanceHandler`] per call.
#[derive(Debug, Clone)]
pub struct BalanceHandlerFactory {
    evm_denom: String,
}

impl BalanceHandlerFactory {
    pub fn new(evm_denom: impl Into<String>) -> Self {
        Self {
            evm_denom: evm_denom.into(),
        }
    }

    pub fn handler(&self) -> BalanceHandler {
        BalanceHandler {
            evm_denom: self.evm_denom.clone(),
            prev_events_len: 0,
        }
    }
}

/// Captures the event-log position before an action and projects the
/// resulting coin movements afterwards. Skipped entirely when the action
/// fails.
#[derive(Debug)]
pub struct BalanceHandler {
    evm_denom: String,
    prev_events_len: usize,
}

impl BalanceHandler {
    pub fn before_balance_change(&mut self, ctx: &Context) {
        self.prev_events_len = ctx.events_len();
    }

    pub fn after_balance_change(&self, ctx: &Context, state_db: &StateDb) -> Result<()> {
        for change in self.collect(ctx)? {
            if change.spent {
                state_db.sub_balance(change.address, change.amount)?;
            } else {
                state_db.add_balance(change.address, change.amount)?;
            }
            tracing::trace!(
                target: "precompile::balance",
                address = %change.address,
                amount = %change.amount,
                spent = change.spent,
                "projected native balance change"
            );
        }
        Ok(())
    }

    fn collect(&self, ctx: &Context) -> Result<Vec<BalanceChange>> {
        let mut changes = Vec::new();
        for event in ctx.events_since(self.prev_events_len) {
            let (addr_key, spent) = match event.kind.as_str() {
                EVENT_COIN_SPENT => (ATTR_SPENDER, true),
                EVENT_COIN_RECEIVED => (ATTR_RECEIVER, false),
                _ => continue,
            };
            let (address, coin) = parse_coin_event(&event, addr_key)?;
            if coin.denom != self.evm_denom {
                continue;
            }
            changes.push(BalanceChange {
                address,
                amount: coin.amount,
                spent,
            });
        }
        Ok(changes)
    }
}

fn parse_coin_event(event: &Event, addr_key: &str) -> Result<(Address, Coin)> {
    let address = event
        .attribute(addr_key)
        .ok_or_else(|| Error::native(format!("event {:?} missing attribute {addr_key:?}", event.kind)))?;
    let address: Address = address
        .parse()
        .map_err(|_| Error::native(format!("invalid address {address:?}")))?;
    let amount = event
        .attribute(ATTR_AMOUNT)
        .ok_or_else(|| Error::native(format!("event {:?} missing attribute amount", event.kind)))?;
    let coin: Coin = amount.parse()?;
    Ok((address, coin))
}
