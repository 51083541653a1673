//! Chain-module bridges mounted at fixed addresses.
//!
//! Each bridge decodes typed call arguments, invokes its module keeper, and
//! encodes a typed return value; all gas, snapshot, and balance management
//! is delegated to the `bridge-core` engine.
//!
//! | Address | Bridge |
//! |------------|--------------|
//! | `0x..0800` | staking |
//! | `0x..0801` | distribution |
//! | `0x..0802` | IBC transfer |
//! | `0x..0804` | bank |
//! | `0x..0805` | governance |
//! | `0x..0806` | slashing |
//! | `0x..0807` | burn |

pub mod bank;
pub mod burn;
pub mod config;
pub mod distribution;
pub mod gov;
pub mod ics20;
pub mod slashing;
pub mod staking;

#[cfg(test)]
pub(crate) mod testutil;

pub use bank::{BankPrecompile, BANK_PRECOMPILE_ADDR};
pub use burn::{BurnPrecompile, BURN_PRECOMPILE_ADDR};
pub use config::BridgeConfig;
pub use distribution::{DistributionPrecompile, DISTRIBUTION_PRECOMPILE_ADDR};
pub use gov::{GovPrecompile, GOV_PRECOMPILE_ADDR};
pub use ics20::{Ics20Precompile, ICS20_PRECOMPILE_ADDR};
pub use slashing::{SlashingPrecompile, SLASHING_PRECOMPILE_ADDR};
pub use staking::{StakingPrecompile, STAKING_PRECOMPILE_ADDR};
