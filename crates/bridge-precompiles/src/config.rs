use std::collections::HashSet;

/// All seven bridge names, the default enabled set.
const ALL_BRIDGES: &[&str] = &[
    "bank",
    "staking",
    "distribution",
    "gov",
    "slashing",
    "ics20",
    "burn",
];

/// Runtime configuration of the bridge set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Denomination of the gas token; native amounts in this denom are
    /// unit-identical to the VM's wei amounts.
    pub evm_denom: String,
    /// Display prefix for native account addresses in user-facing output.
    pub account_prefix: Option<String>,
    /// Which bridges are mounted.
    pub enabled: HashSet<String>,
}

impl BridgeConfig {
    /// Builds the configuration from raw settings. An absent bridge list
    /// enables every bridge.
    pub fn new(
        evm_denom: impl Into<String>,
        account_prefix: Option<String>,
        enabled: Option<&str>,
    ) -> Self {
        let enabled = match enabled {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => ALL_BRIDGES.iter().map(ToString::to_string).collect(),
        };
        Self {
            evm_denom: evm_denom.into(),
            account_prefix,
            enabled,
        }
    }

    /// Creates a new `BridgeConfig` from environment variables.
    pub fn from_env() -> eyre::Result<Self> {
        let evm_denom = std::env::var("BRIDGE_EVM_DENOM")?;
        let account_prefix = std::env::var("BRIDGE_ACCOUNT_PREFIX").ok();
        let enabled = std::env::var("BRIDGE_ENABLED").ok();
        Ok(Self::new(evm_denom, account_prefix, enabled.as_deref()))
    }

    pub fn is_enabled(&self, bridge: &str) -> bool {
        self.enabled.contains(bridge)
    }
}
