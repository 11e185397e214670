use std::time::Duration;

use clap::Parser;

use super::network::ChainConfig;
use super::network::Network;
use crate::models::address::Address;
use crate::models::intent::TransactionIntent;

/// Declarative specification of command-line arguments
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about)]
pub struct Args {
    /// Specify network, `main`, `testnet`, or `regtest`
    #[clap(long, short, default_value = "regtest")]
    pub network: Network,

    /// Private pool contract. Required unless the network is regtest.
    #[clap(long)]
    pub privacy_pool_contract: Option<Address>,

    /// Relay adapter contract. Required unless the network is regtest.
    #[clap(long)]
    pub relay_adapt_contract: Option<Address>,

    /// Spender approved for public swaps. Required unless the network is
    /// regtest.
    #[clap(long)]
    pub swap_spender: Option<Address>,

    /// ERC20 wrapper of the native asset. Required unless the network is
    /// regtest.
    #[clap(long)]
    pub wrapped_base_token: Option<Address>,

    /// Open this kind of transaction directly instead of asking.
    ///
    /// E.g. --intent shield, --intent private-swap
    #[clap(long)]
    pub intent: Option<TransactionIntent>,

    /// How long the background watcher waits for a sent transaction to be
    /// mined before giving up.
    ///
    /// E.g. --confirmation-timeout 3m
    #[clap(long, default_value = "3m", value_parser = humantime::parse_duration)]
    pub confirmation_timeout: Duration,

    /// Interval between confirmation polls.
    #[clap(long, default_value = "4s", value_parser = humantime::parse_duration)]
    pub confirmation_poll_interval: Duration,

    /// How long each status-line message is displayed.
    #[clap(long, default_value = "5s", value_parser = humantime::parse_duration)]
    pub status_duration: Duration,

    /// Lifetime of cached ERC20 allowances.
    #[clap(long, default_value = "60s", value_parser = humantime::parse_duration)]
    pub allowance_cache_ttl: Duration,

    /// Lifetime of cached fee-token metadata.
    #[clap(long, default_value = "10m", value_parser = humantime::parse_duration)]
    pub fee_token_cache_ttl: Duration,

    /// Enable tokio tracing for consumption by the tokio-console application
    /// note: this will attempt to connect to localhost:6669
    #[clap(long, default_value = "false")]
    pub tokio_console: bool,
}

impl Args {
    /// the chain config implied by `--network` and the contract arguments.
    ///
    /// regtest falls back to deterministic local contracts; other networks
    /// require all contracts to be given.
    pub fn chain_config(&self) -> anyhow::Result<ChainConfig> {
        if self.network.is_reg_test() {
            let defaults = ChainConfig::regtest();
            return Ok(ChainConfig::new(
                self.network,
                self.privacy_pool_contract
                    .clone()
                    .unwrap_or(defaults.privacy_pool_contract),
                self.relay_adapt_contract
                    .clone()
                    .unwrap_or(defaults.relay_adapt_contract),
                self.swap_spender.clone().unwrap_or(defaults.swap_spender),
                self.wrapped_base_token
                    .clone()
                    .unwrap_or(defaults.wrapped_base_token),
            ));
        }

        let (Some(pool), Some(relay_adapt), Some(swap_spender), Some(wrapped)) = (
            self.privacy_pool_contract.clone(),
            self.relay_adapt_contract.clone(),
            self.swap_spender.clone(),
            self.wrapped_base_token.clone(),
        ) else {
            anyhow::bail!(
                "network {} requires --privacy-pool-contract, --relay-adapt-contract, --swap-spender and --wrapped-base-token",
                self.network
            );
        };

        Ok(ChainConfig::new(
            self.network,
            pool,
            relay_adapt,
            swap_spender,
            wrapped,
        ))
    }

    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            confirmation_timeout: self.confirmation_timeout,
            confirmation_poll_interval: self.confirmation_poll_interval,
            status_duration: self.status_duration,
            allowance_cache_ttl: self.allowance_cache_ttl,
            fee_token_cache_ttl: self.fee_token_cache_ttl,
        }
    }
}

impl Default for Args {
    fn default() -> Self {
        let empty: Vec<String> = vec![];
        Self::parse_from(empty)
    }
}

/// Runtime settings of the workflow, derived from [`Args`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub confirmation_timeout: Duration,
    pub confirmation_poll_interval: Duration,
    pub status_duration: Duration,
    pub allowance_cache_ttl: Duration,
    pub fee_token_cache_ttl: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Args::default().workflow_config()
    }
}

#[cfg(test)]
mod cli_args_tests {
    use super::*;

    #[test]
    fn default_args_test() {
        let default_args = Args::default();

        assert_eq!(Network::RegTest, default_args.network);
        assert_eq!(Duration::from_secs(180), default_args.confirmation_timeout);
        assert_eq!(Duration::from_secs(5), default_args.status_duration);
        assert_eq!(Duration::from_secs(60), default_args.allowance_cache_ttl);
        assert!(default_args.intent.is_none());
    }

    #[test]
    fn regtest_chain_config_needs_no_contracts() {
        let config = Args::default().chain_config().unwrap();
        assert_eq!(ChainConfig::regtest(), config);
    }

    #[test]
    fn main_net_requires_contracts() {
        let args = Args::parse_from(["tx-workflow", "--network", "main"]);
        assert!(args.chain_config().is_err());

        let args = Args::parse_from([
            "tx-workflow",
            "--network",
            "main",
            "--privacy-pool-contract",
            "0x01",
            "--relay-adapt-contract",
            "0x02",
            "--swap-spender",
            "0x03",
            "--wrapped-base-token",
            "0x04",
        ]);
        let config = args.chain_config().unwrap();
        assert_eq!(Address::new("0x03"), config.swap_spender);
    }

    #[test]
    fn parses_intent_and_durations() {
        let args = Args::parse_from([
            "tx-workflow",
            "--intent",
            "private-swap",
            "--confirmation-timeout",
            "90s",
        ]);
        assert_eq!(Some(TransactionIntent::PrivateSwap), args.intent);
        assert_eq!(Duration::from_secs(90), args.confirmation_timeout);
    }
}
