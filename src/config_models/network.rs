use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use strum::EnumIter;

use crate::models::address::Address;
use crate::models::address::ChainId;

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default, EnumIter, strum::EnumIs,
)]
#[non_exhaustive]
pub enum Network {
    /// Ethereum main net.
    #[default]
    Main,

    /// Public test network (Sepolia).
    Testnet,

    /// Local development chain. All contract addresses have deterministic
    /// defaults so the simulated backend and tests need no configuration.
    RegTest,
}

impl Network {
    pub fn chain_id(&self) -> ChainId {
        match self {
            Self::Main => ChainId(1),
            Self::Testnet => ChainId(11155111),
            Self::RegTest => ChainId(31337),
        }
    }

    /// symbol of the native asset used to pay gas
    pub fn base_token_symbol(&self) -> &'static str {
        match self {
            Self::Main | Self::RegTest => "ETH",
            Self::Testnet => "SepoliaETH",
        }
    }

    pub fn base_token_decimals(&self) -> u8 {
        18
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            Network::Testnet => "testnet",
            Network::RegTest => "regtest",
            Network::Main => "main",
        };
        write!(f, "{}", string)
    }
}

impl FromStr for Network {
    type Err = String;
    fn from_str(input: &str) -> Result<Network, Self::Err> {
        match input {
            "testnet" => Ok(Network::Testnet),
            "regtest" => Ok(Network::RegTest),
            "main" => Ok(Network::Main),
            _ => Err(format!("Failed to parse {} as network", input)),
        }
    }
}

/// Contracts and constants of the chain a session works against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub network: Network,
    pub chain_id: ChainId,
    /// the private pool contract. spender of shield approvals.
    pub privacy_pool_contract: Address,
    /// the relay adapter contract used by private swaps and base-token
    /// unshields.
    pub relay_adapt_contract: Address,
    /// spender of public swap approvals.
    pub swap_spender: Address,
    /// ERC20 wrapper of the native asset, shielded by the base-token variants.
    pub wrapped_base_token: Address,
    pub base_token_symbol: String,
    pub base_token_decimals: u8,
}

impl ChainConfig {
    /// deterministic local-chain contracts
    pub fn regtest() -> Self {
        Self {
            network: Network::RegTest,
            chain_id: Network::RegTest.chain_id(),
            privacy_pool_contract: Address::new("0x5fbdb2315678afecb367f032d93f642f64180aa3"),
            relay_adapt_contract: Address::new("0xe7f1725e7734ce288f8367e1bb143e90bb3f0512"),
            swap_spender: Address::new("0x9fe46736679d2d9a65f0992f2272de9f3c7fa6e0"),
            wrapped_base_token: Address::new("0xcf7ed3acca5a467e9e704c703e8d87f634fb0fc9"),
            base_token_symbol: Network::RegTest.base_token_symbol().to_string(),
            base_token_decimals: Network::RegTest.base_token_decimals(),
        }
    }

    /// chain config for `network` with the given contracts.
    pub fn new(
        network: Network,
        privacy_pool_contract: Address,
        relay_adapt_contract: Address,
        swap_spender: Address,
        wrapped_base_token: Address,
    ) -> Self {
        Self {
            network,
            chain_id: network.chain_id(),
            privacy_pool_contract,
            relay_adapt_contract,
            swap_spender,
            wrapped_base_token,
            base_token_symbol: network.base_token_symbol().to_string(),
            base_token_decimals: network.base_token_decimals(),
        }
    }
}
