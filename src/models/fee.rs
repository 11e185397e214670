//! Fee payment strategies and gas estimates.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::address::Address;
use super::amount::TokenAmount;

/// A local public wallet that can sign transactions and pay gas.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicSigner {
    pub name: String,
    pub address: Address,
}

impl fmt::Display for PublicSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address.abbreviated())
    }
}

/// The broadcaster offer returned by a broadcaster lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedBroadcaster {
    /// the broadcaster's private-pool address, which receives the fee
    pub broadcaster_address: Address,
    pub fee_token_address: Address,
    /// fee-token base units charged per unit of gas
    pub fee_per_unit_gas: TokenAmount,
    /// identifier of the fee quote the broadcaster committed to
    pub fee_commitment: String,
    /// true if the broadcaster can route through the relay adapter (swaps,
    /// base-token unshields)
    pub supports_relay_adapt: bool,
}

/// Relayed fee payment through a broadcaster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayedFee {
    pub fee_token_address: Address,
    pub fee_token_symbol: String,
    pub fee_token_decimals: u8,
    pub broadcaster_address: Address,
    pub broadcaster_fee_commitment: String,
    pub fee_per_unit_gas: TokenAmount,
}

/// How gas is paid for the transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeStrategy {
    /// a local public wallet signs and pays gas in the native asset.
    SelfSigned { signer: PublicSigner },

    /// a broadcaster submits the transaction and is paid in a fee token out of
    /// the private balance.
    Relayed(RelayedFee),
}

impl FeeStrategy {
    pub fn is_relayed(&self) -> bool {
        matches!(self, Self::Relayed(_))
    }

    pub fn relayed(&self) -> Option<&RelayedFee> {
        match self {
            Self::Relayed(fee) => Some(fee),
            Self::SelfSigned { .. } => None,
        }
    }
}

impl fmt::Display for FeeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfSigned { signer } => write!(f, "self-signed by {}", signer),
            Self::Relayed(fee) => write!(
                f,
                "relayed by {}, fee paid in {}",
                fee.broadcaster_address.abbreviated(),
                fee.fee_token_symbol
            ),
        }
    }
}

/// User's choice between the two fee branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumIter)]
pub enum FeeMode {
    #[strum(to_string = "Relayed (pay a broadcaster from private balance)")]
    Relayed,
    #[strum(to_string = "Self-signed (pay gas from a public wallet)")]
    SelfSigned,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvmGasType {
    Legacy,
    Eip1559,
}

/// Fully resolved gas parameters for the transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasDetails {
    pub evm_gas_type: EvmGasType,
    pub gas_limit: u64,
    /// gas price for legacy transactions, max fee per gas for EIP-1559
    pub max_fee_per_gas: TokenAmount,
    pub max_priority_fee_per_gas: Option<TokenAmount>,
}

/// The fee output paying a broadcaster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcasterFeeRecipient {
    pub recipient_address: Address,
    pub token_address: Address,
    pub amount: TokenAmount,
}

/// Estimated cost of a transaction under one fee strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimate {
    pub fee_token_symbol: String,
    pub gas_details: GasDetails,
    /// human-readable estimated cost, eg `0.0042 ETH`
    pub estimated_cost: String,
    /// present only for relayed estimates
    pub broadcaster_fee_recipient: Option<BroadcasterFeeRecipient>,
}

impl fmt::Display for GasEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "estimated cost {}", self.estimated_cost)
    }
}

/// Metadata of a token used to pay broadcaster fees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}
