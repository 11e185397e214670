//! What the user picked to send: amount legs for the transfer family and a
//! single swap for the swap family.

use std::fmt;

use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;
use sha3::Digest;
use sha3::Sha3_256;

use super::address::Address;
use super::amount::TokenAmount;
use super::intent::TransactionIntent;

/// One leg of a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AmountSelection {
    pub token_address: Address,
    pub amount: TokenAmount,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
    pub recipient_address: Address,
}

impl AmountSelection {
    pub fn display_amount(&self) -> String {
        format!("{} {}", self.amount.format_units(self.decimals), self.symbol)
    }
}

/// A swap of one token for another.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwapSelection {
    pub sell_token_address: Address,
    pub buy_token_address: Address,
    pub sell_amount: TokenAmount,
    pub sell_decimals: u8,
    pub sell_symbol: String,
    pub buy_symbol: String,
}

/// A token and the total raw amount a step must be able to move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenRequirement {
    pub token_address: Address,
    pub symbol: String,
    pub amount: TokenAmount,
}

/// The selections of a workflow run.
///
/// A run is either transfer-family or swap-family; the variant is fixed by the
/// [`TransactionIntent`] the run was opened with.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionPayload {
    Transfer(Vec<AmountSelection>),
    Swap(Option<SwapSelection>),
}

impl TransactionPayload {
    /// an empty payload of the right family for `intent`
    pub fn empty_for(intent: TransactionIntent) -> Self {
        if intent.is_swap() {
            Self::Swap(None)
        } else {
            Self::Transfer(vec![])
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Transfer(selections) => selections.is_empty(),
            Self::Swap(swap) => swap.is_none(),
        }
    }

    pub fn amount_selections(&self) -> &[AmountSelection] {
        match self {
            Self::Transfer(selections) => selections,
            Self::Swap(_) => &[],
        }
    }

    /// total amount per distinct token that leaves the signer, in first-seen
    /// token order.
    pub fn token_requirements(&self) -> Vec<TokenRequirement> {
        match self {
            Self::Transfer(selections) => selections
                .iter()
                .into_group_map_by(|s| s.token_address.clone())
                .into_iter()
                .map(|(token_address, legs)| TokenRequirement {
                    symbol: legs[0].symbol.clone(),
                    amount: legs.iter().map(|s| &s.amount).sum(),
                    token_address,
                })
                .sorted_by_key(|r| {
                    selections
                        .iter()
                        .position(|s| s.token_address == r.token_address)
                })
                .collect(),
            Self::Swap(Some(swap)) => vec![TokenRequirement {
                token_address: swap.sell_token_address.clone(),
                symbol: swap.sell_symbol.clone(),
                amount: swap.sell_amount.clone(),
            }],
            Self::Swap(None) => vec![],
        }
    }

    /// content digest of the payload.
    ///
    /// gas estimates and proofs record the digest of the payload they were
    /// computed for, so a later change of selections is detectable.
    pub fn digest(&self) -> PayloadDigest {
        // bincode serialization of these plain data types cannot fail.
        let encoded = bincode::serialize(self).unwrap_or_default();
        PayloadDigest(Sha3_256::digest(encoded).into())
    }
}

impl fmt::Display for TransactionPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer(selections) if selections.is_empty() => write!(f, "no amounts selected"),
            Self::Transfer(selections) => write!(
                f,
                "{}",
                selections
                    .iter()
                    .map(|s| format!(
                        "{} to {}",
                        s.display_amount(),
                        s.recipient_address.abbreviated()
                    ))
                    .join(", ")
            ),
            Self::Swap(None) => write!(f, "no swap selected"),
            Self::Swap(Some(swap)) => write!(
                f,
                "sell {} {} for {}",
                swap.sell_amount.format_units(swap.sell_decimals),
                swap.sell_symbol,
                swap.buy_symbol
            ),
        }
    }
}

/// sha3-256 digest of a [`TransactionPayload`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayloadDigest([u8; 32]);

impl fmt::Display for PayloadDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
