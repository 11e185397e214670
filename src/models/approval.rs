use std::fmt;

use super::address::Address;
use super::amount::TokenAmount;

/// A missing ERC20 approval.
///
/// Exists only while the signer's allowance for `spender` is below
/// `required_amount`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApprovalRequirement {
    pub token_address: Address,
    pub symbol: String,
    pub spender: Address,
    pub owner: Address,
    pub required_amount: TokenAmount,
    pub current_allowance: TokenAmount,
}

impl fmt::Display for ApprovalRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "approve {} ({}) for spender {}",
            self.symbol,
            self.token_address.abbreviated(),
            self.spender.abbreviated()
        )
    }
}
