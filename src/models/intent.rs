use serde::Deserialize;
use serde::Serialize;
use strum::EnumIter;

/// The kind of operation a workflow run builds.
///
/// Fixed for the lifetime of one run.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
pub enum TransactionIntent {
    /// private balance to private address
    Transfer,
    /// private ERC20 balance to a public address
    Unshield,
    /// public ERC20 balance into the private pool
    Shield,
    /// private wrapped base token to native asset at a public address
    UnshieldBase,
    /// native asset into the private pool as wrapped base token
    ShieldBase,
    /// public ERC20 transfer signed by a local public wallet
    PublicTransfer,
    /// public native-asset transfer signed by a local public wallet
    PublicBaseTransfer,
    /// swap of public balances
    PublicSwap,
    /// swap of private balances through the relay adapter
    PrivateSwap,
}

/// Who an ERC20 approval is granted to before a step may proceed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalSpender {
    /// the private pool contract, which pulls tokens during shield
    PrivacyPool,
    /// the swap router, which pulls the sell token during a public swap
    SwapRouter,
}

impl TransactionIntent {
    /// swap intents carry a `SwapSelection`; all others carry amount
    /// selections.
    pub fn is_swap(&self) -> bool {
        matches!(self, Self::PublicSwap | Self::PrivateSwap)
    }

    /// intents whose cost is paid by the public signing wallet, so there is no
    /// fee-strategy choice and the estimate is computed when amounts are
    /// confirmed.
    pub fn has_intrinsic_cost(&self) -> bool {
        matches!(
            self,
            Self::Shield
                | Self::ShieldBase
                | Self::PublicTransfer
                | Self::PublicBaseTransfer
                | Self::PublicSwap
        )
    }

    /// intents that may be submitted through a broadcaster.
    pub fn allows_broadcaster(&self) -> bool {
        !self.has_intrinsic_cost()
    }

    /// intents spending private balance need a zero-knowledge proof; the rest
    /// only need their transaction populated.
    pub fn requires_proof(&self) -> bool {
        matches!(
            self,
            Self::Transfer | Self::Unshield | Self::UnshieldBase | Self::PrivateSwap
        )
    }

    /// intents routed through the relay adapter contract, which only some
    /// broadcasters support.
    pub fn uses_relay_adapt(&self) -> bool {
        matches!(self, Self::UnshieldBase | Self::PrivateSwap)
    }

    /// the approval spender that applies to this intent, if any.
    ///
    /// note that a public swap selling the native asset needs no approval;
    /// callers check the sell token.
    pub fn approval_spender(&self) -> Option<ApprovalSpender> {
        match self {
            Self::Shield => Some(ApprovalSpender::PrivacyPool),
            Self::PublicSwap => Some(ApprovalSpender::SwapRouter),
            _ => None,
        }
    }

    /// human readable title for menus
    pub fn title(&self) -> &'static str {
        match self {
            Self::Transfer => "Private Transfer",
            Self::Unshield => "Unshield",
            Self::Shield => "Shield",
            Self::UnshieldBase => "Unshield Base Token",
            Self::ShieldBase => "Shield Base Token",
            Self::PublicTransfer => "Public Transfer",
            Self::PublicBaseTransfer => "Public Base Token Transfer",
            Self::PublicSwap => "Public Swap",
            Self::PrivateSwap => "Private Swap",
        }
    }
}
