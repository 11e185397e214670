//! Error types of the workflow steps.
//!
//! None of these escape the controller: each step handler logs its error and
//! re-enters the menu with the previous context.

use crate::models::address::Address;

#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum UnlockError {
    #[error("password entry cancelled")]
    Declined,

    #[error("wallet could not be unlocked.  reason: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ApprovalError {
    #[error("approval of {symbol} declined")]
    Declined { token: Address, symbol: String },

    #[error("could not read allowance of {token}.  reason: {reason}")]
    AllowanceRead { token: Address, reason: String },

    #[error("approval of {token} was not confirmed.  reason: {reason}")]
    NotConfirmed { token: Address, reason: String },

    // catch-all error, eg for anyhow errors
    #[error("approval failed.  reason: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum FeeError {
    #[error("could not look up fee token {token}.  reason: {reason}")]
    FeeToken { token: Address, reason: String },

    // catch-all error, eg for anyhow errors
    #[error("fee selection failed.  reason: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum ProofError {
    #[error("missing required data to build proof")]
    MissingRequirement,

    #[error("gas estimate is stale; select fees again")]
    StaleEstimate,

    // catch-all error, eg for anyhow errors
    #[error("proof could not be generated.  reason: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum DispatchError {
    #[error("no transaction has been built")]
    NothingToSend,

    #[error("fee strategy is missing")]
    MissingFeeStrategy,

    #[error("transaction was built for different selections")]
    StaleTransaction,

    // catch-all error, eg for anyhow errors
    #[error("transaction could not be sent.  reason: {0}")]
    Failed(String),
}

/// Union of the step errors, as reported by the controller.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum StepError {
    #[error(transparent)]
    Unlock(#[from] UnlockError),

    #[error(transparent)]
    Approval(#[from] ApprovalError),

    #[error(transparent)]
    Fee(#[from] FeeError),

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("step failed.  reason: {0}")]
    Failed(String),
}

impl StepError {
    /// the user backed out. not worth more than a debug log.
    pub fn is_declined(&self) -> bool {
        matches!(
            self,
            Self::Unlock(UnlockError::Declined) | Self::Approval(ApprovalError::Declined { .. })
        )
    }
}

// convert anyhow::Error to the Failed variant.
// note that anyhow Error is not Clone.
impl From<anyhow::Error> for ApprovalError {
    fn from(e: anyhow::Error) -> Self {
        Self::Failed(e.to_string())
    }
}

impl From<anyhow::Error> for FeeError {
    fn from(e: anyhow::Error) -> Self {
        Self::Failed(e.to_string())
    }
}

impl From<anyhow::Error> for ProofError {
    fn from(e: anyhow::Error) -> Self {
        Self::Failed(e.to_string())
    }
}

impl From<anyhow::Error> for DispatchError {
    fn from(e: anyhow::Error) -> Self {
        Self::Failed(e.to_string())
    }
}

impl From<anyhow::Error> for StepError {
    fn from(e: anyhow::Error) -> Self {
        Self::Failed(e.to_string())
    }
}
