//! Chain-facing services: allowances, gas estimation, submission, balance
//! scanning and token metadata.

use crate::config_models::network::ChainConfig;
use crate::models::address::Address;
use crate::models::address::ChainId;
use crate::models::address::TxHash;
use crate::models::amount::TokenAmount;
use crate::models::fee::FeeStrategy;
use crate::models::fee::GasEstimate;
use crate::models::fee::PublicSigner;
use crate::models::fee::TokenInfo;
use crate::models::proven_transaction::UnsignedTransaction;
use crate::models::selection::TransactionPayload;

#[async_trait::async_trait]
pub trait AllowanceService: Send + Sync {
    async fn get_allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> anyhow::Result<TokenAmount>;

    /// populate `approve(spender, amount)` on `token`
    async fn populate_approval(
        &self,
        token: &Address,
        spender: &Address,
        amount: &TokenAmount,
    ) -> anyhow::Result<UnsignedTransaction>;

    /// gas cost of submitting `approval` from `signer`
    async fn estimate_approval(
        &self,
        signer: &PublicSigner,
        approval: &UnsignedTransaction,
    ) -> anyhow::Result<GasEstimate>;
}

/// Inputs shared by every estimation entry point.
#[derive(Debug, Clone, Copy)]
pub struct EstimateRequest<'a> {
    pub chain: &'a ChainConfig,
    pub payload: &'a TransactionPayload,
    /// `None` prices the transaction as self-signed by the session's active
    /// signer.
    pub fee_strategy: Option<&'a FeeStrategy>,
}

/// One estimation entry point per kind of transaction. All of them return
/// the same [`GasEstimate`] shape.
#[async_trait::async_trait]
pub trait GasEstimator: Send + Sync {
    async fn estimate_transfer(&self, req: EstimateRequest<'_>) -> anyhow::Result<GasEstimate>;
    async fn estimate_unshield(&self, req: EstimateRequest<'_>) -> anyhow::Result<GasEstimate>;
    async fn estimate_unshield_base(&self, req: EstimateRequest<'_>)
        -> anyhow::Result<GasEstimate>;
    async fn estimate_shield(&self, req: EstimateRequest<'_>) -> anyhow::Result<GasEstimate>;
    async fn estimate_shield_base(&self, req: EstimateRequest<'_>) -> anyhow::Result<GasEstimate>;
    async fn estimate_public_transfer(
        &self,
        req: EstimateRequest<'_>,
    ) -> anyhow::Result<GasEstimate>;
    async fn estimate_public_base_transfer(
        &self,
        req: EstimateRequest<'_>,
    ) -> anyhow::Result<GasEstimate>;
    async fn estimate_public_swap(&self, req: EstimateRequest<'_>) -> anyhow::Result<GasEstimate>;
    async fn estimate_private_swap(&self, req: EstimateRequest<'_>)
        -> anyhow::Result<GasEstimate>;
}

/// Inclusion state of a submitted transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Mined { block_number: u64 },
    Reverted { block_number: u64 },
}

#[async_trait::async_trait]
pub trait SubmissionService: Send + Sync {
    /// sign with `signer` and submit. returns once the transaction is accepted
    /// into the pending pool.
    async fn send_self_signed(
        &self,
        signer: &PublicSigner,
        transaction: &UnsignedTransaction,
    ) -> anyhow::Result<TxHash>;

    async fn transaction_status(&self, tx_hash: &TxHash) -> anyhow::Result<TxStatus>;
}

#[async_trait::async_trait]
pub trait BalanceScanner: Send + Sync {
    /// forget cached balances so the next refresh re-derives them from chain
    /// state.
    async fn reset_scan_state(&self, chain: &ChainConfig) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
pub trait TokenMetadata: Send + Sync {
    async fn token_info(&self, chain_id: ChainId, token: &Address) -> anyhow::Result<TokenInfo>;
}
