use crate::models::address::Address;
use crate::models::address::ChainId;
use crate::models::address::TxHash;
use crate::models::fee::SelectedBroadcaster;
use crate::models::proven_transaction::UnsignedTransaction;

/// A proven transaction wrapped for relaying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    pub chain_id: ChainId,
    pub broadcaster_address: Address,
    pub fee_commitment: String,
    pub transaction: UnsignedTransaction,
    pub nullifiers: Vec<String>,
    pub pre_transaction_proofs: Vec<String>,
    pub uses_relay_adapt: bool,
}

/// The broadcaster messaging network.
#[async_trait::async_trait]
pub trait BroadcasterTransport: Send + Sync {
    /// the best broadcaster accepting `fee_token` on `chain_id`, skipping
    /// `excluded` addresses. `None` if no broadcaster qualifies.
    async fn find_best_broadcaster(
        &self,
        chain_id: ChainId,
        fee_token: &Address,
        requires_relay_adapt: bool,
        excluded: &[Address],
    ) -> anyhow::Result<Option<SelectedBroadcaster>>;

    /// hand the transaction to the broadcaster. returns the hash the
    /// broadcaster submitted it under.
    async fn send(&self, request: RelayRequest) -> anyhow::Result<TxHash>;
}
