use tokio::sync::mpsc;

use crate::config_models::network::ChainConfig;
use crate::models::fee::FeeStrategy;
use crate::models::fee::GasEstimate;
use crate::models::intent::TransactionIntent;
use crate::models::proven_transaction::ProofProgress;
use crate::models::proven_transaction::ProvenTransaction;
use crate::models::secret::EncryptionKey;
use crate::models::selection::TransactionPayload;

/// Everything the proving engine needs for one transaction.
#[derive(Debug, Clone, Copy)]
pub struct ProofRequest<'a> {
    pub intent: TransactionIntent,
    pub chain: &'a ChainConfig,
    pub payload: &'a TransactionPayload,
    pub fee_strategy: &'a FeeStrategy,
    pub gas_estimate: &'a GasEstimate,
    pub encryption_key: &'a EncryptionKey,
}

/// One-way progress channel handed to the proving engine.
///
/// Reporting never fails: if nobody listens the event is dropped.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<ProofProgress>,
}

impl ProgressReporter {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProofProgress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn report(&self, percent: f64, label: Option<&str>) {
        let _ = self
            .tx
            .send(ProofProgress::new(percent, label.map(str::to_string)));
    }
}

#[async_trait::async_trait]
pub trait ProvingService: Send + Sync {
    /// generate the proof and populate the transaction.
    ///
    /// may report progress any number of times, including zero.
    async fn generate_proof(
        &self,
        request: ProofRequest<'_>,
        progress: ProgressReporter,
    ) -> anyhow::Result<ProvenTransaction>;
}
