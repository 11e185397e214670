//! Submission of a built transaction and the background confirmation watch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::api::broadcaster::RelayRequest;
use crate::api::chain::SubmissionService;
use crate::api::chain::TxStatus;
use crate::api::Services;
use crate::models::address::TxHash;
use crate::models::fee::FeeStrategy;
use crate::models::intent::TransactionIntent;
use crate::state::session::Session;
use crate::state::status::StatusQueue;
use crate::state::watchers::WatchOutcome;
use crate::state::watchers::WatchedTransaction;
use crate::workflow::context::WorkflowContext;
use crate::workflow::error::DispatchError;

#[derive(Debug)]
pub struct Dispatcher<'a> {
    services: &'a Services,
    session: &'a Session,
}

impl<'a> Dispatcher<'a> {
    pub fn new(services: &'a Services, session: &'a Session) -> Self {
        Self { services, session }
    }

    /// submit the context's transaction along the path its fee strategy
    /// selects.
    ///
    /// returns once the transaction is accepted for inclusion. a confirmation
    /// watcher is left running in the background. the balance scan state is
    /// reset whether or not submission succeeded.
    pub async fn dispatch(&self, ctx: &WorkflowContext) -> Result<TxHash, DispatchError> {
        let result = self.submit(ctx).await;

        if let Err(e) = self
            .services
            .scanner
            .reset_scan_state(self.session.chain())
            .await
        {
            tracing::warn!("could not reset balance scan state: {}", e);
        }

        let tx_hash = result?;
        self.watch(tx_hash.clone(), ctx.intent());
        Ok(tx_hash)
    }

    async fn submit(&self, ctx: &WorkflowContext) -> Result<TxHash, DispatchError> {
        let proven = ctx.proven().ok_or(DispatchError::NothingToSend)?;
        if proven.built_from != ctx.payload().digest() {
            return Err(DispatchError::StaleTransaction);
        }
        let strategy = ctx.fee_strategy().ok_or(DispatchError::MissingFeeStrategy)?;

        let tx_hash = match strategy {
            FeeStrategy::SelfSigned { signer } => {
                tracing::info!("sending {} self-signed by {}", ctx.intent(), signer);
                self.services
                    .submission
                    .send_self_signed(signer, &proven.transaction)
                    .await?
            }
            FeeStrategy::Relayed(fee) => {
                tracing::info!(
                    "sending {} through broadcaster {}",
                    ctx.intent(),
                    fee.broadcaster_address
                );
                let request = RelayRequest {
                    chain_id: self.session.chain().chain_id,
                    broadcaster_address: fee.broadcaster_address.clone(),
                    fee_commitment: fee.broadcaster_fee_commitment.clone(),
                    transaction: proven.transaction.clone(),
                    nullifiers: proven.nullifiers.clone(),
                    pre_transaction_proofs: proven.pre_transaction_proofs.clone(),
                    uses_relay_adapt: proven.uses_relay_adapt,
                };
                self.services.broadcasters.send(request).await?
            }
        };

        tracing::info!("transaction accepted: {}", tx_hash);
        Ok(tx_hash)
    }

    /// spawn the detached confirmation watcher for `tx_hash` and record it in
    /// the session's watcher registry.
    pub fn watch(&self, tx_hash: TxHash, intent: TransactionIntent) {
        let handle = spawn_confirmation_watcher(
            self.services.submission.clone(),
            tx_hash.clone(),
            self.session.status().clone(),
            self.session.config().confirmation_poll_interval,
            self.session.config().confirmation_timeout,
            self.session.config().status_duration,
        );
        self.session.watchers().prune_finished();
        self.session.watchers().register(WatchedTransaction {
            tx_hash,
            intent,
            started_at: Utc::now(),
            handle,
        });
    }
}

/// poll `tx_hash` every `poll_interval` until it is mined or reverted, for at
/// most `timeout`.
///
/// a failed status query ends the watch.
pub async fn await_inclusion(
    submission: &dyn SubmissionService,
    tx_hash: &TxHash,
    poll_interval: Duration,
    timeout: Duration,
) -> WatchOutcome {
    let poll = async {
        loop {
            match submission.transaction_status(tx_hash).await {
                Ok(TxStatus::Mined { block_number }) => {
                    return WatchOutcome::Confirmed { block_number }
                }
                Ok(TxStatus::Reverted { block_number }) => {
                    return WatchOutcome::Reverted { block_number }
                }
                Ok(TxStatus::Pending) => {}
                Err(e) => return WatchOutcome::Failed(e.to_string()),
            }
            tokio::time::sleep(poll_interval).await;
        }
    };

    tokio::time::timeout(timeout, poll)
        .await
        .unwrap_or(WatchOutcome::TimedOut)
}

/// the watcher only writes to `status`. it holds nothing of the workflow run
/// that sent the transaction.
fn spawn_confirmation_watcher(
    submission: Arc<dyn SubmissionService>,
    tx_hash: TxHash,
    status: StatusQueue,
    poll_interval: Duration,
    timeout: Duration,
    status_duration: Duration,
) -> tokio::task::JoinHandle<WatchOutcome> {
    tokio::spawn(async move {
        let outcome = await_inclusion(submission.as_ref(), &tx_hash, poll_interval, timeout).await;

        let message = match &outcome {
            WatchOutcome::Confirmed { block_number } => {
                format!("Transaction {} confirmed in block {}", tx_hash, block_number)
            }
            WatchOutcome::Reverted { block_number } => {
                format!("Transaction {} reverted in block {}", tx_hash, block_number)
            }
            WatchOutcome::TimedOut => format!(
                "Transaction {} not confirmed after {}",
                tx_hash,
                humantime::format_duration(timeout)
            ),
            WatchOutcome::Failed(reason) => {
                tracing::warn!("watching {} failed: {}", tx_hash, reason);
                format!("Could not watch transaction {}: {}", tx_hash, reason)
            }
        };
        status.push(message, status_duration);
        outcome
    })
}
