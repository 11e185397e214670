//! Proof generation and transaction population.
//!
//! The prover runs to completion once started. While it runs, its progress
//! events are forwarded to the prompter's progress line; they never feed back
//! into the workflow.

use crate::api::prompts::Prompter;
use crate::api::prover::ProgressReporter;
use crate::api::prover::ProofRequest;
use crate::api::Services;
use crate::models::proven_transaction::ProofProgress;
use crate::models::proven_transaction::ProvenTransaction;
use crate::state::session::Session;
use crate::workflow::consolidate::consolidate_payload;
use crate::workflow::context::WorkflowContext;
use crate::workflow::error::ProofError;

#[derive(Debug)]
pub struct ProofBuilder<'a> {
    services: &'a Services,
    session: &'a Session,
    prompter: &'a dyn Prompter,
}

impl<'a> ProofBuilder<'a> {
    pub fn new(services: &'a Services, session: &'a Session, prompter: &'a dyn Prompter) -> Self {
        Self {
            services,
            session,
            prompter,
        }
    }

    /// prove and populate the context's transaction from its current gas
    /// estimate.
    pub async fn build(&self, ctx: &WorkflowContext) -> Result<ProvenTransaction, ProofError> {
        let (Some(fee_strategy), Some(record), Some(encryption_key)) = (
            ctx.fee_strategy(),
            ctx.estimate_record(),
            ctx.encryption_key(),
        ) else {
            return Err(ProofError::MissingRequirement);
        };
        if ctx.gas_estimate().is_none() {
            return Err(ProofError::StaleEstimate);
        }

        let payload = consolidate_payload(ctx.payload());
        let request = ProofRequest {
            intent: ctx.intent(),
            chain: self.session.chain(),
            payload: &payload,
            fee_strategy,
            gas_estimate: &record.estimate,
            encryption_key,
        };

        tracing::info!("building {} transaction", ctx.intent());
        let (reporter, mut progress_rx) = ProgressReporter::channel();
        let proving = self.services.prover.generate_proof(request, reporter);
        tokio::pin!(proving);

        let mut display = ProgressDisplay::new(self.prompter);
        let result = loop {
            tokio::select! {
                biased;
                Some(progress) = progress_rx.recv() => display.show(&progress),
                result = &mut proving => break result,
            }
        };
        // events sent just before the prover returned
        while let Ok(progress) = progress_rx.try_recv() {
            display.show(&progress);
        }

        let mut proven = result.map_err(|e| {
            tracing::error!("proof generation failed: {}", e);
            ProofError::from(e)
        })?;
        proven.built_from = ctx.payload().digest();
        tracing::info!(
            "{} transaction built with {} nullifier(s)",
            ctx.intent(),
            proven.nullifiers.len()
        );
        Ok(proven)
    }
}

/// Forwards progress to the prompter, dropping regressions so the rendered
/// percentage only increases.
#[derive(Debug)]
struct ProgressDisplay<'a> {
    prompter: &'a dyn Prompter,
    shown: Option<f64>,
}

impl<'a> ProgressDisplay<'a> {
    fn new(prompter: &'a dyn Prompter) -> Self {
        Self {
            prompter,
            shown: None,
        }
    }

    fn show(&mut self, progress: &ProofProgress) {
        if self.shown.is_some_and(|shown| progress.percent < shown) {
            tracing::trace!("ignoring progress regression to {}", progress.percent);
            return;
        }
        self.shown = Some(progress.percent);
        self.prompter.show_progress(progress);
    }
}
