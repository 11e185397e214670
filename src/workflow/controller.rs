//! This module implements [TransactionWorkflow], the state machine that
//! sequences the steps of building and sending one transaction.
//!
//! A run goes through these stages:
//!
//!   selecting targets -> amounts pending -> fee selection -> ready to build
//!   -> ready to send -> sent | cancelled
//!
//! The stage is never stored. It is a projection of which members of the
//! [WorkflowContext] are populated, as are the menu's enabled flags.
//!
//! [TransactionWorkflow::transition] takes a context and one menu action and
//! produces the next context. It is total: every failure inside a step is
//! logged at the step boundary, and the run continues from the previous
//! context so the failed step can be retried. Only `send-transaction` and
//! `exit-menu` end a run.
//!
//! [TransactionWorkflow::run] is the driver loop: render the menu, await one
//! action, transition.

use std::fmt;
use std::sync::Arc;

use crate::api::prompts::Prompter;
use crate::api::Services;
use crate::models::address::TxHash;
use crate::models::fee::FeeStrategy;
use crate::models::intent::TransactionIntent;
use crate::models::selection::TransactionPayload;
use crate::models::secret::EncryptionKey;
use crate::state::session::Session;
use crate::workflow::approval::ApprovalWorkflow;
use crate::workflow::consolidate::consolidate_payload;
use crate::workflow::context::WorkflowContext;
use crate::workflow::dispatcher::Dispatcher;
use crate::workflow::error::StepError;
use crate::workflow::error::UnlockError;
use crate::workflow::fee_resolver::FeeOutcome;
use crate::workflow::fee_resolver::FeeResolver;
use crate::workflow::menu::Menu;
use crate::workflow::menu::MenuAction;
use crate::workflow::proof_builder::ProofBuilder;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, strum::EnumIs)]
pub enum Outcome {
    Sent { tx_hash: TxHash },
    Cancelled,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent { tx_hash } => write!(f, "sent {}", tx_hash),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of applying one action.
#[derive(Debug, Clone, PartialEq, Eq, strum::EnumIs)]
pub enum Transition {
    Continue(WorkflowContext),
    Terminal(Outcome),
}

#[derive(Debug, Clone)]
pub struct TransactionWorkflow {
    services: Services,
    session: Arc<Session>,
    prompter: Arc<dyn Prompter>,
}

impl TransactionWorkflow {
    pub fn new(services: Services, session: Arc<Session>, prompter: Arc<dyn Prompter>) -> Self {
        Self {
            services,
            session,
            prompter,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// run the menu loop for `intent` until the transaction is sent or the
    /// user cancels.
    pub async fn run(&self, intent: TransactionIntent) -> Outcome {
        tracing::info!("opening {} workflow", intent);
        let mut ctx = WorkflowContext::new(intent);

        loop {
            let menu = Menu::for_context(&ctx);
            let action = match self.prompter.select_action(&menu).await {
                Ok(action) => action,
                Err(e) => {
                    tracing::error!("menu input failed, cancelling: {}", e);
                    return Outcome::Cancelled;
                }
            };

            match self.transition(ctx, action).await {
                Transition::Continue(next) => ctx = next,
                Transition::Terminal(outcome) => {
                    tracing::info!("{} workflow {}", intent, outcome);
                    return outcome;
                }
            }
        }
    }

    /// apply `action` to `ctx`.
    pub async fn transition(&self, ctx: WorkflowContext, action: MenuAction) -> Transition {
        if !Menu::for_context(&ctx).is_enabled(action) {
            // unreachable through `run`, which only offers enabled actions.
            tracing::error!(
                "action {} is disabled at stage {}; flag projection and menu disagree",
                action,
                ctx.stage()
            );
            return Transition::Continue(ctx);
        }

        let from = ctx.stage();
        let result = match action {
            MenuAction::ExitMenu => return Transition::Terminal(Outcome::Cancelled),
            MenuAction::SendTransaction => return self.send_transaction(ctx).await,
            MenuAction::SelectEdit => self.select_edit(&ctx).await,
            MenuAction::ConfirmAmounts => self.confirm_amounts(&ctx).await,
            MenuAction::SelectFee => self.select_fee(&ctx).await,
            MenuAction::DifferentBroadcaster => self.different_broadcaster(&ctx).await,
            MenuAction::GenerateProof => self.generate_proof(&ctx).await,
        };

        let next = match result {
            Ok(next) => next,
            Err(e) if e.is_declined() => {
                tracing::debug!("{} declined: {}", action, e);
                ctx
            }
            Err(e) => {
                tracing::error!("{} failed: {}", action, e);
                self.prompter.notify(&e.to_string());
                ctx
            }
        };
        tracing::debug!("{}: {} -> {}", action, from, next.stage());
        Transition::Continue(next)
    }

    async fn select_edit(&self, ctx: &WorkflowContext) -> Result<WorkflowContext, StepError> {
        let intent = ctx.intent();
        let payload = if intent.is_swap() {
            match self.prompter.select_swap(intent).await? {
                Some(swap) => TransactionPayload::Swap(Some(swap)),
                None => return Ok(ctx.clone()),
            }
        } else {
            match self.prompter.select_amounts(intent).await? {
                Some(selections) => TransactionPayload::Transfer(selections),
                None => return Ok(ctx.clone()),
            }
        };
        let payload = consolidate_payload(&payload);

        if let Some(spender) = intent.approval_spender() {
            if !payload.is_empty() {
                let approvals = ApprovalWorkflow::new(
                    &self.services,
                    &self.session,
                    self.prompter.as_ref(),
                );
                let spender = approvals.spender_address(spender);
                if let Err(e) = approvals.run(&payload.token_requirements(), &spender).await {
                    // the new selections are not committed, and nothing built
                    // on the old ones survives a failed approval.
                    let e = StepError::from(e);
                    if e.is_declined() {
                        tracing::debug!("approval declined: {}", e);
                    } else {
                        tracing::error!("approval failed: {}", e);
                        self.prompter.notify(&e.to_string());
                    }
                    return Ok(ctx.clone().without_estimate());
                }
            }
        }

        Ok(ctx.clone().with_payload(payload))
    }

    async fn confirm_amounts(&self, ctx: &WorkflowContext) -> Result<WorkflowContext, StepError> {
        let key = match ctx.encryption_key() {
            Some(key) => key.clone(),
            None => self.unlock().await?,
        };
        let ctx = ctx.clone().with_encryption_key(key).with_amounts_confirmed();

        if !ctx.intent().has_intrinsic_cost() {
            return Ok(ctx);
        }

        // paid by the active public wallet; price it now.
        let strategy = FeeStrategy::SelfSigned {
            signer: self.session.active_signer().clone(),
        };
        let resolver = FeeResolver::new(&self.services, &self.session, self.prompter.as_ref());
        Ok(match resolver.estimate(&ctx, strategy).await {
            FeeOutcome::Resolved { strategy, estimate } => ctx.with_fee(strategy, Some(estimate)),
            FeeOutcome::EstimateFailed { strategy } => ctx.with_fee(strategy, None),
            FeeOutcome::Declined => ctx,
        })
    }

    async fn unlock(&self) -> Result<EncryptionKey, StepError> {
        let Some(password) = self.prompter.password("Wallet password").await? else {
            return Err(UnlockError::Declined.into());
        };
        self.services
            .keychain
            .unlock(&password)
            .await
            .map_err(|e| UnlockError::Failed(e.to_string()).into())
    }

    async fn select_fee(&self, ctx: &WorkflowContext) -> Result<WorkflowContext, StepError> {
        let resolver = FeeResolver::new(&self.services, &self.session, self.prompter.as_ref());
        Ok(match resolver.resolve(ctx).await? {
            FeeOutcome::Resolved { strategy, estimate } => {
                ctx.clone().with_fee(strategy, Some(estimate))
            }
            FeeOutcome::EstimateFailed { strategy } => ctx.clone().with_fee(strategy, None),
            FeeOutcome::Declined => ctx.clone(),
        })
    }

    /// decline the current broadcaster and pick another through the relayed
    /// branch. the declined broadcaster stays excluded even if the user backs
    /// out of the new selection, in which case the context is unchanged.
    async fn different_broadcaster(
        &self,
        ctx: &WorkflowContext,
    ) -> Result<WorkflowContext, StepError> {
        if let Some(current) = ctx.fee_strategy().and_then(FeeStrategy::relayed) {
            self.session
                .exclusions()
                .exclude(current.broadcaster_address.clone());
        }

        let resolver = FeeResolver::new(&self.services, &self.session, self.prompter.as_ref());
        let Some(strategy) = resolver.select_relayed(ctx.intent()).await? else {
            return Ok(ctx.clone());
        };
        Ok(match resolver.estimate(ctx, strategy).await {
            FeeOutcome::Resolved { strategy, estimate } => {
                ctx.clone().with_fee(strategy, Some(estimate))
            }
            FeeOutcome::EstimateFailed { strategy } => ctx.clone().with_fee(strategy, None),
            FeeOutcome::Declined => ctx.clone(),
        })
    }

    async fn generate_proof(&self, ctx: &WorkflowContext) -> Result<WorkflowContext, StepError> {
        let builder = ProofBuilder::new(&self.services, &self.session, self.prompter.as_ref());
        let proven = builder.build(ctx).await?;
        Ok(ctx.clone().with_proven(proven))
    }

    /// dispatch, offering a retry on failure. a failed send keeps the built
    /// transaction, so retrying needs no new proof.
    async fn send_transaction(&self, ctx: WorkflowContext) -> Transition {
        let dispatcher = Dispatcher::new(&self.services, &self.session);
        loop {
            match dispatcher.dispatch(&ctx).await {
                Ok(tx_hash) => {
                    self.prompter
                        .notify(&format!("Transaction sent: {}", tx_hash));
                    return Transition::Terminal(Outcome::Sent { tx_hash });
                }
                Err(e) => {
                    tracing::error!("send-transaction failed: {}", e);
                    self.prompter.notify(&e.to_string());
                    let retry = self
                        .prompter
                        .confirm("Sending failed. Retry now?")
                        .await
                        .unwrap_or(false);
                    if !retry {
                        return Transition::Continue(ctx);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::mock_services::Answer;
    use crate::mock_services::SubmissionPath;
    use crate::models::address::Address;
    use crate::models::fee::FeeMode;
    use crate::tests::shared::broadcaster;
    use crate::tests::shared::dai;
    use crate::tests::shared::leg;
    use crate::tests::shared::usdc;
    use crate::tests::shared::Harness;
    use crate::tests::shared::PASSWORD;
    use crate::workflow::context::tests::estimate;
    use crate::workflow::context::tests::proven_for;
    use crate::workflow::context::tests::ready_to_send;
    use crate::workflow::context::tests::self_signed;
    use crate::workflow::flags::WorkflowStage;

    fn confirmed_transfer() -> WorkflowContext {
        WorkflowContext::new(TransactionIntent::Transfer)
            .with_payload(TransactionPayload::Transfer(vec![leg(&usdc(), "0xr1", 100)]))
            .with_encryption_key(EncryptionKey::new(vec![3; 32]))
            .with_amounts_confirmed()
    }

    fn unwrap_continue(transition: Transition) -> WorkflowContext {
        match transition {
            Transition::Continue(ctx) => ctx,
            Transition::Terminal(outcome) => panic!("unexpected terminal transition: {}", outcome),
        }
    }

    #[traced_test]
    #[tokio::test]
    async fn private_transfer_runs_to_sent() -> anyhow::Result<()> {
        let h = Harness::new([
            Answer::Action(MenuAction::SelectEdit),
            Answer::Amounts(Some(vec![
                leg(&usdc(), "0xr1", 100),
                leg(&usdc(), "0xr1", 50),
            ])),
            Answer::Action(MenuAction::ConfirmAmounts),
            Answer::Password(Some(PASSWORD.into())),
            Answer::Action(MenuAction::SelectFee),
            Answer::FeeMode(Some(FeeMode::SelfSigned)),
            Answer::Signer(Some(0)),
            Answer::Action(MenuAction::GenerateProof),
            Answer::Action(MenuAction::SendTransaction),
        ]);

        let outcome = h.workflow().run(TransactionIntent::Transfer).await;

        let Outcome::Sent { tx_hash } = outcome else {
            panic!("expected the transaction to be sent");
        };
        assert_eq!(0, h.prompter.remaining());
        assert!(h.session.watchers().contains(&tx_hash));
        assert_eq!(1, h.chain.calls().proofs);
        assert_eq!(1, h.chain.sent().len());
        assert!(h
            .prompter
            .notifications()
            .contains(&format!("Transaction sent: {}", tx_hash)));

        let menus = h.prompter.menus();
        assert_eq!(5, menus.len());
        assert!(!menus[0].is_enabled(MenuAction::ConfirmAmounts));
        assert!(menus[4].is_enabled(MenuAction::SendTransaction));
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    async fn failed_proof_keeps_selections_and_estimate() {
        let h = Harness::new([]);
        h.chain.inject(|f| f.proof = true);
        let ctx = confirmed_transfer().with_fee(self_signed(), Some(estimate()));

        let next = unwrap_continue(
            h.workflow()
                .transition(ctx.clone(), MenuAction::GenerateProof)
                .await,
        );

        assert_eq!(ctx, next);
        assert!(!next.flags().generate_proof_disabled);
        assert!(next.flags().send_transaction_disabled);
        assert_eq!(WorkflowStage::ProofPending, next.stage());
        assert!(logs_contain("generate-proof failed"));
        assert_eq!(1, h.prompter.notifications().len());
    }

    #[traced_test]
    #[tokio::test]
    async fn declined_approval_submits_nothing() {
        let h = Harness::new([
            Answer::Action(MenuAction::SelectEdit),
            Answer::Amounts(Some(vec![leg(&usdc(), "0xpool", 100)])),
            Answer::Confirm(false),
            Answer::Action(MenuAction::ExitMenu),
        ]);

        let outcome = h.workflow().run(TransactionIntent::Shield).await;

        assert!(outcome.is_cancelled());
        assert!(h.chain.sent().is_empty());
        assert_eq!(1, h.chain.calls().approvals_populated);
        // the second menu still shows no selections
        let menus = h.prompter.menus();
        assert!(!menus[1].is_enabled(MenuAction::ConfirmAmounts));
        // the prompt itself was the only feedback
        assert!(!h
            .prompter
            .notifications()
            .iter()
            .any(|n| n.contains("declined")));
    }

    #[traced_test]
    #[tokio::test]
    async fn declined_second_approval_drops_the_proof_and_keeps_the_payload() {
        let h = Harness::new([
            Answer::Amounts(Some(vec![
                leg(&usdc(), "0xpool", 300),
                leg(&dai(), "0xpool", 400),
            ])),
            Answer::Confirm(true),
            Answer::Confirm(false),
        ]);
        let ctx = WorkflowContext::new(TransactionIntent::Shield)
            .with_payload(TransactionPayload::Transfer(vec![
                leg(&usdc(), "0xpool", 100),
                leg(&dai(), "0xpool", 200),
            ]))
            .with_encryption_key(EncryptionKey::new(vec![5; 32]))
            .with_amounts_confirmed()
            .with_fee(self_signed(), Some(estimate()));
        let proven = proven_for(&ctx);
        let ctx = ctx.with_proven(proven);
        assert!(ctx.proven().is_some());

        let next = unwrap_continue(
            h.workflow()
                .transition(ctx.clone(), MenuAction::SelectEdit)
                .await,
        );

        assert!(next.proven().is_none());
        assert!(next.gas_estimate().is_none());
        assert_eq!(ctx.payload(), next.payload());
        assert!(next.flags().generate_proof_disabled);
        assert!(next.flags().send_transaction_disabled);
        assert_eq!(2, h.chain.calls().approvals_populated);
        assert_eq!(0, h.chain.calls().self_signed_sends);
        assert!(h.chain.sent().is_empty());
        assert_eq!(0, h.prompter.remaining());
    }

    #[traced_test]
    #[tokio::test]
    async fn shield_is_priced_when_amounts_are_confirmed() {
        let h = Harness::new([
            Answer::Amounts(Some(vec![leg(&usdc(), "0xpool", 100)])),
            Answer::Confirm(true),
            Answer::Password(Some(PASSWORD.into())),
        ]);
        let workflow = h.workflow();
        let ctx = WorkflowContext::new(TransactionIntent::Shield);

        let ctx = unwrap_continue(workflow.transition(ctx, MenuAction::SelectEdit).await);
        assert_eq!(1, h.chain.sent().len());
        assert_eq!(WorkflowStage::AmountsPending, ctx.stage());

        let ctx = unwrap_continue(workflow.transition(ctx, MenuAction::ConfirmAmounts).await);
        assert!(ctx.gas_estimate().is_some());
        assert_eq!(
            Some(&FeeStrategy::SelfSigned {
                signer: h.session.active_signer().clone()
            }),
            ctx.fee_strategy()
        );
        assert!(ctx.flags().select_fees_disabled);
        assert!(!ctx.flags().generate_proof_disabled);
    }

    #[traced_test]
    #[tokio::test]
    async fn wrong_password_leaves_amounts_unconfirmed() {
        let h = Harness::new([Answer::Password(Some("not the password".into()))]);
        let ctx = WorkflowContext::new(TransactionIntent::Transfer)
            .with_payload(TransactionPayload::Transfer(vec![leg(&usdc(), "0xr1", 1)]));

        let next = unwrap_continue(
            h.workflow()
                .transition(ctx.clone(), MenuAction::ConfirmAmounts)
                .await,
        );

        assert_eq!(ctx, next);
        assert_eq!(1, h.chain.calls().unlocks);
        assert!(h.prompter.notifications()[0].contains("could not be unlocked"));
    }

    #[traced_test]
    #[tokio::test]
    async fn cancelled_password_is_not_an_error() {
        let h = Harness::new([Answer::Password(None)]);
        let ctx = WorkflowContext::new(TransactionIntent::Transfer)
            .with_payload(TransactionPayload::Transfer(vec![leg(&usdc(), "0xr1", 1)]));

        let next = unwrap_continue(
            h.workflow()
                .transition(ctx.clone(), MenuAction::ConfirmAmounts)
                .await,
        );

        assert_eq!(ctx, next);
        assert_eq!(0, h.chain.calls().unlocks);
        assert!(h.prompter.notifications().is_empty());
    }

    #[traced_test]
    #[tokio::test]
    async fn different_broadcaster_excludes_the_current_one() {
        let h = Harness::new([
            Answer::FeeMode(Some(FeeMode::Relayed)),
            Answer::FeeToken(Some(usdc().address)),
            Answer::Broadcaster(true),
            Answer::FeeToken(Some(usdc().address)),
            Answer::Broadcaster(true),
        ]);
        h.chain.add_broadcaster(broadcaster("0xb1", &usdc(), 10));
        h.chain.add_broadcaster(broadcaster("0xb2", &usdc(), 20));
        let workflow = h.workflow();

        let ctx = unwrap_continue(
            workflow
                .transition(confirmed_transfer(), MenuAction::SelectFee)
                .await,
        );
        let first = ctx.fee_strategy().and_then(FeeStrategy::relayed).cloned();
        assert_eq!(Some(Address::new("0xb1")), first.map(|f| f.broadcaster_address));
        assert!(Menu::for_context(&ctx).is_enabled(MenuAction::DifferentBroadcaster));

        let ctx = unwrap_continue(
            workflow
                .transition(ctx, MenuAction::DifferentBroadcaster)
                .await,
        );
        let second = ctx.fee_strategy().and_then(FeeStrategy::relayed).cloned();
        assert_eq!(Some(Address::new("0xb2")), second.map(|f| f.broadcaster_address));
        assert!(ctx.gas_estimate().is_some());
        assert!(h.session.exclusions().contains(&Address::new("0xb1")));
    }

    #[traced_test]
    #[tokio::test]
    async fn backing_out_of_a_different_broadcaster_keeps_the_context() {
        let h = Harness::new([Answer::FeeToken(None)]);
        h.chain.add_broadcaster(broadcaster("0xb1", &usdc(), 10));
        let relayed = FeeStrategy::Relayed(crate::models::fee::RelayedFee {
            fee_token_address: usdc().address,
            fee_token_symbol: usdc().symbol,
            fee_token_decimals: usdc().decimals,
            broadcaster_address: Address::new("0xb1"),
            broadcaster_fee_commitment: "quote-0xb1".into(),
            fee_per_unit_gas: 10u64.into(),
        });
        let ctx = confirmed_transfer().with_fee(relayed, Some(estimate()));

        let next = unwrap_continue(
            h.workflow()
                .transition(ctx.clone(), MenuAction::DifferentBroadcaster)
                .await,
        );

        assert_eq!(ctx, next);
        assert!(h.session.exclusions().contains(&Address::new("0xb1")));
    }

    #[traced_test]
    #[tokio::test]
    async fn failed_send_can_be_retried_without_a_new_proof() {
        let h = Harness::new([Answer::Confirm(true)]);
        h.chain.inject(|f| f.sends = 1);

        let transition = h
            .workflow()
            .transition(ready_to_send(), MenuAction::SendTransaction)
            .await;

        assert!(matches!(
            transition,
            Transition::Terminal(Outcome::Sent { .. })
        ));
        assert_eq!(2, h.chain.calls().self_signed_sends);
        assert_eq!(0, h.chain.calls().proofs);
        assert!(matches!(
            h.chain.sent()[0].path,
            SubmissionPath::SelfSigned { .. }
        ));
    }

    #[traced_test]
    #[tokio::test]
    async fn declined_retry_keeps_the_built_transaction() {
        let h = Harness::new([Answer::Confirm(false)]);
        h.chain.inject(|f| f.sends = 1);
        let ctx = ready_to_send();

        let next = unwrap_continue(
            h.workflow()
                .transition(ctx.clone(), MenuAction::SendTransaction)
                .await,
        );

        assert_eq!(ctx, next);
        assert!(!next.flags().send_transaction_disabled);
        assert!(h.session.watchers().is_empty());
    }

    #[traced_test]
    #[tokio::test]
    async fn disabled_action_is_ignored() {
        let h = Harness::new([]);
        let ctx = WorkflowContext::new(TransactionIntent::Transfer);

        let next = unwrap_continue(
            h.workflow()
                .transition(ctx.clone(), MenuAction::SendTransaction)
                .await,
        );

        assert_eq!(ctx, next);
        assert!(h.chain.sent().is_empty());
        assert!(logs_contain("is disabled"));
    }

    #[traced_test]
    #[tokio::test]
    async fn exhausted_input_cancels_the_run() {
        let h = Harness::new([]);
        let outcome = h.workflow().run(TransactionIntent::Unshield).await;
        assert_eq!(Outcome::Cancelled, outcome);
    }
}
