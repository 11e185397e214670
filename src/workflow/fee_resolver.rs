//! Choice of fee strategy and the gas estimate that goes with it.

use crate::api::chain::EstimateRequest;
use crate::api::chain::GasEstimator;
use crate::api::prompts::Prompter;
use crate::api::Services;
use crate::models::address::Address;
use crate::models::fee::FeeMode;
use crate::models::fee::FeeStrategy;
use crate::models::fee::GasEstimate;
use crate::models::fee::RelayedFee;
use crate::models::fee::TokenInfo;
use crate::models::intent::TransactionIntent;
use crate::models::selection::TransactionPayload;
use crate::state::session::Session;
use crate::workflow::consolidate::consolidate_payload;
use crate::workflow::context::WorkflowContext;
use crate::workflow::error::FeeError;

/// Result of a fee selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeOutcome {
    Resolved {
        strategy: FeeStrategy,
        estimate: GasEstimate,
    },

    /// a strategy was chosen but could not be priced. the estimate stays
    /// unset so proof generation stays disabled.
    EstimateFailed { strategy: FeeStrategy },

    /// the user backed out
    Declined,
}

/// route an estimate to the entry point of `intent`
pub async fn estimate_for_intent(
    gas: &dyn GasEstimator,
    intent: TransactionIntent,
    request: EstimateRequest<'_>,
) -> anyhow::Result<GasEstimate> {
    match intent {
        TransactionIntent::Transfer => gas.estimate_transfer(request).await,
        TransactionIntent::Unshield => gas.estimate_unshield(request).await,
        TransactionIntent::Shield => gas.estimate_shield(request).await,
        TransactionIntent::UnshieldBase => gas.estimate_unshield_base(request).await,
        TransactionIntent::ShieldBase => gas.estimate_shield_base(request).await,
        TransactionIntent::PublicTransfer => gas.estimate_public_transfer(request).await,
        TransactionIntent::PublicBaseTransfer => gas.estimate_public_base_transfer(request).await,
        TransactionIntent::PublicSwap => gas.estimate_public_swap(request).await,
        TransactionIntent::PrivateSwap => gas.estimate_private_swap(request).await,
    }
}

#[derive(Debug)]
pub struct FeeResolver<'a> {
    services: &'a Services,
    session: &'a Session,
    prompter: &'a dyn Prompter,
}

impl<'a> FeeResolver<'a> {
    pub fn new(services: &'a Services, session: &'a Session, prompter: &'a dyn Prompter) -> Self {
        Self {
            services,
            session,
            prompter,
        }
    }

    /// let the user pick relayed or self-signed payment, then price it.
    pub async fn resolve(&self, ctx: &WorkflowContext) -> Result<FeeOutcome, FeeError> {
        let modes = if ctx.intent().allows_broadcaster() {
            vec![FeeMode::Relayed, FeeMode::SelfSigned]
        } else {
            vec![FeeMode::SelfSigned]
        };

        let Some(mode) = self.prompter.select_fee_mode(&modes).await? else {
            return Ok(FeeOutcome::Declined);
        };

        let strategy = match mode {
            FeeMode::Relayed => self.select_relayed(ctx.intent()).await?,
            FeeMode::SelfSigned => self.select_self_signed().await?,
        };

        match strategy {
            Some(strategy) => Ok(self.estimate(ctx, strategy).await),
            None => Ok(FeeOutcome::Declined),
        }
    }

    /// pick a fee token and a broadcaster accepting it.
    ///
    /// loops back to fee-token selection when no broadcaster is available or
    /// the user declines the offered one. declined broadcasters are excluded
    /// for the rest of the session. `None` if the user backs out of fee-token
    /// selection.
    pub async fn select_relayed(
        &self,
        intent: TransactionIntent,
    ) -> Result<Option<FeeStrategy>, FeeError> {
        let chain = self.session.chain();

        loop {
            let Some(fee_token) = self.prompter.select_fee_token(chain).await? else {
                return Ok(None);
            };
            let token_info = self.fee_token_info(&fee_token).await?;

            let excluded = self.session.exclusions().to_vec();
            let offer = match self
                .services
                .broadcasters
                .find_best_broadcaster(
                    chain.chain_id,
                    &fee_token,
                    intent.uses_relay_adapt(),
                    &excluded,
                )
                .await
            {
                Ok(Some(offer)) => offer,
                Ok(None) => {
                    tracing::info!("no broadcaster found for fee token {}", token_info.symbol);
                    self.prompter.notify(&format!(
                        "No broadcaster available for {}. Select another fee token.",
                        token_info.symbol
                    ));
                    continue;
                }
                Err(e) => {
                    tracing::warn!("broadcaster lookup failed: {}", e);
                    self.prompter
                        .notify(&format!("Broadcaster lookup failed: {}", e));
                    continue;
                }
            };

            if !self
                .prompter
                .confirm_broadcaster(&offer, &token_info)
                .await?
            {
                self.session
                    .exclusions()
                    .exclude(offer.broadcaster_address);
                continue;
            }

            tracing::info!(
                "selected broadcaster {} for fee token {}",
                offer.broadcaster_address,
                token_info.symbol
            );
            return Ok(Some(FeeStrategy::Relayed(RelayedFee {
                fee_token_address: token_info.address,
                fee_token_symbol: token_info.symbol,
                fee_token_decimals: token_info.decimals,
                broadcaster_address: offer.broadcaster_address,
                broadcaster_fee_commitment: offer.fee_commitment,
                fee_per_unit_gas: offer.fee_per_unit_gas,
            })));
        }
    }

    /// pick the local wallet that signs and pays gas. `None` if the user backs
    /// out.
    pub async fn select_self_signed(&self) -> Result<Option<FeeStrategy>, FeeError> {
        let signer = self
            .prompter
            .select_signer(self.session.signers())
            .await?;
        Ok(signer.map(|signer| FeeStrategy::SelfSigned { signer }))
    }

    /// price `strategy` for the context's consolidated payload.
    ///
    /// estimation errors are logged and reported as
    /// [`FeeOutcome::EstimateFailed`], never propagated.
    pub async fn estimate(&self, ctx: &WorkflowContext, strategy: FeeStrategy) -> FeeOutcome {
        let payload: TransactionPayload = consolidate_payload(ctx.payload());
        let request = EstimateRequest {
            chain: self.session.chain(),
            payload: &payload,
            fee_strategy: Some(&strategy),
        };

        match estimate_for_intent(self.services.gas.as_ref(), ctx.intent(), request).await {
            Ok(estimate) => {
                tracing::debug!("{} under {}: {}", ctx.intent(), strategy, estimate);
                FeeOutcome::Resolved { strategy, estimate }
            }
            Err(e) => {
                tracing::error!("gas estimation failed: {}", e);
                self.prompter
                    .notify(&format!("Gas estimation failed: {}", e));
                FeeOutcome::EstimateFailed { strategy }
            }
        }
    }

    /// fee token metadata, read through the session's fee-token cache
    async fn fee_token_info(&self, token: &Address) -> Result<TokenInfo, FeeError> {
        let chain_id = self.session.chain().chain_id;
        self.session
            .fee_tokens()
            .get_or_fetch((chain_id, token.clone()), || {
                self.services.tokens.token_info(chain_id, token)
            })
            .await
            .map_err(|e| FeeError::FeeToken {
                token: token.clone(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::mock_services::Answer;
    use crate::models::secret::EncryptionKey;
    use crate::tests::shared::broadcaster;
    use crate::tests::shared::dai;
    use crate::tests::shared::leg;
    use crate::tests::shared::usdc;
    use crate::tests::shared::Harness;

    fn confirmed_transfer() -> WorkflowContext {
        WorkflowContext::new(TransactionIntent::Transfer)
            .with_payload(TransactionPayload::Transfer(vec![leg(&usdc(), "0xr1", 100)]))
            .with_encryption_key(EncryptionKey::new(vec![1; 32]))
            .with_amounts_confirmed()
    }

    // no broadcaster takes usdc: the resolver goes back to fee-token
    // selection, and the user backs out there.
    #[traced_test]
    #[tokio::test]
    async fn no_broadcaster_loops_back_to_fee_token_selection() -> anyhow::Result<()> {
        let h = Harness::new([
            Answer::FeeMode(Some(FeeMode::Relayed)),
            Answer::FeeToken(Some(usdc().address)),
            Answer::FeeToken(None),
        ]);
        let resolver = FeeResolver::new(&h.services, &h.session, h.prompter.as_ref());

        let outcome = resolver.resolve(&confirmed_transfer()).await?;

        assert_eq!(FeeOutcome::Declined, outcome);
        assert_eq!(0, h.prompter.remaining());
        assert_eq!(0, h.chain.calls().estimates);
        assert!(h.prompter.notifications()[0].contains("No broadcaster available for USDC"));
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    async fn declined_broadcaster_is_excluded_and_not_reoffered() -> anyhow::Result<()> {
        let h = Harness::new([
            Answer::FeeMode(Some(FeeMode::Relayed)),
            Answer::FeeToken(Some(dai().address)),
            Answer::Broadcaster(false),
            Answer::FeeToken(Some(dai().address)),
            Answer::Broadcaster(true),
        ]);
        h.chain.add_broadcaster(broadcaster("0xb1", &dai(), 10));
        h.chain.add_broadcaster(broadcaster("0xb2", &dai(), 20));
        let resolver = FeeResolver::new(&h.services, &h.session, h.prompter.as_ref());

        let outcome = resolver.resolve(&confirmed_transfer()).await?;

        let FeeOutcome::Resolved { strategy, estimate } = outcome else {
            anyhow::bail!("expected a resolved fee, got {:?}", outcome);
        };
        let fee = strategy.relayed().unwrap();
        assert_eq!(Address::new("0xb2"), fee.broadcaster_address);
        assert_eq!("DAI", estimate.fee_token_symbol);
        assert!(estimate.broadcaster_fee_recipient.is_some());
        assert!(h.session.exclusions().contains(&Address::new("0xb1")));

        let offered = h
            .prompter
            .offers()
            .into_iter()
            .map(|o| o.broadcaster_address)
            .collect::<Vec<_>>();
        assert_eq!(vec![Address::new("0xb1"), Address::new("0xb2")], offered);
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    async fn estimation_failure_keeps_strategy_without_estimate() -> anyhow::Result<()> {
        let h = Harness::new([
            Answer::FeeMode(Some(FeeMode::SelfSigned)),
            Answer::Signer(Some(1)),
        ]);
        h.chain.inject(|f| f.estimate = true);
        let resolver = FeeResolver::new(&h.services, &h.session, h.prompter.as_ref());

        let outcome = resolver.resolve(&confirmed_transfer()).await?;

        let FeeOutcome::EstimateFailed { strategy } = outcome else {
            anyhow::bail!("expected a failed estimate, got {:?}", outcome);
        };
        assert_eq!(
            FeeStrategy::SelfSigned {
                signer: h.session.signers()[1].clone()
            },
            strategy
        );
        assert!(logs_contain("gas estimation failed"));
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    async fn fee_token_metadata_is_cached() -> anyhow::Result<()> {
        let h = Harness::new([
            Answer::FeeToken(Some(usdc().address)),
            Answer::FeeToken(Some(usdc().address)),
            Answer::FeeToken(None),
        ]);
        let resolver = FeeResolver::new(&h.services, &h.session, h.prompter.as_ref());

        assert_eq!(None, resolver.select_relayed(TransactionIntent::Transfer).await?);
        assert_eq!(1, h.chain.calls().token_lookups);
        assert_eq!(2, h.chain.calls().broadcaster_lookups);
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    async fn intrinsic_intents_are_not_offered_relaying() {
        // the scripted prompter rejects a mode that was not offered
        let h = Harness::new([Answer::FeeMode(Some(FeeMode::Relayed))]);
        let resolver = FeeResolver::new(&h.services, &h.session, h.prompter.as_ref());
        let ctx = WorkflowContext::new(TransactionIntent::Shield)
            .with_payload(TransactionPayload::Transfer(vec![leg(&usdc(), "0xr1", 100)]));

        let result = resolver.resolve(&ctx).await;
        assert!(matches!(result, Err(FeeError::Failed(_))));
        assert_eq!(0, h.chain.calls().broadcaster_lookups);
    }
}
