//! ERC20 approvals required before a shield or a public swap.
//!
//! The approvals of one step succeed or fail together: every missing approval
//! is confirmed by the user before any of them is submitted, so declining one
//! leaves the chain untouched.

use itertools::Itertools;

use crate::api::prompts::Prompter;
use crate::api::Services;
use crate::models::address::Address;
use crate::models::address::TxHash;
use crate::models::amount::TokenAmount;
use crate::models::approval::ApprovalRequirement;
use crate::models::fee::GasEstimate;
use crate::models::intent::ApprovalSpender;
use crate::models::proven_transaction::UnsignedTransaction;
use crate::models::selection::TokenRequirement;
use crate::state::session::AllowanceKey;
use crate::state::session::Session;
use crate::state::watchers::WatchOutcome;
use crate::workflow::dispatcher::await_inclusion;
use crate::workflow::error::ApprovalError;

/// an approval the user agreed to, not yet submitted
#[derive(Debug)]
struct PlannedApproval {
    requirement: ApprovalRequirement,
    transaction: UnsignedTransaction,
}

#[derive(Debug)]
pub struct ApprovalWorkflow<'a> {
    services: &'a Services,
    session: &'a Session,
    prompter: &'a dyn Prompter,
}

impl<'a> ApprovalWorkflow<'a> {
    pub fn new(services: &'a Services, session: &'a Session, prompter: &'a dyn Prompter) -> Self {
        Self {
            services,
            session,
            prompter,
        }
    }

    /// the contract address behind `spender` on the session's chain
    pub fn spender_address(&self, spender: ApprovalSpender) -> Address {
        match spender {
            ApprovalSpender::PrivacyPool => self.session.chain().privacy_pool_contract.clone(),
            ApprovalSpender::SwapRouter => self.session.chain().swap_spender.clone(),
        }
    }

    /// the approvals missing for moving `tokens` through `spender`.
    ///
    /// the native asset needs no approval and is skipped. allowances are read
    /// through the session's allowance cache.
    pub async fn requirements(
        &self,
        tokens: &[TokenRequirement],
        spender: &Address,
    ) -> Result<Vec<ApprovalRequirement>, ApprovalError> {
        let owner = &self.session.active_signer().address;
        let mut missing = vec![];

        for token in tokens.iter().filter(|t| !t.token_address.is_native_token()) {
            let key = AllowanceKey {
                token: token.token_address.clone(),
                owner: owner.clone(),
                spender: spender.clone(),
            };
            let allowance = self
                .session
                .allowances()
                .get_or_fetch(key, || {
                    self.services
                        .allowances
                        .get_allowance(&token.token_address, owner, spender)
                })
                .await
                .map_err(|e| ApprovalError::AllowanceRead {
                    token: token.token_address.clone(),
                    reason: e.to_string(),
                })?;

            if allowance < token.amount {
                missing.push(ApprovalRequirement {
                    token_address: token.token_address.clone(),
                    symbol: token.symbol.clone(),
                    spender: spender.clone(),
                    owner: owner.clone(),
                    required_amount: token.amount.clone(),
                    current_allowance: allowance,
                });
            } else {
                tracing::debug!("allowance of {} suffices", token.symbol);
            }
        }

        Ok(missing)
    }

    /// make sure `spender` may move `tokens` on behalf of the active signer.
    ///
    /// returns the hashes of the approval transactions sent, empty if nothing
    /// was missing.
    pub async fn run(
        &self,
        tokens: &[TokenRequirement],
        spender: &Address,
    ) -> Result<Vec<TxHash>, ApprovalError> {
        let missing = self.requirements(tokens, spender).await?;
        if missing.is_empty() {
            return Ok(vec![]);
        }
        tracing::info!(
            "{} approval(s) required: {}",
            missing.len(),
            missing.iter().map(|r| &r.symbol).join(", ")
        );

        let mut planned = Vec::with_capacity(missing.len());
        for requirement in missing {
            let transaction = self
                .services
                .allowances
                .populate_approval(
                    &requirement.token_address,
                    spender,
                    &TokenAmount::max_uint256(),
                )
                .await?;
            let estimate = self
                .services
                .allowances
                .estimate_approval(self.session.active_signer(), &transaction)
                .await?;

            if !self
                .prompter
                .confirm(&approval_prompt(&requirement, &estimate))
                .await?
            {
                tracing::debug!("approval of {} declined", requirement.symbol);
                return Err(ApprovalError::Declined {
                    token: requirement.token_address,
                    symbol: requirement.symbol,
                });
            }
            planned.push(PlannedApproval {
                requirement,
                transaction,
            });
        }

        let mut sent = Vec::with_capacity(planned.len());
        let mut send_error = None;
        for approval in planned {
            match self.submit(approval).await {
                Ok(submitted) => sent.push(submitted),
                Err(e) => {
                    // approvals already on chain are still awaited and cached
                    send_error = Some(e);
                    break;
                }
            }
        }

        let (confirmed, inclusion_error) = self.settle(sent).await;
        match send_error.or(inclusion_error) {
            Some(e) => Err(e),
            None => Ok(confirmed),
        }
    }

    /// await inclusion of `sent` approvals together and cache the confirmed
    /// ones. returns the confirmed hashes and the first inclusion failure.
    async fn settle(
        &self,
        sent: Vec<(ApprovalRequirement, TxHash)>,
    ) -> (Vec<TxHash>, Option<ApprovalError>) {
        let config = self.session.config();
        let outcomes = futures::future::join_all(sent.iter().map(|(_, tx_hash)| {
            await_inclusion(
                self.services.submission.as_ref(),
                tx_hash,
                config.confirmation_poll_interval,
                config.confirmation_timeout,
            )
        }))
        .await;

        let mut first_error = None;
        let mut confirmed = Vec::with_capacity(sent.len());
        for ((requirement, tx_hash), outcome) in sent.into_iter().zip(outcomes) {
            match outcome {
                WatchOutcome::Confirmed { block_number } => {
                    tracing::info!(
                        "approval of {} confirmed in block {}",
                        requirement.symbol,
                        block_number
                    );
                    self.session.allowances().insert(
                        AllowanceKey {
                            token: requirement.token_address,
                            owner: requirement.owner,
                            spender: requirement.spender,
                        },
                        TokenAmount::max_uint256(),
                    );
                    confirmed.push(tx_hash);
                }
                other => {
                    tracing::warn!("approval {} not confirmed: {:?}", tx_hash, other);
                    first_error.get_or_insert(ApprovalError::NotConfirmed {
                        token: requirement.token_address,
                        reason: format!("{:?}", other),
                    });
                }
            }
        }
        (confirmed, first_error)
    }

    async fn submit(
        &self,
        approval: PlannedApproval,
    ) -> Result<(ApprovalRequirement, TxHash), ApprovalError> {
        let PlannedApproval {
            requirement,
            transaction,
        } = approval;

        let tx_hash = self
            .services
            .submission
            .send_self_signed(self.session.active_signer(), &transaction)
            .await?;
        tracing::info!("sent approval of {}: {}", requirement.symbol, tx_hash);
        self.prompter.notify(&format!(
            "Waiting for approval of {} ({})...",
            requirement.symbol,
            tx_hash.as_str()
        ));
        Ok((requirement, tx_hash))
    }
}

fn approval_prompt(requirement: &ApprovalRequirement, estimate: &GasEstimate) -> String {
    format!(
        "Approve {} for spender {}? Gas: {}",
        requirement.symbol,
        requirement.spender.abbreviated(),
        estimate.estimated_cost
    )
}
