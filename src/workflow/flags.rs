//! Projection of menu flags and stage from a [`WorkflowContext`].
//!
//! Both are pure functions of which context members are populated. There is
//! no separately tracked "current state" to drift out of sync.

use std::fmt;

use super::context::WorkflowContext;

/// Which step actions are currently disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisabledFlags {
    pub confirm_amounts_disabled: bool,
    pub select_fees_disabled: bool,
    pub generate_proof_disabled: bool,
    pub send_transaction_disabled: bool,
}

impl DisabledFlags {
    pub fn project(ctx: &WorkflowContext) -> Self {
        let has_payload = !ctx.payload().is_empty();
        let confirmed = ctx.amounts_confirmed() && ctx.encryption_key().is_some();

        Self {
            confirm_amounts_disabled: !has_payload,

            // intrinsic-cost intents are priced on confirmation; there is no
            // fee choice to make.
            select_fees_disabled: !confirmed || ctx.intent().has_intrinsic_cost(),

            generate_proof_disabled: !(confirmed && ctx.gas_estimate().is_some()),

            send_transaction_disabled: ctx.proven().is_none(),
        }
    }
}

/// The conceptual stage of a run, derived from the context.
///
/// Used for logging and the menu summary only; transitions never consult it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumIs)]
pub enum WorkflowStage {
    SelectingTargets,
    AmountsPending,
    FeeSelection,
    ProofPending,
    ReadyToSend,
}

impl WorkflowStage {
    pub fn project(ctx: &WorkflowContext) -> Self {
        let flags = DisabledFlags::project(ctx);
        if !flags.send_transaction_disabled {
            Self::ReadyToSend
        } else if !flags.generate_proof_disabled {
            Self::ProofPending
        } else if ctx.amounts_confirmed() {
            Self::FeeSelection
        } else if !flags.confirm_amounts_disabled {
            Self::AmountsPending
        } else {
            Self::SelectingTargets
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            Self::SelectingTargets => "selecting targets",
            Self::AmountsPending => "amounts pending confirmation",
            Self::FeeSelection => "fee selection",
            Self::ProofPending => "ready to build",
            Self::ReadyToSend => "ready to send",
        };
        write!(f, "{}", string)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use proptest::sample::select;
    use test_strategy::proptest;

    use super::*;
    use crate::models::intent::TransactionIntent;
    use crate::models::secret::EncryptionKey;
    use crate::models::selection::tests::leg;
    use crate::models::selection::TransactionPayload;
    use crate::workflow::context::tests::estimate;
    use crate::workflow::context::tests::proven_for;
    use crate::workflow::context::tests::ready_to_send;
    use crate::workflow::context::tests::self_signed;

    #[test]
    fn empty_context_only_allows_selection() {
        let ctx = WorkflowContext::new(TransactionIntent::Transfer);
        assert_eq!(
            DisabledFlags {
                confirm_amounts_disabled: true,
                select_fees_disabled: true,
                generate_proof_disabled: true,
                send_transaction_disabled: true,
            },
            ctx.flags()
        );
        assert!(ctx.stage().is_selecting_targets());
    }

    #[test]
    fn complete_context_allows_send() {
        let ctx = ready_to_send();
        assert!(!ctx.flags().send_transaction_disabled);
        assert!(!ctx.flags().generate_proof_disabled);
        assert!(ctx.stage().is_ready_to_send());
    }

    #[test]
    fn intrinsic_cost_intents_never_offer_fee_selection() {
        let ctx = WorkflowContext::new(TransactionIntent::Shield)
            .with_payload(TransactionPayload::Transfer(vec![leg("0xaaa", "0xr1", 1)]))
            .with_encryption_key(EncryptionKey::new(vec![1; 32]))
            .with_amounts_confirmed();
        assert!(ctx.flags().select_fees_disabled);
        assert!(ctx.flags().generate_proof_disabled);

        let ctx = ctx.with_fee(self_signed(), Some(estimate()));
        assert!(!ctx.flags().generate_proof_disabled);
    }

    #[test]
    fn failed_estimate_leaves_proof_disabled() {
        let ctx = WorkflowContext::new(TransactionIntent::Unshield)
            .with_payload(TransactionPayload::Transfer(vec![leg("0xaaa", "0xr1", 1)]))
            .with_encryption_key(EncryptionKey::new(vec![1; 32]))
            .with_amounts_confirmed()
            .with_fee(self_signed(), None);
        assert!(!ctx.flags().select_fees_disabled);
        assert!(ctx.flags().generate_proof_disabled);
        assert!(ctx.stage().is_fee_selection());
    }

    /// a context built by an arbitrary prefix of the happy path, followed by
    /// an optional edit of the selections.
    fn arb_context() -> impl Strategy<Value = WorkflowContext> {
        let intent = select(vec![
            TransactionIntent::Transfer,
            TransactionIntent::Unshield,
            TransactionIntent::Shield,
            TransactionIntent::PublicTransfer,
        ]);
        (intent, 0usize..6, 1u64..1000, prop::option::of(1u64..1000)).prop_map(
            |(intent, steps, amount, edit)| {
                let mut ctx = WorkflowContext::new(intent);
                if steps > 0 {
                    ctx = ctx.with_payload(TransactionPayload::Transfer(vec![leg(
                        "0xaaa", "0xr1", amount,
                    )]));
                }
                if steps > 1 {
                    ctx = ctx.with_encryption_key(EncryptionKey::new(vec![3; 32]));
                }
                if steps > 2 {
                    ctx = ctx.with_amounts_confirmed();
                }
                if steps > 3 {
                    ctx = ctx.with_fee(self_signed(), Some(estimate()));
                }
                if steps > 4 {
                    let proven = proven_for(&ctx);
                    ctx = ctx.with_proven(proven);
                }
                if let Some(new_amount) = edit.filter(|a| *a != amount) {
                    ctx = ctx.with_payload(TransactionPayload::Transfer(vec![leg(
                        "0xaaa", "0xr1", new_amount,
                    )]));
                }
                ctx
            },
        )
    }

    #[proptest]
    fn flag_projection_is_deterministic(#[strategy(arb_context())] ctx: WorkflowContext) {
        prop_assert_eq!(ctx.flags(), ctx.flags());
        prop_assert_eq!(ctx.flags(), ctx.clone().flags());
        prop_assert_eq!(ctx.stage(), ctx.stage());
    }

    #[proptest]
    fn send_enabled_iff_proof_present(#[strategy(arb_context())] ctx: WorkflowContext) {
        prop_assert_eq!(ctx.proven().is_none(), ctx.flags().send_transaction_disabled);
    }

    #[proptest]
    fn changed_selection_requires_new_estimate(
        #[strategy(1u64..1000)] first: u64,
        #[strategy(1u64..1000)] second: u64,
    ) {
        prop_assume!(first != second);
        let ctx = WorkflowContext::new(TransactionIntent::Transfer)
            .with_payload(TransactionPayload::Transfer(vec![leg("0xaaa", "0xr1", first)]))
            .with_encryption_key(EncryptionKey::new(vec![3; 32]))
            .with_amounts_confirmed()
            .with_fee(self_signed(), Some(estimate()));
        prop_assert!(!ctx.flags().generate_proof_disabled);

        let edited = ctx
            .with_payload(TransactionPayload::Transfer(vec![leg("0xaaa", "0xr1", second)]))
            .with_amounts_confirmed();
        prop_assert!(edited.flags().generate_proof_disabled);

        let re_estimated = edited.with_fee(self_signed(), Some(estimate()));
        prop_assert!(!re_estimated.flags().generate_proof_disabled);
    }
}
