//! The interactive prompt widgets, as seen from the workflow.
//!
//! Rendering and input handling belong to the front end; the workflow only
//! needs answers.

use std::fmt;

use zeroize::Zeroizing;

use crate::config_models::network::ChainConfig;
use crate::models::address::Address;
use crate::models::fee::FeeMode;
use crate::models::fee::PublicSigner;
use crate::models::fee::SelectedBroadcaster;
use crate::models::fee::TokenInfo;
use crate::models::intent::TransactionIntent;
use crate::models::proven_transaction::ProofProgress;
use crate::models::selection::AmountSelection;
use crate::models::selection::SwapSelection;
use crate::workflow::menu::Menu;
use crate::workflow::menu::MenuAction;

/// Answers user-facing questions.
///
/// Every `Option` return uses `None` for "the user backed out".
#[async_trait::async_trait]
pub trait Prompter: Send + Sync + fmt::Debug {
    /// render `menu` and return the chosen action. must only return enabled
    /// actions.
    async fn select_action(&self, menu: &Menu) -> anyhow::Result<MenuAction>;

    async fn select_amounts(
        &self,
        intent: TransactionIntent,
    ) -> anyhow::Result<Option<Vec<AmountSelection>>>;

    async fn select_swap(&self, intent: TransactionIntent)
        -> anyhow::Result<Option<SwapSelection>>;

    async fn password(&self, prompt: &str) -> anyhow::Result<Option<Zeroizing<String>>>;

    async fn confirm(&self, message: &str) -> anyhow::Result<bool>;

    async fn select_fee_mode(&self, modes: &[FeeMode]) -> anyhow::Result<Option<FeeMode>>;

    async fn select_fee_token(&self, chain: &ChainConfig) -> anyhow::Result<Option<Address>>;

    async fn confirm_broadcaster(
        &self,
        offer: &SelectedBroadcaster,
        fee_token: &TokenInfo,
    ) -> anyhow::Result<bool>;

    async fn select_signer(&self, signers: &[PublicSigner])
        -> anyhow::Result<Option<PublicSigner>>;

    /// redraw the single progress line.
    fn show_progress(&self, progress: &ProofProgress);

    /// one-line transient message, shown before the menu is re-rendered.
    fn notify(&self, message: &str);
}
