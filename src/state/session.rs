//! The unlocked-wallet session.
//!
//! Constructed at login and passed explicitly to the workflow. Owns the
//! session-scoped caches and the broadcaster exclusion filter; shares the
//! process-wide status queue and watcher registry.

use crate::config_models::cli_args::WorkflowConfig;
use crate::config_models::network::ChainConfig;
use crate::models::address::Address;
use crate::models::address::ChainId;
use crate::models::amount::TokenAmount;
use crate::models::fee::PublicSigner;
use crate::models::fee::TokenInfo;
use crate::state::exclusions::BroadcasterExclusions;
use crate::state::status::StatusQueue;
use crate::state::ttl_cache::TtlCache;
use crate::state::watchers::WatcherRegistry;

/// cache key of an ERC20 allowance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AllowanceKey {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
}

pub type AllowanceCache = TtlCache<AllowanceKey, TokenAmount>;
pub type FeeTokenCache = TtlCache<(ChainId, Address), TokenInfo>;

#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("the wallet holds no public signer")]
    NoSigners,
}

#[derive(Debug)]
pub struct Session {
    chain: ChainConfig,
    config: WorkflowConfig,
    signers: Vec<PublicSigner>,
    active_signer: PublicSigner,
    allowances: AllowanceCache,
    fee_tokens: FeeTokenCache,
    exclusions: BroadcasterExclusions,
    status: StatusQueue,
    watchers: WatcherRegistry,
}

impl Session {
    /// start a session for the unlocked wallet holding `signers`. the first
    /// signer becomes the active one.
    pub fn login(
        chain: ChainConfig,
        config: WorkflowConfig,
        signers: Vec<PublicSigner>,
        status: StatusQueue,
        watchers: WatcherRegistry,
    ) -> Result<Self, SessionError> {
        let active_signer = signers.first().cloned().ok_or(SessionError::NoSigners)?;
        tracing::info!(
            "session opened on {} with active signer {}",
            chain.network,
            active_signer
        );

        Ok(Self {
            allowances: TtlCache::new(config.allowance_cache_ttl),
            fee_tokens: TtlCache::new(config.fee_token_cache_ttl),
            exclusions: BroadcasterExclusions::default(),
            chain,
            config,
            signers,
            active_signer,
            status,
            watchers,
        })
    }

    /// tear the session down. session caches are cleared; the process-wide
    /// status queue and watcher registry are handed back since outstanding
    /// watchers keep reporting.
    pub fn lock(self) -> (StatusQueue, WatcherRegistry) {
        self.allowances.clear();
        self.fee_tokens.clear();
        self.exclusions.clear();
        tracing::info!("session locked");
        (self.status, self.watchers)
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn signers(&self) -> &[PublicSigner] {
        &self.signers
    }

    /// the wallet that owns public balances and signs intrinsic-cost
    /// transactions
    pub fn active_signer(&self) -> &PublicSigner {
        &self.active_signer
    }

    pub fn allowances(&self) -> &AllowanceCache {
        &self.allowances
    }

    pub fn fee_tokens(&self) -> &FeeTokenCache {
        &self.fee_tokens
    }

    pub fn exclusions(&self) -> &BroadcasterExclusions {
        &self.exclusions
    }

    pub fn status(&self) -> &StatusQueue {
        &self.status
    }

    pub fn watchers(&self) -> &WatcherRegistry {
        &self.watchers
    }
}
