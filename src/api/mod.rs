//! Contracts of the collaborators the workflow drives.
//!
//! The workflow never talks to a chain, a prover or a terminal directly. It
//! calls these traits, and the binary or the tests decide what stands behind
//! them (see [`crate::mock_services`]).

pub mod broadcaster;
pub mod chain;
pub mod keychain;
pub mod prompts;
pub mod prover;

use std::fmt;
use std::sync::Arc;

use broadcaster::BroadcasterTransport;
use chain::AllowanceService;
use chain::BalanceScanner;
use chain::GasEstimator;
use chain::SubmissionService;
use chain::TokenMetadata;
use keychain::KeyChain;
use prover::ProvingService;

/// The non-interactive collaborators of a workflow.
#[derive(Clone)]
pub struct Services {
    pub allowances: Arc<dyn AllowanceService>,
    pub gas: Arc<dyn GasEstimator>,
    pub prover: Arc<dyn ProvingService>,
    pub submission: Arc<dyn SubmissionService>,
    pub broadcasters: Arc<dyn BroadcasterTransport>,
    pub keychain: Arc<dyn KeyChain>,
    pub scanner: Arc<dyn BalanceScanner>,
    pub tokens: Arc<dyn TokenMetadata>,
}

impl Services {
    /// all services backed by the same implementation.
    pub fn uniform<T>(backend: Arc<T>) -> Self
    where
        T: AllowanceService
            + GasEstimator
            + ProvingService
            + SubmissionService
            + BroadcasterTransport
            + KeyChain
            + BalanceScanner
            + TokenMetadata
            + 'static,
    {
        Self {
            allowances: backend.clone(),
            gas: backend.clone(),
            prover: backend.clone(),
            submission: backend.clone(),
            broadcasters: backend.clone(),
            keychain: backend.clone(),
            scanner: backend.clone(),
            tokens: backend,
        }
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
