//! The output of the proof step, and the progress events it emits.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::address::Address;
use super::amount::TokenAmount;
use super::fee::GasDetails;
use super::intent::TransactionIntent;
use super::selection::PayloadDigest;

/// A populated, unsigned transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub to: Address,
    pub data: Vec<u8>,
    pub value: TokenAmount,
    pub gas_details: GasDetails,
}

/// A transaction ready to be submitted, plus the auxiliary data a broadcaster
/// needs to relay it.
///
/// Its presence in a workflow context is what enables sending.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenTransaction {
    pub intent: TransactionIntent,
    pub transaction: UnsignedTransaction,
    pub nullifiers: Vec<String>,
    pub pre_transaction_proofs: Vec<String>,
    /// true if the transaction must be routed through the relay adapter
    pub uses_relay_adapt: bool,
    /// digest of the selections this transaction was built from
    pub built_from: PayloadDigest,
}

/// One progress event of a proving job.
///
/// Purely observational: nothing downstream of the progress stream influences
/// the workflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProofProgress {
    /// 0.0 ..= 100.0
    pub percent: f64,
    pub label: Option<String>,
}

impl ProofProgress {
    pub fn new(percent: f64, label: Option<String>) -> Self {
        Self {
            percent: percent.clamp(0.0, 100.0),
            label,
        }
    }
}

impl fmt::Display for ProofProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{:>5.1}% {}", self.percent, label),
            None => write!(f, "{:>5.1}%", self.percent),
        }
    }
}
