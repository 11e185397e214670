//! The immutable workflow context.
//!
//! Every step takes the current context by reference and returns a new one.
//! Menu flags are never stored here; they are projected from the populated
//! members (see [`super::flags`]).

use crate::models::fee::FeeStrategy;
use crate::models::fee::GasEstimate;
use crate::models::intent::TransactionIntent;
use crate::models::proven_transaction::ProvenTransaction;
use crate::models::secret::EncryptionKey;
use crate::models::selection::PayloadDigest;
use crate::models::selection::TransactionPayload;
use crate::workflow::flags::DisabledFlags;
use crate::workflow::flags::WorkflowStage;

/// A gas estimate plus what it was computed for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EstimateRecord {
    pub estimate: GasEstimate,
    pub fee_strategy: FeeStrategy,
    pub for_payload: PayloadDigest,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkflowContext {
    intent: TransactionIntent,
    payload: TransactionPayload,

    /// unlocked wallet secret, obtained once per run
    encryption_key: Option<EncryptionKey>,

    /// digest of the payload the user confirmed
    confirmed_for: Option<PayloadDigest>,

    fee_strategy: Option<FeeStrategy>,
    gas_estimate: Option<EstimateRecord>,
    proven: Option<ProvenTransaction>,
}

impl WorkflowContext {
    /// the empty context a run starts from
    pub fn new(intent: TransactionIntent) -> Self {
        Self {
            intent,
            payload: TransactionPayload::empty_for(intent),
            encryption_key: None,
            confirmed_for: None,
            fee_strategy: None,
            gas_estimate: None,
            proven: None,
        }
    }

    pub fn intent(&self) -> TransactionIntent {
        self.intent
    }

    pub fn payload(&self) -> &TransactionPayload {
        &self.payload
    }

    pub fn encryption_key(&self) -> Option<&EncryptionKey> {
        self.encryption_key.as_ref()
    }

    pub fn fee_strategy(&self) -> Option<&FeeStrategy> {
        self.fee_strategy.as_ref()
    }

    pub fn estimate_record(&self) -> Option<&EstimateRecord> {
        self.gas_estimate.as_ref()
    }

    /// the gas estimate, if it was computed for the current payload and fee
    /// strategy.
    pub fn gas_estimate(&self) -> Option<&GasEstimate> {
        self.gas_estimate
            .as_ref()
            .filter(|r| self.estimate_is_current(r))
            .map(|r| &r.estimate)
    }

    pub fn proven(&self) -> Option<&ProvenTransaction> {
        self.proven.as_ref()
    }

    /// true if the user confirmed exactly the current payload
    pub fn amounts_confirmed(&self) -> bool {
        !self.payload.is_empty() && self.confirmed_for == Some(self.payload.digest())
    }

    pub fn flags(&self) -> DisabledFlags {
        DisabledFlags::project(self)
    }

    pub fn stage(&self) -> WorkflowStage {
        WorkflowStage::project(self)
    }

    pub(crate) fn estimate_is_current(&self, record: &EstimateRecord) -> bool {
        record.for_payload == self.payload.digest()
            && self.fee_strategy.as_ref() == Some(&record.fee_strategy)
    }

    /// replace the selections. everything derived from the old selections
    /// (confirmation, fee, estimate, proof) is dropped; the unlocked key is
    /// kept.
    pub fn with_payload(self, payload: TransactionPayload) -> Self {
        Self {
            payload,
            confirmed_for: None,
            fee_strategy: None,
            gas_estimate: None,
            proven: None,
            ..self
        }
    }

    pub fn with_encryption_key(self, key: EncryptionKey) -> Self {
        Self {
            encryption_key: Some(key),
            ..self
        }
    }

    pub fn with_amounts_confirmed(self) -> Self {
        Self {
            confirmed_for: Some(self.payload.digest()),
            ..self
        }
    }

    /// set the fee strategy and, if estimation succeeded, its estimate for
    /// the current payload. any proof built under a previous fee is dropped.
    pub fn with_fee(self, fee_strategy: FeeStrategy, estimate: Option<GasEstimate>) -> Self {
        let gas_estimate = estimate.map(|estimate| EstimateRecord {
            estimate,
            fee_strategy: fee_strategy.clone(),
            for_payload: self.payload.digest(),
        });
        Self {
            fee_strategy: Some(fee_strategy),
            gas_estimate,
            proven: None,
            ..self
        }
    }

    pub fn with_proven(self, proven: ProvenTransaction) -> Self {
        Self {
            proven: Some(proven),
            ..self
        }
    }

    /// drop the estimate and anything built from it. selections and fee
    /// strategy stay.
    pub fn without_estimate(self) -> Self {
        Self {
            gas_estimate: None,
            proven: None,
            ..self
        }
    }
}
