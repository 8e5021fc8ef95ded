//! Sends a transaction plan and reports what happened to each transaction.
//!
//! Independent transactions go out in parallel. A plan with a dependency is
//! sent in order, and nothing after a failed dependency is sent.

use super::types::{PendingTransaction, TransactionKind, TransactionPlan};
use crate::chain::ChainClient;
use crate::error::{OnboardingError, Result};
use futures::future::join_all;
use serde::Serialize;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::{Signature, Signer};
use solana_sdk::transaction::VersionedTransaction;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "reason")]
pub enum TransactionState {
    Built,
    Submitted,
    Confirmed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub kind: TransactionKind,
    #[serde(serialize_with = "serialize_signature")]
    pub signature: Option<Signature>,
    pub confirmation_slot: Option<u64>,
    pub state: TransactionState,
}

fn serialize_signature<S: serde::Serializer>(
    signature: &Option<Signature>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match signature {
        Some(signature) => serializer.serialize_some(&signature.to_string()),
        None => serializer.serialize_none(),
    }
}

impl SubmissionResult {
    fn built(kind: TransactionKind) -> Self {
        Self {
            kind,
            signature: None,
            confirmation_slot: None,
            state: TransactionState::Built,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            TransactionState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == TransactionState::Confirmed
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SubmitOptions {
    pub commitment: CommitmentConfig,
    pub skip_preflight: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            commitment: CommitmentConfig::confirmed(),
            skip_preflight: false,
        }
    }
}

/// Sign `tx` in the slot reserved for `signer`.
pub fn sign_transaction(tx: &mut VersionedTransaction, signer: &dyn Signer) -> Result<()> {
    let required = tx.message.header().num_required_signatures as usize;
    let pubkey = signer.pubkey();
    let position = tx
        .message
        .static_account_keys()
        .iter()
        .take(required)
        .position(|key| *key == pubkey)
        .ok_or_else(|| OnboardingError::Signing(format!("{pubkey} is not a required signer")))?;

    if tx.signatures.len() < required {
        tx.signatures.resize(required, Signature::default());
    }
    tx.signatures[position] = signer
        .try_sign_message(&tx.message.serialize())
        .map_err(|e| OnboardingError::Signing(e.to_string()))?;
    Ok(())
}

pub struct TransactionSubmitter {
    chain: Arc<dyn ChainClient>,
    options: SubmitOptions,
}

impl TransactionSubmitter {
    pub fn new(chain: Arc<dyn ChainClient>, options: SubmitOptions) -> Self {
        Self { chain, options }
    }

    async fn submit_one(&self, pending: PendingTransaction) -> SubmissionResult {
        let mut result = SubmissionResult::built(pending.kind);

        let signature = match self
            .chain
            .send_transaction(&pending.transaction, self.options.skip_preflight)
            .await
        {
            Ok(signature) => signature,
            Err(e) => {
                error!(kind = ?pending.kind, "Failed to send transaction: {}", e);
                result.state = TransactionState::Failed(e.to_string());
                return result;
            }
        };
        result.signature = Some(signature);
        result.state = TransactionState::Submitted;

        match self
            .chain
            .confirm_transaction(&signature, self.options.commitment)
            .await
        {
            Ok(slot) => {
                info!(%signature, slot, kind = ?pending.kind, "Transaction confirmed");
                result.confirmation_slot = Some(slot);
                result.state = TransactionState::Confirmed;
            }
            Err(e) => {
                warn!(%signature, "Transaction did not confirm: {}", e);
                result.state = TransactionState::Failed(e.to_string());
            }
        }
        result
    }

    /// Sign every transaction with `signer`, then submit. Signing errors fail
    /// the whole call before anything is sent.
    #[instrument(skip_all, fields(transactions = plan.len(), dependency = plan.has_dependency()))]
    pub async fn submit(
        &self,
        plan: &TransactionPlan,
        signer: &dyn Signer,
    ) -> Result<Vec<SubmissionResult>> {
        let mut signed = Vec::with_capacity(plan.len());
        for pending in plan.iter() {
            let mut pending = pending.clone();
            sign_transaction(&mut pending.transaction, signer)?;
            signed.push(pending);
        }
        Ok(self.submit_signed(signed, plan.has_dependency()).await)
    }

    /// Submit already-signed transactions.
    pub async fn submit_signed(
        &self,
        transactions: Vec<PendingTransaction>,
        has_dependency: bool,
    ) -> Vec<SubmissionResult> {
        if !has_dependency {
            return join_all(transactions.into_iter().map(|pending| self.submit_one(pending))).await;
        }

        let mut results = Vec::with_capacity(transactions.len());
        let mut transactions = transactions.into_iter();
        let Some(dependency) = transactions.next() else {
            return results;
        };

        let first = self.submit_one(dependency).await;
        let dependency_failed = !first.is_confirmed();
        results.push(first);

        for pending in transactions {
            if dependency_failed {
                let mut skipped = SubmissionResult::built(pending.kind);
                skipped.state = TransactionState::Failed("dependency transaction failed".to_string());
                results.push(skipped);
            } else {
                results.push(self.submit_one(pending).await);
            }
        }
        results
    }
}
