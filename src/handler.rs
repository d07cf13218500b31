//! Ledger handler: greedy batch application and fee-maximizing selection over a live
//! UTXO set

use tracing::debug;

use crate::crypto::{Secp256k1Verifier, SignatureVerifier};
use crate::error::TransactionError;
use crate::selector::{select_best_subset, Selection};
use crate::transaction::{apply_transaction, check_tx};
use crate::types::*;

/// ApplyBatch: 𝒰𝒮 × 𝒯𝒳* → 𝒰𝒮 × 𝒯𝒳*
///
/// Single in-order pass. Each transaction is checked against the set as left by the
/// transactions accepted before it; a valid one is applied and kept, an invalid one is
/// dropped and never reconsidered. Acceptance depends on batch order whenever
/// transactions conflict.
pub fn apply_batch<V: SignatureVerifier + ?Sized>(
    utxo_set: &mut UtxoSet,
    txs: &[Transaction],
    verifier: &V,
) -> Vec<Transaction> {
    let mut accepted = Vec::with_capacity(txs.len());

    for (i, tx) in txs.iter().enumerate() {
        match check_tx(tx, utxo_set, verifier) {
            Ok(_) => {
                apply_transaction(tx, utxo_set);
                accepted.push(tx.clone());
            }
            Err(e) => debug!("Skipping transaction {} of batch: {}", i, e),
        }
    }

    debug!("Accepted {} of {} transactions", accepted.len(), txs.len());
    accepted
}

/// Owns a live UTXO set and applies accepted transactions to it.
pub struct TxHandler<V: SignatureVerifier = Secp256k1Verifier> {
    utxo_set: UtxoSet,
    verifier: V,
}

impl TxHandler<Secp256k1Verifier> {
    /// Handler over a copy of `utxo_set`, checking signatures with secp256k1.
    pub fn new(utxo_set: UtxoSet) -> Self {
        Self::with_verifier(utxo_set, Secp256k1Verifier::new())
    }
}

impl<V: SignatureVerifier> TxHandler<V> {
    pub fn with_verifier(utxo_set: UtxoSet, verifier: V) -> Self {
        Self { utxo_set, verifier }
    }

    /// True if `tx` is valid against the current set.
    pub fn is_valid_tx(&self, tx: &Transaction) -> bool {
        self.check_tx(tx).is_ok()
    }

    /// Validates `tx` against the current set, returning its fee or the rejection reason.
    pub fn check_tx(&self, tx: &Transaction) -> Result<Integer, TransactionError> {
        check_tx(tx, &self.utxo_set, &self.verifier)
    }

    /// Greedily accepts a mutually valid subset of `possible_txs`, in order, updating the
    /// set as it goes.
    pub fn handle_txs(&mut self, possible_txs: &[Transaction]) -> Vec<Transaction> {
        apply_batch(&mut self.utxo_set, possible_txs, &self.verifier)
    }

    /// Accepts the mutually valid subset of `possible_txs` with the highest total fee and
    /// commits it to the set.
    ///
    /// Runs an exhaustive search: exponential in the batch size.
    pub fn select_max_fee_txs(&mut self, possible_txs: &[Transaction]) -> Selection {
        let selection = select_best_subset(&self.utxo_set, possible_txs, &self.verifier);

        for tx in &selection.transactions {
            apply_transaction(tx, &mut self.utxo_set);
        }

        selection
    }

    pub fn utxo_set(&self) -> &UtxoSet {
        &self.utxo_set
    }

    pub fn into_utxo_set(self) -> UtxoSet {
        self.utxo_set
    }
}
