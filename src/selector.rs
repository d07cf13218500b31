//! Fee-maximizing transaction selection
//!
//! Exhaustive depth-first search over include/exclude decisions. Each branch carries its
//! own copy of the UTXO set, and the best assignment found so far is threaded through the
//! recursion as a value rather than kept in shared state.

use tracing::debug;

use crate::crypto::SignatureVerifier;
use crate::transaction::{apply_transaction, check_tx};
use crate::types::*;

/// A mutually valid subset of a candidate batch and the fees it collects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub transactions: Vec<Transaction>,
    pub total_fee: Integer,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// SelectBestSubset: 𝒰𝒮 × 𝒯𝒳* → 𝒯𝒳*
///
/// Returns the subset of `txs` with the highest total fee such that every member is valid
/// against `utxo_set` after applying the members before it, in batch order. Among subsets
/// with equal fee the first one reached wins; exclusion is explored before inclusion, so
/// the empty subset beats any zero-fee subset.
///
/// `utxo_set` is left untouched. Cost is O(2ⁿ) validations for n candidates.
pub fn select_best_subset<V: SignatureVerifier + ?Sized>(
    utxo_set: &UtxoSet,
    txs: &[Transaction],
    verifier: &V,
) -> Selection {
    let mut taken = Vec::with_capacity(txs.len());
    let (indices, total_fee) =
        search(txs, 0, utxo_set, &mut taken, 0, None, verifier).unwrap_or_default();

    debug!(
        "Selected {} of {} transactions, total fee {}",
        indices.len(),
        txs.len(),
        total_fee
    );

    Selection {
        transactions: indices.into_iter().map(|i| txs[i].clone()).collect(),
        total_fee,
    }
}

/// Best complete assignment: indices into the batch, with its fee.
type Candidate = (Vec<usize>, Integer);

/// Explores decisions for `txs[index..]` and returns the better of `best` and anything
/// found below this node.
fn search<V: SignatureVerifier + ?Sized>(
    txs: &[Transaction],
    index: usize,
    utxo_set: &UtxoSet,
    taken: &mut Vec<usize>,
    fee_sum: Integer,
    best: Option<Candidate>,
    verifier: &V,
) -> Option<Candidate> {
    if index == txs.len() {
        return match best {
            Some((_, best_sum)) if fee_sum <= best_sum => best,
            _ => Some((taken.clone(), fee_sum)),
        };
    }

    // Leave the transaction out
    let best = search(txs, index + 1, utxo_set, taken, fee_sum, best, verifier);

    // Take it if it fits on this branch
    let tx = &txs[index];
    let fee = match check_tx(tx, utxo_set, verifier) {
        Ok(fee) => fee,
        Err(_) => return best,
    };

    let mut branch = utxo_set.clone();
    apply_transaction(tx, &mut branch);

    taken.push(index);
    let best = search(
        txs,
        index + 1,
        &branch,
        taken,
        fee_sum.saturating_add(fee),
        best,
        verifier,
    );
    taken.pop();

    best
}
