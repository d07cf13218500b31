//! Transaction validation against a UTXO set

use std::collections::HashSet;

use crate::crypto::{calculate_tx_id, signing_payload, SignatureVerifier};
use crate::error::TransactionError;
use crate::types::*;

/// CheckTx: 𝒯𝒳 × 𝒰𝒮 → {valid, invalid} × ℤ
///
/// A transaction tx = (v, ins, outs, lt) is valid against us if and only if:
/// 1. ∀i ∈ ins: i.prevout ∈ dom(us)
/// 2. no prevout is claimed by two inputs of tx
/// 3. ∀i ∈ ins: the signature of i verifies under us(i.prevout).recipient
/// 4. ∀o ∈ outs: o.value ≥ 0
/// 5. Σᵢ us(i.prevout).value ≥ Σₒ o.value
///
/// On success the fee Σᵢ - Σₒ is returned. The set is only read.
pub fn check_tx<V: SignatureVerifier + ?Sized>(
    tx: &Transaction,
    utxo_set: &UtxoSet,
    verifier: &V,
) -> Result<Integer, TransactionError> {
    // 1. Every claimed output must be unspent
    for (index, input) in tx.inputs.iter().enumerate() {
        if !utxo_set.contains_key(&input.prevout) {
            return Err(TransactionError::UnknownUtxo {
                index,
                prevout: input.prevout,
            });
        }
    }

    let mut claimed = HashSet::with_capacity(tx.inputs.len());
    let mut total_in: Integer = 0;

    for (index, input) in tx.inputs.iter().enumerate() {
        // 2. No double claim within the transaction
        if !claimed.insert(input.prevout) {
            return Err(TransactionError::DoubleSpendWithinTx { index });
        }

        let spent = utxo_set
            .get(&input.prevout)
            .ok_or(TransactionError::UnknownUtxo {
                index,
                prevout: input.prevout,
            })?;

        // 3. Signature over this input's payload
        let payload =
            signing_payload(tx, index).ok_or(TransactionError::SignatureInvalid { index })?;
        if !verifier.verify(&spent.recipient, &payload, &input.signature) {
            return Err(TransactionError::SignatureInvalid { index });
        }

        total_in = total_in
            .checked_add(spent.value)
            .ok_or(TransactionError::ValueOverflow)?;
    }

    // 4. Output values
    let mut total_out: Integer = 0;
    for (index, output) in tx.outputs.iter().enumerate() {
        if output.value < 0 {
            return Err(TransactionError::NegativeOutput {
                index,
                value: output.value,
            });
        }
        total_out = total_out
            .checked_add(output.value)
            .ok_or(TransactionError::ValueOverflow)?;
    }

    // 5. Fee must be non-negative
    if total_in < total_out {
        return Err(TransactionError::InputsBelowOutputs {
            inputs: total_in,
            outputs: total_out,
        });
    }

    Ok(total_in - total_out)
}

/// Boolean form of [`check_tx`].
pub fn is_valid_tx<V: SignatureVerifier + ?Sized>(
    tx: &Transaction,
    utxo_set: &UtxoSet,
    verifier: &V,
) -> bool {
    check_tx(tx, utxo_set, verifier).is_ok()
}

/// ApplyTransaction: 𝒯𝒳 × 𝒰𝒮 → 𝒰𝒮
///
/// us' = (us \ {i.prevout : i ∈ tx.inputs}) ∪ {(tx.id, k) ↦ tx.outputs[k]}
///
/// No validation happens here; callers check first.
pub fn apply_transaction(tx: &Transaction, utxo_set: &mut UtxoSet) {
    for input in &tx.inputs {
        utxo_set.remove(&input.prevout);
    }

    let tx_id = calculate_tx_id(tx);
    for (i, output) in tx.outputs.iter().enumerate() {
        utxo_set.insert(OutPoint::new(tx_id, i as Natural), output.clone());
    }
}

/// Fee = sum of input values - sum of output values
///
/// Inputs missing from the set count as zero, so this is only meaningful for a transaction
/// that validated against `utxo_set`. Returns `None` if either sum or the difference
/// overflows.
pub fn calculate_fee(tx: &Transaction, utxo_set: &UtxoSet) -> Option<Integer> {
    let total_input = tx
        .inputs
        .iter()
        .filter_map(|input| utxo_set.get(&input.prevout))
        .try_fold(0 as Integer, |sum, utxo| sum.checked_add(utxo.value))?;
    let total_output = tx
        .outputs
        .iter()
        .try_fold(0 as Integer, |sum, o| sum.checked_add(o.value))?;

    total_input.checked_sub(total_output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept_all(_: &[u8], _: &[u8], _: &[u8]) -> bool {
        true
    }

    fn reject_all(_: &[u8], _: &[u8], _: &[u8]) -> bool {
        false
    }

    fn utxo_set_with(entries: &[(u8, Natural, Integer)]) -> UtxoSet {
        let mut utxo_set = UtxoSet::new();
        for &(hash, index, value) in entries {
            utxo_set.insert(
                OutPoint::new([hash; 32], index),
                TransactionOutput { value, recipient: vec![hash] },
            );
        }
        utxo_set
    }

    fn spend(prevouts: &[(u8, Natural)], values: &[Integer]) -> Transaction {
        Transaction::new(
            prevouts
                .iter()
                .map(|&(h, i)| TransactionInput::unsigned(OutPoint::new([h; 32], i)))
                .collect(),
            values
                .iter()
                .map(|&value| TransactionOutput { value, recipient: vec![9] })
                .collect(),
        )
    }

    #[test]
    fn test_check_tx_valid_with_fee() {
        let utxo_set = utxo_set_with(&[(1, 0, 10), (2, 0, 5)]);
        let tx = spend(&[(1, 0), (2, 0)], &[7, 6]);

        assert_eq!(check_tx(&tx, &utxo_set, &accept_all), Ok(2));
        assert!(is_valid_tx(&tx, &utxo_set, &accept_all));
    }

    #[test]
    fn test_check_tx_unknown_utxo() {
        let utxo_set = utxo_set_with(&[(1, 0, 10)]);
        let tx = spend(&[(1, 1)], &[1]);

        assert_eq!(
            check_tx(&tx, &utxo_set, &accept_all),
            Err(TransactionError::UnknownUtxo {
                index: 0,
                prevout: OutPoint::new([1; 32], 1)
            })
        );
    }

    #[test]
    fn test_check_tx_double_spend_within_tx() {
        let utxo_set = utxo_set_with(&[(1, 0, 10)]);
        let tx = spend(&[(1, 0), (1, 0)], &[10]);

        assert_eq!(
            check_tx(&tx, &utxo_set, &accept_all),
            Err(TransactionError::DoubleSpendWithinTx { index: 1 })
        );
    }

    #[test]
    fn test_check_tx_bad_signature() {
        let utxo_set = utxo_set_with(&[(1, 0, 10)]);
        let tx = spend(&[(1, 0)], &[10]);

        assert_eq!(
            check_tx(&tx, &utxo_set, &reject_all),
            Err(TransactionError::SignatureInvalid { index: 0 })
        );
    }

    #[test]
    fn test_check_tx_signature_checked_against_recipient() {
        let utxo_set = utxo_set_with(&[(1, 0, 10), (2, 0, 10)]);
        let tx = spend(&[(1, 0), (2, 0)], &[10]);
        let only_owner_one = |recipient: &[u8], _: &[u8], _: &[u8]| recipient == [1u8];

        assert_eq!(
            check_tx(&tx, &utxo_set, &only_owner_one),
            Err(TransactionError::SignatureInvalid { index: 1 })
        );
    }

    #[test]
    fn test_check_tx_negative_output() {
        let utxo_set = utxo_set_with(&[(1, 0, 10)]);
        let tx = spend(&[(1, 0)], &[5, -1]);

        assert_eq!(
            check_tx(&tx, &utxo_set, &accept_all),
            Err(TransactionError::NegativeOutput { index: 1, value: -1 })
        );
    }

    #[test]
    fn test_check_tx_inputs_below_outputs() {
        let utxo_set = utxo_set_with(&[(1, 0, 10)]);
        let tx = spend(&[(1, 0)], &[11]);

        assert_eq!(
            check_tx(&tx, &utxo_set, &accept_all),
            Err(TransactionError::InputsBelowOutputs { inputs: 10, outputs: 11 })
        );
    }

    #[test]
    fn test_check_tx_output_overflow() {
        let utxo_set = utxo_set_with(&[(1, 0, 10)]);
        let tx = spend(&[(1, 0)], &[Integer::MAX, 1]);

        assert_eq!(
            check_tx(&tx, &utxo_set, &accept_all),
            Err(TransactionError::ValueOverflow)
        );
    }

    #[test]
    fn test_check_tx_zero_fee_and_empty() {
        let utxo_set = utxo_set_with(&[(1, 0, 10)]);

        assert_eq!(check_tx(&spend(&[(1, 0)], &[10]), &utxo_set, &accept_all), Ok(0));
        assert_eq!(check_tx(&spend(&[], &[]), &utxo_set, &reject_all), Ok(0));
    }

    #[test]
    fn test_apply_transaction() {
        let mut utxo_set = utxo_set_with(&[(1, 0, 10), (2, 0, 3)]);
        let tx = spend(&[(1, 0)], &[4, 6]);

        apply_transaction(&tx, &mut utxo_set);

        assert!(!utxo_set.contains_key(&OutPoint::new([1; 32], 0)));
        assert!(utxo_set.contains_key(&OutPoint::new([2; 32], 0)));
        assert_eq!(utxo_set[&tx.outpoint(0)].value, 4);
        assert_eq!(utxo_set[&tx.outpoint(1)].value, 6);
        assert_eq!(utxo_set.len(), 3);
    }

    #[test]
    fn test_calculate_fee() {
        let utxo_set = utxo_set_with(&[(1, 0, 10), (2, 0, 3)]);
        let tx = spend(&[(1, 0), (2, 0)], &[12]);

        assert_eq!(calculate_fee(&tx, &utxo_set), Some(1));
    }

    #[test]
    fn test_calculate_fee_overflow() {
        let utxo_set = utxo_set_with(&[(1, 0, Integer::MAX), (2, 0, Integer::MAX)]);
        let tx = spend(&[(1, 0), (2, 0)], &[1]);

        assert_eq!(calculate_fee(&tx, &utxo_set), None);
        assert_eq!(
            check_tx(&tx, &utxo_set, &accept_all),
            Err(TransactionError::ValueOverflow)
        );
    }
}
