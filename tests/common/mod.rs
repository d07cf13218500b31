//! Shared fixtures for integration tests

#![allow(dead_code)]

use secp256k1::SecretKey;
use utxo_ledger::crypto::{public_key_bytes, sign_input};
use utxo_ledger::*;

/// Deterministic secp256k1 key for participant `n` (n ≥ 1).
pub fn key(n: u8) -> SecretKey {
    SecretKey::from_slice(&[n; 32]).unwrap()
}

/// Recipient bytes owned by participant `n`.
pub fn address(n: u8) -> ByteString {
    public_key_bytes(&key(n))
}

/// Transaction spending `prevouts`, every input signed by participant `owner`.
pub fn signed_spend(owner: u8, prevouts: &[OutPoint], outputs: &[(Integer, u8)]) -> Transaction {
    let unsigned = Transaction::new(
        prevouts.iter().map(|p| TransactionInput::unsigned(*p)).collect(),
        outputs
            .iter()
            .map(|&(value, to)| TransactionOutput {
                value,
                recipient: address(to),
            })
            .collect(),
    );

    let mut signed = unsigned.clone();
    for index in 0..unsigned.inputs.len() {
        let signature = sign_input(&unsigned, index, &key(owner)).unwrap();
        signed = signed.with_signature(index, signature).unwrap();
    }
    signed
}

pub fn genesis_for(owner: u8) -> Block {
    Block::new(None, Transaction::coinbase(COINBASE_VALUE, address(owner), 0), vec![])
}

/// Block on `parent` whose coinbase pays participant `miner`.
pub fn block_on(parent: &Block, height: Natural, miner: u8, txs: Vec<Transaction>) -> Block {
    Block::new(
        Some(parent.hash()),
        Transaction::coinbase(COINBASE_VALUE, address(miner), height),
        txs,
    )
}

/// UTXO set holding one coin of `value` per entry, owned by participant 1.
pub fn funded_set(values: &[Integer]) -> UtxoSet {
    let mut utxo_set = UtxoSet::new();
    for (i, &value) in values.iter().enumerate() {
        utxo_set.insert(
            OutPoint::new([i as u8 + 1; 32], 0),
            TransactionOutput {
                value,
                recipient: address(1),
            },
        );
    }
    utxo_set
}

pub fn coin(n: u8) -> OutPoint {
    OutPoint::new([n; 32], 0)
}
