//! Core ledger types for UTXO validation and chain maintenance

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::COINBASE_OUTPUT_INDEX;
use crate::crypto::{calculate_block_hash, calculate_tx_id};

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// Integer type
pub type Integer = i64;

/// OutPoint: 𝒪 = ℍ × ℕ
///
/// Identity of an unspent output: the id of the transaction that created it and the
/// position of the output inside that transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: Natural,
}

impl OutPoint {
    pub fn new(hash: Hash, index: Natural) -> Self {
        Self { hash, index }
    }
}

/// Transaction Input: ℐ = 𝒪 × 𝕊
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub signature: ByteString,
}

impl TransactionInput {
    /// Input spending `prevout`, not yet signed.
    pub fn unsigned(prevout: OutPoint) -> Self {
        Self {
            prevout,
            signature: Vec::new(),
        }
    }
}

/// Transaction Output: 𝒯 = ℤ × 𝕊
///
/// `recipient` holds the serialized public key allowed to spend this output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: Integer,
    pub recipient: ByteString,
}

/// Transaction: 𝒯𝒳 = ℕ × ℐ* × 𝒯* × ℕ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: Natural,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: Natural,
}

impl Transaction {
    /// Version 1 transaction with a zero lock time.
    pub fn new(inputs: Vec<TransactionInput>, outputs: Vec<TransactionOutput>) -> Self {
        Self {
            version: 1,
            inputs,
            outputs,
            lock_time: 0,
        }
    }

    /// Coinbase paying `value` to `recipient`.
    ///
    /// The height goes into `lock_time` so that two blocks paying the same reward to the
    /// same key still produce distinct coinbase ids.
    pub fn coinbase(value: Integer, recipient: ByteString, height: Natural) -> Self {
        Self {
            version: 1,
            inputs: Vec::new(),
            outputs: vec![TransactionOutput { value, recipient }],
            lock_time: height,
        }
    }

    /// Content hash identifying this transaction.
    pub fn hash(&self) -> Hash {
        calculate_tx_id(self)
    }

    /// Returns a copy of the transaction with `signature` attached to input `index`.
    ///
    /// Returns `None` if the input does not exist.
    pub fn with_signature(mut self, index: usize, signature: ByteString) -> Option<Self> {
        self.inputs.get_mut(index)?.signature = signature;
        Some(self)
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty() && self.outputs.len() == 1
    }

    /// Outpoint of the `index`-th output of this transaction.
    pub fn outpoint(&self, index: Natural) -> OutPoint {
        OutPoint::new(self.hash(), index)
    }
}

/// Block: ℬ = ℍ? × 𝒯𝒳 × 𝒯𝒳*
///
/// Only the genesis block lacks a parent reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub prev_block_hash: Option<Hash>,
    pub coinbase: Transaction,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(
        prev_block_hash: Option<Hash>,
        coinbase: Transaction,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            prev_block_hash,
            coinbase,
            transactions,
        }
    }

    pub fn hash(&self) -> Hash {
        calculate_block_hash(self)
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_block_hash.is_none()
    }

    /// Outpoint of the reward credited by this block's coinbase.
    pub fn coinbase_outpoint(&self) -> OutPoint {
        self.coinbase.outpoint(COINBASE_OUTPUT_INDEX)
    }
}

/// UTXO Set: 𝒰𝒮 = 𝒪 → 𝒯
///
/// Cloning yields an independent snapshot.
pub type UtxoSet = HashMap<OutPoint, TransactionOutput>;
