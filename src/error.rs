//! Error types for ledger validation

use thiserror::Error;

use crate::types::{Hash, Natural, OutPoint};

/// Reasons a transaction is rejected against a UTXO set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Input {index} references unknown UTXO {prevout:?}")]
    UnknownUtxo { index: usize, prevout: OutPoint },

    #[error("Input {index} spends a UTXO already claimed by this transaction")]
    DoubleSpendWithinTx { index: usize },

    #[error("Invalid signature on input {index}")]
    SignatureInvalid { index: usize },

    #[error("Negative value {value} at output {index}")]
    NegativeOutput { index: usize, value: i64 },

    #[error("Inputs total {inputs} is below outputs total {outputs}")]
    InputsBelowOutputs { inputs: i64, outputs: i64 },

    #[error("Value sum overflows")]
    ValueOverflow,
}

/// Reasons a block is rejected by the chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("Block has no parent reference but is not the genesis block")]
    NotGenesisButNoParent,

    #[error("Parent block {} is unknown or pruned", crate::crypto::short_hash(.0))]
    UnknownParent(Hash),

    #[error("Block {} is already part of the chain", crate::crypto::short_hash(.0))]
    DuplicateBlock(Hash),

    #[error("Malformed coinbase: {0}")]
    InvalidCoinbase(String),

    #[error("Only {accepted} of {expected} transactions are valid")]
    TransactionSetInvalid { accepted: usize, expected: usize },

    #[error("Height {height} is outside the retention window (max height {max_height})")]
    HeightBelowRetentionWindow { height: Natural, max_height: Natural },
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Transaction validation failed: {0}")]
    Transaction(#[from] TransactionError),

    #[error("Block validation failed: {0}")]
    Block(#[from] BlockError),

    #[error("Input index {index} out of range ({inputs} inputs)")]
    InvalidInputIndex { index: usize, inputs: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] secp256k1::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
