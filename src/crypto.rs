//! Hashing and signature collaborators
//!
//! The ledger treats content hashing and signature checking as opaque. This module holds
//! the canonical serializations they run over, the [`SignatureVerifier`] seam the
//! validator calls through, and a secp256k1 implementation of it.

use bitcoin_hashes::{sha256d, Hash as BitcoinHash, HashEngine};
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey, VerifyOnly};
use sha2::{Digest, Sha256};

use crate::error::{LedgerError, Result};
use crate::types::*;

/// Oracle deciding whether `signature` was produced over `payload` by the owner of
/// `recipient`.
pub trait SignatureVerifier {
    fn verify(&self, recipient: &[u8], payload: &[u8], signature: &[u8]) -> bool;
}

impl<F> SignatureVerifier for F
where
    F: Fn(&[u8], &[u8], &[u8]) -> bool,
{
    fn verify(&self, recipient: &[u8], payload: &[u8], signature: &[u8]) -> bool {
        self(recipient, payload, signature)
    }
}

/// ECDSA over secp256k1.
///
/// Recipients are compressed or uncompressed SEC1 public keys, signatures are DER, and the
/// signed message is SHA-256 of the payload.
pub struct Secp256k1Verifier {
    secp: Secp256k1<VerifyOnly>,
}

impl Secp256k1Verifier {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }
}

impl Default for Secp256k1Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureVerifier for Secp256k1Verifier {
    fn verify(&self, recipient: &[u8], payload: &[u8], signature: &[u8]) -> bool {
        let pubkey = match PublicKey::from_slice(recipient) {
            Ok(pk) => pk,
            Err(_) => return false,
        };

        let signature = match Signature::from_der(signature) {
            Ok(sig) => sig,
            Err(_) => return false,
        };

        let message = match payload_message(payload) {
            Ok(msg) => msg,
            Err(_) => return false,
        };

        self.secp.verify_ecdsa(&message, &signature, &pubkey).is_ok()
    }
}

/// Sign input `index` of `tx` with `secret_key`, returning a DER signature.
pub fn sign_input(tx: &Transaction, index: usize, secret_key: &SecretKey) -> Result<ByteString> {
    let payload = signing_payload(tx, index).ok_or(LedgerError::InvalidInputIndex {
        index,
        inputs: tx.inputs.len(),
    })?;
    let message = payload_message(&payload)?;
    let secp = Secp256k1::signing_only();
    let signature = secp.sign_ecdsa(&message, secret_key);
    Ok(signature.serialize_der().to_vec())
}

/// Compressed public key bytes for `secret_key`, usable as an output recipient.
pub fn public_key_bytes(secret_key: &SecretKey) -> ByteString {
    let secp = Secp256k1::signing_only();
    PublicKey::from_secret_key(&secp, secret_key).serialize().to_vec()
}

/// Canonical bytes signed by input `index`: its prevout, every output, and the lock time.
///
/// Signatures are never part of the payload. Returns `None` if the input does not exist.
pub fn signing_payload(tx: &Transaction, index: usize) -> Option<ByteString> {
    let input = tx.inputs.get(index)?;
    let mut data = Vec::new();

    data.extend_from_slice(&input.prevout.hash);
    data.extend_from_slice(&input.prevout.index.to_le_bytes());
    encode_outputs(&tx.outputs, &mut data);
    data.extend_from_slice(&tx.lock_time.to_le_bytes());

    Some(data)
}

/// Calculate transaction ID: sha256d over the full serialization, signatures included
pub fn calculate_tx_id(tx: &Transaction) -> Hash {
    let mut data = Vec::new();

    data.extend_from_slice(&tx.version.to_le_bytes());

    data.extend_from_slice(&encode_varint(tx.inputs.len() as u64));
    for input in &tx.inputs {
        data.extend_from_slice(&input.prevout.hash);
        data.extend_from_slice(&input.prevout.index.to_le_bytes());
        data.extend_from_slice(&encode_varint(input.signature.len() as u64));
        data.extend_from_slice(&input.signature);
    }

    encode_outputs(&tx.outputs, &mut data);
    data.extend_from_slice(&tx.lock_time.to_le_bytes());

    sha256d_hash(&data)
}

/// Calculate block hash over the parent link, the coinbase id and every transaction id
pub fn calculate_block_hash(block: &Block) -> Hash {
    let mut hasher = sha256d::Hash::engine();

    match &block.prev_block_hash {
        Some(prev) => {
            hasher.input(&[1u8]);
            hasher.input(prev);
        }
        None => hasher.input(&[0u8]),
    }

    hasher.input(&calculate_tx_id(&block.coinbase));
    hasher.input(&encode_varint(block.transactions.len() as u64));
    for tx in &block.transactions {
        hasher.input(&calculate_tx_id(tx));
    }

    sha256d::Hash::from_engine(hasher).into_inner()
}

/// First four bytes of a hash in hex, for log lines and error messages.
pub fn short_hash(hash: &Hash) -> String {
    hash[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

fn encode_outputs(outputs: &[TransactionOutput], data: &mut Vec<u8>) {
    data.extend_from_slice(&encode_varint(outputs.len() as u64));
    for output in outputs {
        data.extend_from_slice(&output.value.to_le_bytes());
        data.extend_from_slice(&encode_varint(output.recipient.len() as u64));
        data.extend_from_slice(&output.recipient);
    }
}

fn payload_message(payload: &[u8]) -> std::result::Result<Message, secp256k1::Error> {
    let digest = Sha256::digest(payload);
    Message::from_digest_slice(&digest)
}

fn sha256d_hash(data: &[u8]) -> Hash {
    sha256d::Hash::hash(data).into_inner()
}

/// Encode a number as a Bitcoin varint
fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= 0xffff {
        let mut result = vec![0xfd];
        result.extend_from_slice(&(value as u16).to_le_bytes());
        result
    } else if value <= 0xffffffff {
        let mut result = vec![0xfe];
        result.extend_from_slice(&(value as u32).to_le_bytes());
        result
    } else {
        let mut result = vec![0xff];
        result.extend_from_slice(&value.to_le_bytes());
        result
    }
}
