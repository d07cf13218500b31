//! # UTXO-Ledger
//!
//! Validation and fork tracking for a simplified unspent-transaction-output ledger.
//!
//! ## Architecture
//!
//! The crate is layered bottom-up:
//! - Types and hashing (outpoints, transactions, blocks, UTXO sets)
//! - Transaction validation against a UTXO set
//! - Batch handlers: greedy in-order acceptance and fee-maximizing selection
//! - Block chain: fork-aware block acceptance over a sliding retention window
//!
//! ## Design Principles
//!
//! 1. **Snapshots, not journals**: every retained block owns the UTXO set after it
//! 2. **Atomic acceptance**: a rejected block or transaction leaves state untouched
//! 3. **Opaque crypto**: hashing and signatures sit behind [`crypto`]
//!
//! ## Usage
//!
//! ```rust
//! use utxo_ledger::{Block, BlockChain, Transaction, COINBASE_VALUE};
//!
//! let reward = Transaction::coinbase(COINBASE_VALUE, vec![0x02; 33], 0);
//! let genesis = Block::new(None, reward, vec![]);
//! let mut chain = BlockChain::new(genesis.clone());
//!
//! let next = Block::new(
//!     Some(genesis.hash()),
//!     Transaction::coinbase(COINBASE_VALUE, vec![0x03; 33], 1),
//!     vec![],
//! );
//! assert!(chain.add_block(next.clone()));
//! assert_eq!(chain.get_best_tip(), &next);
//! assert_eq!(chain.get_best_tip_utxo_set().len(), 2);
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod config;
pub mod crypto;
pub mod transaction;
pub mod handler;
pub mod selector;
pub mod mempool;
pub mod chain;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{BlockError, LedgerError, Result, TransactionError};
pub use config::ChainConfig;
pub use crypto::{Secp256k1Verifier, SignatureVerifier};
pub use handler::TxHandler;
pub use selector::Selection;
pub use mempool::TransactionPool;
pub use chain::BlockChain;
