//! Ledger constants

/// Maximum height difference behind the best tip at which a block is still accepted or
/// retained.
pub const CUTOFF_AGE: u64 = 10;

/// Default reward paid by a block's coinbase.
pub const COINBASE_VALUE: i64 = 25;

/// Position of the reward output inside a coinbase transaction.
pub const COINBASE_OUTPUT_INDEX: u64 = 0;

/// Height assigned to the genesis block.
pub const GENESIS_HEIGHT: u64 = 0;
