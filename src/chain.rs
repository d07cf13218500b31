//! Fork-aware block chain with a bounded retention window
//!
//! Every accepted block keeps the UTXO set that results from connecting it to its parent,
//! so a new block can extend any retained fork without replaying history. The window holds
//! cutoff age + 1 height levels ending at the best tip; anything lower is dropped together
//! with its set, which bounds memory by the window size times the number of live forks.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::config::ChainConfig;
use crate::constants::GENESIS_HEIGHT;
use crate::crypto::{short_hash, Secp256k1Verifier, SignatureVerifier};
use crate::error::{BlockError, Result};
use crate::handler::apply_batch;
use crate::mempool::TransactionPool;
use crate::types::*;

/// A retained block with its height and the UTXO set after connecting it.
#[derive(Debug, Clone)]
struct ChainRecord {
    block: Block,
    height: Natural,
    utxo_set: UtxoSet,
}

/// Maintains competing forks from a trusted genesis block and tracks the tallest one.
///
/// All mutation goes through `&mut self`; a caller sharing the chain across threads wraps
/// it in its own lock.
pub struct BlockChain<V: SignatureVerifier = Secp256k1Verifier> {
    config: ChainConfig,
    verifier: V,
    records: HashMap<Hash, ChainRecord>,
    /// Sliding window: absolute height → blocks at that height.
    levels: BTreeMap<Natural, Vec<Hash>>,
    max_height: Natural,
    best_tip: Hash,
    pending: TransactionPool,
}

impl BlockChain<Secp256k1Verifier> {
    /// Chain rooted at `genesis` with the default retention window.
    ///
    /// The genesis block is trusted: its coinbase output is credited as-is and nothing
    /// else about it is checked.
    pub fn new(genesis: Block) -> Self {
        Self::from_parts(genesis, ChainConfig::default(), Secp256k1Verifier::new())
    }
}

impl<V: SignatureVerifier> BlockChain<V> {
    /// Chain rooted at `genesis` using `config` and a custom signature oracle.
    pub fn with_config(genesis: Block, config: ChainConfig, verifier: V) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(genesis, config, verifier))
    }

    fn from_parts(genesis: Block, config: ChainConfig, verifier: V) -> Self {
        if !genesis.is_genesis() {
            warn!("Genesis block carries a parent reference; ignoring it");
        }
        if !genesis.transactions.is_empty() {
            warn!(
                "Genesis block carries {} transactions; only its coinbase is credited",
                genesis.transactions.len()
            );
        }

        let mut utxo_set = UtxoSet::new();
        if let Some(reward) = genesis.coinbase.outputs.first() {
            utxo_set.insert(genesis.coinbase_outpoint(), reward.clone());
        }

        let hash = genesis.hash();
        info!("Chain initialized at genesis {}", short_hash(&hash));

        let mut records = HashMap::new();
        records.insert(
            hash,
            ChainRecord {
                block: genesis,
                height: GENESIS_HEIGHT,
                utxo_set,
            },
        );

        let mut levels = BTreeMap::new();
        levels.insert(GENESIS_HEIGHT, vec![hash]);

        Self {
            config,
            verifier,
            records,
            levels,
            max_height: GENESIS_HEIGHT,
            best_tip: hash,
            pending: TransactionPool::new(),
        }
    }

    /// Adds `block` if it is valid, returning whether it was accepted.
    pub fn add_block(&mut self, block: Block) -> bool {
        self.try_add_block(block).is_ok()
    }

    /// Adds `block` if it is valid, returning its hash or the reason it was rejected.
    ///
    /// A block is valid when its parent is retained, its coinbase is well formed, every one
    /// of its transactions is accepted in order against the parent's UTXO set, and its
    /// height lies inside the retention window. A rejected block leaves the chain exactly
    /// as it was.
    pub fn try_add_block(&mut self, block: Block) -> std::result::Result<Hash, BlockError> {
        let hash = block.hash();
        match self.connect_block(block, hash) {
            Ok(height) => {
                debug!("Accepted block {} at height {}", short_hash(&hash), height);
                Ok(hash)
            }
            Err(e) => {
                warn!("Rejected block {}: {}", short_hash(&hash), e);
                Err(e)
            }
        }
    }

    fn connect_block(
        &mut self,
        block: Block,
        hash: Hash,
    ) -> std::result::Result<Natural, BlockError> {
        let prev_hash = block
            .prev_block_hash
            .ok_or(BlockError::NotGenesisButNoParent)?;

        let parent = self
            .records
            .get(&prev_hash)
            .ok_or(BlockError::UnknownParent(prev_hash))?;
        if self.records.contains_key(&hash) {
            return Err(BlockError::DuplicateBlock(hash));
        }

        let height = parent.height + 1;
        let mut utxo_set = parent.utxo_set.clone();

        let reward = check_coinbase(&block.coinbase)?.clone();

        let accepted = apply_batch(&mut utxo_set, &block.transactions, &self.verifier);
        if accepted.len() != block.transactions.len() {
            return Err(BlockError::TransactionSetInvalid {
                accepted: accepted.len(),
                expected: block.transactions.len(),
            });
        }

        utxo_set.insert(block.coinbase_outpoint(), reward);

        self.check_height(height)?;

        self.records.insert(
            hash,
            ChainRecord {
                block,
                height,
                utxo_set,
            },
        );
        self.levels.entry(height).or_default().push(hash);

        if height > self.max_height {
            self.advance_tip(hash, height);
        } else {
            debug!(
                "Block {} extends a side fork at height {} (tip at {})",
                short_hash(&hash),
                height,
                self.max_height
            );
        }

        Ok(height)
    }

    fn advance_tip(&mut self, hash: Hash, height: Natural) {
        self.best_tip = hash;
        self.max_height = height;
        info!("New best tip {} at height {}", short_hash(&hash), height);

        let pruned = self.prune();
        debug_assert!(self.records.contains_key(&hash), "best tip was pruned");
        if pruned > 0 {
            debug!(
                "Pruned {} blocks, lowest retained height is now {}",
                pruned,
                self.min_retained_height()
            );
        }

        if let Some(tip) = self.records.get(&hash) {
            let evicted = self.pending.retain_valid(&tip.utxo_set, &self.verifier);
            if !evicted.is_empty() {
                debug!("Evicted {} pending transactions", evicted.len());
            }
        }
    }

    /// max height − cutoff age, if the chain is that tall.
    ///
    /// The floor level is still retained so its blocks keep their sets, but nothing new is
    /// accepted at or below it.
    fn acceptance_floor(&self) -> Option<Natural> {
        self.max_height.checked_sub(self.config.cutoff_age)
    }

    fn check_height(&self, height: Natural) -> std::result::Result<(), BlockError> {
        match self.acceptance_floor() {
            Some(floor) if height <= floor => Err(BlockError::HeightBelowRetentionWindow {
                height,
                max_height: self.max_height,
            }),
            _ => Ok(()),
        }
    }

    /// Drops every level below the acceptance floor, returning how many blocks went.
    fn prune(&mut self) -> usize {
        let Some(floor) = self.acceptance_floor() else {
            return 0;
        };

        let retained = self.levels.split_off(&floor);
        let expired = std::mem::replace(&mut self.levels, retained);

        let mut pruned = 0;
        for hash in expired.into_values().flatten() {
            if self.records.remove(&hash).is_some() {
                pruned += 1;
            }
        }
        pruned
    }

    /// Queues `tx` for a future block without validating it.
    pub fn add_transaction(&mut self, tx: Transaction) -> Hash {
        self.pending.add_transaction(tx)
    }

    /// Tallest retained block; on ties, the first one received at that height.
    pub fn get_best_tip(&self) -> &Block {
        &self.tip_record().block
    }

    /// UTXO set to build the next block on top of the best tip.
    pub fn get_best_tip_utxo_set(&self) -> &UtxoSet {
        &self.tip_record().utxo_set
    }

    pub fn get_pending_pool(&self) -> &TransactionPool {
        &self.pending
    }

    pub fn best_tip_hash(&self) -> Hash {
        self.best_tip
    }

    pub fn max_height(&self) -> Natural {
        self.max_height
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn contains_block(&self, hash: &Hash) -> bool {
        self.records.contains_key(hash)
    }

    pub fn get_block(&self, hash: &Hash) -> Option<&Block> {
        self.records.get(hash).map(|record| &record.block)
    }

    pub fn height_of(&self, hash: &Hash) -> Option<Natural> {
        self.records.get(hash).map(|record| record.height)
    }

    pub fn utxo_set_at(&self, hash: &Hash) -> Option<&UtxoSet> {
        self.records.get(hash).map(|record| &record.utxo_set)
    }

    /// Number of blocks currently retained across all forks.
    pub fn retained_blocks(&self) -> usize {
        self.records.len()
    }

    /// Lowest height still retained.
    pub fn min_retained_height(&self) -> Natural {
        self.levels.keys().next().copied().unwrap_or(self.max_height)
    }

    /// Retained blocks with no retained child, tallest first.
    pub fn fork_tips(&self) -> Vec<Hash> {
        let parents: HashSet<Hash> = self
            .records
            .values()
            .filter_map(|record| record.block.prev_block_hash)
            .collect();

        self.levels
            .iter()
            .rev()
            .flat_map(|(_, hashes)| hashes.iter().copied())
            .filter(|hash| !parents.contains(hash))
            .collect()
    }

    fn tip_record(&self) -> &ChainRecord {
        // The tip sits at max height and pruning keeps at least that level.
        &self.records[&self.best_tip]
    }
}

/// A coinbase has no inputs and exactly one non-negative output.
fn check_coinbase(
    coinbase: &Transaction,
) -> std::result::Result<&TransactionOutput, BlockError> {
    if !coinbase.is_coinbase() {
        return Err(BlockError::InvalidCoinbase(format!(
            "{} inputs, {} outputs",
            coinbase.inputs.len(),
            coinbase.outputs.len()
        )));
    }

    match coinbase.outputs.first() {
        Some(reward) if reward.value >= 0 => Ok(reward),
        Some(reward) => Err(BlockError::InvalidCoinbase(format!(
            "negative reward {}",
            reward.value
        ))),
        None => Err(BlockError::InvalidCoinbase("no outputs".to_string())),
    }
}
