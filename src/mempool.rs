//! Pending transactions not yet included in an accepted block

use std::collections::HashMap;

use crate::crypto::SignatureVerifier;
use crate::transaction::is_valid_tx;
use crate::types::*;

/// Transactions waiting for a block, keyed by hash.
///
/// Nothing is validated on insertion. Iteration follows arrival order so a block composer
/// feeding [`TransactionPool::transactions`] to the greedy updater gets a stable result.
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    entries: HashMap<Hash, PoolEntry>,
    next_sequence: u64,
}

#[derive(Debug, Clone)]
struct PoolEntry {
    sequence: u64,
    tx: Transaction,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `tx`, returning its hash. Re-adding a known transaction keeps its original
    /// position.
    pub fn add_transaction(&mut self, tx: Transaction) -> Hash {
        let hash = tx.hash();
        if !self.entries.contains_key(&hash) {
            let sequence = self.next_sequence;
            self.next_sequence += 1;
            self.entries.insert(hash, PoolEntry { sequence, tx });
        }
        hash
    }

    pub fn remove_transaction(&mut self, hash: &Hash) -> Option<Transaction> {
        self.entries.remove(hash).map(|entry| entry.tx)
    }

    pub fn get_transaction(&self, hash: &Hash) -> Option<&Transaction> {
        self.entries.get(hash).map(|entry| &entry.tx)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.entries.contains_key(hash)
    }

    /// Pending transactions in arrival order.
    pub fn transactions(&self) -> Vec<Transaction> {
        let mut entries: Vec<&PoolEntry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.sequence);
        entries.into_iter().map(|entry| entry.tx.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every transaction that is not valid on its own against `utxo_set`, returning
    /// the hashes removed.
    ///
    /// Each transaction is checked independently; two pending transactions spending the same
    /// output both survive.
    pub fn retain_valid<V: SignatureVerifier + ?Sized>(
        &mut self,
        utxo_set: &UtxoSet,
        verifier: &V,
    ) -> Vec<Hash> {
        let mut removed = Vec::new();
        self.entries.retain(|hash, entry| {
            let keep = is_valid_tx(&entry.tx, utxo_set, verifier);
            if !keep {
                removed.push(*hash);
            }
            keep
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept_all(_: &[u8], _: &[u8], _: &[u8]) -> bool {
        true
    }

    fn spend(n: u8) -> Transaction {
        Transaction::new(
            vec![TransactionInput::unsigned(OutPoint::new([n; 32], 0))],
            vec![TransactionOutput { value: 1, recipient: vec![n] }],
        )
    }

    #[test]
    fn test_add_and_remove() {
        let mut pool = TransactionPool::new();
        let hash = pool.add_transaction(spend(1));

        assert!(pool.contains(&hash));
        assert_eq!(pool.get_transaction(&hash), Some(&spend(1)));
        assert_eq!(pool.remove_transaction(&hash), Some(spend(1)));
        assert!(pool.is_empty());
        assert_eq!(pool.remove_transaction(&hash), None);
    }

    #[test]
    fn test_arrival_order_preserved() {
        let mut pool = TransactionPool::new();
        for n in [5, 1, 9, 3] {
            pool.add_transaction(spend(n));
        }
        pool.add_transaction(spend(5));

        assert_eq!(pool.len(), 4);
        assert_eq!(
            pool.transactions(),
            vec![spend(5), spend(1), spend(9), spend(3)]
        );
    }

    #[test]
    fn test_retain_valid() {
        let mut pool = TransactionPool::new();
        let kept = pool.add_transaction(spend(1));
        let dropped = pool.add_transaction(spend(2));

        let mut utxo_set = UtxoSet::new();
        utxo_set.insert(
            OutPoint::new([1; 32], 0),
            TransactionOutput { value: 1, recipient: vec![] },
        );

        let removed = pool.retain_valid(&utxo_set, &accept_all);

        assert_eq!(removed, vec![dropped]);
        assert!(pool.contains(&kept));
        assert_eq!(pool.len(), 1);
    }
}
