// Copyright 2018 Chris Pearce
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::itemset::ItemSet;
use fnv::{FnvHashMap, FnvHashSet};
use std::collections::BTreeSet;

// The best itemsets found so far, bounded to `capacity` entries. Entries
// are ordered by (support, itemset) so the first one is always the entry
// to evict, and its support is the pruning threshold (rmsup).
#[derive(Clone, Debug)]
pub struct TopKItemsets {
    capacity: usize,
    entries: BTreeSet<(u32, ItemSet)>,
    supports: FnvHashMap<ItemSet, u32>,
}

impl TopKItemsets {
    pub fn new(capacity: usize) -> TopKItemsets {
        assert!(capacity > 0, "top-k capacity must be positive");
        TopKItemsets {
            capacity,
            entries: BTreeSet::new(),
            supports: FnvHashMap::default(),
        }
    }

    // Seeds from the head of the co-occurrence list: its first `capacity`
    // entries are the best 1- and 2-itemsets there are.
    pub fn seeded(capacity: usize, ranked: &[(ItemSet, u32)]) -> TopKItemsets {
        let mut top_k = TopKItemsets::new(capacity);
        for (itemset, support) in ranked.iter().take(capacity) {
            top_k.insert(*support, itemset.clone());
        }
        top_k
    }

    // Returns whether the set changed. A repeated itemset keeps the larger
    // of its two supports.
    pub fn insert(&mut self, support: u32, itemset: ItemSet) -> bool {
        if let Some(&current) = self.supports.get(&itemset) {
            if support <= current {
                return false;
            }
            self.entries.remove(&(current, itemset.clone()));
            self.entries.insert((support, itemset.clone()));
            self.supports.insert(itemset, support);
            return true;
        }

        if self.entries.len() >= self.capacity {
            if support <= self.threshold() {
                return false;
            }
            let evicted = match self.entries.iter().next() {
                Some(entry) => entry.clone(),
                None => return false,
            };
            self.entries.remove(&evicted);
            self.supports.remove(&evicted.1);
        }
        self.entries.insert((support, itemset.clone()));
        self.supports.insert(itemset, support);
        true
    }

    // Smallest support currently held, or 0 when nothing is held.
    pub fn threshold(&self) -> u32 {
        match self.entries.iter().next() {
            Some(&(support, _)) => support,
            None => 0,
        }
    }

    pub fn all(&self) -> Vec<(u32, ItemSet)> {
        self.entries.iter().cloned().collect()
    }

    // Held itemsets by decreasing support, ties by ascending itemset.
    pub fn ranked(&self) -> Vec<(ItemSet, u32)> {
        let mut v: Vec<(ItemSet, u32)> = self
            .entries
            .iter()
            .map(|(support, itemset)| (itemset.clone(), *support))
            .collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        v
    }

    // The 2-itemsets currently held.
    pub fn pairs(&self) -> FnvHashSet<ItemSet> {
        self.supports
            .keys()
            .filter(|itemset| itemset.len() == 2)
            .cloned()
            .collect()
    }

    #[cfg(test)]
    pub fn support_of(&self, itemset: &ItemSet) -> Option<u32> {
        self.supports.get(itemset).cloned()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::TopKItemsets;
    use crate::itemset::ItemSet;
    use proptest::prelude::*;

    #[test]
    fn test_insert_below_capacity() {
        let mut top_k = TopKItemsets::new(3);
        assert_eq!(top_k.threshold(), 0);
        assert!(top_k.is_empty());
        assert!(top_k.insert(5, ItemSet::from_ids(&[1])));
        assert!(top_k.insert(8, ItemSet::from_ids(&[2])));
        assert_eq!(top_k.len(), 2);
        assert_eq!(top_k.threshold(), 5);
    }

    #[test]
    fn test_evicts_minimum_when_full() {
        let mut top_k = TopKItemsets::new(2);
        top_k.insert(5, ItemSet::from_ids(&[1]));
        top_k.insert(8, ItemSet::from_ids(&[2]));
        // Equal to the minimum: no-op.
        assert!(!top_k.insert(5, ItemSet::from_ids(&[3])));
        assert!(top_k.insert(6, ItemSet::from_ids(&[1, 2])));
        assert_eq!(top_k.len(), 2);
        assert_eq!(top_k.threshold(), 6);
        assert_eq!(top_k.support_of(&ItemSet::from_ids(&[1])), None);
        assert_eq!(
            top_k.ranked(),
            vec![(ItemSet::from_ids(&[2]), 8), (ItemSet::from_ids(&[1, 2]), 6)]
        );
    }

    #[test]
    fn test_duplicate_keeps_larger_support() {
        let mut top_k = TopKItemsets::new(3);
        top_k.insert(4, ItemSet::from_ids(&[1, 2]));
        top_k.insert(7, ItemSet::from_ids(&[3]));
        assert!(!top_k.insert(2, ItemSet::from_ids(&[2, 1])));
        assert_eq!(top_k.support_of(&ItemSet::from_ids(&[1, 2])), Some(4));
        assert!(top_k.insert(9, ItemSet::from_ids(&[1, 2])));
        assert_eq!(top_k.support_of(&ItemSet::from_ids(&[1, 2])), Some(9));
        assert_eq!(top_k.len(), 2);
        assert_eq!(top_k.threshold(), 7);
    }

    #[test]
    fn test_seeded_takes_head_of_list() {
        let ranked = vec![
            (ItemSet::from_ids(&[0]), 1),
            (ItemSet::from_ids(&[1]), 2),
            (ItemSet::from_ids(&[2]), 10),
            (ItemSet::from_ids(&[3]), 5),
        ];
        let top_k = TopKItemsets::seeded(2, &ranked);
        assert_eq!(top_k.len(), 2);
        assert_eq!(top_k.support_of(&ItemSet::from_ids(&[0])), Some(1));
        assert_eq!(top_k.support_of(&ItemSet::from_ids(&[1])), Some(2));
        assert_eq!(top_k.threshold(), 1);

        let short = TopKItemsets::seeded(5, &ranked[..2]);
        assert_eq!(short.len(), 2);
        assert_eq!(short.threshold(), 1);
    }

    #[test]
    fn test_pairs() {
        let mut top_k = TopKItemsets::new(5);
        top_k.insert(100, ItemSet::from_ids(&[1, 2]));
        top_k.insert(90, ItemSet::from_ids(&[1, 2, 3]));
        top_k.insert(80, ItemSet::from_ids(&[2, 3]));
        top_k.insert(70, ItemSet::from_ids(&[1, 2, 3, 4]));
        top_k.insert(60, ItemSet::from_ids(&[3, 4]));
        let pairs = top_k.pairs();
        assert_eq!(pairs.len(), 3);
        assert!(pairs.contains(&ItemSet::from_ids(&[1, 2])));
        assert!(pairs.contains(&ItemSet::from_ids(&[2, 3])));
        assert!(pairs.contains(&ItemSet::from_ids(&[3, 4])));
        assert!(TopKItemsets::new(2).pairs().is_empty());
    }

    proptest! {
        #[test]
        fn prop_bounded_and_threshold_monotone(
            capacity in 1usize..6,
            inserts in prop::collection::vec((1u32..20, prop::collection::vec(0u32..6, 1..4)), 0..40),
        ) {
            let mut top_k = TopKItemsets::new(capacity);
            let mut last_threshold = 0;
            for (support, ids) in inserts {
                let was_full = top_k.len() == capacity;
                top_k.insert(support, ItemSet::from_ids(&ids));
                prop_assert!(top_k.len() <= capacity);
                // Below capacity the minimum can still drop; once full it
                // only rises.
                if was_full {
                    prop_assert!(top_k.threshold() >= last_threshold);
                }
                last_threshold = top_k.threshold();
                for (support, _) in top_k.all() {
                    prop_assert!(support >= top_k.threshold());
                }
            }
        }
    }
}
