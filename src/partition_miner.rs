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

use crate::error::{PtfError, Result};
use crate::intersection::intersect;
use crate::item::Item;
use crate::itemset::ItemSet;
use crate::prefix_partitioning::Partition;
use crate::tid_list_index::TidListIndex;
use crate::tid_set::TidSetEntry;
use crate::top_k::TopKItemsets;
use crate::vec_sets;
use crate::vertical_index::{FormatStats, HybridVerticalIndex};
use fnv::{FnvHashMap, FnvHashSet};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::str::FromStr;

// Per-item tid-sets of one partition, and how to intersect them.
pub trait VerticalStorage {
    type TidSet;

    fn partition_item(&self) -> Item;
    fn tid_set(&self, item: Item) -> Option<&Self::TidSet>;
    // The intersection and its support.
    fn intersect(&self, a: &Self::TidSet, b: &Self::TidSet) -> (Self::TidSet, u32);
}

impl VerticalStorage for TidListIndex {
    type TidSet = Vec<u32>;

    fn partition_item(&self) -> Item {
        TidListIndex::partition_item(self)
    }

    fn tid_set(&self, item: Item) -> Option<&Vec<u32>> {
        self.tid_list(item)
    }

    fn intersect(&self, a: &Vec<u32>, b: &Vec<u32>) -> (Vec<u32>, u32) {
        let tids = vec_sets::intersection(a, b);
        let support = tids.len() as u32;
        (tids, support)
    }
}

impl VerticalStorage for HybridVerticalIndex {
    type TidSet = TidSetEntry;

    fn partition_item(&self) -> Item {
        HybridVerticalIndex::partition_item(self)
    }

    fn tid_set(&self, item: Item) -> Option<&TidSetEntry> {
        self.entry(item)
    }

    fn intersect(&self, a: &TidSetEntry, b: &TidSetEntry) -> (TidSetEntry, u32) {
        intersect(a, b)
    }
}

// The optional candidate filters applied on top of the hash table check.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PruningRules {
    // Skip when the sibling's cached support no longer beats the threshold.
    pub timeliness: bool,
    // Skip when {last, y2} isn't a held 2-itemset.
    pub last_item: bool,
}

impl PruningRules {
    pub fn none() -> PruningRules {
        PruningRules::default()
    }

    pub fn all() -> PruningRules {
        PruningRules {
            timeliness: true,
            last_item: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MineStats {
    pub intersections: u64,
    pub candidates: u64,
    pub unseen_siblings: u64,
    pub timeliness_pruned: u64,
    pub last_item_pruned: u64,
    pub inserted: u64,
    pub formats: Option<FormatStats>,
}

impl MineStats {
    pub fn merge(&mut self, other: &MineStats) {
        self.intersections += other.intersections;
        self.candidates += other.candidates;
        self.unseen_siblings += other.unseen_siblings;
        self.timeliness_pruned += other.timeliness_pruned;
        self.last_item_pruned += other.last_item_pruned;
        self.inserted += other.inserted;
        if let Some(ref formats) = other.formats {
            self.formats
                .get_or_insert_with(FormatStats::default)
                .merge(formats);
        }
    }
}

#[derive(Clone, Debug)]
pub struct MineOutcome {
    pub threshold: u32,
    pub stats: MineStats,
}

struct Candidate<T> {
    tid_set: T,
    support: u32,
}

fn mine_error(item: Item, message: String) -> PtfError {
    PtfError::Mine { item, message }
}

// High-support-first search over the itemsets rooted at the storage's
// partition item. Itemsets of three or more items whose support beats the
// threshold are inserted into `top_k`. `promising` must be strictly
// ascending and start with the partition item.
pub fn search<S: VerticalStorage>(
    storage: &S,
    promising: &[Item],
    top_k: &mut TopKItemsets,
    threshold: u32,
    rules: PruningRules,
) -> Result<MineOutcome> {
    let partition_item = storage.partition_item();
    if promising.first() != Some(&partition_item) {
        return Err(mine_error(
            partition_item,
            "promising items don't start with the partition item".to_owned(),
        ));
    }

    let mut stats = MineStats::default();
    let mut threshold = threshold;
    let mut table: FnvHashMap<ItemSet, Candidate<S::TidSet>> = FnvHashMap::default();
    let mut queue: BinaryHeap<(u32, Reverse<ItemSet>)> = BinaryHeap::new();
    let mut held_pairs: FnvHashSet<ItemSet> = if rules.last_item {
        top_k.pairs()
    } else {
        FnvHashSet::default()
    };

    let tid_set_of = move |item: Item| {
        storage
            .tid_set(item)
            .ok_or_else(|| mine_error(partition_item, format!("no tid-set for item {}", item)))
    };

    let prefix = tid_set_of(partition_item)?;
    for &y in &promising[1..] {
        let (tid_set, support) = storage.intersect(prefix, tid_set_of(y)?);
        stats.intersections += 1;
        if support > threshold {
            let pair = ItemSet::pair(partition_item, y);
            table.insert(pair.clone(), Candidate { tid_set, support });
            queue.push((support, Reverse(pair)));
        }
    }

    while let Some((support, Reverse(itemset))) = queue.pop() {
        if support <= threshold {
            break;
        }
        if itemset.len() >= 3 && top_k.insert(support, itemset.clone()) {
            stats.inserted += 1;
            threshold = threshold.max(top_k.threshold());
            if rules.last_item {
                held_pairs = top_k.pairs();
            }
        }

        let last = itemset.last();
        let position = promising.binary_search(&last).map_err(|_| {
            mine_error(partition_item, format!("{} is not a promising item", last))
        })?;
        let current = match table.get(&itemset) {
            Some(candidate) => candidate,
            None => {
                return Err(mine_error(
                    partition_item,
                    format!("{} was queued without a tid-set", itemset),
                ))
            }
        };

        // New itemsets are one item longer than any sibling looked up
        // here, so they're added to the table after the scan.
        let mut extensions = vec![];
        let base = itemset.without(last);
        for &y2 in &promising[position + 1..] {
            stats.candidates += 1;
            let with_y2 = base.with(y2);
            let sibling = match table.get(&with_y2) {
                Some(sibling) => sibling,
                None => {
                    stats.unseen_siblings += 1;
                    continue;
                }
            };
            if rules.timeliness && sibling.support <= threshold {
                stats.timeliness_pruned += 1;
                continue;
            }
            if rules.last_item && !held_pairs.contains(&ItemSet::pair(last, y2)) {
                stats.last_item_pruned += 1;
                continue;
            }
            let (tid_set, extended_support) = storage.intersect(&current.tid_set, &sibling.tid_set);
            stats.intersections += 1;
            if extended_support > threshold {
                trace!("{} has support {}", itemset.with(y2), extended_support);
                extensions.push((
                    itemset.with(y2),
                    Candidate {
                        tid_set,
                        support: extended_support,
                    },
                ));
            }
        }
        for (extended, candidate) in extensions {
            queue.push((candidate.support, Reverse(extended.clone())));
            table.insert(extended, candidate);
        }
    }

    Ok(MineOutcome { threshold, stats })
}

// Mines one partition, growing `top_k` with the itemsets it finds.
pub trait PartitionMiner: Send + Sync {
    fn name(&self) -> &'static str;

    fn mine(
        &self,
        partition: &Partition,
        promising: &[Item],
        top_k: &mut TopKItemsets,
        threshold: u32,
    ) -> Result<MineOutcome>;
}

// Every tid-set stored as a plain list.
pub struct PlainMiner;

impl PartitionMiner for PlainMiner {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn mine(
        &self,
        partition: &Partition,
        promising: &[Item],
        top_k: &mut TopKItemsets,
        threshold: u32,
    ) -> Result<MineOutcome> {
        let index = TidListIndex::build(partition, promising)?;
        search(&index, promising, top_k, threshold, PruningRules::none())
    }
}

fn mine_hybrid(
    partition: &Partition,
    promising: &[Item],
    top_k: &mut TopKItemsets,
    threshold: u32,
    rules: PruningRules,
) -> Result<MineOutcome> {
    let index = HybridVerticalIndex::build(partition, promising)?;
    let (hybrid_bytes, naive_bytes) = index.memory_comparison();
    debug!(
        "Partition {}: {} tid-sets ({}) in {} bytes, {} as tid-lists ({:.1}x)",
        partition.item(),
        index.stats().entries(),
        index.stats().summary(),
        hybrid_bytes,
        naive_bytes,
        index.stats().reduction_factor()
    );
    let mut outcome = search(&index, promising, top_k, threshold, rules)?;
    outcome.stats.formats = Some(index.stats().clone());
    Ok(outcome)
}

// Tid-sets in their cheapest format.
pub struct HybridMiner;

impl PartitionMiner for HybridMiner {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn mine(
        &self,
        partition: &Partition,
        promising: &[Item],
        top_k: &mut TopKItemsets,
        threshold: u32,
    ) -> Result<MineOutcome> {
        mine_hybrid(partition, promising, top_k, threshold, PruningRules::none())
    }
}

// Hybrid storage plus the timeliness and last-item candidate checks.
pub struct PruningMiner;

impl PartitionMiner for PruningMiner {
    fn name(&self) -> &'static str {
        "pruning"
    }

    fn mine(
        &self,
        partition: &Partition,
        promising: &[Item],
        top_k: &mut TopKItemsets,
        threshold: u32,
    ) -> Result<MineOutcome> {
        mine_hybrid(partition, promising, top_k, threshold, PruningRules::all())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strategy {
    Plain,
    Hybrid,
    HybridPruning,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match *self {
            Strategy::Plain => "plain",
            Strategy::Hybrid => "hybrid",
            Strategy::HybridPruning => "pruning",
        }
    }

    pub fn miner(&self) -> Box<dyn PartitionMiner> {
        match *self {
            Strategy::Plain => Box::new(PlainMiner),
            Strategy::Hybrid => Box::new(HybridMiner),
            Strategy::HybridPruning => Box::new(PruningMiner),
        }
    }
}

impl Default for Strategy {
    fn default() -> Strategy {
        Strategy::HybridPruning
    }
}

impl FromStr for Strategy {
    type Err = PtfError;

    fn from_str(s: &str) -> Result<Strategy> {
        match s.trim().to_lowercase().as_str() {
            "plain" => Ok(Strategy::Plain),
            "hybrid" => Ok(Strategy::Hybrid),
            "pruning" | "hybrid-pruning" => Ok(Strategy::HybridPruning),
            other => Err(PtfError::Config(format!(
                "unknown strategy {:?}, expected plain, hybrid or pruning",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Strategy;
    use crate::co_occurrence::CoOccurrence;
    use crate::promising_items::{build_promising_items, partitions_worth_mining};
    use crate::prefix_partitioning::PrefixPartitions;
    use crate::transaction_db::TransactionDb;
    use proptest::prelude::*;

    fn items(ids: &[u32]) -> Vec<Item> {
        ids.iter().map(|&id| Item::with_id(id)).collect()
    }

    fn lists(entries: &[(u32, &[u32])]) -> Vec<(Item, Vec<u32>)> {
        entries
            .iter()
            .map(|&(item, tids)| (Item::with_id(item), tids.to_vec()))
            .collect()
    }

    // Rows [1,2], [1,3], [2,3], [1,2,3], [1,2] read as tids 0..5 with the
    // prefix item taken to cover every row.
    fn five_rows() -> Vec<(Item, Vec<u32>)> {
        lists(&[(1, &[0, 1, 2, 3, 4]), (2, &[0, 2, 3, 4]), (3, &[1, 2, 3])])
    }

    fn scenario_two() -> Vec<(Item, Vec<u32>)> {
        lists(&[
            (2, &[2, 4, 5, 6, 7, 8]),
            (9, &[2, 4, 5, 6, 7, 8]),
            (10, &[2, 5, 6, 7, 8, 11]),
        ])
    }

    #[test]
    fn test_three_itemset_from_five_rows() {
        let one = Item::with_id(1);
        let plain = TidListIndex::from_tid_lists(one, 5, five_rows()).unwrap();
        let hybrid = HybridVerticalIndex::from_tid_lists(one, 5, five_rows()).unwrap();

        let mut top_k = TopKItemsets::new(3);
        let outcome = search(&plain, &items(&[1, 2, 3]), &mut top_k, 1, PruningRules::none())
            .unwrap();
        assert_eq!(top_k.ranked(), vec![(ItemSet::from_ids(&[1, 2, 3]), 2)]);
        assert_eq!(outcome.threshold, 2);
        // Two pairs, then one extension.
        assert_eq!(outcome.stats.intersections, 3);
        assert_eq!(outcome.stats.inserted, 1);

        let mut hybrid_top_k = TopKItemsets::new(3);
        let hybrid_outcome = search(
            &hybrid,
            &items(&[1, 2, 3]),
            &mut hybrid_top_k,
            1,
            PruningRules::none(),
        )
        .unwrap();
        assert_eq!(hybrid_top_k.ranked(), top_k.ranked());
        assert_eq!(hybrid_outcome.stats, outcome.stats);
    }

    #[test]
    fn test_no_three_itemset_at_high_threshold() {
        let one = Item::with_id(1);
        let index = HybridVerticalIndex::from_tid_lists(one, 5, five_rows()).unwrap();
        let mut top_k = TopKItemsets::new(3);
        let outcome = search(&index, &items(&[1, 2, 3]), &mut top_k, 2, PruningRules::none())
            .unwrap();
        assert!(top_k.is_empty());
        assert_eq!(outcome.threshold, 2);
    }

    #[test]
    fn test_explicit_tid_sets() {
        let two = Item::with_id(2);
        let promising = items(&[2, 9, 10]);
        let expected = vec![(ItemSet::from_ids(&[2, 9, 10]), 5)];

        let plain = TidListIndex::from_tid_lists(two, 12, scenario_two()).unwrap();
        let mut top_k = TopKItemsets::new(4);
        search(&plain, &promising, &mut top_k, 0, PruningRules::none()).unwrap();
        assert_eq!(top_k.ranked(), expected);

        let hybrid = HybridVerticalIndex::from_tid_lists(two, 12, scenario_two()).unwrap();
        let mut top_k = TopKItemsets::new(4);
        search(&hybrid, &promising, &mut top_k, 0, PruningRules::none()).unwrap();
        assert_eq!(top_k.ranked(), expected);

        // The last-item check needs {9, 10} held.
        let mut top_k = TopKItemsets::new(4);
        top_k.insert(5, ItemSet::from_ids(&[9, 10]));
        let outcome = search(&hybrid, &promising, &mut top_k, 0, PruningRules::all()).unwrap();
        assert_eq!(top_k.support_of(&ItemSet::from_ids(&[2, 9, 10])), Some(5));
        assert_eq!(outcome.stats.last_item_pruned, 0);

        let mut top_k = TopKItemsets::new(4);
        let outcome = search(&hybrid, &promising, &mut top_k, 0, PruningRules::all()).unwrap();
        assert!(top_k.is_empty());
        assert_eq!(outcome.stats.last_item_pruned, 1);
    }

    #[test]
    fn test_sample_partition() {
        let db = TransactionDb::from_transactions(
            include_str!("../data/sample.txt")
                .lines()
                .map(|line| crate::transaction_reader::parse_transaction(line).unwrap()),
        );
        let partitions = PrefixPartitions::new(&db);
        let partition = partitions.get(Item::with_id(2)).unwrap();
        let co = CoOccurrence::compute(&partitions, false);

        for strategy in &[Strategy::Plain, Strategy::Hybrid, Strategy::HybridPruning] {
            let mut top_k = TopKItemsets::seeded(8, co.ranked());
            let outcome = strategy
                .miner()
                .mine(partition, &items(&[2, 9, 10]), &mut top_k, 3)
                .unwrap();
            assert_eq!(outcome.threshold, 4, "{}", strategy.name());
            assert_eq!(top_k.support_of(&ItemSet::from_ids(&[2, 9, 10])), Some(4));
            assert_eq!(top_k.support_of(&ItemSet::from_ids(&[2, 4])), None);
            assert_eq!(top_k.len(), 8);
            assert_eq!(
                outcome.stats.formats.is_some(),
                *strategy != Strategy::Plain
            );
        }
    }

    #[test]
    fn test_promising_must_start_with_partition_item() {
        let two = Item::with_id(2);
        let index = HybridVerticalIndex::from_tid_lists(two, 12, scenario_two()).unwrap();
        let mut top_k = TopKItemsets::new(4);
        match search(&index, &items(&[9, 10]), &mut top_k, 0, PruningRules::none()) {
            Err(PtfError::Mine { item, .. }) => assert_eq!(item, two),
            other => panic!("expected a mining error, got {:?}", other.map(|o| o.threshold)),
        }
        match search(&index, &items(&[2, 7]), &mut top_k, 0, PruningRules::none()) {
            Err(PtfError::Mine { .. }) => {}
            other => panic!("expected a mining error, got {:?}", other.map(|o| o.threshold)),
        }
    }

    #[test]
    fn test_strategy_from_str() {
        let cases = [
            ("plain", Some(Strategy::Plain)),
            ("hybrid", Some(Strategy::Hybrid)),
            ("pruning", Some(Strategy::HybridPruning)),
            (" Hybrid-Pruning ", Some(Strategy::HybridPruning)),
            ("fast", None),
        ];
        for &(text, expected) in cases.iter() {
            assert_eq!(text.parse::<Strategy>().ok(), expected, "{:?}", text);
        }
        assert_eq!(Strategy::default(), Strategy::HybridPruning);
    }

    fn database() -> impl proptest::strategy::Strategy<Value = Vec<Vec<u32>>> {
        proptest::collection::vec(proptest::collection::vec(0u32..8, 1..6), 1..14)
    }

    proptest! {
        #[test]
        fn prop_pruning_is_safe(rows in database(), k in 1usize..16) {
            let db = TransactionDb::from_ids(&rows);
            let partitions = PrefixPartitions::new(&db);
            let co = CoOccurrence::compute(&partitions, false);
            let seed = TopKItemsets::seeded(k, co.ranked());
            let threshold = seed.threshold();
            let mut promising = build_promising_items(&seed, db.items(), &co, threshold);
            for item in partitions_worth_mining(&mut promising, &co, threshold) {
                let partition = partitions.get(item).unwrap();
                let ar = &promising[&item];

                let mut plain_top_k = seed.clone();
                let plain = PlainMiner.mine(partition, ar, &mut plain_top_k, threshold).unwrap();
                let mut hybrid_top_k = seed.clone();
                let hybrid = HybridMiner.mine(partition, ar, &mut hybrid_top_k, threshold).unwrap();
                let mut pruned_top_k = seed.clone();
                let pruned = PruningMiner.mine(partition, ar, &mut pruned_top_k, threshold).unwrap();

                prop_assert_eq!(plain_top_k.all(), hybrid_top_k.all());
                prop_assert_eq!(plain.stats.intersections, hybrid.stats.intersections);
                prop_assert_eq!(hybrid_top_k.all(), pruned_top_k.all());
                prop_assert_eq!(hybrid.threshold, pruned.threshold);
                prop_assert!(pruned.stats.intersections <= hybrid.stats.intersections);
            }
        }
    }
}
