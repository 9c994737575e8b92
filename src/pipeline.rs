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

use crate::co_occurrence::CoOccurrence;
use crate::config::MinerConfig;
use crate::error::{PtfError, Result};
use crate::itemset::ItemSet;
use crate::metrics::{seconds, RunMetrics};
use crate::orchestrator::PartitionOrchestrator;
use crate::prefix_partitioning::PrefixPartitions;
use crate::promising_items::build_promising_items;
use crate::top_k::TopKItemsets;
use crate::transaction_db::TransactionDb;
use log::Level;
use std::time::Instant;

pub struct MiningResult {
    // By decreasing support, ties by ascending itemset.
    pub itemsets: Vec<(ItemSet, u32)>,
    pub threshold: u32,
    pub initial_threshold: u32,
    pub seed_size: usize,
    pub metrics: RunMetrics,
}

// Finds the `config.top_k` itemsets of highest support in `db`.
pub fn mine_top_k(db: &TransactionDb, config: &MinerConfig) -> Result<MiningResult> {
    if config.top_k == 0 {
        return Err(PtfError::InvalidTopK(0));
    }
    let mut metrics = RunMetrics::for_config(config);
    metrics.transactions = db.len();
    metrics.items = db.items().len();
    metrics.item_occurrences = db.occurrence_count();

    info!("Partitioning {} transactions by prefix item...", db.len());
    let timer = Instant::now();
    let partitions = PrefixPartitions::new(db);
    metrics.partitions = partitions.len();
    metrics.suffix_items = partitions.suffix_item_count();
    metrics.timings.partition = seconds(timer.elapsed());
    info!(
        "Built {} partitions in {:.3} seconds.",
        partitions.len(),
        metrics.timings.partition
    );

    let timer = Instant::now();
    let co_occurrence = CoOccurrence::compute(&partitions, config.is_parallel());
    metrics.timings.rank = seconds(timer.elapsed());
    metrics.co_occurrences = co_occurrence.table().len();
    info!(
        "Counted {} co-occurrences in {:.3} seconds.",
        metrics.co_occurrences, metrics.timings.rank
    );
    if log_enabled!(Level::Debug) {
        for partition in partitions.iter() {
            let paired = co_occurrence
                .partition_ranked(partition.item())
                .map_or(0, |ranked| ranked.len() - 1);
            debug!(
                "Partition {}: {} suffixes, {} co-occurring items",
                partition.item(),
                partition.len(),
                paired
            );
        }
    }

    let timer = Instant::now();
    let seed = TopKItemsets::seeded(config.top_k, co_occurrence.ranked());
    let initial_threshold = seed.threshold();
    let seed_size = seed.len();
    if seed.is_empty() {
        warn!("No items to seed the top-{} set with.", config.top_k);
    }
    let mut promising = build_promising_items(&seed, db.items(), &co_occurrence, initial_threshold);
    metrics.timings.seed = seconds(timer.elapsed());
    info!(
        "Seeded top-{} with {} itemsets, initial threshold {}.",
        config.top_k, seed_size, initial_threshold
    );

    let timer = Instant::now();
    let dispatch =
        PartitionOrchestrator::new(&partitions, &co_occurrence, config).run(seed, &mut promising)?;
    let elapsed = timer.elapsed();
    metrics.timings.merge = seconds(dispatch.merge_time);
    metrics.timings.mine = seconds(elapsed.checked_sub(dispatch.merge_time).unwrap_or(elapsed));

    let itemsets = dispatch.top_k.ranked();
    let threshold = dispatch.top_k.threshold();
    info!(
        "Mined {} partitions in {:.3} seconds, final threshold {}.",
        dispatch.mined.len(),
        seconds(elapsed),
        threshold
    );

    metrics.partitions_mined = dispatch.mined.len();
    metrics.partitions_skipped = dispatch.skipped;
    metrics.batches = dispatch.batches;
    metrics.seed_size = seed_size;
    metrics.initial_threshold = initial_threshold;
    metrics.final_threshold = threshold;
    metrics.itemsets_found = itemsets.len();
    metrics.mining = dispatch.stats;
    metrics.total_seconds = metrics.timings.total();

    Ok(MiningResult {
        itemsets,
        threshold,
        initial_threshold,
        seed_size,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Execution;
    use crate::item::Item;
    use crate::partition_miner::{PartitionMiner, PlainMiner, Strategy};
    use proptest::prelude::*;
    use proptest::strategy::Strategy as _;
    use std::collections::BTreeMap;

    const STRATEGIES: [Strategy; 3] = [Strategy::Plain, Strategy::Hybrid, Strategy::HybridPruning];

    fn sample_db() -> TransactionDb {
        TransactionDb::from_transactions(
            include_str!("../data/sample.txt")
                .lines()
                .map(|line| crate::transaction_reader::parse_transaction(line).unwrap()),
        )
    }

    fn parallel(top_k: usize, strategy: Strategy) -> MinerConfig {
        MinerConfig {
            top_k,
            strategy,
            execution: Execution::Parallel {
                workers: Some(2),
                batch_size: None,
            },
        }
    }

    // Support of every itemset present in at least one transaction.
    fn brute_force(rows: &[Vec<u32>]) -> BTreeMap<ItemSet, u32> {
        let mut counts = BTreeMap::new();
        for row in rows {
            let mut items: Vec<u32> = row.clone();
            items.sort();
            items.dedup();
            for mask in 1u32..(1 << items.len()) {
                let subset: Vec<u32> = (0..items.len())
                    .filter(|&i| mask & (1 << i) != 0)
                    .map(|i| items[i])
                    .collect();
                *counts.entry(ItemSet::from_ids(&subset)).or_insert(0) += 1;
            }
        }
        counts
    }

    #[test]
    fn test_sample_dataset() {
        let db = sample_db();
        for &strategy in STRATEGIES.iter() {
            for config in vec![MinerConfig::sequential(8, strategy), parallel(8, strategy)] {
                let result = mine_top_k(&db, &config).unwrap();
                assert_eq!(result.initial_threshold, 3);
                assert_eq!(result.seed_size, 8);
                assert_eq!(result.threshold, 4);
                let expected: Vec<(ItemSet, u32)> = vec![
                    (ItemSet::from_ids(&[2]), 10),
                    (ItemSet::from_ids(&[10]), 9),
                    (ItemSet::from_ids(&[2, 10]), 7),
                    (ItemSet::from_ids(&[9]), 6),
                    (ItemSet::from_ids(&[2, 9]), 5),
                    (ItemSet::from_ids(&[9, 10]), 5),
                    (ItemSet::from_ids(&[2, 9, 10]), 4),
                    (ItemSet::from_ids(&[4]), 4),
                ];
                assert_eq!(result.itemsets, expected, "{:?}", config);
                assert_eq!(result.metrics.partitions_mined, 1);
                assert_eq!(result.metrics.item_occurrences, 35);
                assert_eq!(result.metrics.suffix_items, 68);
                assert_eq!(result.metrics.itemsets_found, 8);
            }
        }
    }

    #[test]
    fn test_five_rows() {
        let rows = vec![vec![1, 2], vec![1, 3], vec![2, 3], vec![1, 2, 3], vec![1, 2]];
        let db = TransactionDb::from_ids(&rows);

        // Exactly six 1- and 2-itemsets exist; {1, 2, 3} has support 1 and
        // can't beat a full seed.
        let result = mine_top_k(&db, &MinerConfig::sequential(6, Strategy::default())).unwrap();
        assert_eq!(result.threshold, 2);
        let supports: BTreeMap<ItemSet, u32> = result.itemsets.iter().cloned().collect();
        assert_eq!(supports[&ItemSet::from_ids(&[1, 2])], 3);
        assert_eq!(supports[&ItemSet::from_ids(&[1, 3])], 2);
        assert_eq!(supports[&ItemSet::from_ids(&[2, 3])], 2);
        assert!(!supports.contains_key(&ItemSet::from_ids(&[1, 2, 3])));

        // With nothing to beat, partition 1 yields the 3-itemset.
        let partitions = PrefixPartitions::new(&db);
        let partition = partitions.get(Item::with_id(1)).unwrap();
        let promising: Vec<Item> = vec![1, 2, 3].into_iter().map(Item::with_id).collect();
        let mut top_k = TopKItemsets::new(4);
        PlainMiner.mine(partition, &promising, &mut top_k, 0).unwrap();
        assert_eq!(top_k.support_of(&ItemSet::from_ids(&[1, 2, 3])), Some(1));
    }

    #[test]
    fn test_empty_database() {
        let db = TransactionDb::from_ids(&[]);
        let result = mine_top_k(&db, &MinerConfig::sequential(5, Strategy::default())).unwrap();
        assert!(result.itemsets.is_empty());
        assert_eq!(result.threshold, 0);
        assert_eq!(result.seed_size, 0);
    }

    #[test]
    fn test_top_k_larger_than_seed() {
        // Six 1-/2-itemsets leave room for {1,2,3}, but the threshold is
        // already the smallest held support, which it only ties.
        let db = TransactionDb::from_ids(&[vec![1, 2, 3]]);
        for &strategy in STRATEGIES.iter() {
            for &parallel in &[false, true] {
                let config = MinerConfig::new(10, strategy, parallel, None, None).unwrap();
                let result = mine_top_k(&db, &config).unwrap();
                assert_eq!(result.seed_size, 6);
                assert_eq!(result.initial_threshold, 1);
                assert_eq!(result.threshold, 1);
                assert_eq!(result.itemsets.len(), 6, "{:?}", config);
                assert!(result.itemsets.iter().all(|(itemset, support)| {
                    itemset.len() <= 2 && *support == 1
                }));
            }
        }
    }

    #[test]
    fn test_zero_top_k() {
        let db = sample_db();
        let config = MinerConfig::sequential(0, Strategy::default());
        match mine_top_k(&db, &config) {
            Err(PtfError::InvalidTopK(0)) => {}
            _ => panic!("expected an invalid top-k error"),
        }
    }

    fn case() -> impl proptest::strategy::Strategy<Value = (Vec<Vec<u32>>, usize)> {
        proptest::collection::vec(proptest::collection::vec(0u32..7, 1..6), 1..16)
            .prop_flat_map(|rows| {
                let entries = {
                    let db = TransactionDb::from_ids(&rows);
                    let partitions = PrefixPartitions::new(&db);
                    CoOccurrence::compute(&partitions, false).ranked().len()
                };
                (Just(rows), 1..=entries)
            })
    }

    proptest! {
        #[test]
        fn prop_matches_brute_force((rows, k) in case()) {
            let db = TransactionDb::from_ids(&rows);
            let mut expected: Vec<u32> = brute_force(&rows).values().cloned().collect();
            expected.sort_by(|a, b| b.cmp(a));
            expected.truncate(k);

            for &strategy in STRATEGIES.iter() {
                for config in vec![MinerConfig::sequential(k, strategy), parallel(k, strategy)] {
                    let result = mine_top_k(&db, &config).unwrap();
                    let supports: Vec<u32> = result.itemsets.iter().map(|p| p.1).collect();
                    prop_assert_eq!(&supports, &expected);
                    prop_assert_eq!(result.threshold, *expected.last().unwrap());

                    let truth = brute_force(&rows);
                    for (itemset, support) in &result.itemsets {
                        prop_assert_eq!(truth.get(itemset), Some(support));
                    }
                }
            }
        }
    }
}
