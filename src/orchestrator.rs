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
use crate::config::{Execution, MinerConfig};
use crate::error::{PtfError, Result};
use crate::item::Item;
use crate::itemset::ItemSet;
use crate::partition_miner::{MineStats, PartitionMiner};
use crate::prefix_partitioning::PrefixPartitions;
use crate::promising_items::{partitions_worth_mining, PromisingItems};
use crate::top_k::TopKItemsets;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::time::{Duration, Instant};

// What one worker hands back: everything its private top-k set held once
// its partition was mined.
struct PartitionResult {
    item: Item,
    capacity: usize,
    found: Vec<(u32, ItemSet)>,
    stats: MineStats,
}

pub struct Dispatch {
    pub top_k: TopKItemsets,
    pub mined: Vec<Item>,
    pub skipped: usize,
    pub batches: usize,
    pub stats: MineStats,
    pub merge_time: Duration,
}

// Folds every worker's pairs into a fresh set. The order is fixed (support
// descending, then itemset ascending) so the outcome doesn't depend on
// which worker finished first.
fn merge(capacity: usize, results: &[PartitionResult]) -> Result<TopKItemsets> {
    let mut pairs: Vec<(u32, ItemSet)> = vec![];
    for result in results {
        if result.capacity != capacity {
            return Err(PtfError::Merge(format!(
                "partition {} returned a top-{} set, expected top-{}",
                result.item, result.capacity, capacity
            )));
        }
        pairs.extend(result.found.iter().cloned());
    }
    pairs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    let mut top_k = TopKItemsets::new(capacity);
    for (support, itemset) in pairs {
        top_k.insert(support, itemset);
    }
    Ok(top_k)
}

// Picks the partitions worth mining and runs the configured miner over
// them, one at a time or across a rayon pool.
pub struct PartitionOrchestrator<'a> {
    partitions: &'a PrefixPartitions<'a>,
    co_occurrence: &'a CoOccurrence,
    miner: Box<dyn PartitionMiner>,
    execution: Execution,
}

impl<'a> PartitionOrchestrator<'a> {
    pub fn new(
        partitions: &'a PrefixPartitions<'a>,
        co_occurrence: &'a CoOccurrence,
        config: &MinerConfig,
    ) -> PartitionOrchestrator<'a> {
        PartitionOrchestrator::with_miner(
            partitions,
            co_occurrence,
            config.strategy.miner(),
            config.execution,
        )
    }

    pub fn with_miner(
        partitions: &'a PrefixPartitions<'a>,
        co_occurrence: &'a CoOccurrence,
        miner: Box<dyn PartitionMiner>,
        execution: Execution,
    ) -> PartitionOrchestrator<'a> {
        PartitionOrchestrator {
            partitions,
            co_occurrence,
            miner,
            execution,
        }
    }

    pub fn run(&self, seed: TopKItemsets, promising: &mut PromisingItems) -> Result<Dispatch> {
        let threshold = seed.threshold();
        let qualifying = partitions_worth_mining(promising, self.co_occurrence, threshold);
        let skipped = promising.len() - qualifying.len();
        info!(
            "{} of {} partitions qualify for the {} miner at threshold {}",
            qualifying.len(),
            promising.len(),
            self.miner.name(),
            threshold
        );
        match self.execution {
            Execution::Sequential => self.run_sequential(seed, promising, qualifying, skipped),
            Execution::Parallel {
                workers,
                batch_size,
            } => self.run_parallel(seed, promising, qualifying, skipped, workers, batch_size),
        }
    }

    fn mine_one(
        &self,
        item: Item,
        promising: &PromisingItems,
        top_k: &mut TopKItemsets,
    ) -> Result<MineStats> {
        let partition = self.partitions.get(item).ok_or_else(|| PtfError::Partition {
            item,
            message: "no such partition".to_owned(),
        })?;
        let ar = promising.get(&item).ok_or_else(|| PtfError::Partition {
            item,
            message: "no promising items".to_owned(),
        })?;
        let before = top_k.threshold();
        let outcome = self.miner.mine(partition, ar, top_k, before)?;
        debug!(
            "Partition {} ({} suffixes, {} promising items): {} intersections, {} inserted, threshold {} -> {}",
            item,
            partition.len(),
            ar.len(),
            outcome.stats.intersections,
            outcome.stats.inserted,
            before,
            outcome.threshold
        );
        Ok(outcome.stats)
    }

    fn run_sequential(
        &self,
        seed: TopKItemsets,
        promising: &PromisingItems,
        qualifying: Vec<Item>,
        skipped: usize,
    ) -> Result<Dispatch> {
        let mut top_k = seed;
        let mut stats = MineStats::default();
        for &item in &qualifying {
            stats.merge(&self.mine_one(item, promising, &mut top_k)?);
        }
        Ok(Dispatch {
            top_k,
            mined: qualifying,
            skipped,
            batches: 1,
            stats,
            merge_time: Duration::default(),
        })
    }

    fn run_parallel(
        &self,
        seed: TopKItemsets,
        promising: &PromisingItems,
        qualifying: Vec<Item>,
        skipped: usize,
        workers: Option<usize>,
        batch_size: Option<usize>,
    ) -> Result<Dispatch> {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(workers) = workers {
            builder = builder.num_threads(workers);
        }
        let pool = builder.build()?;
        info!("Dispatching to {} worker threads", pool.current_num_threads());

        let capacity = seed.capacity();
        let chunk = batch_size.unwrap_or_else(|| qualifying.len()).max(1);
        let mut snapshot = seed;
        let mut stats = MineStats::default();
        let mut merge_time = Duration::default();
        let mut batches = 0;
        for batch in qualifying.chunks(chunk) {
            batches += 1;
            let results: Vec<PartitionResult> = pool.install(|| {
                batch
                    .par_iter()
                    .map(|&item| -> Result<PartitionResult> {
                        let mut local = snapshot.clone();
                        let partition_stats = self.mine_one(item, promising, &mut local)?;
                        Ok(PartitionResult {
                            item,
                            capacity: local.capacity(),
                            found: local.all(),
                            stats: partition_stats,
                        })
                    })
                    .collect::<Result<Vec<PartitionResult>>>()
            })?;

            // Each local set started from the snapshot, so the union of
            // locals covers every snapshot entry that wasn't beaten.
            let timer = Instant::now();
            snapshot = merge(capacity, &results)?;
            merge_time += timer.elapsed();
            for result in &results {
                stats.merge(&result.stats);
            }
            if batch_size.is_some() {
                debug!(
                    "Batch {} merged, threshold now {}",
                    batches,
                    snapshot.threshold()
                );
            }
        }

        Ok(Dispatch {
            top_k: snapshot,
            mined: qualifying,
            skipped,
            batches,
            stats,
            merge_time,
        })
    }
}
