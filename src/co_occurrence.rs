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

use crate::counter::Counter;
use crate::item::Item;
use crate::itemset::ItemSet;
use crate::prefix_partitioning::{Partition, PrefixPartitions};
use fnv::FnvHashMap;
use rayon::prelude::*;

pub type SupportTable = FnvHashMap<ItemSet, u32>;

// Co-occurrence counts of one partition: the prefix item alone and the
// prefix paired with each later item, sorted by decreasing count.
pub struct PartitionCounts {
    pub item: Item,
    pub ranked: Vec<(ItemSet, u32)>,
}

// Exact supports of every 1- and 2-itemset in the database, derived from
// the prefix partitions. Within P_i the number of suffixes containing y
// equals the support of {i, y}, so nothing here is an estimate.
pub struct CoOccurrence {
    partitions: Vec<PartitionCounts>,
    ranked: Vec<(ItemSet, u32)>,
    table: SupportTable,
}

fn count_partition(partition: &Partition) -> PartitionCounts {
    let prefix = partition.item();
    let mut counter: Counter<Item> = Counter::new();
    for suffix in partition.suffixes() {
        counter.add(&prefix, 1);
        for item in &suffix[1..] {
            counter.add(item, 1);
        }
    }
    let ranked = counter
        .sorted_descending()
        .into_iter()
        .map(|(item, count)| {
            let itemset = if item == prefix {
                ItemSet::singleton(prefix)
            } else {
                ItemSet::pair(prefix, item)
            };
            (itemset, count)
        })
        .collect();
    PartitionCounts {
        item: prefix,
        ranked,
    }
}

impl CoOccurrence {
    pub fn compute(partitions: &PrefixPartitions, parallel: bool) -> CoOccurrence {
        let all: Vec<&Partition> = partitions.iter().collect();
        let counts: Vec<PartitionCounts> = if parallel {
            all.par_iter().map(|p| count_partition(p)).collect()
        } else {
            all.iter().map(|p| count_partition(p)).collect()
        };

        let mut ranked: Vec<(ItemSet, u32)> = counts
            .iter()
            .flat_map(|c| c.ranked.iter().cloned())
            .collect();
        // Stable: equal counts keep partition order. Only the relative order
        // of counts matters to the search, not how ties fall.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let table = ranked.iter().cloned().collect();
        CoOccurrence {
            partitions: counts,
            ranked,
            table,
        }
    }

    // Every 1- and 2-itemset with its count, by decreasing count.
    pub fn ranked(&self) -> &[(ItemSet, u32)] {
        &self.ranked
    }

    pub fn partition_ranked(&self, item: Item) -> Option<&[(ItemSet, u32)]> {
        self.partitions
            .binary_search_by_key(&item, |c| c.item)
            .ok()
            .map(|index| &self.partitions[index].ranked[..])
    }

    pub fn table(&self) -> &SupportTable {
        &self.table
    }

    pub fn support(&self, itemset: &ItemSet) -> u32 {
        self.table.get(itemset).cloned().unwrap_or(0)
    }

    pub fn item_support(&self, item: Item) -> u32 {
        self.support(&ItemSet::singleton(item))
    }

    pub fn pair_support(&self, a: Item, b: Item) -> u32 {
        self.support(&ItemSet::pair(a, b))
    }
}
