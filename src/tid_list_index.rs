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
use crate::item::Item;
use crate::prefix_partitioning::Partition;
use fnv::{FnvHashMap, FnvHashSet};

// Checks that `promising` is strictly ascending and starts with the
// partition's own item.
pub fn check_promising(partition_item: Item, promising: &[Item]) -> Result<()> {
    if promising.first() != Some(&partition_item) {
        return Err(PtfError::Partition {
            item: partition_item,
            message: format!(
                "promising items must start with the prefix item, got {:?}",
                promising.iter().map(|i| i.id()).collect::<Vec<u32>>()
            ),
        });
    }
    if promising.windows(2).any(|w| w[0] >= w[1]) {
        return Err(PtfError::Partition {
            item: partition_item,
            message: "promising items are not strictly ascending".to_owned(),
        });
    }
    Ok(())
}

// Vertical layout of one partition: for each promising item, the sorted
// local tids of the suffixes containing it. Every tid is stored.
pub struct TidListIndex {
    partition_item: Item,
    universe: u32,
    index: FnvHashMap<Item, Vec<u32>>,
}

impl TidListIndex {
    pub fn build(partition: &Partition, promising: &[Item]) -> Result<TidListIndex> {
        check_promising(partition.item(), promising)?;
        let wanted: FnvHashSet<Item> = promising.iter().cloned().collect();
        let mut index: FnvHashMap<Item, Vec<u32>> =
            promising.iter().map(|&item| (item, vec![])).collect();
        for (tid, suffix) in partition.suffixes().iter().enumerate() {
            for item in suffix.iter().filter(|item| wanted.contains(item)) {
                if let Some(tids) = index.get_mut(item) {
                    tids.push(tid as u32);
                }
            }
        }
        Ok(TidListIndex {
            partition_item: partition.item(),
            universe: partition.len() as u32,
            index,
        })
    }

    // Builds from explicit tid-lists. Each list must be strictly ascending
    // and below `universe`.
    #[cfg(test)]
    pub fn from_tid_lists(
        partition_item: Item,
        universe: u32,
        lists: Vec<(Item, Vec<u32>)>,
    ) -> Result<TidListIndex> {
        let mut index = FnvHashMap::default();
        for (item, tids) in lists {
            let ascending = tids.windows(2).all(|w| w[0] < w[1]);
            if !ascending || tids.last().map_or(false, |&t| t >= universe) {
                return Err(PtfError::Partition {
                    item: partition_item,
                    message: format!(
                        "tid-list for item {} must be ascending and below {}",
                        item, universe
                    ),
                });
            }
            index.insert(item, tids);
        }
        if !index.contains_key(&partition_item) {
            return Err(PtfError::Partition {
                item: partition_item,
                message: "no tid-list for the prefix item".to_owned(),
            });
        }
        Ok(TidListIndex {
            partition_item,
            universe,
            index,
        })
    }

    pub fn partition_item(&self) -> Item {
        self.partition_item
    }

    // Number of transactions in the partition.
    pub fn universe(&self) -> u32 {
        self.universe
    }

    pub fn tid_list(&self, item: Item) -> Option<&Vec<u32>> {
        self.index.get(&item)
    }

    pub fn into_lists(self) -> FnvHashMap<Item, Vec<u32>> {
        self.index
    }
}
