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

use crate::item::Item;
use crate::transaction_db::TransactionDb;
use std::collections::BTreeMap;

// All suffixes of the database that begin with one item. Suffixes borrow
// from the transaction database rather than copying it.
pub struct Partition<'a> {
    item: Item,
    suffixes: Vec<&'a [Item]>,
}

impl<'a> Partition<'a> {
    pub fn new(item: Item, suffixes: Vec<&'a [Item]>) -> Partition<'a> {
        assert!(suffixes.iter().all(|s| s.first() == Some(&item)));
        Partition { item, suffixes }
    }

    pub fn item(&self) -> Item {
        self.item
    }

    pub fn suffixes(&self) -> &[&'a [Item]] {
        &self.suffixes
    }

    // Number of suffixes, which is also the support of the prefix item.
    pub fn len(&self) -> usize {
        self.suffixes.len()
    }
}

// Transaction [1, 2, 3] contributes
//   [1, 2, 3] to the partition of 1,
//   [2, 3]    to the partition of 2,
//   [3]       to the partition of 3.
pub struct PrefixPartitions<'a> {
    partitions: BTreeMap<Item, Partition<'a>>,
}

impl<'a> PrefixPartitions<'a> {
    pub fn new(db: &'a TransactionDb) -> PrefixPartitions<'a> {
        let mut suffixes: BTreeMap<Item, Vec<&'a [Item]>> = BTreeMap::new();
        for transaction in db.transactions() {
            for (position, &prefix) in transaction.iter().enumerate() {
                suffixes
                    .entry(prefix)
                    .or_insert_with(Vec::new)
                    .push(&transaction[position..]);
            }
        }
        let partitions = suffixes
            .into_iter()
            .map(|(item, suffixes)| (item, Partition::new(item, suffixes)))
            .collect();
        PrefixPartitions { partitions }
    }

    pub fn get(&self, item: Item) -> Option<&Partition<'a>> {
        self.partitions.get(&item)
    }

    // Partitions in ascending order of their prefix item.
    pub fn iter(&self) -> impl Iterator<Item = &Partition<'a>> {
        self.partitions.values()
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    // Sum of suffix lengths over every partition.
    pub fn suffix_item_count(&self) -> usize {
        self.iter()
            .flat_map(|p| p.suffixes().iter())
            .map(|s| s.len())
            .sum()
    }
}
