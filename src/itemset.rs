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
use smallvec::SmallVec;
use std::fmt;

// Itemsets mined here rarely grow past a handful of items, so keep them
// inline and only spill to the heap for unusually long patterns.
const INLINE_ITEMS: usize = 8;

// A set of items, always stored sorted ascending and free of duplicates, so
// that equality and hashing depend only on membership.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ItemSet {
    items: SmallVec<[Item; INLINE_ITEMS]>,
}

impl ItemSet {
    pub fn new(items: &[Item]) -> ItemSet {
        let mut items: SmallVec<[Item; INLINE_ITEMS]> = SmallVec::from_slice(items);
        items.sort();
        items.dedup();
        ItemSet { items }
    }

    pub fn singleton(item: Item) -> ItemSet {
        let mut items = SmallVec::new();
        items.push(item);
        ItemSet { items }
    }

    pub fn pair(a: Item, b: Item) -> ItemSet {
        ItemSet::new(&[a, b])
    }

    #[cfg(test)]
    pub fn from_ids(ids: &[u32]) -> ItemSet {
        let items: Vec<Item> = ids.iter().map(|&id| Item::with_id(id)).collect();
        ItemSet::new(&items)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub fn contains(&self, item: Item) -> bool {
        self.items.binary_search(&item).is_ok()
    }

    // The largest item. Itemsets are never empty once they reach the miner.
    pub fn last(&self) -> Item {
        match self.items.last() {
            Some(&item) => item,
            None => panic!("last() called on an empty itemset"),
        }
    }

    pub fn with(&self, item: Item) -> ItemSet {
        let mut items = self.items.clone();
        if let Err(position) = items.binary_search(&item) {
            items.insert(position, item);
        }
        ItemSet { items }
    }

    pub fn without(&self, item: Item) -> ItemSet {
        let items = self.items.iter().cloned().filter(|&x| x != item).collect();
        ItemSet { items }
    }
}

impl fmt::Display for ItemSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ids: Vec<String> = self.items.iter().map(|item| item.to_string()).collect();
        write!(f, "{{{}}}", ids.join(", "))
    }
}
