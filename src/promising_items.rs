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
use crate::item::Item;
use crate::top_k::TopKItemsets;
use itertools::Itertools;
use std::collections::BTreeMap;

// AR_i for every item i: the items still worth combining with i.
pub type PromisingItems = BTreeMap<Item, Vec<Item>>;

// Seeds AR_i from the 1- and 2-itemsets held in `top_k` ({x} puts x in
// AR_x, {x, y} with x < y puts y in AR_x), then drops every y whose exact
// support with i is below `threshold`. Lists come back sorted and
// duplicate free, so i itself leads its own list whenever present.
pub fn build_promising_items(
    top_k: &TopKItemsets,
    items: &[Item],
    co_occurrence: &CoOccurrence,
    threshold: u32,
) -> PromisingItems {
    let mut promising: PromisingItems = items.iter().map(|&item| (item, vec![])).collect();
    for (_, itemset) in top_k.all() {
        match itemset.items() {
            &[x] => promising.entry(x).or_insert_with(Vec::new).push(x),
            &[x, y] => promising.entry(x).or_insert_with(Vec::new).push(y),
            _ => {}
        }
    }

    for (&item, list) in promising.iter_mut() {
        *list = list
            .iter()
            .cloned()
            .filter(|&y| {
                let support = if y == item {
                    co_occurrence.item_support(item)
                } else {
                    co_occurrence.pair_support(item, y)
                };
                support >= threshold
            })
            .sorted()
            .dedup()
            .collect();
    }
    promising
}

// The cheap, table-only pass run before any tid-set is built. Extension
// items whose pair support with the prefix can't beat `threshold` are
// removed, and only partitions that could still yield a 3-itemset are
// returned, in ascending item order.
pub fn partitions_worth_mining(
    promising: &mut PromisingItems,
    co_occurrence: &CoOccurrence,
    threshold: u32,
) -> Vec<Item> {
    let mut qualifying = vec![];
    for (&item, list) in promising.iter_mut() {
        if list.first() != Some(&item) || co_occurrence.item_support(item) <= threshold {
            list.clear();
            continue;
        }
        list.retain(|&y| y == item || co_occurrence.pair_support(item, y) > threshold);
        if list.len() > 2 {
            qualifying.push(item);
        } else {
            trace!("partition {} has only {} promising items, skipping", item, list.len());
        }
    }
    qualifying
}
