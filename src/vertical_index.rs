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

use crate::error::Result;
use crate::item::Item;
use crate::prefix_partitioning::Partition;
use crate::tid_list_index::TidListIndex;
use crate::tid_set::{Format, TidSetEntry, ALL_FORMATS};
use fnv::FnvHashMap;
use itertools::Itertools;
use serde::Serialize;

// How many tid-sets of an index were stored in each format, and the bytes
// they took, next to what storing every set as a tid-list would cost.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FormatStats {
    pub tid_lists: u64,
    pub dif_lists: u64,
    pub bit_vectors: u64,
    pub tid_list_bytes: u64,
    pub dif_list_bytes: u64,
    pub bit_vector_bytes: u64,
    pub naive_bytes: u64,
}

impl FormatStats {
    pub fn record(&mut self, entry: &TidSetEntry) {
        let bytes = entry.size_bytes();
        match entry.format() {
            Format::TidList => {
                self.tid_lists += 1;
                self.tid_list_bytes += bytes;
            }
            Format::DifList => {
                self.dif_lists += 1;
                self.dif_list_bytes += bytes;
            }
            Format::BitVector => {
                self.bit_vectors += 1;
                self.bit_vector_bytes += bytes;
            }
        }
        self.naive_bytes += 4 * entry.support() as u64;
    }

    pub fn merge(&mut self, other: &FormatStats) {
        self.tid_lists += other.tid_lists;
        self.dif_lists += other.dif_lists;
        self.bit_vectors += other.bit_vectors;
        self.tid_list_bytes += other.tid_list_bytes;
        self.dif_list_bytes += other.dif_list_bytes;
        self.bit_vector_bytes += other.bit_vector_bytes;
        self.naive_bytes += other.naive_bytes;
    }

    pub fn count(&self, format: Format) -> u64 {
        match format {
            Format::TidList => self.tid_lists,
            Format::DifList => self.dif_lists,
            Format::BitVector => self.bit_vectors,
        }
    }

    // e.g. "0 tid-list, 1 dif-list, 2 bit-vector"
    pub fn summary(&self) -> String {
        ALL_FORMATS
            .iter()
            .map(|&format| format!("{} {}", self.count(format), format.name()))
            .join(", ")
    }

    pub fn entries(&self) -> u64 {
        self.tid_lists + self.dif_lists + self.bit_vectors
    }

    pub fn total_bytes(&self) -> u64 {
        self.tid_list_bytes + self.dif_list_bytes + self.bit_vector_bytes
    }

    // Naive bytes over hybrid bytes; 1.0 when nothing is stored.
    pub fn reduction_factor(&self) -> f64 {
        match self.total_bytes() {
            0 if self.naive_bytes == 0 => 1.0,
            0 => f64::INFINITY,
            total => self.naive_bytes as f64 / total as f64,
        }
    }
}

// Vertical layout of one partition with every tid-set in its cheapest
// format. The prefix item is in every suffix, so its set is always the
// full range and costs nothing as an empty dif-list.
pub struct HybridVerticalIndex {
    partition_item: Item,
    entries: FnvHashMap<Item, TidSetEntry>,
    stats: FormatStats,
}

impl HybridVerticalIndex {
    pub fn build(partition: &Partition, promising: &[Item]) -> Result<HybridVerticalIndex> {
        Ok(HybridVerticalIndex::from_index(TidListIndex::build(
            partition, promising,
        )?))
    }

    // Builds from explicit tid-lists over local tids `0..universe`.
    #[cfg(test)]
    pub fn from_tid_lists(
        partition_item: Item,
        universe: u32,
        lists: Vec<(Item, Vec<u32>)>,
    ) -> Result<HybridVerticalIndex> {
        Ok(HybridVerticalIndex::from_index(
            TidListIndex::from_tid_lists(partition_item, universe, lists)?,
        ))
    }

    fn from_index(index: TidListIndex) -> HybridVerticalIndex {
        let partition_item = index.partition_item();
        let universe = index.universe();
        let mut stats = FormatStats::default();
        let entries: FnvHashMap<Item, TidSetEntry> = index
            .into_lists()
            .into_iter()
            .map(|(item, tids)| {
                let entry = TidSetEntry::from_tids(tids, universe);
                stats.record(&entry);
                (item, entry)
            })
            .collect();
        HybridVerticalIndex {
            partition_item,
            entries,
            stats,
        }
    }

    pub fn partition_item(&self) -> Item {
        self.partition_item
    }

    pub fn entry(&self, item: Item) -> Option<&TidSetEntry> {
        self.entries.get(&item)
    }

    #[cfg(test)]
    pub fn support(&self, item: Item) -> u32 {
        self.entries.get(&item).map_or(0, |e| e.support())
    }

    pub fn stats(&self) -> &FormatStats {
        &self.stats
    }

    // (hybrid bytes, bytes as plain tid-lists).
    pub fn memory_comparison(&self) -> (u64, u64) {
        (self.stats.total_bytes(), self.stats.naive_bytes)
    }
}
