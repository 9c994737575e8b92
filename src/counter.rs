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

use fnv::FnvHashMap;
use std::cmp;
use std::hash::Hash;

pub struct Counter<T> {
    counter: FnvHashMap<T, u32>,
}

impl<T> Counter<T>
where
    T: cmp::Eq,
    T: Hash,
    T: Ord,
    T: Copy,
{
    pub fn new() -> Counter<T> {
        Counter {
            counter: FnvHashMap::default(),
        }
    }
    pub fn add(&mut self, item: &T, count: u32) {
        *self.counter.entry(*item).or_insert(0) += count;
    }
    #[cfg(test)]
    pub fn get(&self, item: &T) -> u32 {
        match self.counter.get(item) {
            Some(count) => *count,
            None => 0,
        }
    }
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.counter.len()
    }
    // (item, count) pairs by decreasing count; equal counts in ascending
    // item order so that the result doesn't depend on hash order.
    pub fn sorted_descending(&self) -> Vec<(T, u32)> {
        let mut v: Vec<(T, u32)> = self.counter.iter().map(|(&item, &count)| (item, count)).collect();
        v.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        v
    }
}
