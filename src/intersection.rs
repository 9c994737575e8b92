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

use crate::tid_set::{bit_is_set, clear_bits, TidSet, TidSetEntry};
use crate::vec_sets::{difference, intersection, union};

// Intersects two tid-sets over the same universe. The result is
// re-encoded in its cheapest format and returned with its support.
pub fn intersect(a: &TidSetEntry, b: &TidSetEntry) -> (TidSetEntry, u32) {
    assert_eq!(a.universe(), b.universe(), "tid-sets from different partitions");
    let universe = a.universe();
    let result = match (a.set(), b.set()) {
        (TidSet::TidList(x), TidSet::TidList(y)) => {
            TidSetEntry::from_tids(intersection(x, y), universe)
        }
        // Absent from the result if absent from either side.
        (TidSet::DifList(x), TidSet::DifList(y)) => {
            TidSetEntry::from_dif_list(union(x, y), universe)
        }
        (TidSet::BitVector(x), TidSet::BitVector(y)) => {
            let bits = x.iter().zip(y.iter()).map(|(p, q)| p & q).collect();
            TidSetEntry::from_bit_vector(bits, universe)
        }
        (TidSet::TidList(tids), TidSet::DifList(excluded))
        | (TidSet::DifList(excluded), TidSet::TidList(tids)) => {
            TidSetEntry::from_tids(difference(tids, excluded), universe)
        }
        (TidSet::TidList(tids), TidSet::BitVector(bits))
        | (TidSet::BitVector(bits), TidSet::TidList(tids)) => {
            let kept = tids.iter().cloned().filter(|&t| bit_is_set(bits, t)).collect();
            TidSetEntry::from_tids(kept, universe)
        }
        (TidSet::DifList(excluded), TidSet::BitVector(bits))
        | (TidSet::BitVector(bits), TidSet::DifList(excluded)) => {
            let mut bits = bits.clone();
            clear_bits(&mut bits, excluded);
            TidSetEntry::from_bit_vector(bits, universe)
        }
    };
    let support = result.support();
    (result, support)
}
