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

// A tid-set is the set of local transaction ids (positions within one
// partition) containing an itemset. It's stored in whichever of three
// formats takes the fewest bytes:
//
//   tid-list:   sorted ids present,       4 bytes per id
//   dif-list:   sorted ids absent,        4 bytes per id
//   bit-vector: bit t set iff t present,  ceil(n / 8) bytes
//
// Bits are numbered least significant first within each byte, and bits at
// or past the universe size are always clear.

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    TidList,
    DifList,
    BitVector,
}

impl Format {
    pub fn name(&self) -> &'static str {
        match *self {
            Format::TidList => "tid-list",
            Format::DifList => "dif-list",
            Format::BitVector => "bit-vector",
        }
    }
}

pub const ALL_FORMATS: [Format; 3] = [Format::TidList, Format::DifList, Format::BitVector];

fn bit_vector_len(universe: u32) -> usize {
    (universe as usize + 7) / 8
}

// Byte cost of each format for a tid-set of `support` ids out of `universe`.
pub fn format_cost(format: Format, support: u32, universe: u32) -> u64 {
    match format {
        Format::TidList => 4 * support as u64,
        Format::DifList => 4 * (universe - support) as u64,
        Format::BitVector => bit_vector_len(universe) as u64,
    }
}

// Smallest format; ties favour tid-list, then dif-list.
pub fn choose_format(support: u32, universe: u32) -> Format {
    let mut best = Format::TidList;
    for &format in ALL_FORMATS.iter() {
        if format_cost(format, support, universe) < format_cost(best, support, universe) {
            best = format;
        }
    }
    best
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TidSet {
    TidList(Vec<u32>),
    DifList(Vec<u32>),
    BitVector(Vec<u8>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TidSetEntry {
    universe: u32,
    set: TidSet,
}

impl TidSetEntry {
    // Encodes sorted `tids` in the cheapest format.
    pub fn from_tids(tids: Vec<u32>, universe: u32) -> TidSetEntry {
        assert!(tids.last().map_or(true, |&t| t < universe), "tid out of range");
        match choose_format(tids.len() as u32, universe) {
            Format::TidList => TidSetEntry {
                universe,
                set: TidSet::TidList(tids),
            },
            format => TidSetEntry::encode(&tids, universe, format),
        }
    }

    // Encodes the complement of sorted `excluded` in the cheapest format.
    pub fn from_dif_list(excluded: Vec<u32>, universe: u32) -> TidSetEntry {
        assert!(excluded.last().map_or(true, |&t| t < universe), "tid out of range");
        let support = universe - excluded.len() as u32;
        let set = match choose_format(support, universe) {
            Format::TidList => TidSet::TidList(complement(&excluded, universe)),
            Format::DifList => TidSet::DifList(excluded),
            Format::BitVector => {
                let mut bits = all_bits(universe);
                clear_bits(&mut bits, &excluded);
                TidSet::BitVector(bits)
            }
        };
        TidSetEntry { universe, set }
    }

    // Encodes a bit-vector's contents in the cheapest format.
    pub fn from_bit_vector(bits: Vec<u8>, universe: u32) -> TidSetEntry {
        assert_eq!(bits.len(), bit_vector_len(universe), "bit-vector size mismatch");
        let set = match choose_format(popcount(&bits), universe) {
            Format::TidList => TidSet::TidList(tids_from_bits(&bits, universe, true)),
            Format::DifList => TidSet::DifList(tids_from_bits(&bits, universe, false)),
            Format::BitVector => TidSet::BitVector(bits),
        };
        TidSetEntry { universe, set }
    }

    // Every transaction of the partition, as the prefix item has.
    #[cfg(test)]
    pub fn full(universe: u32) -> TidSetEntry {
        TidSetEntry::from_dif_list(vec![], universe)
    }

    // Encodes sorted `tids` in the given format, whatever its cost.
    pub fn encode(tids: &[u32], universe: u32, format: Format) -> TidSetEntry {
        let set = match format {
            Format::TidList => TidSet::TidList(tids.to_vec()),
            Format::DifList => TidSet::DifList(complement(tids, universe)),
            Format::BitVector => {
                let mut bits = vec![0u8; bit_vector_len(universe)];
                for &tid in tids {
                    bits[(tid / 8) as usize] |= 1 << (tid % 8);
                }
                TidSet::BitVector(bits)
            }
        };
        TidSetEntry { universe, set }
    }

    pub fn set(&self) -> &TidSet {
        &self.set
    }

    pub fn universe(&self) -> u32 {
        self.universe
    }

    pub fn format(&self) -> Format {
        match self.set {
            TidSet::TidList(_) => Format::TidList,
            TidSet::DifList(_) => Format::DifList,
            TidSet::BitVector(_) => Format::BitVector,
        }
    }

    // Support without decoding the set.
    pub fn support(&self) -> u32 {
        match self.set {
            TidSet::TidList(ref tids) => tids.len() as u32,
            TidSet::DifList(ref excluded) => self.universe - excluded.len() as u32,
            TidSet::BitVector(ref bits) => popcount(bits),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        match self.set {
            TidSet::TidList(ref tids) => 4 * tids.len() as u64,
            TidSet::DifList(ref excluded) => 4 * excluded.len() as u64,
            TidSet::BitVector(ref bits) => bits.len() as u64,
        }
    }

    // Decodes to the sorted list of tids.
    #[cfg(test)]
    pub fn tids(&self) -> Vec<u32> {
        match self.set {
            TidSet::TidList(ref tids) => tids.clone(),
            TidSet::DifList(ref excluded) => complement(excluded, self.universe),
            TidSet::BitVector(ref bits) => tids_from_bits(bits, self.universe, true),
        }
    }
}

pub fn popcount(bits: &[u8]) -> u32 {
    bits.iter().map(|b| b.count_ones()).sum()
}

pub fn bit_is_set(bits: &[u8], tid: u32) -> bool {
    bits[(tid / 8) as usize] & (1 << (tid % 8)) != 0
}

pub fn clear_bits(bits: &mut [u8], tids: &[u32]) {
    for &tid in tids {
        bits[(tid / 8) as usize] &= !(1 << (tid % 8));
    }
}

fn all_bits(universe: u32) -> Vec<u8> {
    let mut bits = vec![0xffu8; bit_vector_len(universe)];
    let spare = (bits.len() * 8) as u32 - universe;
    if spare > 0 {
        if let Some(last) = bits.last_mut() {
            *last >>= spare;
        }
    }
    bits
}

// Ids in [0, universe) whose bit equals `set`.
fn tids_from_bits(bits: &[u8], universe: u32, set: bool) -> Vec<u32> {
    (0..universe).filter(|&tid| bit_is_set(bits, tid) == set).collect()
}

// Ids in [0, universe) missing from sorted `tids`.
fn complement(tids: &[u32], universe: u32) -> Vec<u32> {
    let mut result = Vec::with_capacity(universe as usize - tids.len());
    let mut present = tids.iter().peekable();
    for tid in 0..universe {
        if present.peek() == Some(&&tid) {
            present.next();
        } else {
            result.push(tid);
        }
    }
    result
}
