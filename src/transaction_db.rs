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
use crate::transaction_reader::TransactionReader;
use itertools::Itertools;

// The loaded transaction database. Every transaction is sorted ascending
// and duplicate free; empty transactions are dropped on the way in.
pub struct TransactionDb {
    transactions: Vec<Vec<Item>>,
    items: Vec<Item>,
}

impl TransactionDb {
    pub fn load(path: &str) -> Result<TransactionDb> {
        let transactions = TransactionReader::open(path)?.collect::<Result<Vec<_>>>()?;
        let db = TransactionDb::from_transactions(transactions);
        if db.is_empty() {
            warn!("{} contains no transactions", path);
        }
        Ok(db)
    }

    pub fn from_transactions<I>(transactions: I) -> TransactionDb
    where
        I: IntoIterator<Item = Vec<Item>>,
    {
        let transactions: Vec<Vec<Item>> = transactions
            .into_iter()
            .map(|transaction| transaction.into_iter().sorted().dedup().collect::<Vec<Item>>())
            .filter(|transaction| !transaction.is_empty())
            .collect();
        let items = transactions
            .iter()
            .flat_map(|transaction| transaction.iter().cloned())
            .sorted()
            .dedup()
            .collect();
        TransactionDb {
            transactions,
            items,
        }
    }

    #[cfg(test)]
    pub fn from_ids(transactions: &[Vec<u32>]) -> TransactionDb {
        TransactionDb::from_transactions(
            transactions
                .iter()
                .map(|t| t.iter().map(|&id| Item::with_id(id)).collect::<Vec<Item>>()),
        )
    }

    pub fn transactions(&self) -> &[Vec<Item>] {
        &self.transactions
    }

    // The distinct items of the database, ascending.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    // Total number of item occurrences summed over all transactions.
    pub fn occurrence_count(&self) -> usize {
        self.transactions.iter().map(|t| t.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::TransactionDb;
    use crate::error::PtfError;
    use crate::item::Item;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn to_item_vec(nums: &[u32]) -> Vec<Item> {
        nums.iter().map(|&i| Item::with_id(i)).collect()
    }

    #[test]
    fn test_from_transactions_normalizes() {
        let db = TransactionDb::from_ids(&[vec![3, 1, 2], vec![], vec![5, 5, 1], vec![2]]);
        assert_eq!(db.len(), 3);
        assert_eq!(db.transactions()[0], to_item_vec(&[1, 2, 3]));
        assert_eq!(db.transactions()[1], to_item_vec(&[1, 5]));
        assert_eq!(db.items(), &to_item_vec(&[1, 2, 3, 5])[..]);
        assert_eq!(db.occurrence_count(), 6);
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1 2 3").unwrap();
        writeln!(file, "").unwrap();
        writeln!(file, "3 2").unwrap();
        writeln!(file, "4").unwrap();
        let db = TransactionDb::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(db.len(), 3);
        assert_eq!(db.items(), &to_item_vec(&[1, 2, 3, 4])[..]);
        assert_eq!(db.transactions()[1], to_item_vec(&[2, 3]));
    }

    #[test]
    fn test_load_propagates_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1 2").unwrap();
        writeln!(file, "1 b").unwrap();
        match TransactionDb::load(file.path().to_str().unwrap()) {
            Err(PtfError::Parse { line, token, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(token, "b");
            }
            Err(err) => panic!("unexpected error {}", err),
            Ok(_) => panic!("loaded a malformed file"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        match TransactionDb::load("/nonexistent/ptf/input.txt") {
            Err(err) => assert_eq!(err.stage(), "load"),
            Ok(_) => panic!("loaded a missing file"),
        }
    }
}
