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
use itertools::Itertools;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;

pub struct TransactionReader<R> {
    reader: R,
    path: String,
    line_number: usize,
}

impl TransactionReader<BufReader<File>> {
    pub fn open(path: &str) -> Result<TransactionReader<BufReader<File>>> {
        let file = File::open(path).map_err(|source| PtfError::Load {
            path: path.to_owned(),
            source,
        })?;
        Ok(TransactionReader::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> TransactionReader<R> {
    pub fn new(reader: R, path: &str) -> TransactionReader<R> {
        TransactionReader {
            reader,
            path: path.to_owned(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Iterator for TransactionReader<R> {
    type Item = Result<Vec<Item>>;
    fn next(&mut self) -> Option<Result<Vec<Item>>> {
        let mut line = String::new();
        loop {
            line.clear();
            let len = match self.reader.read_line(&mut line) {
                Ok(len) => len,
                Err(source) => {
                    return Some(Err(PtfError::Load {
                        path: self.path.clone(),
                        source,
                    }))
                }
            };
            if len == 0 {
                return None;
            }
            self.line_number += 1;

            match parse_transaction(&line) {
                Ok(ref items) if items.is_empty() => continue,
                Ok(items) => return Some(Ok(items)),
                Err(token) => {
                    return Some(Err(PtfError::Parse {
                        path: self.path.clone(),
                        line: self.line_number,
                        content: line.trim().to_owned(),
                        token,
                    }))
                }
            }
        }
    }
}

// Splits a line on whitespace and commas. Items come back sorted ascending
// with duplicates removed; on failure the offending token is returned.
pub fn parse_transaction(line: &str) -> std::result::Result<Vec<Item>, String> {
    let mut items = Vec::new();
    for token in line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
    {
        match Item::parse(token) {
            Some(item) => items.push(item),
            None => return Err(token.to_owned()),
        }
    }
    // Some input files have transactions with duplicates items.
    Ok(items.into_iter().sorted().dedup().collect())
}
