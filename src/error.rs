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
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PtfError>;

// Errors that abort a mining run. Every variant belongs to exactly one
// pipeline stage, reported through `PtfError::stage()`.
#[derive(Debug, Error)]
pub enum PtfError {
    // The transaction file could not be opened or read.
    #[error("could not read {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: io::Error,
    },
    // A transaction line held a token that is not an item id.
    #[error("invalid format on line {line} of {path}: {content:?} (bad item {token:?})")]
    Parse {
        path: String,
        line: usize,
        content: String,
        token: String,
    },
    #[error("top-k must be a positive integer, got {0}")]
    InvalidTopK(i64),
    #[error("number of workers must be a positive integer, got {0}")]
    InvalidWorkers(i64),
    #[error("batch size must be a positive integer, got {0}")]
    InvalidBatchSize(i64),
    // Bad JSON, a missing required field, or an unknown option value.
    #[error("{0}")]
    Config(String),
    // The vertical index for a partition could not be built.
    #[error("partition {item}: {message}")]
    Partition { item: Item, message: String },
    #[error("mining partition {item} failed: {message}")]
    Mine { item: Item, message: String },
    #[error("could not build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("merging worker results failed: {0}")]
    Merge(String),
    #[error("could not write {path}: {source}")]
    Report {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl PtfError {
    pub fn stage(&self) -> &'static str {
        match *self {
            PtfError::Load { .. } | PtfError::Parse { .. } => "load",
            PtfError::InvalidTopK(_)
            | PtfError::InvalidWorkers(_)
            | PtfError::InvalidBatchSize(_)
            | PtfError::Config(_) => "config",
            PtfError::Partition { .. } => "partition",
            PtfError::Mine { .. } | PtfError::WorkerPool(_) => "mine",
            PtfError::Merge(_) => "merge",
            PtfError::Report { .. } => "report",
        }
    }
}
