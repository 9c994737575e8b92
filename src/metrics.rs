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

use crate::config::{Execution, MinerConfig};
use crate::partition_miner::MineStats;
use serde::Serialize;
use std::time::Duration;

// Wall clock seconds spent in each stage of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StageTimings {
    pub load: f64,
    pub partition: f64,
    pub rank: f64,
    pub seed: f64,
    pub mine: f64,
    pub merge: f64,
}

impl StageTimings {
    pub fn total(&self) -> f64 {
        self.load + self.partition + self.rank + self.seed + self.mine + self.merge
    }
}

pub fn seconds(duration: Duration) -> f64 {
    duration.as_secs_f64()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunMetrics {
    pub input: String,
    pub top_k: usize,
    pub strategy: String,
    pub mode: String,
    pub workers: Option<usize>,
    pub batch_size: Option<usize>,
    pub transactions: usize,
    pub items: usize,
    pub item_occurrences: usize,
    pub partitions: usize,
    pub suffix_items: usize,
    pub co_occurrences: usize,
    pub partitions_mined: usize,
    pub partitions_skipped: usize,
    pub batches: usize,
    pub seed_size: usize,
    pub initial_threshold: u32,
    pub final_threshold: u32,
    pub itemsets_found: usize,
    pub timings: StageTimings,
    pub total_seconds: f64,
    pub mining: MineStats,
}

impl RunMetrics {
    pub fn for_config(config: &MinerConfig) -> RunMetrics {
        let (mode, workers, batch_size) = match config.execution {
            Execution::Sequential => ("sequential", None, None),
            Execution::Parallel {
                workers,
                batch_size,
            } => ("parallel", workers, batch_size),
        };
        RunMetrics {
            top_k: config.top_k,
            strategy: config.strategy.name().to_owned(),
            mode: mode.to_owned(),
            workers,
            batch_size,
            ..RunMetrics::default()
        }
    }

    pub fn set_load_time(&mut self, duration: Duration) {
        self.timings.load = seconds(duration);
        self.total_seconds = self.timings.total();
    }
}
