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
use crate::error::{PtfError, Result};
use crate::metrics::RunMetrics;
use crate::pipeline::MiningResult;
use std::fs::File;
use std::io::{self, BufWriter, Write};

fn mode(config: &MinerConfig) -> String {
    match config.execution {
        Execution::Sequential => "sequential".to_owned(),
        Execution::Parallel {
            workers: Some(workers),
            ..
        } => format!("parallel ({} workers)", workers),
        Execution::Parallel { workers: None, .. } => "parallel".to_owned(),
    }
}

pub fn write_report<W: Write>(
    output: &mut W,
    input: &str,
    config: &MinerConfig,
    result: &MiningResult,
) -> io::Result<()> {
    writeln!(output, "Input: {}", input)?;
    writeln!(
        output,
        "Top-k: {}, strategy: {}, mode: {}",
        config.top_k,
        config.strategy.name(),
        mode(config)
    )?;
    writeln!(output, "Initial threshold: {}", result.initial_threshold)?;
    writeln!(output, "Initial seed size: {}", result.seed_size)?;
    writeln!(output)?;
    writeln!(output, "Total itemsets found: {}", result.itemsets.len())?;
    writeln!(output, "Final threshold: {}", result.threshold)?;
    writeln!(output)?;
    for (rank, (itemset, support)) in result.itemsets.iter().enumerate() {
        writeln!(
            output,
            "{}. {:20} => Support: {}",
            rank + 1,
            itemset.to_string(),
            support
        )?;
    }
    Ok(())
}

fn report_error(path: &str) -> impl Fn(io::Error) -> PtfError + '_ {
    move |source| PtfError::Report {
        path: path.to_owned(),
        source,
    }
}

// Writes the text report to `path`, or to stdout when there's no path.
pub fn save_report(
    path: Option<&str>,
    input: &str,
    config: &MinerConfig,
    result: &MiningResult,
) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(report_error(path))?;
            let mut output = BufWriter::new(file);
            write_report(&mut output, input, config, result).map_err(report_error(path))?;
            output.flush().map_err(report_error(path))
        }
        None => {
            let stdout = io::stdout();
            let mut output = stdout.lock();
            write_report(&mut output, input, config, result).map_err(report_error("stdout"))
        }
    }
}

pub fn save_metrics(path: &str, metrics: &RunMetrics) -> Result<()> {
    let json = serde_json::to_string_pretty(metrics)
        .map_err(|e| report_error(path)(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    let mut file = File::create(path).map_err(report_error(path))?;
    writeln!(file, "{}", json).map_err(report_error(path))
}
