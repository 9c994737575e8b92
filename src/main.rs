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

#[macro_use]
extern crate log;

mod co_occurrence;
mod command_line_args;
mod config;
mod counter;
mod error;
mod intersection;
mod item;
mod itemset;
mod metrics;
mod orchestrator;
mod partition_miner;
mod pipeline;
mod prefix_partitioning;
mod promising_items;
mod report;
mod tid_list_index;
mod tid_set;
mod top_k;
mod transaction_db;
mod transaction_reader;
mod vec_sets;
mod vertical_index;

use command_line_args::{parse_args_or_exit, Arguments};
use error::Result;
use pipeline::mine_top_k;
use report::{save_metrics, save_report};
use transaction_db::TransactionDb;

use std::process;
use std::time::Instant;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn run(args: &Arguments) -> Result<()> {
    let settings = args.resolve()?;
    let start = Instant::now();

    info!("Mining data set: {}", settings.input);
    let timer = Instant::now();
    let db = TransactionDb::load(&settings.input)?;
    let load_time = timer.elapsed();
    info!(
        "Loaded {} transactions over {} items in {:.3} seconds.",
        db.len(),
        db.items().len(),
        load_time.as_secs_f64()
    );

    let mut result = mine_top_k(&db, &settings.miner)?;
    result.metrics.input = settings.input.clone();
    result.metrics.set_load_time(load_time);

    save_report(
        settings.output.as_ref().map(String::as_str),
        &settings.input,
        &settings.miner,
        &result,
    )?;
    if let Some(ref path) = settings.metrics {
        save_metrics(path, &result.metrics)?;
        info!("Wrote run metrics to {}", path);
    }

    info!("Total runtime: {:.3} seconds", start.elapsed().as_secs_f64());
    Ok(())
}

fn main() {
    let arguments = parse_args_or_exit();
    init_logging(arguments.verbose);

    if let Err(err) = run(&arguments) {
        eprintln!("Error ({}): {}", err.stage(), err);
        process::exit(1);
    }
}
