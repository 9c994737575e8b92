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

use std::env;
use std::io;
use std::process;

use argparse::{ArgumentParser, StoreOption, StoreTrue};

use crate::config::{JsonConfig, RunSettings};
use crate::error::{PtfError, Result};

pub const DEFAULT_TOP_K: i64 = 8;

#[derive(Debug, Default)]
pub struct Arguments {
    pub input_file_path: Option<String>,
    pub top_k: Option<i64>,
    pub strategy: Option<String>,
    pub parallel: bool,
    pub workers: Option<i64>,
    pub batch_size: Option<i64>,
    pub output_report_path: Option<String>,
    pub metrics_path: Option<String>,
    pub config_path: Option<String>,
    pub verbose: bool,
}

pub fn parse_args_or_exit() -> Arguments {
    let mut args = Arguments::default();

    {
        let mut parser = ArgumentParser::new();
        parser.set_description("Top-k frequent itemset mining by prefix partitioning.");

        parser
            .refer(&mut args.input_file_path)
            .add_option(
                &["--input"],
                StoreOption,
                "Input dataset, one transaction of integer items per line.",
            )
            .metavar("file_path");

        parser
            .refer(&mut args.top_k)
            .add_option(
                &["--top-k"],
                StoreOption,
                "Number of itemsets to find. Default: 8.",
            )
            .metavar("k");

        parser
            .refer(&mut args.strategy)
            .add_option(
                &["--strategy"],
                StoreOption,
                "Partition miner: plain, hybrid or pruning. Default: pruning.",
            )
            .metavar("name");

        parser.refer(&mut args.parallel).add_option(
            &["--parallel"],
            StoreTrue,
            "Mine partitions on a pool of worker threads.",
        );

        parser
            .refer(&mut args.workers)
            .add_option(
                &["--workers"],
                StoreOption,
                "Number of worker threads. Default: one per core.",
            )
            .metavar("n");

        parser
            .refer(&mut args.batch_size)
            .add_option(
                &["--batch-size"],
                StoreOption,
                "Partitions per parallel batch; the threshold is refreshed between batches.",
            )
            .metavar("n");

        parser
            .refer(&mut args.output_report_path)
            .add_option(
                &["--output"],
                StoreOption,
                "File path in which to store the ranked itemsets. Default: stdout.",
            )
            .metavar("file_path");

        parser
            .refer(&mut args.metrics_path)
            .add_option(
                &["--metrics"],
                StoreOption,
                "File path in which to store run metrics as JSON.",
            )
            .metavar("file_path");

        parser
            .refer(&mut args.config_path)
            .add_option(
                &["--config"],
                StoreOption,
                "JSON config file. Command line options override its values.",
            )
            .metavar("file_path");

        parser.refer(&mut args.verbose).add_option(
            &["-v", "--verbose"],
            StoreTrue,
            "Log per-partition detail.",
        );

        if env::args().count() == 1 {
            parser.print_help("Usage:", &mut io::stderr()).unwrap();
            process::exit(1);
        }

        match parser.parse_args() {
            Ok(()) => {}
            Err(err) => {
                process::exit(err);
            }
        }
    }

    args
}

impl Arguments {
    // Merges the config file, if any, with the command line and validates
    // the result.
    pub fn resolve(&self) -> Result<RunSettings> {
        let mut config = match self.config_path {
            Some(ref path) => JsonConfig::load(path)?,
            None => JsonConfig {
                top_k: Some(DEFAULT_TOP_K),
                ..JsonConfig::default()
            },
        };
        if self.input_file_path.is_some() {
            config.input_dataset_path = self.input_file_path.clone();
        }
        if self.top_k.is_some() {
            config.top_k = self.top_k;
        }
        if self.strategy.is_some() {
            config.strategy = self.strategy.clone();
        }
        if self.parallel {
            config.parallel = true;
        }
        if self.workers.is_some() {
            config.num_workers = self.workers;
        }
        if self.batch_size.is_some() {
            config.batch_size = self.batch_size;
        }
        if self.output_report_path.is_some() {
            config.output_report = self.output_report_path.clone();
        }
        if self.metrics_path.is_some() {
            config.save_metrics = self.metrics_path.clone();
        }
        if config.input_dataset_path.is_none() {
            return Err(PtfError::Config(
                "an input file is required, pass --input or --config".to_owned(),
            ));
        }
        config.into_settings()
    }
}
