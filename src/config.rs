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
use crate::partition_miner::Strategy;
use serde::Deserialize;
use std::fs;
use std::path::Path;

// How qualifying partitions are dispatched.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Execution {
    // One partition after another against a single top-k set.
    Sequential,
    // Partitions spread over a rayon pool of `workers` threads (all cores
    // when `None`). With a `batch_size`, the threshold is refreshed after
    // every batch; otherwise the whole dispatch shares one snapshot.
    Parallel {
        workers: Option<usize>,
        batch_size: Option<usize>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MinerConfig {
    pub top_k: usize,
    pub strategy: Strategy,
    pub execution: Execution,
}

fn positive(value: i64, err: fn(i64) -> PtfError) -> Result<usize> {
    if value > 0 {
        Ok(value as usize)
    } else {
        Err(err(value))
    }
}

impl MinerConfig {
    pub fn new(
        top_k: i64,
        strategy: Strategy,
        parallel: bool,
        workers: Option<i64>,
        batch_size: Option<i64>,
    ) -> Result<MinerConfig> {
        let top_k = positive(top_k, PtfError::InvalidTopK)?;
        let workers = workers
            .map(|w| positive(w, PtfError::InvalidWorkers))
            .transpose()?;
        let batch_size = batch_size
            .map(|b| positive(b, PtfError::InvalidBatchSize))
            .transpose()?;
        let execution = if parallel {
            Execution::Parallel {
                workers,
                batch_size,
            }
        } else {
            if workers.is_some() || batch_size.is_some() {
                warn!("Workers and batch size only apply to parallel runs, ignoring them");
            }
            Execution::Sequential
        };
        Ok(MinerConfig {
            top_k,
            strategy,
            execution,
        })
    }

    #[cfg(test)]
    pub fn sequential(top_k: usize, strategy: Strategy) -> MinerConfig {
        MinerConfig {
            top_k,
            strategy,
            execution: Execution::Sequential,
        }
    }

    pub fn is_parallel(&self) -> bool {
        self.execution != Execution::Sequential
    }
}

// Everything one run of the binary needs.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSettings {
    pub input: String,
    pub output: Option<String>,
    pub metrics: Option<String>,
    pub miner: MinerConfig,
}

// The JSON configuration file. Only `top_k` and `input_dataset_path` are
// required.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct JsonConfig {
    pub top_k: Option<i64>,
    pub input_dataset_path: Option<String>,
    pub output_report: Option<String>,
    #[serde(default)]
    pub parallel: bool,
    pub num_workers: Option<i64>,
    pub batch_size: Option<i64>,
    pub strategy: Option<String>,
    pub save_metrics: Option<String>,
}

impl JsonConfig {
    pub fn load(path: &str) -> Result<JsonConfig> {
        let text = fs::read_to_string(path)
            .map_err(|e| PtfError::Config(format!("could not read config {}: {}", path, e)))?;
        JsonConfig::parse(&text)
            .map_err(|e| PtfError::Config(format!("config {}: {}", path, e)))
    }

    pub fn parse(text: &str) -> Result<JsonConfig> {
        serde_json::from_str(text).map_err(|e| PtfError::Config(format!("invalid JSON: {}", e)))
    }

    pub fn into_settings(self) -> Result<RunSettings> {
        let top_k = self
            .top_k
            .ok_or_else(|| PtfError::Config("missing required field \"top_k\"".to_owned()))?;
        let input = self.input_dataset_path.ok_or_else(|| {
            PtfError::Config("missing required field \"input_dataset_path\"".to_owned())
        })?;
        if !Path::new(&input).is_file() {
            return Err(PtfError::Config(format!("input file {} does not exist", input)));
        }
        let strategy = match self.strategy {
            Some(ref name) => name.parse()?,
            None => Strategy::default(),
        };
        let miner = MinerConfig::new(
            top_k,
            strategy,
            self.parallel,
            self.num_workers,
            self.batch_size,
        )?;
        Ok(RunSettings {
            input,
            output: self.output_report,
            metrics: self.save_metrics,
            miner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dataset() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "1 2 3").unwrap();
        file
    }

    #[test]
    fn test_miner_config() {
        let config = MinerConfig::new(8, Strategy::Plain, true, Some(4), None).unwrap();
        assert_eq!(config.top_k, 8);
        assert_eq!(
            config.execution,
            Execution::Parallel {
                workers: Some(4),
                batch_size: None
            }
        );
        assert!(config.is_parallel());

        let config = MinerConfig::new(3, Strategy::Hybrid, false, Some(4), Some(2)).unwrap();
        assert_eq!(config.execution, Execution::Sequential);
    }

    #[test]
    fn test_miner_config_rejects_non_positive() {
        let cases: Vec<(i64, Option<i64>, Option<i64>, &str)> = vec![
            (0, None, None, "top-k"),
            (-3, None, None, "top-k"),
            (5, Some(0), None, "workers"),
            (5, None, Some(-1), "batch"),
        ];
        for (top_k, workers, batch_size, expected) in cases {
            match MinerConfig::new(top_k, Strategy::default(), true, workers, batch_size) {
                Err(err) => {
                    assert_eq!(err.stage(), "config");
                    assert!(err.to_string().contains(expected), "{}", err);
                }
                Ok(config) => panic!("accepted {:?}", config),
            }
        }
    }

    #[test]
    fn test_json_config() {
        let data = dataset();
        let path = data.path().to_str().unwrap();
        let text = format!(
            r#"{{
                "top_k": 5,
                "input_dataset_path": "{}",
                "output_report": "report.txt",
                "parallel": true,
                "num_workers": 2,
                "strategy": "hybrid",
                "save_metrics": "metrics.json"
            }}"#,
            path
        );
        let settings = JsonConfig::parse(&text).unwrap().into_settings().unwrap();
        assert_eq!(settings.input, path);
        assert_eq!(settings.output, Some("report.txt".to_owned()));
        assert_eq!(settings.metrics, Some("metrics.json".to_owned()));
        assert_eq!(settings.miner.top_k, 5);
        assert_eq!(settings.miner.strategy, Strategy::Hybrid);
        assert_eq!(
            settings.miner.execution,
            Execution::Parallel {
                workers: Some(2),
                batch_size: None
            }
        );
    }

    #[test]
    fn test_json_config_defaults() {
        let data = dataset();
        let text = format!(
            r#"{{"top_k": 8, "input_dataset_path": "{}"}}"#,
            data.path().to_str().unwrap()
        );
        let settings = JsonConfig::parse(&text).unwrap().into_settings().unwrap();
        assert_eq!(settings.output, None);
        assert_eq!(settings.miner, MinerConfig::sequential(8, Strategy::HybridPruning));
    }

    #[test]
    fn test_json_config_errors() {
        let data = dataset();
        let path = data.path().to_str().unwrap();
        let cases = vec![
            format!(r#"{{"input_dataset_path": "{}"}}"#, path),
            r#"{"top_k": 8}"#.to_owned(),
            r#"{"top_k": 8, "input_dataset_path": "/no/such/file.txt"}"#.to_owned(),
            format!(r#"{{"top_k": 0, "input_dataset_path": "{}"}}"#, path),
            format!(
                r#"{{"top_k": 2, "input_dataset_path": "{}", "parallel": true, "num_workers": -1}}"#,
                path
            ),
            format!(r#"{{"top_k": 2, "input_dataset_path": "{}", "strategy": "x"}}"#, path),
            "not json".to_owned(),
        ];
        for text in cases {
            let result = JsonConfig::parse(&text).and_then(|c| c.into_settings());
            match result {
                Err(err) => assert_eq!(err.stage(), "config", "{}", text),
                Ok(_) => panic!("accepted {}", text),
            }
        }
    }

    #[test]
    fn test_load_missing_config() {
        match JsonConfig::load("/no/such/config.json") {
            Err(PtfError::Config(message)) => assert!(message.contains("could not read")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
