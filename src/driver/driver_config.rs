use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::eval::eval_config::EvalConfig;
use crate::network::spec::NetworkSpec;

/// Everything a fan-out run needs besides the device.
///
/// # Fields
/// - `network`        : classifier dimensions
/// - `eval`           : per-worker iterations, batch size and batch seed
/// - `thread_count`   : number of worker threads, at least 1
/// - `param_seed`     : seed for parameter initialization
/// - `join_timeout_ms`: optional bound on waiting for the workers; `None`
///                       blocks until every worker is done
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub network: NetworkSpec,
    pub eval: EvalConfig,
    pub thread_count: usize,
    pub param_seed: u64,
    pub join_timeout_ms: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            network: NetworkSpec::default(),
            eval: EvalConfig::default(),
            thread_count: 4,
            param_seed: 1,
            join_timeout_ms: None,
        }
    }
}

impl DriverConfig {
    pub fn new(network: NetworkSpec, thread_count: usize) -> Self {
        DriverConfig { network, thread_count, ..DriverConfig::default() }
    }

    pub fn join_timeout(&self) -> Option<Duration> {
        self.join_timeout_ms.map(Duration::from_millis)
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a config from a JSON file; missing fields take their defaults.
    pub fn load_json(path: &str) -> Result<DriverConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
