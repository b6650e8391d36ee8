use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use super::client::ContainerRuntime;
use super::config::ContainerConfig;

/// In-memory runtime that records every request
pub struct FakeRuntime {
    pub result: std::result::Result<i64, String>,
    pub prune_fails: bool,
    pub runs: Mutex<Vec<ContainerConfig>>,
    pub prunes: Mutex<usize>,
}

impl FakeRuntime {
    pub fn exiting_with(code: i64) -> Self {
        Self {
            result: Ok(code),
            prune_fails: false,
            runs: Mutex::new(Vec::new()),
            prunes: Mutex::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
            ..Self::exiting_with(0)
        }
    }

    pub fn run_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }

    pub fn prune_count(&self) -> usize {
        *self.prunes.lock().unwrap()
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn run_to_completion(&self, config: &ContainerConfig) -> Result<i64> {
        self.runs.lock().unwrap().push(config.clone());
        self.result.clone().map_err(anyhow::Error::msg)
    }

    async fn prune_stopped(&self) -> Result<usize> {
        *self.prunes.lock().unwrap() += 1;
        if self.prune_fails {
            anyhow::bail!("daemon gone");
        }
        Ok(2)
    }
}
