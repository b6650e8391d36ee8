use chrono::{DateTime, Utc};

use super::client::ContainerRuntime;
use super::config::ContainerConfig;
use crate::config::run::RunConfiguration;
use crate::config::settings::StaticConfig;

/// Result of a single analysis container run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The container ran and exited; `exit_code` is the analysis process status
    Completed { name: String, exit_code: i64 },
    /// The runtime refused or failed to run the container
    Failed {
        name: String,
        reason: String,
        pruned: bool,
    },
}

/// Container name for a run started at `now`: `<base>-<unix seconds>`
pub fn run_name(base: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", base, now.timestamp())
}

/// Bind mounts for the source tree and the results directory
pub fn volume_binds(run: &RunConfiguration, settings: &StaticConfig) -> Vec<String> {
    vec![
        format!("{}:{}", run.source.display(), settings.docker_working_dir),
        format!("{}:{}", run.results_dir().display(), settings.docker_results_dir),
    ]
}

/// Assemble the container definition for one run
pub fn container_config(
    run: &RunConfiguration,
    settings: &StaticConfig,
    now: DateTime<Utc>,
) -> ContainerConfig {
    ContainerConfig {
        image: settings.container_name.clone(),
        name: run_name(&settings.name, now),
        env: run
            .env_vars()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect(),
        binds: volume_binds(run, settings),
        remove_on_exit: true,
    }
}

/// Run the analysis container to completion.
///
/// Runtime errors never escape: they are logged, a prune of stopped
/// containers is attempted, and the failure is reported in the outcome.
pub async fn launch(
    run: &RunConfiguration,
    settings: &StaticConfig,
    runtime: &dyn ContainerRuntime,
) -> LaunchOutcome {
    let config = container_config(run, settings, Utc::now());

    tracing::info!("Starting container {} ({})", config.name, config.image);
    for bind in &config.binds {
        tracing::debug!("Mount: {}", bind);
    }
    for entry in &config.env {
        tracing::debug!("Env: {}", entry);
    }

    match runtime.run_to_completion(&config).await {
        Ok(exit_code) => {
            if exit_code == 0 {
                tracing::info!("Container {} exited successfully", config.name);
            } else {
                tracing::warn!("Container {} exited with code {}", config.name, exit_code);
            }
            LaunchOutcome::Completed {
                name: config.name,
                exit_code,
            }
        }
        Err(e) => {
            let reason = format!("{:#}", e);
            tracing::error!("Failed to run container {}: {}", config.name, reason);

            let pruned = match runtime.prune_stopped().await {
                Ok(count) => {
                    tracing::debug!("Pruned {} stopped container(s)", count);
                    true
                }
                Err(e) => {
                    tracing::warn!("Prune failed: {:#}", e);
                    false
                }
            };

            LaunchOutcome::Failed {
                name: config.name,
                reason,
                pruned,
            }
        }
    }
}
