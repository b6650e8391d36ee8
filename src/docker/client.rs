use anyhow::{Context, Result};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogsOptions, PruneContainersOptions, RemoveContainerOptions,
    StartContainerOptions, WaitContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::CreateImageOptions;
use bollard::models::{ContainerCreateResponse, ContainerWaitResponse};
use bollard::Docker;
use futures::StreamExt;

use super::config::ContainerConfig;

/// Operations the lifecycle manager needs from a container engine
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Run a container in the foreground and return its exit code.
    /// The container is removed afterwards when `remove_on_exit` is set.
    async fn run_to_completion(&self, config: &ContainerConfig) -> Result<i64>;

    /// Delete stopped containers, returning how many were removed
    async fn prune_stopped(&self) -> Result<usize>;
}

/// Docker client wrapper for analysis runs
pub struct DockerClient {
    docker: Docker,
}

impl DockerClient {
    /// Create a new Docker client
    pub async fn new() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .context("Failed to connect to Docker daemon. Is Docker running?")?;

        // Verify connection
        docker
            .ping()
            .await
            .context("Failed to ping Docker daemon")?;

        Ok(Self { docker })
    }

    /// Create a container, pulling the image once if the daemon does not have it
    async fn create_container(&self, config: &ContainerConfig) -> Result<String> {
        let response = match self.try_create_container(config).await {
            Err(e) if is_missing_image(&e) => {
                tracing::info!("Image {} not found locally, pulling it", config.image);
                self.pull_image(&config.image).await?;
                self.try_create_container(config).await
            }
            other => other,
        }
        .with_context(|| format!("Failed to create container {} from {}", config.name, config.image))?;

        for warning in &response.warnings {
            tracing::warn!("Docker: {}", warning);
        }

        Ok(response.id)
    }

    async fn try_create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerCreateResponse, BollardError> {
        let host_config = bollard::models::HostConfig {
            binds: Some(config.binds.clone()),
            ..Default::default()
        };

        let container_config = Config {
            image: Some(config.image.clone()),
            env: Some(config.env.clone()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            host_config: Some(host_config),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: config.name.clone(),
            platform: None,
        };

        self.docker
            .create_container(Some(options), container_config)
            .await
    }

    /// Pull a Docker image from a registry
    async fn pull_image(&self, image: &str) -> Result<()> {
        let (from_image, tag) = split_image_reference(image);
        let options = Some(CreateImageOptions {
            from_image,
            tag,
            ..Default::default()
        });

        let mut stream = self.docker.create_image(options, None, None);

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(status) = info.status {
                        tracing::debug!("Pull status: {}", status);
                    }
                    if let Some(error) = info.error {
                        anyhow::bail!("Pull of {} failed: {}", image, error);
                    }
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Pull of {} failed", image));
                }
            }
        }

        Ok(())
    }

    /// Start the container, follow its output, and wait for it to stop
    async fn start_and_wait(&self, container_id: &str) -> Result<i64> {
        self.docker
            .start_container(container_id, None::<StartContainerOptions<String>>)
            .await
            .context("Failed to start container")?;

        let log_options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            ..Default::default()
        };

        let mut log_stream = self.docker.logs(container_id, Some(log_options));

        while let Some(result) = log_stream.next().await {
            match result {
                Ok(output) => {
                    for line in output.to_string().lines() {
                        tracing::debug!("[container] {}", line);
                    }
                }
                Err(e) => {
                    tracing::warn!("Log stream error: {}", e);
                    break;
                }
            }
        }

        let wait_options = WaitContainerOptions {
            condition: "not-running",
        };

        let mut wait_stream = self.docker.wait_container(container_id, Some(wait_options));
        exit_status(wait_stream.next().await)
    }
}

/// The daemon answers 404 on create when the image is not available locally
fn is_missing_image(error: &BollardError) -> bool {
    matches!(
        error,
        BollardError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

/// Split `repo[:tag]` into repository and tag, defaulting the tag to `latest`.
/// A colon before the last `/` belongs to a registry port. Digest references
/// are passed through whole.
fn split_image_reference(image: &str) -> (&str, &str) {
    if image.contains('@') {
        return (image, "");
    }
    let name_start = image.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image[name_start..].rfind(':') {
        Some(i) => (&image[..name_start + i], &image[name_start + i + 1..]),
        None => (image, "latest"),
    }
}

/// Exit code from the first item of a wait stream
fn exit_status(first: Option<Result<ContainerWaitResponse, BollardError>>) -> Result<i64> {
    match first {
        Some(Ok(response)) => Ok(response.status_code),
        // bollard reports a non-zero exit status as an error
        Some(Err(BollardError::DockerContainerWaitError { code, .. })) => Ok(code),
        Some(Err(e)) => Err(e).context("Failed to wait for container"),
        None => anyhow::bail!("Container wait returned no status"),
    }
}

#[async_trait]
impl ContainerRuntime for DockerClient {
    async fn run_to_completion(&self, config: &ContainerConfig) -> Result<i64> {
        let container_id = self.create_container(config).await?;
        tracing::debug!("Container id: {}", container_id);

        let result = self.start_and_wait(&container_id).await;

        // Remove even when start failed, otherwise the name stays taken
        if config.remove_on_exit {
            let options = RemoveContainerOptions {
                force: true,
                ..Default::default()
            };
            if let Err(e) = self.docker.remove_container(&container_id, Some(options)).await {
                tracing::warn!("Failed to remove container {}: {}", config.name, e);
            }
        }

        result
    }

    async fn prune_stopped(&self) -> Result<usize> {
        let response = self
            .docker
            .prune_containers(None::<PruneContainersOptions<String>>)
            .await
            .context("Failed to prune containers")?;

        Ok(response.containers_deleted.map(|ids| ids.len()).unwrap_or(0))
    }
}
