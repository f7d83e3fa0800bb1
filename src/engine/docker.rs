// Docker engine via bollard

use super::{CreateRequest, EngineClient, ExecOutput, ResourceFilter, ResourceSummary};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::models::ContainerStatus;
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::errors::Error as DockerError;
use bollard::exec::{StartExecOptions, StartExecResults};
use bollard::models::{ContainerCreateBody, ExecConfig, HealthConfig, HostConfig, PortBinding};
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, CreateImageOptionsBuilder, ListContainersOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use futures_util::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument};

const HEALTHCHECK_INTERVAL: Duration = Duration::from_secs(2);
const HEALTHCHECK_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTHCHECK_START_PERIOD: Duration = Duration::from_secs(2);
const HEALTHCHECK_RETRIES: i64 = 29;

pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    pub fn connect(config: &EngineConfig) -> Result<Self> {
        let docker = match &config.socket {
            Some(path) => {
                Docker::connect_with_socket(path, config.timeout_secs, bollard::API_DEFAULT_VERSION)
            }
            None => Docker::connect_with_local_defaults()
                .map(|d| d.with_timeout(Duration::from_secs(config.timeout_secs))),
        }
        .map_err(Error::transport)?;
        info!(socket = ?config.socket, "Docker engine connected");
        Ok(Self { docker })
    }

    pub fn from_docker(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl EngineClient for DockerEngine {
    #[instrument(skip(self), fields(engine = "docker", operation = "pull_image"))]
    async fn pull_image(&self, image: &str) -> Result<()> {
        let (from_image, tag) = split_image_ref(image);
        let options = CreateImageOptionsBuilder::default()
            .from_image(from_image)
            .tag(tag)
            .build();
        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(progress) = stream.next().await {
            let info = progress.map_err(Error::transport)?;
            if let Some(status) = info.status {
                debug!(status = %status, "pull progress");
            }
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(engine = "docker", operation = "create_resource", container = %request.name))]
    async fn create_resource(&self, request: &CreateRequest) -> Result<String> {
        let port_bindings: HashMap<String, Option<Vec<PortBinding>>> = request
            .ports
            .iter()
            .map(|p| {
                let binding = PortBinding {
                    host_ip: Some("0.0.0.0".to_string()),
                    host_port: Some(p.host_port.to_string()),
                };
                (p.container_key(), Some(vec![binding]))
            })
            .collect();

        let body = ContainerCreateBody {
            image: Some(request.image.clone()),
            env: Some(request.env.clone()),
            healthcheck: request.healthcheck.as_deref().map(health_config),
            host_config: Some(HostConfig {
                port_bindings: Some(port_bindings),
                ..Default::default()
            }),
            ..Default::default()
        };
        let options = CreateContainerOptionsBuilder::default()
            .name(&request.name)
            .build();

        match self.docker.create_container(Some(options), body).await {
            Ok(response) => Ok(response.id),
            Err(DockerError::DockerResponseServerError {
                status_code: 409, ..
            }) => Err(Error::Conflict(request.name.clone())),
            Err(e) => Err(classify(e, &request.name)),
        }
    }

    #[instrument(skip(self), fields(engine = "docker", operation = "start_resource"))]
    async fn start_resource(&self, id: &str) -> Result<()> {
        match self
            .docker
            .start_container(id, None::<StartContainerOptions>)
            .await
        {
            // 304: already started
            Ok(()) | Err(DockerError::DockerResponseServerError { status_code: 304, .. }) => Ok(()),
            Err(e) => Err(classify(e, id)),
        }
    }

    #[instrument(skip(self), fields(engine = "docker", operation = "list_resources"))]
    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<ResourceSummary>> {
        let (key, value) = match filter {
            ResourceFilter::Name(name) => ("name", name_pattern(name)),
            ResourceFilter::Id(id) => ("id", id.clone()),
        };
        let options = ListContainersOptions {
            all: true,
            filters: Some(HashMap::from([(key.to_string(), vec![value])])),
            ..Default::default()
        };

        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(Error::transport)?;

        Ok(containers
            .into_iter()
            .map(|c| ResourceSummary {
                id: c.id.unwrap_or_default(),
                status: c
                    .state
                    .as_ref()
                    .map(|s| ContainerStatus::from_docker(&s.to_string()))
                    .unwrap_or_default(),
                status_message: c.status.unwrap_or_default(),
            })
            .collect())
    }

    #[instrument(skip(self), fields(engine = "docker", operation = "stop_resource"))]
    async fn stop_resource(&self, id: &str) -> Result<()> {
        match self
            .docker
            .stop_container(id, None::<StopContainerOptions>)
            .await
        {
            // 304: already stopped
            Ok(()) | Err(DockerError::DockerResponseServerError { status_code: 304, .. }) => Ok(()),
            Err(e) => Err(classify(e, id)),
        }
    }

    #[instrument(skip(self), fields(engine = "docker", operation = "remove_resource"))]
    async fn remove_resource(&self, id: &str) -> Result<()> {
        self.docker
            .remove_container(id, None::<RemoveContainerOptions>)
            .await
            .map_err(|e| classify(e, id))
    }

    #[instrument(skip(self), fields(engine = "docker", operation = "exec_in_resource"))]
    async fn exec_in_resource(&self, id: &str, command: &str) -> Result<ExecOutput> {
        let config = ExecConfig {
            cmd: Some(vec!["bash".to_string(), "-c".to_string(), command.to_string()]),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };
        let exec = self
            .docker
            .create_exec(id, config)
            .await
            .map_err(|e| classify(e, id))?;

        let mut output = ExecOutput::default();
        let started = self
            .docker
            .start_exec(&exec.id, None::<StartExecOptions>)
            .await
            .map_err(Error::transport)?;
        if let StartExecResults::Attached {
            output: mut stream, ..
        } = started
        {
            while let Some(chunk) = stream.next().await {
                match chunk.map_err(Error::transport)? {
                    LogOutput::StdOut { message } => {
                        output.stdout.push_str(&String::from_utf8_lossy(&message))
                    }
                    LogOutput::StdErr { message } => {
                        output.stderr.push_str(&String::from_utf8_lossy(&message))
                    }
                    _ => {}
                }
            }
        }

        let inspect = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .map_err(Error::transport)?;
        output.exit_code = inspect.exit_code;
        Ok(output)
    }

    async fn close(&self) {
        // bollard keeps no session state; the connection pool goes with the last clone.
        debug!("Docker engine handle released");
    }
}

/// Splits an image reference into repository and tag, defaulting the tag to "latest".
/// Digest references ("repo@sha256:...") are returned whole with an empty tag.
pub fn split_image_ref(image: &str) -> (&str, &str) {
    if image.contains('@') {
        return (image, "");
    }
    let last_segment = image.rfind('/').map_or(0, |i| i + 1);
    match image[last_segment..].rfind(':') {
        Some(i) => (&image[..last_segment + i], &image[last_segment + i + 1..]),
        None => (image, "latest"),
    }
}

/// Docker matches the name filter as a regex against "/name". Names may only contain
/// `[a-zA-Z0-9_.-]`, so `.` is the one character that needs escaping.
fn name_pattern(name: &str) -> String {
    format!("^/{}$", name.replace('.', "\\."))
}

fn health_config(command: &str) -> HealthConfig {
    HealthConfig {
        test: Some(vec!["CMD-SHELL".to_string(), command.to_string()]),
        interval: Some(nanos(HEALTHCHECK_INTERVAL)),
        timeout: Some(nanos(HEALTHCHECK_TIMEOUT)),
        start_period: Some(nanos(HEALTHCHECK_START_PERIOD)),
        retries: Some(HEALTHCHECK_RETRIES),
        ..Default::default()
    }
}

fn nanos(d: Duration) -> i64 {
    d.as_nanos() as i64
}

fn classify(err: DockerError, subject: &str) -> Error {
    match err {
        DockerError::DockerResponseServerError {
            status_code: 404, ..
        } => Error::NotFound(subject.to_string()),
        other => Error::transport(other),
    }
}
