// Docker container models

use crate::options::Options;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Applied when a spec carries no (or a zero) start timeout.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(60);

/// Status message marker for a health check that has not finished yet.
pub const HEALTH_STARTING: &str = "health: starting";

/// Desired container; fixed once the controller is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    image: String,
    name: Option<String>,
    env: Vec<String>,
    ports: Vec<String>,
    healthcheck: Option<String>,
    start_timeout: Duration,
}

impl ContainerSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self::with_options(image, Options::default())
    }

    /// Finalizes a spec from an image and a (possibly merged) options layer.
    pub fn with_options(image: impl Into<String>, options: Options) -> Self {
        let start_timeout = match options.start_timeout_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => DEFAULT_START_TIMEOUT,
        };
        Self {
            image: image.into(),
            name: options.name.filter(|n| !n.is_empty()),
            env: options.env.unwrap_or_default(),
            ports: options.ports.unwrap_or_default(),
            healthcheck: options.healthcheck.filter(|h| !h.is_empty()),
            start_timeout,
        }
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// `KEY=VALUE` entries.
    pub fn env(&self) -> &[String] {
        &self.env
    }

    /// `containerPort:hostPort` entries, unparsed.
    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    pub fn healthcheck(&self) -> Option<&str> {
        self.healthcheck.as_deref()
    }

    pub fn start_timeout(&self) -> Duration {
        self.start_timeout
    }

    /// The spec viewed as an options layer, e.g. to merge further overrides on top.
    pub fn to_options(&self) -> Options {
        Options {
            name: self.name.clone(),
            healthcheck: self.healthcheck.clone(),
            env: Some(self.env.clone()),
            ports: Some(self.ports.clone()),
            start_timeout_secs: Some(self.start_timeout.as_secs()),
        }
    }
}

/// Docker container status; serializes to lowercase JSON (e.g. "running").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ContainerStatus {
    /// Parse from Docker API state string (e.g. "running", "exited").
    pub fn from_docker(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "created" => ContainerStatus::Created,
            "running" => ContainerStatus::Running,
            "paused" => ContainerStatus::Paused,
            "restarting" => ContainerStatus::Restarting,
            "removing" => ContainerStatus::Removing,
            "exited" => ContainerStatus::Exited,
            "dead" => ContainerStatus::Dead,
            _ => ContainerStatus::Unknown,
        }
    }
}

/// Engine-observed snapshot, refreshed by every fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerState {
    pub id: Option<String>,
    pub status: ContainerStatus,
    /// Free text such as "Up 3 seconds (health: starting)".
    pub status_message: String,
}

impl ContainerState {
    /// Running, and not in the middle of its health check.
    pub fn is_ready(&self) -> bool {
        self.status == ContainerStatus::Running && !self.status_message.contains(HEALTH_STARTING)
    }
}

/// Database living inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    pub reset_command: String,
}
