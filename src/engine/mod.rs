// Container engine capability set consumed by the lifecycle controller

mod docker;
mod slot;

pub use docker::{DockerEngine, split_image_ref};
pub use slot::EngineSlot;

use crate::error::Result;
use crate::models::{ContainerStatus, PortMapping};
use async_trait::async_trait;
use std::fmt;

/// Everything the engine needs to create one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub image: String,
    pub name: String,
    pub env: Vec<String>,
    pub ports: Vec<PortMapping>,
    pub healthcheck: Option<String>,
}

/// How to look a container up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceFilter {
    Name(String),
    Id(String),
}

impl fmt::Display for ResourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceFilter::Name(name) => write!(f, "name={name}"),
            ResourceFilter::Id(id) => write!(f, "id={id}"),
        }
    }
}

/// One row of a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSummary {
    pub id: String,
    pub status: ContainerStatus,
    pub status_message: String,
}

/// Captured output of a command run inside a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i64>,
}

/// Raw engine operations. Implementations classify their failures into
/// `NotFound`, `Conflict` (create only) or `Transport`; they never retry.
#[async_trait]
pub trait EngineClient: Send + Sync {
    async fn pull_image(&self, image: &str) -> Result<()>;

    /// Creates the container and returns its id.
    async fn create_resource(&self, request: &CreateRequest) -> Result<String>;

    async fn start_resource(&self, id: &str) -> Result<()>;

    /// Every container (running or not) matching `filter`.
    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<ResourceSummary>>;

    async fn stop_resource(&self, id: &str) -> Result<()>;

    async fn remove_resource(&self, id: &str) -> Result<()>;

    async fn exec_in_resource(&self, id: &str, command: &str) -> Result<ExecOutput>;

    /// Releases the underlying connection.
    async fn close(&self);
}
