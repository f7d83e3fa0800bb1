// Lifecycle controller for a single container

mod database;

pub use database::DatabaseContainer;

use crate::context::Context;
use crate::engine::{CreateRequest, EngineClient, ExecOutput, ResourceFilter};
use crate::error::{Error, Result};
use crate::models::{ContainerSpec, ContainerState, ContainerStatus, PortMapping};
use crate::readiness::{ReadinessPoller, ReadinessProbe};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::{Duration, Instant};
use tracing::{debug, info};

/// Drives one container through create, start, stop and remove.
///
/// The controller caches the last observed state and is meant to be used from one task
/// at a time; give each concurrent user its own instance.
pub struct Container {
    engine: Arc<dyn EngineClient>,
    spec: ContainerSpec,
    state: ContainerState,
    poller: ReadinessPoller,
}

impl Container {
    pub fn new(engine: Arc<dyn EngineClient>, spec: ContainerSpec) -> Self {
        Self {
            engine,
            spec,
            state: ContainerState::default(),
            poller: ReadinessPoller::default(),
        }
    }

    /// Binds the controller to an existing container id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.state.id = Some(id.into()).filter(|id: &String| !id.is_empty());
        self
    }

    pub fn with_poller(mut self, poller: ReadinessPoller) -> Self {
        self.poller = poller;
        self
    }

    pub fn spec(&self) -> &ContainerSpec {
        &self.spec
    }

    pub fn state(&self) -> &ContainerState {
        &self.state
    }

    pub fn id(&self) -> Option<&str> {
        self.state.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.spec.name()
    }

    /// Pulls the image and creates the container, remembering its id.
    ///
    /// An existing container with the same name is reported as `Error::Conflict`.
    pub async fn create(&mut self, ctx: &Context) -> Result<()> {
        if self.spec.image().is_empty() {
            return Err(Error::Validation("empty image name".into()));
        }
        let Some(name) = self.spec.name() else {
            return Err(Error::Validation("empty container name".into()));
        };
        let request = CreateRequest {
            image: self.spec.image().to_string(),
            name: name.to_string(),
            env: self.spec.env().to_vec(),
            ports: PortMapping::parse_all(self.spec.ports())?,
            healthcheck: self.spec.healthcheck().map(str::to_string),
        };

        ctx.run(self.engine.pull_image(&request.image)).await?;
        let id = ctx.run(self.engine.create_resource(&request)).await?;
        info!(container = %request.name, id = %id, image = %request.image, "container created");
        self.state = ContainerState {
            id: Some(id),
            status: ContainerStatus::Created,
            status_message: String::new(),
        };
        Ok(())
    }

    /// Starts the container and waits until it is ready.
    ///
    /// The whole call, including lookups that stall in the engine, is bounded by the
    /// configured start timeout plus one polling interval; running past it is
    /// `Error::Timeout`. A shorter deadline on `ctx` still surfaces as `DeadlineExceeded`.
    /// Does nothing when the container is already ready.
    pub async fn start(&mut self, ctx: &Context) -> Result<()> {
        let timeout = self.spec.start_timeout();
        let started = Instant::now();
        let bound = started + timeout + self.poller.interval();
        let bounded = ctx.clone().deadline_at(bound);

        match self.start_within(&bounded, timeout).await {
            Err(Error::DeadlineExceeded) if ctx.deadline().is_none_or(|d| d > bound) => {
                Err(Error::Timeout {
                    container: self.label(),
                    waited: started.elapsed(),
                })
            }
            other => other,
        }
    }

    async fn start_within(&mut self, ctx: &Context, timeout: Duration) -> Result<()> {
        if self.has_started(ctx).await? {
            debug!(container = %self.label(), "already started");
            return Ok(());
        }
        let id = self.current_id()?;
        ctx.run(self.engine.start_resource(&id)).await?;
        debug!(container = %self.label(), id = %id, "start issued");

        let poller = self.poller;
        let attempts = poller.attempts_for(timeout);
        poller.wait_until_ready(ctx, self, attempts).await?;
        info!(container = %self.label(), "container started");
        Ok(())
    }

    pub async fn create_start(&mut self, ctx: &Context) -> Result<()> {
        self.create(ctx).await?;
        self.start(ctx).await
    }

    /// Refreshes the state and reports whether the container runs and its health check
    /// (if any) has finished starting.
    pub async fn has_started(&mut self, ctx: &Context) -> Result<bool> {
        self.refresh(ctx).await?;
        Ok(self.state.is_ready())
    }

    pub async fn stop(&mut self, ctx: &Context) -> Result<()> {
        self.refresh(ctx).await?;
        let id = self.current_id()?;
        ctx.run(self.engine.stop_resource(&id)).await?;
        info!(container = %self.label(), "container stopped");
        Ok(())
    }

    /// Removes the container; a container that no longer exists counts as removed.
    pub async fn remove(&mut self, ctx: &Context) -> Result<()> {
        let Some(id) = self.resolve_for_teardown(ctx).await? else {
            return Ok(());
        };
        ctx.run(self.engine.remove_resource(&id)).await?;
        self.mark_gone();
        info!(container = %self.label(), "container removed");
        Ok(())
    }

    /// Stops then removes the container; a container that no longer exists counts as removed.
    pub async fn stop_remove(&mut self, ctx: &Context) -> Result<()> {
        let Some(id) = self.resolve_for_teardown(ctx).await? else {
            return Ok(());
        };
        ctx.run(self.engine.stop_resource(&id)).await?;
        ctx.run(self.engine.remove_resource(&id)).await?;
        self.mark_gone();
        info!(container = %self.label(), "container stopped and removed");
        Ok(())
    }

    /// Runs `command` with `bash -c` inside the container. No readiness check is made.
    pub async fn exec(&mut self, ctx: &Context, command: &str) -> Result<ExecOutput> {
        let id = match self.state.id.clone() {
            Some(id) => id,
            None => {
                self.refresh(ctx).await?;
                self.current_id()?
            }
        };
        let output = ctx.run(self.engine.exec_in_resource(&id, command)).await?;
        debug!(container = %self.label(), exit_code = ?output.exit_code, "command executed");
        Ok(output)
    }

    fn filter(&self) -> Result<ResourceFilter> {
        if let Some(name) = self.spec.name() {
            return Ok(ResourceFilter::Name(name.to_string()));
        }
        match &self.state.id {
            Some(id) => Ok(ResourceFilter::Id(id.clone())),
            None => Err(Error::Validation("empty container name and id".into())),
        }
    }

    async fn refresh(&mut self, ctx: &Context) -> Result<()> {
        let filter = self.filter()?;
        let found = ctx.run(self.engine.list_resources(&filter)).await?;
        let Some(summary) = found.into_iter().next() else {
            return Err(Error::NotFound(filter.to_string()));
        };
        self.state = ContainerState {
            id: Some(summary.id).filter(|id| !id.is_empty()),
            status: summary.status,
            status_message: summary.status_message,
        };
        Ok(())
    }

    /// `None` when the container is already gone.
    async fn resolve_for_teardown(&mut self, ctx: &Context) -> Result<Option<String>> {
        match self.refresh(ctx).await {
            Ok(()) => self.current_id().map(Some),
            Err(Error::NotFound(what)) => {
                debug!(container = %self.label(), lookup = %what, "already absent");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn mark_gone(&mut self) {
        self.state.status = ContainerStatus::Unknown;
        self.state.status_message.clear();
    }

    fn current_id(&self) -> Result<String> {
        self.state
            .id
            .clone()
            .ok_or_else(|| Error::Validation("container id unknown".into()))
    }

    fn label(&self) -> String {
        self.spec
            .name()
            .or(self.state.id.as_deref())
            .unwrap_or(self.spec.image())
            .to_string()
    }
}

#[async_trait]
impl ReadinessProbe for Container {
    async fn is_ready(&mut self, ctx: &Context) -> Result<bool> {
        self.has_started(ctx).await
    }

    fn label(&self) -> String {
        Container::label(self)
    }
}
