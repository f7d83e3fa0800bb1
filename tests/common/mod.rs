// Shared test helpers: an in-memory engine with scripted listings

#![allow(dead_code)]

use async_trait::async_trait;
use docktest::engine::{CreateRequest, EngineClient, ExecOutput, ResourceFilter, ResourceSummary};
use docktest::models::ContainerStatus;
use docktest::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const MOCK_ID: &str = "c0ffee";

/// What the next `list_resources` call reports, overriding the simulated container.
#[derive(Debug, Clone)]
pub enum Listing {
    Running,
    HealthStarting,
    Created,
    Missing,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Pull(String),
    Create(CreateRequest),
    Start(String),
    List(ResourceFilter),
    Stop(String),
    Remove(String),
    Exec(String, String),
    Close,
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    /// Simulated container; `None` when absent.
    resource: Option<ResourceSummary>,
    script: VecDeque<Listing>,
    /// Start leaves the container in "created" instead of running it.
    start_never_runs: bool,
    conflict_on_create: bool,
    fail_pull: bool,
    fail_remove: bool,
    fail_exec: bool,
    /// Every `list_resources` call stalls this long before answering.
    list_delay: Option<Duration>,
}

#[derive(Default)]
pub struct MockEngine {
    inner: Mutex<Inner>,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Engine already holding a container in `status`.
    pub fn with_resource(status: ContainerStatus, message: &str) -> Arc<Self> {
        let engine = Self::default();
        engine.lock().resource = Some(summary(status, message));
        Arc::new(engine)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn script(&self, listings: impl IntoIterator<Item = Listing>) {
        self.lock().script.extend(listings);
    }

    pub fn start_never_runs(&self) {
        self.lock().start_never_runs = true;
    }

    pub fn conflict_on_create(&self) {
        self.lock().conflict_on_create = true;
    }

    pub fn fail_pull(&self) {
        self.lock().fail_pull = true;
    }

    pub fn fail_remove(&self) {
        self.lock().fail_remove = true;
    }

    pub fn fail_exec(&self) {
        self.lock().fail_exec = true;
    }

    pub fn slow_list(&self, delay: Duration) {
        self.lock().list_delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn starts(&self) -> usize {
        self.count(|c| matches!(c, Call::Start(_)))
    }

    pub fn lists(&self) -> usize {
        self.count(|c| matches!(c, Call::List(_)))
    }

    pub fn exists(&self) -> bool {
        self.lock().resource.is_some()
    }
}

fn summary(status: ContainerStatus, message: &str) -> ResourceSummary {
    ResourceSummary {
        id: MOCK_ID.to_string(),
        status,
        status_message: message.to_string(),
    }
}

#[async_trait]
impl EngineClient for MockEngine {
    async fn pull_image(&self, image: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::Pull(image.to_string()));
        if inner.fail_pull {
            return Err(Error::transport("pull access denied"));
        }
        Ok(())
    }

    async fn create_resource(&self, request: &CreateRequest) -> Result<String> {
        let mut inner = self.lock();
        inner.calls.push(Call::Create(request.clone()));
        if inner.conflict_on_create || inner.resource.is_some() {
            return Err(Error::Conflict(request.name.clone()));
        }
        inner.resource = Some(summary(ContainerStatus::Created, "Created"));
        Ok(MOCK_ID.to_string())
    }

    async fn start_resource(&self, id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::Start(id.to_string()));
        let never_runs = inner.start_never_runs;
        match inner.resource.as_mut() {
            Some(r) if !never_runs => {
                r.status = ContainerStatus::Running;
                r.status_message = "Up 1 second".to_string();
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(Error::NotFound(id.to_string())),
        }
    }

    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<ResourceSummary>> {
        let delay = self.lock().list_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.lock();
        inner.calls.push(Call::List(filter.clone()));
        match inner.script.pop_front() {
            Some(Listing::Running) => Ok(vec![summary(ContainerStatus::Running, "Up 5 seconds (healthy)")]),
            Some(Listing::HealthStarting) => Ok(vec![summary(
                ContainerStatus::Running,
                "Up 1 second (health: starting)",
            )]),
            Some(Listing::Created) => Ok(vec![summary(ContainerStatus::Created, "Created")]),
            Some(Listing::Missing) => Ok(vec![]),
            Some(Listing::Fail) => Err(Error::transport("daemon unavailable")),
            None => Ok(inner.resource.iter().cloned().collect()),
        }
    }

    async fn stop_resource(&self, id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::Stop(id.to_string()));
        match inner.resource.as_mut() {
            Some(r) => {
                r.status = ContainerStatus::Exited;
                r.status_message = "Exited (0) 1 second ago".to_string();
                Ok(())
            }
            None => Err(Error::NotFound(id.to_string())),
        }
    }

    async fn remove_resource(&self, id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.push(Call::Remove(id.to_string()));
        if inner.fail_remove {
            return Err(Error::transport("removal in progress"));
        }
        match inner.resource.take() {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(id.to_string())),
        }
    }

    async fn exec_in_resource(&self, id: &str, command: &str) -> Result<ExecOutput> {
        let mut inner = self.lock();
        inner
            .calls
            .push(Call::Exec(id.to_string(), command.to_string()));
        if inner.fail_exec {
            return Err(Error::transport("exec failed: container is restarting"));
        }
        Ok(ExecOutput {
            stdout: "DROP DATABASE\nCREATE DATABASE\n".to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        })
    }

    async fn close(&self) {
        self.lock().calls.push(Call::Close);
    }
}
