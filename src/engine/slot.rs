// Lazily-initialized shared engine handle

use super::{DockerEngine, EngineClient};
use crate::config::EngineConfig;
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

type Factory = Box<dyn Fn() -> Result<Arc<dyn EngineClient>> + Send + Sync>;

/// One engine handle shared by a composition root.
///
/// The first `get` creates the handle while holding the lock; concurrent callers wait and
/// receive the same handle. `release` closes it, and the next `get` connects again.
pub struct EngineSlot {
    factory: Factory,
    handle: Mutex<Option<Arc<dyn EngineClient>>>,
}

impl EngineSlot {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn EngineClient>> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            handle: Mutex::new(None),
        }
    }

    pub fn docker(config: EngineConfig) -> Self {
        Self::new(move || {
            let engine: Arc<dyn EngineClient> = Arc::new(DockerEngine::connect(&config)?);
            Ok(engine)
        })
    }

    pub async fn get(&self) -> Result<Arc<dyn EngineClient>> {
        let mut handle = self.handle.lock().await;
        if let Some(engine) = handle.as_ref() {
            return Ok(engine.clone());
        }
        let engine = (self.factory)()?;
        info!("engine handle initialized");
        *handle = Some(engine.clone());
        Ok(engine)
    }

    pub async fn is_initialized(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    pub async fn release(&self) {
        let taken = self.handle.lock().await.take();
        if let Some(engine) = taken {
            engine.close().await;
            debug!("engine handle released");
        }
    }
}
