use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub presets: PresetsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Unix socket of the Docker daemon; local defaults (DOCKER_HOST or /var/run/docker.sock) when absent.
    pub socket: Option<String>,
    #[serde(default = "default_engine_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            socket: None,
            timeout_secs: default_engine_timeout_secs(),
        }
    }
}

fn default_engine_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// Start timeout for containers whose preset does not set one.
    #[serde(default = "default_start_timeout_secs")]
    pub start_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_timeout_secs: default_start_timeout_secs(),
        }
    }
}

fn default_start_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresetsConfig {
    /// Directory searched for `<id>.toml` before the built-in presets.
    pub dir: Option<String>,
}

impl AppConfig {
    /// Reads `CONFIG_FILE` (default `docktest.toml`); a missing default file yields defaults.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => {
                let s = std::fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("config {}: {}", path, e))?;
                Self::load_from_str(&s)
            }
            Err(_) => match std::fs::read_to_string("docktest.toml") {
                Ok(s) => Self::load_from_str(&s),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
                Err(e) => Err(e.into()),
            },
        }
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.engine.timeout_secs > 0,
            "engine.timeout_secs must be > 0, got {}",
            self.engine.timeout_secs
        );
        if let Some(socket) = &self.engine.socket {
            anyhow::ensure!(!socket.is_empty(), "engine.socket must be non-empty when set");
        }
        anyhow::ensure!(
            self.lifecycle.start_timeout_secs > 0,
            "lifecycle.start_timeout_secs must be > 0, got {}",
            self.lifecycle.start_timeout_secs
        );
        if let Some(dir) = &self.presets.dir {
            anyhow::ensure!(!dir.is_empty(), "presets.dir must be non-empty when set");
        }
        Ok(())
    }
}
