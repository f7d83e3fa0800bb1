// Docker container lifecycle and presets for integration test suites

pub mod config;
pub mod container;
pub mod context;
pub mod engine;
pub mod error;
pub mod models;
pub mod options;
pub mod preset;
pub mod readiness;
pub mod version;

pub use container::{Container, DatabaseContainer};
pub use context::Context;
pub use engine::{DockerEngine, EngineClient, EngineSlot};
pub use error::{Error, Result};
pub use models::{ContainerSpec, ContainerState, Database};
pub use options::Options;
pub use preset::{Preset, PresetRegistry};
