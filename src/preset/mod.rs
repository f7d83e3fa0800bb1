// Named, read-only container templates and the registry that loads them

mod document;

pub use document::{
    ContainerSection, DatabaseSection, EnvDecl, EnvValue, ImageSection, PresetDocument,
};

use crate::container::{Container, DatabaseContainer};
use crate::engine::EngineClient;
use crate::error::{Error, Result};
use crate::models::{ContainerSpec, Database, PortMapping};
use crate::options::{Options, merge};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

pub const POSTGRESQL: &str = "postgresql";

const BUILTIN: &[(&str, &str)] = &[(
    POSTGRESQL,
    include_str!("../../presets/postgresql.toml"),
)];

/// A loaded preset: image, base options and, for database presets, the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    id: String,
    image: String,
    base: Options,
    database: Option<Database>,
}

impl Preset {
    /// Parses and validates a TOML preset document.
    pub fn parse(id: &str, document: &str) -> Result<Self> {
        let doc: PresetDocument = toml::from_str(document)
            .map_err(|e| Error::Config(format!("preset {id}: {e}")))?;
        Self::from_document(id, doc)
    }

    pub fn from_document(id: &str, doc: PresetDocument) -> Result<Self> {
        let invalid = |what: String| Error::Config(format!("preset {id}: {what}"));

        if doc.image.name.trim().is_empty() {
            return Err(invalid("image.name must be non-empty".into()));
        }
        if let Some(decl) = doc
            .container
            .env
            .iter()
            .find(|d| d.name.is_empty() || d.name.contains('='))
        {
            return Err(invalid(format!("invalid env name {:?}", decl.name)));
        }
        PortMapping::parse_all(&doc.container.ports)
            .map_err(|e| invalid(e.to_string()))?;

        let base = Options {
            name: Some(doc.container.name),
            healthcheck: Some(doc.container.healthcheck),
            env: Some(doc.container.env.iter().map(EnvDecl::to_entry).collect()),
            ports: Some(doc.container.ports),
            start_timeout_secs: None,
        };
        let database = doc.database.map(|db| Database {
            name: db.name,
            reset_command: db.reset_command,
        });

        Ok(Self {
            id: id.to_string(),
            image: doc.image.name,
            base,
            database,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    pub fn base_options(&self) -> &Options {
        &self.base
    }

    /// Copy of this preset whose base options sit on top of `defaults`, so a default only
    /// applies where the preset leaves a field unset.
    pub fn over_defaults(&self, defaults: &Options) -> Preset {
        Preset {
            base: merge(defaults, [&self.base]),
            ..self.clone()
        }
    }

    pub fn spec(&self) -> ContainerSpec {
        ContainerSpec::with_options(&self.image, self.base.clone())
    }

    /// Base options with `overrides` applied; the preset itself is left untouched.
    pub fn customized_spec(&self, overrides: &Options) -> ContainerSpec {
        ContainerSpec::with_options(&self.image, merge(&self.base, [overrides]))
    }

    pub fn as_container(&self, engine: Arc<dyn EngineClient>) -> Container {
        Container::new(engine, self.spec())
    }

    pub fn as_customized_container(
        &self,
        engine: Arc<dyn EngineClient>,
        overrides: &Options,
    ) -> Container {
        Container::new(engine, self.customized_spec(overrides))
    }

    pub fn as_database_container(&self, engine: Arc<dyn EngineClient>) -> Result<DatabaseContainer> {
        Ok(DatabaseContainer::new(
            self.as_container(engine),
            self.require_database()?,
        ))
    }

    pub fn as_customized_database_container(
        &self,
        engine: Arc<dyn EngineClient>,
        overrides: &Options,
    ) -> Result<DatabaseContainer> {
        Ok(DatabaseContainer::new(
            self.as_customized_container(engine, overrides),
            self.require_database()?,
        ))
    }

    fn require_database(&self) -> Result<Database> {
        self.database
            .clone()
            .ok_or_else(|| Error::Config(format!("preset {} has no database section", self.id)))
    }
}

/// Loads each preset once and hands out shared, read-only copies.
///
/// Presets are looked up in the optional directory (`<dir>/<id>.toml`) first, then among
/// the built-in ones.
#[derive(Debug, Default)]
pub struct PresetRegistry {
    dir: Option<PathBuf>,
    loaded: Mutex<HashMap<String, Arc<Preset>>>,
}

impl PresetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            loaded: Mutex::default(),
        }
    }

    /// Ids of the presets compiled into the crate.
    pub fn builtin_ids() -> impl Iterator<Item = &'static str> {
        BUILTIN.iter().map(|(id, _)| *id)
    }

    pub fn get(&self, id: &str) -> Result<Arc<Preset>> {
        let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(preset) = loaded.get(id) {
            return Ok(preset.clone());
        }
        let preset = Arc::new(self.load(id)?);
        loaded.insert(id.to_string(), preset.clone());
        Ok(preset)
    }

    pub fn postgresql(&self, engine: Arc<dyn EngineClient>) -> Result<DatabaseContainer> {
        self.get(POSTGRESQL)?.as_database_container(engine)
    }

    pub fn customized_postgresql(
        &self,
        engine: Arc<dyn EngineClient>,
        overrides: &Options,
    ) -> Result<DatabaseContainer> {
        self.get(POSTGRESQL)?
            .as_customized_database_container(engine, overrides)
    }

    fn load(&self, id: &str) -> Result<Preset> {
        if id.is_empty() || id.contains(['/', '\\', '.']) {
            return Err(Error::Config(format!("invalid preset id {id:?}")));
        }
        if let Some(path) = self.dir.as_deref().map(|d| d.join(format!("{id}.toml")))
            && path.is_file()
        {
            let preset = load_file(id, &path)?;
            info!(preset = %id, path = %path.display(), "preset loaded");
            return Ok(preset);
        }
        let Some((_, document)) = BUILTIN.iter().find(|(builtin, _)| *builtin == id) else {
            return Err(Error::Config(format!("unknown preset {id:?}")));
        };
        let preset = Preset::parse(id, document)?;
        debug!(preset = %id, "built-in preset loaded");
        Ok(preset)
    }
}

fn load_file(id: &str, path: &Path) -> Result<Preset> {
    let document = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("preset {id}: {}: {e}", path.display())))?;
    Preset::parse(id, &document)
}
