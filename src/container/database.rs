// Database capability on top of the lifecycle controller

use super::Container;
use crate::context::Context;
use crate::engine::ExecOutput;
use crate::error::Result;
use crate::models::Database;
use std::ops::{Deref, DerefMut};
use tracing::info;

/// A [`Container`] hosting a database that can be reset between test runs.
/// Lifecycle operations are reached through `Deref`.
pub struct DatabaseContainer {
    container: Container,
    database: Database,
}

impl DatabaseContainer {
    pub fn new(container: Container, database: Database) -> Self {
        Self {
            container,
            database,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn into_container(self) -> Container {
        self.container
    }

    /// Runs the reset command inside the container. Call `start`/`create_start` first.
    pub async fn reset_database(&mut self, ctx: &Context) -> Result<ExecOutput> {
        let output = self
            .container
            .exec(ctx, &self.database.reset_command)
            .await?;
        info!(database = %self.database.name, exit_code = ?output.exit_code, "database reset");
        Ok(output)
    }
}

impl Deref for DatabaseContainer {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}

impl DerefMut for DatabaseContainer {
    fn deref_mut(&mut self) -> &mut Container {
        &mut self.container
    }
}
