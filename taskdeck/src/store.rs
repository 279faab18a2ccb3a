//! Persistence gateway.
//!
//! [`Store`] owns the SeaORM [`DatabaseConnection`] that the auth and task
//! services share. It is built once at process start with [`StoreBuilder`],
//! and the tables are created with [`Store::migrate`] (or entity by entity
//! through [`Store::schema`]).

use std::time::Duration;

use log::{LevelFilter, error, info};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
    sea_query::SqliteQueryBuilder,
};

use crate::entity::{task, user};

pub struct Store {
    inner: DatabaseConnection,
}

impl Store {
    /// Get a reference to the underlying SeaORM connection.
    pub fn inner(&self) -> &DatabaseConnection {
        &self.inner
    }

    /// Start building the schema.
    ///
    /// ```ignore
    /// store.schema()
    ///     .register(user::Entity)
    ///     .register(task::Entity)
    ///     .sync()
    ///     .await?;
    /// ```
    pub fn schema(&self) -> SchemaBuilder<'_> {
        SchemaBuilder {
            store: self,
            statements: Vec::new(),
        }
    }

    /// Create every table the services need. Users come first because tasks
    /// reference them.
    pub async fn migrate(&self) -> Result<(), DbErr> {
        self.schema()
            .register(user::Entity)
            .register(task::Entity)
            .sync()
            .await
    }

    pub async fn close(self) -> Result<(), DbErr> {
        self.inner.close().await
    }
}

/// Collects `CREATE TABLE IF NOT EXISTS` statements and applies them in
/// registration order.
pub struct SchemaBuilder<'a> {
    store: &'a Store,
    statements: Vec<String>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn register<E>(mut self, entity: E) -> Self
    where
        E: EntityTrait,
    {
        let schema = Schema::new(self.store.inner.get_database_backend());
        let create_sql = schema
            .create_table_from_entity(entity)
            .if_not_exists()
            .to_owned()
            .to_string(SqliteQueryBuilder);
        self.statements.push(create_sql);
        self
    }

    pub async fn sync(self) -> Result<(), DbErr> {
        for statement in self.statements {
            self.store.inner.execute_unprepared(&statement).await?;
        }
        Ok(())
    }
}

/// Builder for [`Store`].
pub struct StoreBuilder {
    database_url: String,
    max_connections: Option<u32>,
    connect_timeout: Duration,
}

impl StoreBuilder {
    pub fn new(url: &str) -> Self {
        Self {
            database_url: url.to_string(),
            max_connections: None,
            connect_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = Some(max);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub async fn build(self) -> Result<Store, DbErr> {
        let mut opts = ConnectOptions::new(&self.database_url);
        opts.connect_timeout(self.connect_timeout)
            .sqlx_logging_level(LevelFilter::Debug);

        // Each pooled connection to `sqlite::memory:` opens its own empty
        // database, so the pool must never hold more than one.
        if is_in_memory(&self.database_url) {
            opts.max_connections(1).min_connections(1);
        } else if let Some(max) = self.max_connections {
            opts.max_connections(max);
        }

        match Database::connect(opts).await {
            Ok(inner) => {
                info!("database connected ({})", redact(&self.database_url));
                Ok(Store { inner })
            }
            Err(err) => {
                error!("database connection failed ({}): {err}", redact(&self.database_url));
                Err(err)
            }
        }
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Strip credentials from a connection string before it reaches the logs.
fn redact(url: &str) -> String {
    match (url.split_once("://"), url.rfind('@')) {
        (Some((scheme, _)), Some(at)) => format!("{scheme}://***{}", &url[at..]),
        _ => url.to_string(),
    }
}
