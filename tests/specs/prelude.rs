//! Shared fixtures for the behavioral specs

pub use adbx_adapters::{DriverCall, FakeDriver, FakeRegistry, RegistryError, TracedDriver};
pub use adbx_core::{DriverError, MisuseError, ObjectsFilter};
pub use adbx_engine::{
    Connection, ConnectionConfig, ConnectionError, Database, DatabaseError, InitializationError,
};
pub use std::sync::Arc;
pub use std::time::Duration;

pub type Driver = TracedDriver<FakeDriver>;

/// A fake driver behind the tracing wrapper, plus an initialized database
pub struct Setup {
    pub fake: FakeDriver,
    pub driver: Arc<Driver>,
    pub database: Database<Driver>,
}

impl Setup {
    pub async fn new() -> Self {
        Self::with_driver(FakeDriver::new().with_table("users", "id: int64, name: utf8")).await
    }

    pub async fn with_driver(fake: FakeDriver) -> Self {
        let driver = Arc::new(TracedDriver::new(fake.clone()));
        let database = Database::new(Arc::clone(&driver)).unwrap();
        database.set_option("uri", "memory://specs").await.unwrap();
        database.init().await.unwrap();
        Self {
            fake,
            driver,
            database,
        }
    }

    pub async fn connect(&self) -> Connection<Driver> {
        self.connect_with(ConnectionConfig::new("specs")).await.unwrap()
    }

    pub async fn connect_with(
        &self,
        config: ConnectionConfig,
    ) -> Result<Connection<Driver>, ConnectionError> {
        Connection::start(Arc::clone(&self.driver), &self.database, config).await
    }

    /// Driver calls other than handle setup and teardown, in order
    pub fn work_calls(&self) -> Vec<&'static str> {
        self.fake
            .call_names()
            .into_iter()
            .filter(|name| !name.starts_with("database_") && !name.starts_with("connection_"))
            .collect()
    }

    /// Wait until the fake has seen `n` calls of `op`
    pub async fn wait_for_calls(&self, op: &str, n: usize) {
        let fake = &self.fake;
        tokio::time::timeout(Duration::from_secs(5), async {
            while fake.count(op) < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {} x{}", op, n));
    }
}

pub fn users_schema() -> &'static str {
    "id: int64, name: utf8"
}

/// Give spawned callers a moment to reach the coordinator's mailbox
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}
