//! Harness for end-to-end runs: a real `taskdeck_server` router on an
//! ephemeral port, backed by in-memory SQLite.

use std::net::SocketAddr;

use anyhow::Context;
use taskdeck::{AuthSettings, HashCost, StoreBuilder};
use taskdeck_client::{ApiClient, SessionHandle};
use taskdeck_server::{AppState, router};
use tokio::{net::TcpListener, task::JoinHandle};

pub struct TestServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(AuthSettings::new("e2e-secret")).await
    }

    pub async fn start_with(settings: AuthSettings) -> anyhow::Result<Self> {
        let _ = env_logger::builder().is_test(true).try_init();

        let store = StoreBuilder::new("sqlite::memory:")
            .build()
            .await
            .context("opening in-memory store")?;
        store.migrate().await.context("creating tables")?;

        let app = router(AppState::new(
            &store,
            settings.with_hash_cost(HashCost::minimal()),
        ));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                log::error!("test server stopped: {err}");
            }
        });

        Ok(Self { addr, handle })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A client with its own, initially empty, session.
    pub fn client(&self) -> (ApiClient, SessionHandle) {
        let session = SessionHandle::new();
        (ApiClient::new(self.base_url(), session.clone()), session)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
