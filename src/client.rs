//! Network clients for the two chained calls


use crate::{
    error::{AppError, Result},
    models::Config,
};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

/// The one capability the benchmark needs from a network client
#[async_trait]
pub trait ResourceLister: Send + Sync {
    /// List the resources behind the configured endpoint.
    ///
    /// The response content is discarded; only success or failure matters.
    async fn list_resources(&self) -> Result<()>;
}

/// reqwest-backed client pointed at an endpoint override
pub struct ResourceClient {
    client: Client,
    endpoint: Url,
    connect_timeout: Duration,
}

impl ResourceClient {
    /// Create a client for `endpoint` that gives up connecting after
    /// `connect_timeout`
    pub fn new(endpoint: &str, connect_timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| AppError::config(format!("Invalid endpoint '{}': {}", endpoint, e)))?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AppError::config(format!(
                "Endpoint must use http or https: {}",
                endpoint
            )));
        }

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            connect_timeout,
        })
    }

    /// Create a client from the benchmark configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.endpoint, config.connect_timeout())
    }

    /// The endpoint every call is sent to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The configured connection timeout
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

#[async_trait]
impl ResourceLister for ResourceClient {
    async fn list_resources(&self) -> Result<()> {
        self.client
            .get(self.endpoint.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Factory for the pair of clients used by the two calls
pub struct ClientFactory {
    endpoint: String,
    connect_timeout: Duration,
    shared_client: bool,
}

impl ClientFactory {
    /// Create a new client factory from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            connect_timeout: config.connect_timeout(),
            shared_client: config.shared_client,
        }
    }

    /// Create a single client
    pub fn create_client(&self) -> Result<ResourceClient> {
        ResourceClient::new(&self.endpoint, self.connect_timeout)
    }

    /// Create the clients for the first and the second call.
    ///
    /// With `shared_client` both handles point at one instance.
    pub fn create_pair(&self) -> Result<(Arc<dyn ResourceLister>, Arc<dyn ResourceLister>)> {
        let first: Arc<dyn ResourceLister> = Arc::new(self.create_client()?);
        let second: Arc<dyn ResourceLister> = if self.shared_client {
            Arc::clone(&first)
        } else {
            Arc::new(self.create_client()?)
        };
        Ok((first, second))
    }
}

/// In-process lister with a fixed outcome.
///
/// Used by tests and benches to drive the composition strategies without a
/// network.
pub struct ScriptedClient {
    outcome: Result<()>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedClient {
    /// A lister whose calls succeed after `delay`
    pub fn succeeding(delay: Duration) -> Self {
        Self {
            outcome: Ok(()),
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    /// A lister whose calls fail with `error` after `delay`
    pub fn failing(error: AppError, delay: Duration) -> Self {
        Self {
            outcome: Err(error),
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceLister for ScriptedClient {
    async fn list_resources(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}
