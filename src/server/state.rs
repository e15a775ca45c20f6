//! Server state management.

use crate::config::ServerConfig;
use crate::database::{DatabaseDriver, Gateway, QueryExecutor, SchemaInspector, VerticaDriver};
use crate::protocol::ClientInfo;
use crate::resources::ResourceCatalog;
use crate::security::SqlGate;
use crate::tools::ToolRegistry;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct ServerState {
    pub config: ServerConfig,
    pub gateway: Arc<Gateway>,
    pub tools: ToolRegistry,
    pub resources: ResourceCatalog,
    initialized: AtomicBool,
    client_info: RwLock<Option<ClientInfo>>,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        gateway: Arc<Gateway>,
        tools: ToolRegistry,
        resources: ResourceCatalog,
    ) -> Self {
        Self {
            config,
            gateway,
            tools,
            resources,
            initialized: AtomicBool::new(false),
            client_info: RwLock::new(None),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn set_initialized(&self, client_info: Option<ClientInfo>) {
        *self.client_info.write() = client_info;
        self.initialized.store(true, Ordering::SeqCst);
    }

    pub fn client_info(&self) -> Option<ClientInfo> {
        self.client_info.read().clone()
    }
}

pub struct ServerStateBuilder {
    config: Option<ServerConfig>,
    driver: Option<Arc<dyn DatabaseDriver>>,
}

impl ServerStateBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            driver: None,
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the driver. Defaults to [`VerticaDriver`].
    pub fn driver(mut self, driver: Arc<dyn DatabaseDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn build(self) -> Result<ServerState, &'static str> {
        let config = self.config.ok_or("Config is required")?;
        let driver = self
            .driver
            .unwrap_or_else(|| Arc::new(VerticaDriver::new()));

        let gateway = Arc::new(Gateway::new(config.connection.clone(), driver));
        let inspector = Arc::new(SchemaInspector::new(
            Arc::clone(&gateway),
            config.allow_lists.clone(),
        ));
        let executor = Arc::new(QueryExecutor::new(
            Arc::clone(&gateway),
            SqlGate::new(config.query_limit),
        ));

        let tools = crate::tools::create_registry(Arc::clone(&inspector), executor);
        let resources = ResourceCatalog::new(inspector);

        Ok(ServerState::new(config, gateway, tools, resources))
    }
}

impl Default for ServerStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
