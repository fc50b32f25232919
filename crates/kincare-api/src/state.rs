//! Application state shared across handlers

use std::sync::Arc;

use kincare_agents::{AgentService, ResponseGenerator};
use kincare_db::Storage;

use crate::hub::{HubConfig, RelayHub};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub agents: AgentService,
    pub hub: Arc<RelayHub>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Storage>,
        generator: Arc<dyn ResponseGenerator>,
        hub: HubConfig,
    ) -> Self {
        Self {
            agents: AgentService::new(store.clone(), generator),
            store,
            hub: Arc::new(RelayHub::new(hub)),
        }
    }
}
