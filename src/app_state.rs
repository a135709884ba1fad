use std::sync::Arc;

use crate::config::Config;
use crate::fetcher::FetchError;
use crate::pipeline::ModelCardPipeline;
use crate::session::SessionRegistry;
use crate::sources::SourceClients;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ModelCardPipeline>,
    pub clients: Arc<SourceClients>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let clients = SourceClients::from_config(config)?;
        let pipeline = ModelCardPipeline::new(clients.fetchers(), config.fetch_timeout());
        Ok(Self {
            pipeline: Arc::new(pipeline),
            clients: Arc::new(clients),
            sessions: SessionRegistry::new(),
        })
    }
}
