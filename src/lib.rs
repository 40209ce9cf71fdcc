pub mod api;
pub mod chunker;
pub mod config;
pub mod error;
pub mod llm;
pub mod normalizer;
pub mod prompt;
pub mod scraper;
pub mod session;
pub mod workflow;

use std::sync::Arc;

use config::Config;
use error::Result;
use session::SessionStore;
use workflow::Workflow;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<Workflow>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let workflow = Workflow::from_config(config)?;
        Ok(AppState {
            workflow: Arc::new(workflow),
            sessions: SessionStore::new(),
        })
    }
}
