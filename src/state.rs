use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::models::Resource;
use crate::database::{DocumentStore, Repository};

/// Shared handles given to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let tokens = Arc::new(TokenService::new(&config.security));
        Self {
            config: Arc::new(config),
            store,
            tokens,
        }
    }

    pub fn repo<T: Resource>(&self) -> Repository<T> {
        Repository::new(self.store.clone())
    }
}
