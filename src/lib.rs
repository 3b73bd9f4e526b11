pub mod api;
pub mod backend;
pub mod config;
pub mod db;
pub mod media;

use config::Config;
use std::sync::Arc;

use crate::backend::{Backend, RestBackend};
use crate::media::{CloudinaryClient, MediaHost};

pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn Backend>,
    pub media: Arc<dyn MediaHost>,
}

impl AppState {
    /// Build the state with the platform and media clients described by
    /// `config`.
    pub fn new(config: Config) -> Self {
        let backend = Arc::new(RestBackend::new(&config.backend));
        let media = Arc::new(CloudinaryClient::new(&config.media));
        Self::with_clients(config, backend, media)
    }

    pub fn with_clients(
        config: Config,
        backend: Arc<dyn Backend>,
        media: Arc<dyn MediaHost>,
    ) -> Self {
        Self {
            config,
            backend,
            media,
        }
    }
}
