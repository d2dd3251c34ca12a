use std::sync::Arc;

use one_meter_core::errors::CoreError;
use one_meter_core::store::firebase::FirebaseStore;
use one_meter_core::store::memory::MemoryStore;
use one_meter_core::OneMeter;
use tracing::info;

use super::config::{Config, StoreBackend};

pub struct AppState {
    pub meter: OneMeter,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Arc<Self>, CoreError> {
        let meter = match &config.store {
            StoreBackend::Firebase { url, auth } => {
                info!("Using Firebase store at {url}");
                let store = FirebaseStore::with_timeout(url, auth.clone(), config.store_timeout)?;
                OneMeter::new(Arc::new(store), config.settings.clone())
            }
            StoreBackend::Memory => {
                OneMeter::new(Arc::new(MemoryStore::new()), config.settings.clone())
            }
        };

        Ok(Self::from_meter(meter))
    }

    pub fn from_meter(meter: OneMeter) -> Arc<Self> {
        Arc::new(Self { meter })
    }
}
