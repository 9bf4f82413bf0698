use std::sync::Arc;

use crate::assets::AssetStore;
use crate::model::ModelManager;

#[derive(Clone)]
pub struct AppState {
    mm: ModelManager,
    assets: Arc<dyn AssetStore>,
}

impl AppState {
    pub fn new(mm: ModelManager, assets: Arc<dyn AssetStore>) -> Self {
        Self { mm, assets }
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn assets(&self) -> &dyn AssetStore {
        self.assets.as_ref()
    }
}
