//! Shared, read-only server state.

use crate::classifier::ModelArtifact;
use crate::config::ServeConfig;
use crate::download::ensure_model;
use crate::error::ServerResult;
use crate::models::Dataset;
use crate::store::DatasetStore;

use super::logs::{log_info, log_info_indent, log_success};

/// Dataset and model, loaded once before the listener binds.
#[derive(Debug)]
pub struct AppState {
    pub dataset: Dataset,
    pub model: ModelArtifact,
}

impl AppState {
    pub fn new(dataset: Dataset, model: ModelArtifact) -> Self {
        Self { dataset, model }
    }

    /// Load the model (downloading it if missing and configured) and the table.
    pub async fn load(config: &ServeConfig) -> ServerResult<Self> {
        log_info("Loading model...");
        log_info_indent(format!("MODEL: {}", config.model_path.display()), 1);
        ensure_model(&config.model_path, config.model_url.as_deref()).await?;
        let model = ModelArtifact::load(&config.model_path)?;
        log_success(format!(
            "Model {} ({} labels, trained {})",
            model.id,
            model.labels().len(),
            model.trained_at.format("%Y-%m-%d %H:%M")
        ));

        log_info("Loading data...");
        log_info_indent(format!("DATABASE: {}", config.database.display()), 1);
        let store = DatasetStore::open(&config.database, &config.table).await?;
        let dataset = store.load().await?;
        store.close().await;
        log_success(format!("{} messages", dataset.len()));

        Ok(Self::new(dataset, model))
    }
}
