use super::StartupError;
use crate::config::{BackendType, DataPaths, ServerConfig};
use crate::dataset::{load_deals, Transaction};
use crate::model::TrainedModel;

/// Everything a request may read. Never mutated after construction.
#[derive(Debug)]
pub struct ServingContext {
    pub model: TrainedModel,
    /// Raw deals of the served 법정동, in snapshot order
    pub deals: Vec<Transaction>,
    pub dong: String,
    /// Address label echoed in search results
    pub location: String,
}

impl ServingContext {
    /// Deals outside `dong` are dropped here so every query sees one 법정동
    pub fn new(
        model: TrainedModel,
        deals: Vec<Transaction>,
        dong: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        let dong = dong.into();
        let total = deals.len();
        let deals: Vec<Transaction> = deals
            .into_iter()
            .filter(|tx| tx.dong_name.as_deref() == Some(dong.as_str()))
            .map(Transaction::with_split_date_fields)
            .collect();

        if deals.len() < total {
            log::debug!("Dropped {} deals outside {}", total - deals.len(), dong);
        }

        Self {
            model,
            deals,
            dong,
            location: location.into(),
        }
    }

    pub fn load(
        paths: &DataPaths,
        backend: BackendType,
        config: &ServerConfig,
    ) -> Result<Self, StartupError> {
        let model = TrainedModel::load(&paths.model)?;
        let deals = load_deals(backend, paths)?;
        let ctx = Self::new(model, deals, config.dong.clone(), config.location.clone());

        log::info!("🏠 Serving {} deals in {}", ctx.deals.len(), ctx.dong);
        Ok(ctx)
    }
}
