use std::sync::Arc;

use crate::config::{CatalogConfig, ImportUploadConfig, ScoringProviderConfig};
use crate::error::ProviderError;
use crate::providers::{
    HttpCatalogProvider, HttpImportProvider, HttpScoringProvider, LocalScoringProvider,
};
use crate::traits::{CatalogProvider, ImportProvider, ScoringProvider};

pub fn build_scoring_provider(
    cfg: ScoringProviderConfig,
) -> Result<Arc<dyn ScoringProvider>, ProviderError> {
    match cfg {
        ScoringProviderConfig::Local => Ok(Arc::new(LocalScoringProvider)),
        ScoringProviderConfig::Http(c) => Ok(Arc::new(HttpScoringProvider::new(c)?)),
    }
}

pub fn build_catalog_provider(
    cfg: CatalogConfig,
) -> Result<Arc<dyn CatalogProvider>, ProviderError> {
    Ok(Arc::new(HttpCatalogProvider::new(cfg)?))
}

pub fn build_import_provider(
    cfg: ImportUploadConfig,
) -> Result<Arc<dyn ImportProvider>, ProviderError> {
    Ok(Arc::new(HttpImportProvider::new(cfg)?))
}
