use reqwest::Client;
use saw_rank_core::MetadataRecord;
use tracing::debug;

use crate::config::CatalogConfig;
use crate::error::ProviderError;
use crate::providers::{http_client, read_envelope, with_auth};
use crate::traits::CatalogProvider;
use crate::types::{CatalogGameEnvelope, CatalogListEnvelope};

#[derive(Clone)]
pub struct HttpCatalogProvider {
    config: CatalogConfig,
    client: Client,
}

impl HttpCatalogProvider {
    pub fn new(config: CatalogConfig) -> Result<Self, ProviderError> {
        if config.base_url.trim().is_empty() {
            return Err(ProviderError::Config(
                "catalog base url is empty".to_string(),
            ));
        }
        let client = http_client(config.timeout)?;
        Ok(Self { config, client })
    }
}

#[async_trait::async_trait]
impl CatalogProvider for HttpCatalogProvider {
    fn name(&self) -> &'static str {
        "http-catalog"
    }

    async fn list(&self) -> Result<Vec<MetadataRecord>, ProviderError> {
        let url = self.config.list_url();
        debug!(%url, "fetching catalog list");
        let req = self.client.get(&url);
        let res = with_auth(req, self.config.api_key.as_deref()).send().await?;
        let envelope: CatalogListEnvelope = read_envelope(res).await?;
        envelope.into_records()
    }

    async fn lookup(&self, app_id: &str) -> Result<MetadataRecord, ProviderError> {
        let app_id = app_id.trim();
        if app_id.is_empty() {
            return Err(ProviderError::Config("app id is empty".to_string()));
        }
        if !app_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ProviderError::Config(format!(
                "app id '{app_id}' must be alphanumeric"
            )));
        }

        let url = self.config.lookup_url(app_id);
        debug!(%url, "looking up catalog record");
        let req = self.client.get(&url);
        let res = with_auth(req, self.config.api_key.as_deref()).send().await?;
        let envelope: CatalogGameEnvelope = read_envelope(res).await?;
        let record = envelope.into_record()?;
        if record.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(ProviderError::InvalidResponse(
                "catalog record has no name".to_string(),
            ));
        }
        Ok(record)
    }
}
