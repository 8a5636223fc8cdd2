use async_trait::async_trait;
use saw_rank_core::{ImportedMatrix, MetadataRecord, SawOutcome, ScoreRequest};

use crate::error::ProviderError;
use crate::types::ImportUpload;

#[async_trait]
pub trait ScoringProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn score(&self, request: ScoreRequest) -> Result<SawOutcome, ProviderError>;
}

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn list(&self) -> Result<Vec<MetadataRecord>, ProviderError>;

    async fn lookup(&self, app_id: &str) -> Result<MetadataRecord, ProviderError>;
}

#[async_trait]
pub trait ImportProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn upload(&self, upload: ImportUpload) -> Result<ImportedMatrix, ProviderError>;
}
