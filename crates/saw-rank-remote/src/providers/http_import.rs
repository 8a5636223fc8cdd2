use reqwest::Client;
use reqwest::multipart::{Form, Part};
use saw_rank_core::ImportedMatrix;
use tracing::debug;

use crate::config::ImportUploadConfig;
use crate::error::ProviderError;
use crate::providers::{http_client, read_envelope, with_auth};
use crate::traits::ImportProvider;
use crate::types::{ImportEnvelope, ImportUpload};

/// Posts a spreadsheet to the external parser as multipart field `file`.
#[derive(Clone)]
pub struct HttpImportProvider {
    config: ImportUploadConfig,
    client: Client,
}

impl HttpImportProvider {
    pub fn new(config: ImportUploadConfig) -> Result<Self, ProviderError> {
        if config.endpoint.trim().is_empty() {
            return Err(ProviderError::Config(
                "import endpoint is empty".to_string(),
            ));
        }
        let client = http_client(config.timeout)?;
        Ok(Self { config, client })
    }
}

#[async_trait::async_trait]
impl ImportProvider for HttpImportProvider {
    fn name(&self) -> &'static str {
        "http-import"
    }

    async fn upload(&self, upload: ImportUpload) -> Result<ImportedMatrix, ProviderError> {
        if upload.bytes.is_empty() {
            return Err(ProviderError::Config(
                "import file is empty".to_string(),
            ));
        }
        debug!(
            endpoint = %self.config.endpoint,
            file = %upload.file_name,
            bytes = upload.bytes.len(),
            "uploading import file"
        );

        let part = Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = Form::new().part("file", part);
        let req = self.client.post(&self.config.endpoint).multipart(form);
        let res = with_auth(req, self.config.api_key.as_deref()).send().await?;
        let envelope: ImportEnvelope = read_envelope(res).await?;
        envelope.into_import()
    }
}
