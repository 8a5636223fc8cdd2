use reqwest::Client;
use saw_rank_core::{SawOutcome, ScoreRequest};
use tracing::debug;

use crate::config::HttpScoringConfig;
use crate::error::ProviderError;
use crate::providers::{http_client, read_envelope, with_auth};
use crate::traits::ScoringProvider;
use crate::types::ScoreEnvelope;

#[derive(Clone)]
pub struct HttpScoringProvider {
    config: HttpScoringConfig,
    client: Client,
}

impl HttpScoringProvider {
    pub fn new(config: HttpScoringConfig) -> Result<Self, ProviderError> {
        if config.endpoint.trim().is_empty() {
            return Err(ProviderError::Config(
                "scoring endpoint is empty".to_string(),
            ));
        }
        let client = http_client(config.timeout)?;
        Ok(Self { config, client })
    }
}

#[async_trait::async_trait]
impl ScoringProvider for HttpScoringProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn score(&self, request: ScoreRequest) -> Result<SawOutcome, ProviderError> {
        request.validate()?;
        debug!(
            endpoint = %self.config.endpoint,
            alternatives = request.alternatives.len(),
            "sending remote scoring request"
        );

        let req = self.client.post(&self.config.endpoint).json(&request);
        let res = with_auth(req, self.config.api_key.as_deref()).send().await?;
        let envelope: ScoreEnvelope = read_envelope(res).await?;
        let outcome = envelope.into_outcome()?;

        if outcome.ranking.len() != request.alternatives.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "ranking has {} entries for {} alternatives",
                outcome.ranking.len(),
                request.alternatives.len()
            )));
        }
        if outcome.normalized_matrix.len() != request.alternatives.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "normalized matrix has {} rows for {} alternatives",
                outcome.normalized_matrix.len(),
                request.alternatives.len()
            )));
        }
        Ok(outcome)
    }
}
