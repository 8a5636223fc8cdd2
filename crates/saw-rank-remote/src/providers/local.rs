use saw_rank_core::{rank, SawOutcome, ScoreRequest};

use crate::error::ProviderError;
use crate::traits::ScoringProvider;

/// Runs the SAW engine in process.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalScoringProvider;

#[async_trait::async_trait]
impl ScoringProvider for LocalScoringProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn score(&self, request: ScoreRequest) -> Result<SawOutcome, ProviderError> {
        Ok(rank(&request)?)
    }
}
