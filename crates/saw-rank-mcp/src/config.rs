use std::time::Duration;

use saw_rank_remote::{CatalogConfig, HttpScoringConfig, ImportUploadConfig, ScoringProviderConfig};

pub const DEFAULT_WEIGHTS_PATH: &str = "./data/ahp-weights.json";

/// Everything `saw-rankd` reads from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub weights_path: String,
    pub scoring: ScoringProviderConfig,
    pub catalog: Option<CatalogConfig>,
    pub import: Option<ImportUploadConfig>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        let weights_path =
            env_string("SAW_RANK_WEIGHTS_PATH").unwrap_or_else(|| DEFAULT_WEIGHTS_PATH.to_string());
        let api_key = env_string("SAW_REMOTE_API_KEY");
        let timeout = env_string("SAW_REMOTE_TIMEOUT_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(|ms| Duration::from_millis(ms.clamp(100, 300_000)));

        let provider = env_string("SAW_SCORING_PROVIDER")
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_else(|| "local".to_string());
        let scoring = match provider.as_str() {
            "local" => ScoringProviderConfig::Local,
            "http" | "remote" => {
                let endpoint = env_string("SAW_SCORING_ENDPOINT").ok_or_else(|| {
                    "SAW_SCORING_ENDPOINT must be set when SAW_SCORING_PROVIDER=http".to_string()
                })?;
                let mut cfg = HttpScoringConfig::new(endpoint);
                cfg.api_key.clone_from(&api_key);
                if let Some(t) = timeout {
                    cfg.timeout = t;
                }
                ScoringProviderConfig::Http(cfg)
            }
            other => {
                return Err(format!(
                    "SAW_SCORING_PROVIDER must be local or http, got '{other}'"
                ))
            }
        };

        let catalog = env_string("SAW_CATALOG_BASE_URL").map(|base| {
            let mut cfg = CatalogConfig::new(base);
            cfg.api_key.clone_from(&api_key);
            if let Some(t) = timeout {
                cfg.timeout = t;
            }
            cfg
        });

        let import = env_string("SAW_IMPORT_ENDPOINT").map(|endpoint| {
            let mut cfg = ImportUploadConfig::new(endpoint);
            cfg.api_key.clone_from(&api_key);
            if let Some(t) = timeout {
                cfg.timeout = t;
            }
            cfg
        });

        Ok(Self {
            weights_path,
            scoring,
            catalog,
            import,
        })
    }

    /// Local scoring, no catalog, no import parser.
    pub fn local(weights_path: impl Into<String>) -> Self {
        Self {
            weights_path: weights_path.into(),
            scoring: ScoringProviderConfig::Local,
            catalog: None,
            import: None,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
