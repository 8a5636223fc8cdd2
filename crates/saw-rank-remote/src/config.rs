use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpScoringConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl HttpScoringConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub list_path: String,
    pub lookup_path: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl CatalogConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            list_path: "/get_steam_games".to_string(),
            lookup_path: "/search_steam_game".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn list_url(&self) -> String {
        join_url(&self.base_url, &self.list_path)
    }

    pub fn lookup_url(&self, app_id: &str) -> String {
        format!("{}/{app_id}", join_url(&self.base_url, &self.lookup_path))
    }
}

#[derive(Debug, Clone)]
pub struct ImportUploadConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl ImportUploadConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ScoringProviderConfig {
    Local,
    Http(HttpScoringConfig),
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
