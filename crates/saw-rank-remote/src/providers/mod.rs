pub mod http_catalog;
pub mod http_import;
pub mod http_scoring;
pub mod local;

pub use http_catalog::HttpCatalogProvider;
pub use http_import::HttpImportProvider;
pub use http_scoring::HttpScoringProvider;
pub use local::LocalScoringProvider;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ProviderError;

pub(crate) fn http_client(timeout: std::time::Duration) -> Result<Client, ProviderError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

pub(crate) fn with_auth(req: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
    match api_key {
        Some(key) if !key.is_empty() => req.bearer_auth(key),
        _ => req,
    }
}

/// Decode a `{success, ...}` envelope. An error status is still decoded when
/// the body carries `"success": false`, so the remote message reaches the user.
pub(crate) async fn read_envelope<T: DeserializeOwned>(res: Response) -> Result<T, ProviderError> {
    let status = res.status();
    let body = res.text().await?;
    let value = match serde_json::from_str::<Value>(&body) {
        Ok(v) => v,
        Err(_) if !status.is_success() => {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Err(err) => return Err(ProviderError::Serde(err)),
    };

    let explicit_failure = value.get("success").and_then(Value::as_bool) == Some(false);
    if !status.is_success() && !explicit_failure {
        return Err(ProviderError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(serde_json::from_value(value)?)
}
