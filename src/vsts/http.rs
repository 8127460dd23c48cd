//! HTTP transport for VSTS REST API calls

use super::auth::Credential;
use super::error::{ApiError, Error, Result};
use reqwest::header::CONNECTION;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// Maximum length of a body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize a request or response body for logging
/// Truncates long bodies and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = match body.char_indices().nth(MAX_LOG_BODY_LENGTH) {
        Some((cut, _)) => format!("{}... [truncated, {} bytes total]", &body[..cut], body.len()),
        None => body.to_string(),
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// A successful (status in [200, 400)) response with its body fully read
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub endpoint: String,
    pub body: String,
}

impl Response {
    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|source| Error::Decode {
            endpoint: self.endpoint.clone(),
            source,
        })
    }
}

/// Authenticated HTTP transport for one VSTS account
///
/// Every verb funnels through [`Transport::send`], so all resource kinds get
/// the same authentication, error decoding and logging.
#[derive(Clone)]
pub struct Transport {
    client: Client,
    credential: Credential,
    base_url: Url,
}

impl Transport {
    /// Transport against `https://{account}.visualstudio.com/`
    pub fn new(credential: Credential) -> Result<Self> {
        let base_url = credential.base_url();
        Self::with_base_url(credential, &base_url)
    }

    /// Transport against an explicit base URL (mock servers, on-prem hosts)
    pub fn with_base_url(credential: Credential, base_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|source| Error::Url {
            url: base_url.to_string(),
            source,
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        // No idle pool: each request gets its own connection
        let client = Client::builder()
            .user_agent(concat!("vsts-reconcile/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            client,
            credential,
            base_url,
        })
    }

    pub fn account(&self) -> &str {
        self.credential.account()
    }

    /// Absolute URL for a relative endpoint path
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|source| Error::Url {
                url: endpoint.to_string(),
                source,
            })
    }

    /// Send a request and classify the response
    ///
    /// Statuses outside [200, 400) come back as [`Error::Api`] with the
    /// decoded body and the response headers; the status stays available
    /// through [`Error::status`].
    pub async fn send(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Result<Response> {
        let url = self.endpoint_url(endpoint)?;
        tracing::debug!("Sending request to {} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .basic_auth(self.credential.account(), Some(self.credential.token()))
            .header(CONNECTION, "close");

        // Content-Type only with a body: VSTS rejects some bodiless requests carrying it
        if let Some(payload) = payload {
            tracing::debug!("With payload {}", sanitize_for_log(&payload.to_string()));
            request = request.json(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if !(200..400).contains(&status.as_u16()) {
            tracing::error!("API error: {} {} - {}", status, endpoint, sanitize_for_log(&body));
            let api = ApiError::decode(status.as_u16(), endpoint, &body).with_headers(headers);
            return Err(api.into());
        }

        tracing::debug!("Resp: {} {}", status, sanitize_for_log(&body));

        Ok(Response {
            status,
            endpoint: endpoint.to_string(),
            body,
        })
    }

    pub async fn get(&self, endpoint: &str) -> Result<Response> {
        self.send(Method::GET, endpoint, None).await
    }

    pub async fn post(&self, endpoint: &str, payload: &Value) -> Result<Response> {
        self.send(Method::POST, endpoint, Some(payload)).await
    }

    pub async fn put(&self, endpoint: &str, payload: &Value) -> Result<Response> {
        self.send(Method::PUT, endpoint, Some(payload)).await
    }

    /// PUT without a body
    pub async fn put_only(&self, endpoint: &str) -> Result<Response> {
        self.send(Method::PUT, endpoint, None).await
    }

    pub async fn patch(&self, endpoint: &str, payload: &Value) -> Result<Response> {
        self.send(Method::PATCH, endpoint, Some(payload)).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Response> {
        self.send(Method::DELETE, endpoint, None).await
    }
}
