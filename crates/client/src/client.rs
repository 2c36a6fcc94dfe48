//! Core API client: token caching and JSON request plumbing.

use std::time::{Duration, Instant};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use baseops_core::ApiCredentials;

use crate::ApiError;

/// Transport retry attempts (bounded exponential backoff).
const MAX_ATTEMPTS: u32 = 3;
/// Initial backoff delay; doubles per attempt.
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
/// Refresh the token this long before its reported expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Platform response envelope: `code` 0 means success, `data` carries the
/// payload.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: String,
    /// Seconds until the token expires.
    #[serde(default)]
    expire: u64,
}

/// Authenticated JSON client for the open-platform API.
pub struct ApiClient {
    creds: ApiCredentials,
    http: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl ApiClient {
    /// Build a client from explicit credentials (never read from the
    /// environment in here).
    pub fn new(creds: ApiCredentials) -> Self {
        Self {
            creds,
            http: reqwest::Client::new(),
            token: Mutex::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.creds.base_url
    }

    /// Current tenant token, fetching or refreshing as needed.
    async fn token(&self) -> Result<String, ApiError> {
        let mut cache = self.token.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN {
                return Ok(cached.token.clone());
            }
        }

        debug!("fetching tenant access token");
        let url = format!(
            "{}/auth/v3/tenant_access_token/internal",
            self.creds.base_url
        );
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "app_id": self.creds.app_id,
                "app_secret": self.creds.app_secret,
            }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Auth(format!("token endpoint returned {status}: {body}")));
        }
        let token: TokenResponse = resp.json().await?;
        if token.code != 0 {
            return Err(ApiError::Auth(format!(
                "token request rejected ({}): {}",
                token.code, token.msg
            )));
        }

        let expires_at = Instant::now() + Duration::from_secs(token.expire.max(60));
        *cache = Some(CachedToken {
            token: token.tenant_access_token.clone(),
            expires_at,
        });
        Ok(token.tenant_access_token)
    }

    /// GET with query parameters.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        self.send(Method::GET, path, Some(query), None).await
    }

    /// POST with a JSON body.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, path, None, Some(body)).await
    }

    /// PUT with a JSON body.
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApiError> {
        self.send(Method::PUT, path, None, Some(body)).await
    }

    /// Send a request, retrying transport failures, 429s, and 5xxs with
    /// bounded exponential backoff. Non-zero envelope codes are terminal
    /// (the platform answered; retrying won't change its mind).
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.creds.base_url, path);
        let mut delay = INITIAL_BACKOFF;

        for attempt in 1..=MAX_ATTEMPTS {
            let token = self.token().await?;
            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&token);
            if let Some(query) = query {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let retryable =
                        status == reqwest::StatusCode::TOO_MANY_REQUESTS
                            || status.is_server_error();
                    if retryable && attempt < MAX_ATTEMPTS {
                        warn!(%status, path, attempt, "retryable status, backing off");
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                        continue;
                    }
                    if !status.is_success() {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(ApiError::Http { status, body });
                    }
                    let envelope: Envelope<T> = resp.json().await?;
                    if envelope.code != 0 {
                        return Err(ApiError::Api {
                            code: envelope.code,
                            path: path.to_string(),
                            msg: envelope.msg,
                        });
                    }
                    return envelope.data.ok_or_else(|| {
                        ApiError::Malformed(format!("missing data in response from {path}"))
                    });
                }
                Err(e) => {
                    let retryable = e.is_timeout() || e.is_connect() || e.is_request();
                    if retryable && attempt < MAX_ATTEMPTS {
                        warn!(error = %e, path, attempt, "transport error, backing off");
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
        unreachable!("retry loop always returns within MAX_ATTEMPTS");
    }
}

// ── Tests ───────────────────────────────────────────────────────────
