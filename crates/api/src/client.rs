//! HTTP transport for the remote credentials API.

use std::time::Duration;

use reqwest::StatusCode;

use propdesk_auth::{
    AuthError, CredentialExchange, Credentials, ExchangeErrorBody, ExchangeResponse,
    RefreshRequest, TokenPair,
};

/// `CredentialExchange` over HTTP/JSON.
///
/// - `POST {base}/auth/login` with `{email, password}`
/// - `POST {base}/auth/refresh-tokens` with `{refreshToken}`
///
/// No retries: a failed exchange is reported to the caller as-is.
#[derive(Debug, Clone)]
pub struct HttpCredentialExchange {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCredentialExchange {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, AuthError>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<T>()
                .await
                .map_err(|e| AuthError::transport(format!("malformed response from {path}: {e}")));
        }

        // Error bodies are best-effort; a missing message falls back to the default.
        let message = resp
            .json::<ExchangeErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message);

        if is_rejection(status) {
            tracing::debug!(%status, path, "credentials API rejected request");
            Err(AuthError::invalid_credentials(message))
        } else {
            tracing::warn!(%status, path, "credentials API failed");
            Err(AuthError::transport(format!(
                "{status}: {}",
                message.unwrap_or_else(|| "no message".to_string())
            )))
        }
    }
}

fn is_rejection(status: StatusCode) -> bool {
    status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS
}

#[async_trait::async_trait]
impl CredentialExchange for HttpCredentialExchange {
    async fn login(&self, credentials: &Credentials) -> Result<ExchangeResponse, AuthError> {
        self.post("/auth/login", credentials).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.post("/auth/refresh-tokens", &body).await
    }
}
