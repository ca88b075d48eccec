use std::time::Duration;

use async_trait::async_trait;
use common::{JudgeRequest, JudgeStatus, JudgeTicket};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::JudgeConfig;

use super::{JudgeClient, JudgeError};

/// Judge0-compatible HTTP client.
#[derive(Clone)]
pub struct Judge0Client {
    http: Client,
    base_url: String,
}

impl Judge0Client {
    pub fn new(config: &JudgeConfig) -> Result<Self, JudgeError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| JudgeError::Unavailable(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn status_url(&self, token: &str) -> String {
        format!("{}/{}?base64_encoded=true", self.base_url, token)
    }
}

/// Server-side failures are worth retrying, anything else non-2xx is not.
fn classify_status(status: StatusCode, body: &str) -> JudgeError {
    let msg = format!("Judge returned {status}: {body}");
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        JudgeError::Unavailable(msg)
    } else {
        JudgeError::Protocol(msg)
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, JudgeError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| JudgeError::Unavailable(format!("Failed to read judge response: {e}")))?;

    if !status.is_success() {
        return Err(classify_status(status, &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| JudgeError::Protocol(format!("Unparseable judge response ({e}): {body}")))
}

#[async_trait]
impl JudgeClient for Judge0Client {
    async fn submit(&self, request: &JudgeRequest) -> Result<String, JudgeError> {
        debug!(
            url = %self.base_url,
            language_id = request.language_id,
            "Submitting to judge"
        );

        let resp = self
            .http
            .post(&self.base_url)
            .json(request)
            .send()
            .await
            .map_err(|e| JudgeError::Unavailable(format!("Judge request failed: {e}")))?;

        let ticket: JudgeTicket = read_json(resp).await?;
        if ticket.token.trim().is_empty() {
            return Err(JudgeError::Protocol("Judge returned no token".into()));
        }
        Ok(ticket.token)
    }

    async fn poll(&self, token: &str) -> Result<JudgeStatus, JudgeError> {
        let resp = self
            .http
            .get(self.status_url(token))
            .send()
            .await
            .map_err(|e| JudgeError::Unavailable(format!("Judge poll failed: {e}")))?;

        read_json(resp).await
    }
}
