//! HTTP webhook publisher

use async_trait::async_trait;
use std::time::Duration;

use super::{PublishError, Publisher};
use crate::config::defaults::HTTP_PUBLISH_TIMEOUT_SECS;
use crate::types::PublishPayload;

/// POSTs each payload as JSON to a fixed URL.
#[derive(Clone)]
pub struct HttpPublisher {
    http: reqwest::Client,
    url: String,
}

impl HttpPublisher {
    pub fn new(url: &str) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_PUBLISH_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, payload: &PublishPayload) -> Result<(), PublishError> {
        let resp = self.http.post(&self.url).json(payload).send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PublishError::Status(status))
        }
    }

    fn sink_name(&self) -> &str {
        "http"
    }
}
