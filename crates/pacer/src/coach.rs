//! Client side of the external coaching service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::CoachConfig;
use crate::errors::CoachError;
use crate::models::{Advice, CoachReply, RaceSummary, TelemetryTick};

/// Which send path a tick travels on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Sample-cadence tick, fire-and-forget.
    Periodic,
    /// User-triggered ask; the reply is awaited.
    OnDemand,
}

impl Channel {
    pub fn path(&self) -> &'static str {
        match self {
            Channel::Periodic => "/tick",
            Channel::OnDemand => "/coach",
        }
    }
}

/// The coaching contract: a snapshot in, a tip or no tip out.
#[async_trait]
pub trait CoachingService: Send + Sync {
    async fn advise(&self, channel: Channel, tick: &TelemetryTick) -> Result<Advice, CoachError>;

    /// Best-effort notification that a race ended.
    async fn end_of_race(&self, summary: &RaceSummary) -> Result<(), CoachError>;
}

/// HTTP/JSON implementation of [`CoachingService`].
pub struct HttpCoach {
    client: Client,
    base_url: String,
}

impl HttpCoach {
    pub fn new(config: &CoachConfig) -> Result<Self, CoachError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, CoachError> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CoachError::Status { status, body });
        }
        Ok(resp)
    }
}

#[async_trait]
impl CoachingService for HttpCoach {
    async fn advise(&self, channel: Channel, tick: &TelemetryTick) -> Result<Advice, CoachError> {
        debug!(
            "Posting {} at {:.2} km (pace {:.2})",
            channel.path(),
            tick.done_km,
            tick.pace_now
        );
        let resp = self.post(channel.path(), tick).await?;
        let text = resp.text().await?;
        decode_reply(&text)
    }

    async fn end_of_race(&self, summary: &RaceSummary) -> Result<(), CoachError> {
        self.post("/reset", summary).await?;
        Ok(())
    }
}

/// Parses a `{"message": ...}` body.
pub fn decode_reply(body: &str) -> Result<Advice, CoachError> {
    let reply: CoachReply =
        serde_json::from_str(body).map_err(|e| CoachError::Malformed(e.to_string()))?;
    Ok(reply.into())
}
