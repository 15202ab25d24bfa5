use crate::telemetry::record::LogRecord;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ingestion endpoint returned status {status}: {message}")]
    Endpoint { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, SinkError>;

/// Destination for flushed telemetry batches. Only success/failure is
/// consumed; ack semantics beyond that are the endpoint's concern.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn send(&self, records: &[LogRecord]) -> Result<()>;
}

/// Ships batches to the remote ingestion endpoint as a JSON array.
#[derive(Debug)]
pub struct HttpSink {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LogSink for HttpSink {
    async fn send(&self, records: &[LogRecord]) -> Result<()> {
        let response = self.client.post(&self.endpoint).json(records).send().await?;

        if !response.status().is_success() {
            return Err(SinkError::Endpoint {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}
