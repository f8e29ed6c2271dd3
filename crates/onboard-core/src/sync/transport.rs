//! Delivery transport
//!
//! `Transport` sends one encoded submission and reports whether the endpoint
//! accepted it. `HttpTransport` is the production implementation; tests swap
//! in scripted transports.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::wire::{WireForm, CONTENT_TYPE};

/// A failed delivery attempt; the item stays queued
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Endpoint answered with a non-2xx status
    #[error("endpoint rejected submission with status {status}")]
    Rejected { status: u16 },

    /// Request never got a response (DNS, connection, timeout, ...)
    #[error("network error: {0}")]
    Transport(String),
}

/// Sends encoded submissions to the remote endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one submission; `Ok` only on a 2xx response
    async fn deliver(&self, form: &WireForm) -> Result<(), DeliveryError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn deliver(&self, form: &WireForm) -> Result<(), DeliveryError> {
        self.as_ref().deliver(form).await
    }
}

/// Form-encoded POST over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport for `endpoint`
    ///
    /// Without a timeout the client's default applies, so a hung request
    /// only delays its own item.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self, DeliveryError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("onboard/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether the endpoint answers at all
    pub async fn probe(&self) -> bool {
        super::connectivity::probe(&self.client, &self.endpoint).await
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, form: &WireForm) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(form.body())
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), endpoint = %self.endpoint, "Submission response");

        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
