//! Outbound alert delivery.

mod teams;

pub use teams::TeamsWebhook;

use async_trait::async_trait;
use thiserror::Error;

use crate::alerts::AlertMessage;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("webhook request failed: {0}")]
    Transport(#[from] anyhow::Error),
}

/// A channel that can deliver one alert message per call.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &AlertMessage) -> Result<(), NotifyError>;
}
