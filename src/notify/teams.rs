use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{Notifier, NotifyError};
use crate::alerts::AlertMessage;
use crate::fetch::{HttpClient, post_json};

/// Incoming-webhook notifier posting an Adaptive Card.
pub struct TeamsWebhook<C> {
    client: C,
    url: String,
}

impl<C: HttpClient> TeamsWebhook<C> {
    pub fn new(client: C, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Adaptive Card payload: bold title, intro line, one block per alert.
    pub fn card(message: &AlertMessage) -> Value {
        let mut body = vec![
            json!({
                "type": "TextBlock",
                "size": "Large",
                "weight": "Bolder",
                "text": message.title,
                "color": "Attention",
            }),
            json!({
                "type": "TextBlock",
                "text": message.intro,
                "wrap": true,
            }),
        ];
        body.extend(message.blocks.iter().map(|block| {
            json!({
                "type": "TextBlock",
                "text": block.text(),
                "wrap": true,
                "style": "warning",
            })
        }));

        json!({
            "type": "message",
            "attachments": [{
                "contentType": "application/vnd.microsoft.card.adaptive",
                "content": {
                    "type": "AdaptiveCard",
                    "body": body,
                },
            }],
        })
    }
}

#[async_trait]
impl<C: HttpClient> Notifier for TeamsWebhook<C> {
    #[tracing::instrument(skip_all, fields(alerts = message.blocks.len()))]
    async fn send(&self, message: &AlertMessage) -> Result<(), NotifyError> {
        let card = Self::card(message);
        debug!("Posting alert card");

        let response = post_json(&self.client, &self.url, &card).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!(status = status.as_u16(), "Alert card delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertBlock;
    use crate::fetch::testing::RecordingClient;

    fn message() -> AlertMessage {
        AlertMessage {
            title: "⚠️ 계측기 경고 알림 (2024년 5월 1일)".into(),
            intro: "intro".into(),
            blocks: vec![AlertBlock {
                location: "A".into(),
                instrument_name: "W-1".into(),
                instrument_type: "지하수위계".into(),
                status: "1차 초과".into(),
                ratio: "60.0%".into(),
            }],
        }
    }

    #[test]
    fn test_card_layout() {
        let card = TeamsWebhook::<RecordingClient>::card(&message());
        let body = &card["attachments"][0]["content"]["body"];
        assert_eq!(card["type"], "message");
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[0]["text"], "⚠️ 계측기 경고 알림 (2024년 5월 1일)");
        assert_eq!(body[2]["style"], "warning");
        assert!(body[2]["text"].as_str().unwrap().contains("W-1 (지하수위계)"));
    }

    #[tokio::test]
    async fn test_send_posts_card() {
        let notifier = TeamsWebhook::new(RecordingClient::new(200, "1"), "https://hook.test/x");
        notifier.send(&message()).await.unwrap();

        let sent = notifier.client.captured();
        assert_eq!(sent.len(), 1);
        let payload: Value = serde_json::from_slice(&sent[0].body).unwrap();
        assert_eq!(
            payload["attachments"][0]["contentType"],
            "application/vnd.microsoft.card.adaptive"
        );
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let notifier = TeamsWebhook::new(RecordingClient::new(400, "bad card"), "https://hook.test/x");
        let err = notifier.send(&message()).await.unwrap_err();
        match err {
            NotifyError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad card");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
