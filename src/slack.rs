use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::error::RelayError;
use crate::flatten::cell;
use crate::types::{FlatRecord, MessagePayload};

/// Carries both the header title and the summary section.
pub const TITLE_FIELD: &str = "deIdentifiedInsightSummary";
pub const PRIMARY_KEY_FIELD: &str = "internalInsightId";

const EVIDENCE_FIELD: &str = "insightEvidence";
const ROLE_FIELD: &str = "senderRole";
const DOMAIN_FIELD: &str = "organizationDomain";
const TYPE_FIELD: &str = "insightType";

// Slack rejects header text longer than 150 characters
const MAX_HEADER_CHARS: usize = 150;

/// Render a field as display text, substituting `fallback` when the field
/// is absent or null. Non-string scalars render as their JSON text.
pub fn field_or(record: &FlatRecord, key: &str, fallback: &str) -> String {
    match cell(record, key) {
        Value::Null => fallback.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn clip_title(title: &str) -> String {
    if title.chars().count() <= MAX_HEADER_CHARS {
        return title.to_string();
    }
    let clipped: String = title.chars().take(MAX_HEADER_CHARS - 3).collect();
    format!("{}...", clipped)
}

/// Render one flattened insight as a Block Kit message: header, summary,
/// evidence, then a combined metadata section, with a plain-text fallback.
pub fn build_insight_message(insight: &FlatRecord) -> MessagePayload {
    let title = field_or(insight, TITLE_FIELD, "Untitled Insight");
    let summary = field_or(insight, TITLE_FIELD, "No de-identified summary available");
    let evidence = field_or(insight, EVIDENCE_FIELD, "No evidence available");
    let sender_role = field_or(insight, ROLE_FIELD, "Unknown role");
    let org_domain = field_or(insight, DOMAIN_FIELD, "Unknown domain");
    let insight_type = field_or(insight, TYPE_FIELD, "Unknown type");

    let blocks = vec![
        json!({
            "type": "header",
            "text": {"type": "plain_text", "text": clip_title(&title), "emoji": true}
        }),
        json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": format!("*De-identified Summary:*\n{}", summary)}
        }),
        json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": format!("*Evidence:*\n{}", evidence)}
        }),
        json!({
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(
                    "*Type:* {}\n*Sender Role:* {}\n*Organization:* {}",
                    insight_type, sender_role, org_domain
                )
            }
        }),
    ];

    MessagePayload {
        text: format!("New Thread Insight: {}", title),
        blocks: Some(blocks),
    }
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

/// Client for the Slack Web API, paced to the channel's posting limits.
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    channel_id: String,
    min_post_gap: Duration,
    last_post: Option<Instant>,
}

impl SlackClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
        channel_id: impl Into<String>,
        min_post_gap: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
            channel_id: channel_id.into(),
            min_post_gap,
            last_post: None,
        }
    }

    /// Post one message to the configured channel, waiting out the minimum
    /// gap since the previous post first.
    ///
    /// A network or HTTP-level failure is an error. A well-formed
    /// `ok: false` envelope is reported as `Ok(false)` so the caller can
    /// skip the message and keep going.
    pub async fn post_message(&mut self, payload: &MessagePayload) -> Result<bool, RelayError> {
        if let Some(last) = self.last_post {
            let since = last.elapsed();
            if since < self.min_post_gap {
                tokio::time::sleep(self.min_post_gap - since).await;
            }
        }

        let mut body = json!({
            "channel": self.channel_id,
            "text": payload.text,
        });
        if let Some(blocks) = &payload.blocks {
            body["blocks"] = Value::Array(blocks.clone());
        }

        let response = self
            .http
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        self.last_post = Some(Instant::now());

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::RemoteApi {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: PostMessageResponse = response.json().await?;
        if !envelope.ok {
            warn!(
                "Slack API error: {}",
                envelope.error.as_deref().unwrap_or("unknown error")
            );
            return Ok(false);
        }
        Ok(true)
    }
}
