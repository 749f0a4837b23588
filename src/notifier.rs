use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{Config, DeliveryMode};
use crate::error::{RelayError, Result};
use crate::fetcher::Entry;

const LINK_LABEL: &str = "🔗 Read more";
const ELLIPSIS: char = '…';

/// One item of a message, as rendered by the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyItem {
    pub title: String,
    pub link: String,
    pub summary: Option<String>,
}

impl NotifyItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>, summary: Option<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            summary,
        }
    }
}

impl From<&Entry> for NotifyItem {
    fn from(entry: &Entry) -> Self {
        Self {
            title: entry.title.clone(),
            link: entry.link.clone(),
            summary: entry.summary.clone(),
        }
    }
}

// Webhook wire format
#[derive(Debug, Serialize)]
#[serde(tag = "msg_type")]
pub enum Message {
    #[serde(rename = "interactive")]
    Interactive { card: Card },
    #[serde(rename = "text")]
    Text { content: TextContent },
}

#[derive(Debug, Serialize)]
pub struct Card {
    pub header: CardHeader,
    pub elements: Vec<Element>,
}

#[derive(Debug, Serialize)]
pub struct CardHeader {
    pub title: TaggedText,
}

#[derive(Debug, Serialize)]
pub struct TaggedText {
    pub tag: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "tag")]
pub enum Element {
    #[serde(rename = "div")]
    Div { text: TaggedText },
    #[serde(rename = "hr")]
    Hr,
}

#[derive(Debug, Serialize)]
pub struct TextContent {
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    pub include_summary: bool,
    pub summary_max_len: usize,
}

impl From<&Config> for FormatOptions {
    fn from(config: &Config) -> Self {
        Self {
            include_summary: config.include_summary,
            summary_max_len: config.summary_max_len,
        }
    }
}

impl FormatOptions {
    fn summary(&self, item: &NotifyItem) -> Option<String> {
        if !self.include_summary {
            return None;
        }
        item.summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| truncate_summary(s, self.summary_max_len))
    }
}

/// Cut `text` to `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_summary(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut cut = text[..byte_idx].to_string();
            cut.push(ELLIPSIS);
            cut
        }
        None => text.to_string(),
    }
}

/// Markdown body of one card block, numbered from 1.
fn render_block(index: usize, item: &NotifyItem, options: &FormatOptions) -> String {
    let mut md = format!("**{}. {}**", index, item.title);
    if !item.link.is_empty() {
        md.push_str(&format!("\n[{}]({})", LINK_LABEL, item.link));
    }
    if let Some(summary) = options.summary(item) {
        md.push_str(&format!("\n> {}", summary));
    }
    md
}

/// Build one card with a block per item and dividers in between.
pub fn render_card(title: &str, items: &[NotifyItem], options: &FormatOptions) -> Message {
    let mut elements = Vec::with_capacity(items.len() * 2);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            elements.push(Element::Hr);
        }
        elements.push(Element::Div {
            text: TaggedText {
                tag: "lark_md",
                content: render_block(i + 1, item, options),
            },
        });
    }

    Message::Interactive {
        card: Card {
            header: CardHeader {
                title: TaggedText {
                    tag: "plain_text",
                    content: title.to_string(),
                },
            },
            elements,
        },
    }
}

/// Build a plain-text message for a single item.
pub fn render_text(title: &str, item: &NotifyItem, options: &FormatOptions) -> Message {
    let mut text = format!("[{}] {}", title, item.title);
    if !item.link.is_empty() {
        text.push('\n');
        text.push_str(&item.link);
    }
    if let Some(summary) = options.summary(item) {
        text.push('\n');
        text.push_str(&summary);
    }
    Message::Text {
        content: TextContent { text },
    }
}

pub struct Notifier {
    client: Client,
    webhook_url: String,
    options: FormatOptions,
    mode: DeliveryMode,
}

impl Notifier {
    /// Fails with [`RelayError::MissingWebhook`] when no destination is set.
    pub fn new(client: Client, config: &Config) -> Result<Self> {
        let webhook_url = config
            .webhook_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or(RelayError::MissingWebhook)?;

        Ok(Self {
            client,
            webhook_url,
            options: FormatOptions::from(config),
            mode: config.delivery,
        })
    }

    /// Deliver `items` under `title`: a single card, or one text message
    /// per item in order. Stops at the first failed request.
    pub async fn send(&self, title: &str, items: &[NotifyItem]) -> Result<()> {
        self.send_with(title, items, &self.options).await?;
        info!("Delivered {} item(s) to webhook", items.len());
        Ok(())
    }

    /// Deliver a status notice. Its summary is always shown, whatever
    /// `include_summary` says, since it carries the actual message.
    pub async fn send_notice(&self, title: &str, notice: &NotifyItem) -> Result<()> {
        let options = FormatOptions {
            include_summary: true,
            ..self.options
        };
        self.send_with(title, std::slice::from_ref(notice), &options)
            .await?;
        info!("Delivered notice '{}' to webhook", notice.title);
        Ok(())
    }

    async fn send_with(
        &self,
        title: &str,
        items: &[NotifyItem],
        options: &FormatOptions,
    ) -> Result<()> {
        match self.mode {
            DeliveryMode::Card => self.post(&render_card(title, items, options)).await,
            DeliveryMode::Text => {
                for item in items {
                    self.post(&render_text(title, item, options)).await?;
                }
                Ok(())
            }
        }
    }

    async fn post(&self, message: &Message) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!("Webhook responded {} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(RelayError::Delivery { status, body });
        }
        check_ack(&body)
    }
}

/// Feishu answers HTTP 200 with a non-zero `code` when it refuses a payload.
fn check_ack(body: &str) -> Result<()> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Ok(());
    };

    let code = value
        .get("code")
        .or_else(|| value.get("StatusCode"))
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(0);
    if code == 0 {
        return Ok(());
    }

    let msg = value
        .get("msg")
        .or_else(|| value.get("StatusMessage"))
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();
    Err(RelayError::Rejected { code, msg })
}
