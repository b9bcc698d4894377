//! Discord REST API gateway.
//!
//! Minimal client over `reqwest` covering the three calls the archiver
//! needs: fetch a channel, send a message with an embed payload, and list
//! a channel's pins. Gateway websocket concerns (connection, auth,
//! reconnect) live with the embedding event source, not here.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::{DeliveryGateway, GatewayError, TextChannel};
use crate::archive::format::ArchiveRecord;
use crate::domain::{Attachment, Author, ChannelId, GuildId, Message};

const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

// Channel types that accept plain message sends
const CHANNEL_GUILD_TEXT: u8 = 0;
const CHANNEL_GUILD_ANNOUNCEMENT: u8 = 5;

/// Discord REST API client
#[derive(Debug, Clone)]
pub struct DiscordRestGateway {
    /// Bot token
    token: String,
    /// API base URL (overridable for tests)
    base_url: String,
    /// HTTP client
    client: reqwest::Client,
}

/// Channel object as returned by `GET /channels/{id}`
#[derive(Debug, Deserialize)]
struct ChannelPayload {
    id: String,
    #[serde(rename = "type")]
    kind: u8,
    guild_id: Option<String>,
}

/// Message object as returned by `GET /channels/{id}/pins`
#[derive(Debug, Deserialize)]
struct MessagePayload {
    id: String,
    channel_id: String,
    content: String,
    #[serde(default)]
    pinned: bool,
    author: AuthorPayload,
    #[serde(default)]
    embeds: Vec<serde_json::Value>,
    #[serde(default)]
    attachments: Vec<AttachmentPayload>,
}

#[derive(Debug, Deserialize)]
struct AuthorPayload {
    id: String,
    username: String,
    avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttachmentPayload {
    filename: String,
    url: String,
}

impl DiscordRestGateway {
    /// Create a new gateway with a bot token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the API base URL (used by tests against a local server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build an API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn api_error(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        GatewayError::Api { status, message }
    }
}

/// Parse a snowflake id from its JSON string form
fn parse_id(raw: &str) -> Result<u64, GatewayError> {
    raw.parse()
        .map_err(|_| GatewayError::Payload(format!("invalid snowflake id: {raw:?}")))
}

/// Convert an archival record into a Discord message body
pub(crate) fn message_body(record: &ArchiveRecord) -> serde_json::Value {
    match record {
        ArchiveRecord::Forward(embed) => json!({ "embeds": [embed] }),
        ArchiveRecord::Summary(summary) => {
            let mut author = json!({ "name": summary.author_name });
            if let Some(icon) = &summary.author_avatar {
                author["icon_url"] = json!(icon);
            }

            let mut fields = Vec::new();
            if !summary.attachments.is_empty() {
                fields.push(json!({
                    "name": "Attachments",
                    "value": summary.attachments.join("\n"),
                }));
            }
            fields.push(json!({
                "name": "Original Message",
                "value": format!("[Link]({})", summary.jump_url),
            }));
            fields.push(json!({
                "name": "Author ID",
                "value": summary.author_id.to_string(),
            }));

            json!({
                "embeds": [{
                    "author": author,
                    "description": summary.content,
                    "fields": fields,
                }]
            })
        }
    }
}

impl MessagePayload {
    /// Convert the wire form into the domain message, synthesizing the
    /// jump link and avatar URL from raw ids the way the platform does
    fn into_message(self, guild_id: GuildId) -> Result<Message, GatewayError> {
        let id = parse_id(&self.id)?;
        let channel_id = parse_id(&self.channel_id)?;
        let author_id = parse_id(&self.author.id)?;

        Ok(Message {
            id,
            channel_id,
            author: Author {
                id: author_id,
                name: self.author.username,
                avatar_url: self.author.avatar.map(|hash| {
                    format!("https://cdn.discordapp.com/avatars/{author_id}/{hash}.png")
                }),
            },
            content: self.content,
            pinned: self.pinned,
            embeds: self.embeds,
            attachments: self
                .attachments
                .into_iter()
                .map(|a| Attachment {
                    filename: a.filename,
                    url: a.url,
                })
                .collect(),
            jump_url: format!("https://discord.com/channels/{guild_id}/{channel_id}/{id}"),
        })
    }
}

#[async_trait]
impl DeliveryGateway for DiscordRestGateway {
    async fn resolve_channel(
        &self,
        channel_id: ChannelId,
    ) -> Result<Option<Arc<dyn TextChannel>>, GatewayError> {
        let url = self.api_url(&format!("channels/{channel_id}"));

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let payload: ChannelPayload = response.json().await?;
        if !matches!(payload.kind, CHANNEL_GUILD_TEXT | CHANNEL_GUILD_ANNOUNCEMENT) {
            return Ok(None);
        }
        let Some(guild_id) = payload.guild_id else {
            // DM or group channel, not archivable
            return Ok(None);
        };

        Ok(Some(Arc::new(DiscordChannel {
            gateway: self.clone(),
            channel_id: parse_id(&payload.id)?,
            guild_id: parse_id(&guild_id)?,
        })))
    }
}

/// A resolved Discord text channel
#[derive(Debug, Clone)]
pub struct DiscordChannel {
    gateway: DiscordRestGateway,
    channel_id: ChannelId,
    guild_id: GuildId,
}

#[async_trait]
impl TextChannel for DiscordChannel {
    fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    async fn send_record(&self, record: &ArchiveRecord) -> Result<(), GatewayError> {
        let url = self
            .gateway
            .api_url(&format!("channels/{}/messages", self.channel_id));

        let response = self
            .gateway
            .client
            .post(&url)
            .header("Authorization", self.gateway.auth_header())
            .json(&message_body(record))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DiscordRestGateway::api_error(response).await);
        }
        Ok(())
    }

    async fn pinned_messages(&self) -> Result<Vec<Message>, GatewayError> {
        let url = self
            .gateway
            .api_url(&format!("channels/{}/pins", self.channel_id));

        let response = self
            .gateway
            .client
            .get(&url)
            .header("Authorization", self.gateway.auth_header())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DiscordRestGateway::api_error(response).await);
        }

        let payloads: Vec<MessagePayload> = response.json().await?;
        payloads
            .into_iter()
            .map(|payload| payload.into_message(self.guild_id))
            .collect()
    }
}
