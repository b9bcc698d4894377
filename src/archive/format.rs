//! Archival record formatting.
//!
//! Pure `Message` → [`ArchiveRecord`] mapping with no side effects. A
//! message that already carries an embed is forwarded verbatim so rich
//! content (link previews and the like) survives the copy; anything else is
//! summarized into an embed-shaped record pointing back at the original.

use crate::domain::{Message, UserId};

/// A formatted archival record, ready for the delivery gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveRecord {
    /// The source message's own first embed, forwarded as-is
    Forward(serde_json::Value),

    /// A synthesized summary of a plain message
    Summary(ArchiveSummary),
}

/// Summary record for messages without a native embed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveSummary {
    /// Author display name
    pub author_name: String,

    /// Author avatar URL, if any
    pub author_avatar: Option<String>,

    /// Raw author id, rendered as its own field so the original account
    /// stays identifiable even after a rename
    pub author_id: UserId,

    /// Original text content
    pub content: String,

    /// Attachment URLs in message order; empty when the message had none
    pub attachments: Vec<String>,

    /// Permanent link back to the original message
    pub jump_url: String,
}

/// Format a message into its archival record.
///
/// Total: every message formats to exactly one record, and the function
/// never touches the network.
pub fn format_record(message: &Message) -> ArchiveRecord {
    if let Some(embed) = message.embeds.first() {
        return ArchiveRecord::Forward(embed.clone());
    }

    ArchiveRecord::Summary(ArchiveSummary {
        author_name: message.author.name.clone(),
        author_avatar: message.author.avatar_url.clone(),
        author_id: message.author.id,
        content: message.content.clone(),
        attachments: message
            .attachments
            .iter()
            .map(|attachment| attachment.url.clone())
            .collect(),
        jump_url: message.jump_url.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Attachment, Author};
    use serde_json::json;

    fn plain_message() -> Message {
        Message {
            id: 111,
            channel_id: 7,
            author: Author {
                id: 9,
                name: "maya".to_string(),
                avatar_url: Some("https://cdn.example/maya.png".to_string()),
            },
            content: "remember this".to_string(),
            pinned: true,
            embeds: vec![],
            attachments: vec![],
            jump_url: "https://discord.com/channels/42/7/111".to_string(),
        }
    }

    #[test]
    fn test_message_with_embed_is_forwarded() {
        let embed = json!({"title": "a preview", "url": "https://example.com"});
        let mut message = plain_message();
        message.embeds = vec![embed.clone(), json!({"title": "second"})];

        // Only the first embed is forwarded
        assert_eq!(format_record(&message), ArchiveRecord::Forward(embed));
    }

    #[test]
    fn test_plain_message_is_summarized() {
        let record = format_record(&plain_message());

        let ArchiveRecord::Summary(summary) = record else {
            panic!("expected a summary record");
        };
        assert_eq!(summary.author_name, "maya");
        assert_eq!(summary.author_id, 9);
        assert_eq!(summary.content, "remember this");
        assert!(summary.attachments.is_empty());
        assert_eq!(summary.jump_url, "https://discord.com/channels/42/7/111");
    }

    #[test]
    fn test_attachment_urls_listed_in_order() {
        let mut message = plain_message();
        message.attachments = vec![
            Attachment {
                filename: "a.png".to_string(),
                url: "https://cdn.example/a.png".to_string(),
            },
            Attachment {
                filename: "b.log".to_string(),
                url: "https://cdn.example/b.log".to_string(),
            },
        ];

        let ArchiveRecord::Summary(summary) = format_record(&message) else {
            panic!("expected a summary record");
        };
        assert_eq!(
            summary.attachments,
            vec!["https://cdn.example/a.png", "https://cdn.example/b.log"]
        );
    }

    #[test]
    fn test_empty_content_still_formats() {
        let mut message = plain_message();
        message.content = String::new();

        let ArchiveRecord::Summary(summary) = format_record(&message) else {
            panic!("expected a summary record");
        };
        assert_eq!(summary.content, "");
    }
}
