//! Message values passed between the helpers and the scenarios.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned id of a rendered message row (the row's `zid`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a message is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Destination {
    /// A topic inside a stream
    Stream {
        /// Stream name
        stream: String,
        /// Topic name
        topic: String,
    },
    /// A direct message to one or more users, by email
    Private {
        /// Recipient emails
        recipients: Vec<String>,
    },
}

impl Destination {
    /// Stream destination
    #[must_use]
    pub fn stream(stream: impl Into<String>, topic: impl Into<String>) -> Self {
        Self::Stream {
            stream: stream.into(),
            topic: topic.into(),
        }
    }

    /// Private destination with a single recipient
    #[must_use]
    pub fn private(recipient: impl Into<String>) -> Self {
        Self::Private {
            recipients: vec![recipient.into()],
        }
    }

    /// Whether this is a stream destination
    #[must_use]
    pub const fn is_stream(&self) -> bool {
        matches!(self, Self::Stream { .. })
    }
}

/// A message to submit through the compose box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDraft {
    /// Destination
    pub destination: Destination,
    /// Raw message body
    pub content: String,
}

impl MessageDraft {
    /// Stream message
    #[must_use]
    pub fn stream(
        stream: impl Into<String>,
        topic: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            destination: Destination::stream(stream, topic),
            content: content.into(),
        }
    }

    /// Private message to one recipient
    #[must_use]
    pub fn private(recipient: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            destination: Destination::private(recipient),
            content: content.into(),
        }
    }
}

/// New values for an existing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEdit {
    /// New topic; `None` leaves the topic field untouched
    pub topic: Option<String>,
    /// New raw body
    pub content: String,
}

impl MessageEdit {
    /// Edit only the body
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            topic: None,
            content: content.into(),
        }
    }

    /// Edit topic and body
    #[must_use]
    pub fn topic_and_content(topic: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            content: content.into(),
        }
    }
}

/// Consecutive messages rendered under one recipient header.
///
/// Serialized as `[header, [bodies...]]`, the shape the page function
/// returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, Vec<String>)", into = "(String, Vec<String>)")]
pub struct MessageGroup {
    /// "Verona > edited", "You and Cordelia, Lear's daughter", ...
    pub header: String,
    /// Rendered message bodies, top to bottom
    pub bodies: Vec<String>,
}

impl MessageGroup {
    /// Create a group
    #[must_use]
    pub fn new<I, S>(header: impl Into<String>, bodies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into(),
            bodies: bodies.into_iter().map(Into::into).collect(),
        }
    }

    /// Header of a stream group
    #[must_use]
    pub fn stream_header(stream: &str, topic: &str) -> String {
        format!("{stream} > {topic}")
    }

    /// Header of a private conversation group
    #[must_use]
    pub fn private_header(recipient_names: &[&str]) -> String {
        format!("You and {}", recipient_names.join(", "))
    }
}

impl From<(String, Vec<String>)> for MessageGroup {
    fn from((header, bodies): (String, Vec<String>)) -> Self {
        Self { header, bodies }
    }
}

impl From<MessageGroup> for (String, Vec<String>) {
    fn from(group: MessageGroup) -> Self {
        (group.header, group.bodies)
    }
}
