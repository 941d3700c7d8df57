//! Message Types
//!
//! Outbound message input and the Outlook REST `sendmail` wire payload.

use serde::{Deserialize, Serialize};

/// A single `To` recipient.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Recipient mailbox address.
    pub email_address: String,
}

impl Recipient {
    /// Recipient for `email_address`.
    pub fn new(email_address: impl Into<String>) -> Self {
        Self {
            email_address: email_address.into(),
        }
    }
}

impl From<&str> for Recipient {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// Message to send. The body is HTML.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub body: String,
    /// `To` recipients, in order.
    pub to_recipients: Vec<Recipient>,
}

impl Message {
    /// Create a message.
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        to_recipients: Vec<Recipient>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            to_recipients,
        }
    }

    /// Start a message builder.
    pub fn builder() -> crate::builders::MessageBuilder {
        crate::builders::MessageBuilder::new()
    }
}

/// `POST {mailbox}/sendmail` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMailPayload<'a> {
    pub message: PayloadMessage<'a>,
    pub save_to_sent_items: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PayloadMessage<'a> {
    pub subject: &'a str,
    pub body: ItemBody<'a>,
    pub to_recipients: Vec<PayloadRecipient<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemBody<'a> {
    pub content_type: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PayloadRecipient<'a> {
    pub email_address: PayloadAddress<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PayloadAddress<'a> {
    pub address: &'a str,
}

impl<'a> SendMailPayload<'a> {
    /// Build the wire payload for `message`.
    pub fn new(message: &'a Message, save_to_sent_items: bool) -> Self {
        Self {
            message: PayloadMessage {
                subject: &message.subject,
                body: ItemBody {
                    content_type: "Html",
                    content: &message.body,
                },
                to_recipients: message
                    .to_recipients
                    .iter()
                    .map(|r| PayloadRecipient {
                        email_address: PayloadAddress {
                            address: &r.email_address,
                        },
                    })
                    .collect(),
            },
            save_to_sent_items,
        }
    }
}
