//! Message Builder
//!
//! Fluent construction of [`Message`] values.
//!
//! The builder does not validate; `O365Client::send_email` checks subject,
//! body and recipients before anything goes on the wire.
//!
//! ```rust
//! use o365_mail::MessageBuilder;
//!
//! let message = MessageBuilder::new()
//!     .subject("Quarterly report")
//!     .html("<p>Attached below.</p>")
//!     .to("cfo@contoso.com")
//!     .to("ceo@contoso.com")
//!     .build();
//!
//! assert_eq!(message.to_recipients.len(), 2);
//! ```

use crate::types::{Message, Recipient};

/// Builder for [`Message`].
#[derive(Debug, Default)]
pub struct MessageBuilder {
    subject: String,
    body: String,
    to_recipients: Vec<Recipient>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the subject line.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the HTML body.
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a `To` recipient.
    pub fn to(mut self, address: impl Into<String>) -> Self {
        self.to_recipients.push(Recipient::new(address));
        self
    }

    /// Add several `To` recipients.
    pub fn to_all<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.to_recipients
            .extend(addresses.into_iter().map(Recipient::new));
        self
    }

    pub fn build(self) -> Message {
        Message {
            subject: self.subject,
            body: self.body,
            to_recipients: self.to_recipients,
        }
    }
}
