//! Message store and query.
//!
//! Buyers see the messages they sent or received. The admin sees the whole
//! log, which is how messages to the general inbox reach them.

use thiserror::Error;

use bazaar_core::api::{FieldError, SendMessageRequest};
use bazaar_core::{Message, User};

use crate::db::{Database, MessageRepository, RepositoryError, UserRepository};

/// Errors from messaging operations.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error(transparent)]
    Validation(#[from] FieldError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct MessageService<'a> {
    messages: MessageRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> MessageService<'a> {
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self {
            messages: MessageRepository::new(db),
            users: UserRepository::new(db),
        }
    }

    /// Append a message from `sender`.
    ///
    /// # Errors
    ///
    /// Returns `MessageError::Validation` if the content is blank or the
    /// receiver does not exist.
    pub async fn send(
        &self,
        sender: &User,
        request: SendMessageRequest,
    ) -> Result<Message, MessageError> {
        let message = request.validate()?;

        if let Some(receiver) = message.receiver_id
            && self.users.get_by_id(receiver).await?.is_none()
        {
            return Err(FieldError::new("receiverId", "no such user").into());
        }

        let message = self.messages.append(sender.id, &message).await?;
        tracing::debug!(
            message_id = %message.id,
            sender_id = %message.sender_id,
            general_inbox = message.receiver_id.is_none(),
            "Message appended"
        );
        Ok(message)
    }

    /// The messages `principal` may read, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `MessageError::Repository` if the log cannot be read.
    pub async fn list_visible(&self, principal: &User) -> Result<Vec<Message>, MessageError> {
        let messages = if principal.is_admin {
            self.messages.list_all().await?
        } else {
            self.messages.list_involving(principal.id).await?
        };
        Ok(messages)
    }
}
