//! Message log repository.
//!
//! The log is append-only: there is no update or delete. Reads come back in
//! chronological order with ties broken by ID.

use chrono::{DateTime, Utc};

use bazaar_core::api::NewMessage;
use bazaar_core::{Message, MessageId, UserId};

use super::{Database, RepositoryError};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, created_at";

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: MessageId,
    sender_id: UserId,
    receiver_id: Option<UserId>,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Repository for the message log.
pub struct MessageRepository<'a> {
    db: &'a Database,
}

impl<'a> MessageRepository<'a> {
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append a message. The ID and timestamp are assigned here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn append(
        &self,
        sender: UserId,
        message: &NewMessage,
    ) -> Result<Message, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => {
                let row = sqlx::query_as::<_, MessageRow>(&format!(
                    "INSERT INTO messages (sender_id, receiver_id, content) \
                     VALUES ($1, $2, $3) RETURNING {MESSAGE_COLUMNS}"
                ))
                .bind(sender)
                .bind(message.receiver_id)
                .bind(message.content.as_str())
                .fetch_one(pool)
                .await?;
                Ok(row.into())
            }
            Database::Memory(memory) => Ok(memory.insert_message(sender, message).await),
        }
    }

    /// Every message in the system.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Message>, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => {
                let rows = sqlx::query_as::<_, MessageRow>(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY created_at, id"
                ))
                .fetch_all(pool)
                .await?;
                Ok(rows.into_iter().map(Message::from).collect())
            }
            Database::Memory(memory) => Ok(memory.messages(None).await),
        }
    }

    /// Messages `user` sent or received.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_involving(&self, user: UserId) -> Result<Vec<Message>, RepositoryError> {
        match self.db {
            Database::Postgres(pool) => {
                let rows = sqlx::query_as::<_, MessageRow>(&format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages \
                     WHERE sender_id = $1 OR receiver_id = $1 \
                     ORDER BY created_at, id"
                ))
                .bind(user)
                .fetch_all(pool)
                .await?;
                Ok(rows.into_iter().map(Message::from).collect())
            }
            Database::Memory(memory) => Ok(memory.messages(Some(user)).await),
        }
    }
}
