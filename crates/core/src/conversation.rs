//! Conversation projection.
//!
//! Messages are stored as one flat, append-only log. Nothing about threads is
//! persisted; instead every read groups the messages a principal can see into
//! conversations keyed by the *other* participant.
//!
//! For a message `m` seen by `principal`, the counterparty is
//! `m.receiver_id` when the principal sent it and `m.sender_id` otherwise.
//! A message the principal sent to the general inbox has no counterparty and
//! is left out of the projection. Every other message lands in exactly one
//! conversation.
//!
//! Conversations are ordered by their latest message, newest first. Ties keep
//! the order in which the conversations were first encountered.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};

use crate::models::Message;
use crate::types::{MessageId, UserId};

/// Gap between two consecutive messages after which a timeline shows a new
/// time separator.
pub const TIME_SEPARATOR_GAP: TimeDelta = TimeDelta::minutes(5);

/// The other side of `message` as seen by `principal`.
///
/// `None` for a message the principal sent to the general inbox.
#[must_use]
pub fn counterparty_of(message: &Message, principal: UserId) -> Option<UserId> {
    if message.sender_id == principal {
        message.receiver_id
    } else {
        Some(message.sender_id)
    }
}

/// All messages between the principal and one counterparty, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    counterparty: UserId,
    messages: Vec<Message>,
}

impl Conversation {
    #[must_use]
    pub const fn counterparty(&self) -> UserId {
        self.counterparty
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message. Conversations are never empty.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Timestamp of the most recent message.
    #[must_use]
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message().map(|m| m.created_at)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Count messages from the counterparty newer than `last_read`.
    ///
    /// With no read marker every incoming message is unread.
    #[must_use]
    pub fn unread_count(&self, principal: UserId, last_read: Option<MessageId>) -> usize {
        self.messages
            .iter()
            .filter(|m| m.sender_id != principal)
            .filter(|m| last_read.is_none_or(|marker| m.id > marker))
            .count()
    }

    /// The messages interleaved with time separators.
    #[must_use]
    pub fn timeline(&self) -> Vec<TimelineEntry<'_>> {
        timeline(&self.messages)
    }
}

/// The principal's conversations, most recently active first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    conversations: Vec<Conversation>,
}

impl Projection {
    /// Group `messages` (in chronological order) by counterparty.
    #[must_use]
    pub fn build(messages: &[Message], principal: UserId) -> Self {
        let mut index: HashMap<UserId, usize> = HashMap::new();
        let mut conversations: Vec<Conversation> = Vec::new();

        for message in messages {
            let Some(counterparty) = counterparty_of(message, principal) else {
                continue;
            };
            let slot = *index.entry(counterparty).or_insert_with(|| {
                conversations.push(Conversation {
                    counterparty,
                    messages: Vec::new(),
                });
                conversations.len() - 1
            });
            if let Some(conversation) = conversations.get_mut(slot) {
                conversation.messages.push(message.clone());
            }
        }

        // sort_by is stable, so equal timestamps keep encounter order
        conversations.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));

        Self { conversations }
    }

    #[must_use]
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Look up the conversation with `counterparty`.
    #[must_use]
    pub fn get(&self, counterparty: UserId) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|c| c.counterparty == counterparty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

/// A buyer's single thread with the shop: everything they sent or received.
#[must_use]
pub fn buyer_thread(messages: &[Message], principal: UserId) -> Vec<Message> {
    messages
        .iter()
        .filter(|m| m.involves(principal))
        .cloned()
        .collect()
}

/// One row of a rendered conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineEntry<'a> {
    /// Show the time before the next message.
    Separator(DateTime<Utc>),
    Message(&'a Message),
}

/// Interleave `messages` with time separators.
///
/// A separator precedes the first message and any message that arrives more
/// than [`TIME_SEPARATOR_GAP`] after its predecessor.
#[must_use]
pub fn timeline(messages: &[Message]) -> Vec<TimelineEntry<'_>> {
    let mut entries = Vec::with_capacity(messages.len() + 1);
    let mut previous: Option<DateTime<Utc>> = None;

    for message in messages {
        let needs_separator =
            previous.is_none_or(|prev| message.created_at - prev > TIME_SEPARATOR_GAP);
        if needs_separator {
            entries.push(TimelineEntry::Separator(message.created_at));
        }
        entries.push(TimelineEntry::Message(message));
        previous = Some(message.created_at);
    }

    entries
}
