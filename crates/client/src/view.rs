//! Admin inbox view state.
//!
//! The server knows nothing about read state or which conversation is open.
//! [`InboxView`] keeps both on the client and derives everything else from a
//! fresh [`Projection`] on each snapshot.

use std::collections::HashMap;

use bazaar_core::{Conversation, Message, MessageId, Projection, UserId};

/// One row of the conversation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub counterparty: UserId,
    pub last_message: Message,
    pub message_count: usize,
    pub unread: usize,
    /// Whether the principal wrote the last message.
    pub last_from_me: bool,
    pub selected: bool,
}

/// Selection and read markers for one principal's inbox.
#[derive(Debug, Clone)]
pub struct InboxView {
    principal: UserId,
    selected: Option<UserId>,
    read_markers: HashMap<UserId, MessageId>,
}

impl InboxView {
    #[must_use]
    pub fn new(principal: UserId) -> Self {
        Self {
            principal,
            selected: None,
            read_markers: HashMap::new(),
        }
    }

    #[must_use]
    pub const fn principal(&self) -> UserId {
        self.principal
    }

    #[must_use]
    pub const fn selected(&self) -> Option<UserId> {
        self.selected
    }

    /// Open the conversation with `counterparty`.
    pub fn select(&mut self, counterparty: UserId) {
        self.selected = Some(counterparty);
    }

    /// Go back to the conversation list.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// The open conversation, if it exists in `projection`.
    #[must_use]
    pub fn active<'p>(&self, projection: &'p Projection) -> Option<&'p Conversation> {
        projection.get(self.selected?)
    }

    /// Mark everything in the open conversation as read.
    pub fn mark_selected_read(&mut self, projection: &Projection) {
        let Some(last) = self.active(projection).and_then(Conversation::last_message) else {
            return;
        };
        let id = last.id;
        if let Some(counterparty) = self.selected {
            self.mark_read(counterparty, id);
        }
    }

    /// Record that everything up to `id` with `counterparty` has been read.
    ///
    /// Markers only move forward.
    pub fn mark_read(&mut self, counterparty: UserId, id: MessageId) {
        self.read_markers
            .entry(counterparty)
            .and_modify(|marker| *marker = (*marker).max(id))
            .or_insert(id);
    }

    /// Messages from `counterparty` the principal has not read yet.
    #[must_use]
    pub fn unread(&self, conversation: &Conversation) -> usize {
        conversation.unread_count(
            self.principal,
            self.read_markers.get(&conversation.counterparty()).copied(),
        )
    }

    /// Total unread across all conversations.
    #[must_use]
    pub fn total_unread(&self, projection: &Projection) -> usize {
        projection
            .conversations()
            .iter()
            .map(|c| self.unread(c))
            .sum()
    }

    /// Conversation list rows, most recently active first.
    #[must_use]
    pub fn summaries(&self, projection: &Projection) -> Vec<ConversationSummary> {
        projection
            .conversations()
            .iter()
            .filter_map(|conversation| {
                let last_message = conversation.last_message()?.clone();
                Some(ConversationSummary {
                    counterparty: conversation.counterparty(),
                    last_from_me: last_message.sender_id == self.principal,
                    last_message,
                    message_count: conversation.len(),
                    unread: self.unread(conversation),
                    selected: self.selected == Some(conversation.counterparty()),
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};

    use super::*;

    const ADMIN: UserId = UserId::new(1);
    const ALICE: UserId = UserId::new(2);
    const BOB: UserId = UserId::new(3);

    fn msg(id: i32, from: UserId, to: Option<UserId>) -> Message {
        Message {
            id: MessageId::new(id),
            sender_id: from,
            receiver_id: to,
            content: format!("message {id}"),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid date")
                + TimeDelta::minutes(i64::from(id)),
        }
    }

    fn projection(log: &[Message]) -> Projection {
        Projection::build(log, ADMIN)
    }

    #[test]
    fn test_nothing_selected_initially() {
        let view = InboxView::new(ADMIN);
        let p = projection(&[msg(1, ALICE, None)]);
        assert!(view.active(&p).is_none());
        assert!(view.summaries(&p).iter().all(|s| !s.selected));
    }

    #[test]
    fn test_select_and_read() {
        let log = vec![msg(1, ALICE, None), msg(2, BOB, None), msg(3, ALICE, None)];
        let p = projection(&log);
        let mut view = InboxView::new(ADMIN);
        assert_eq!(view.total_unread(&p), 3);

        view.select(ALICE);
        assert_eq!(view.active(&p).map(Conversation::len), Some(2));
        view.mark_selected_read(&p);

        let summaries = view.summaries(&p);
        assert_eq!(summaries[0].counterparty, ALICE);
        assert!(summaries[0].selected);
        assert_eq!(summaries[0].unread, 0);
        assert_eq!(summaries[1].unread, 1);
        assert_eq!(view.total_unread(&p), 1);
    }

    #[test]
    fn test_new_message_after_marker_is_unread() {
        let mut view = InboxView::new(ADMIN);
        view.select(ALICE);
        view.mark_selected_read(&projection(&[msg(1, ALICE, None)]));

        let p = projection(&[msg(1, ALICE, None), msg(2, ADMIN, Some(ALICE)), msg(3, ALICE, None)]);
        let summary = &view.summaries(&p)[0];
        assert_eq!(summary.unread, 1);
        assert_eq!(summary.message_count, 3);
        assert!(!summary.last_from_me);
    }

    #[test]
    fn test_markers_never_move_back() {
        let mut view = InboxView::new(ADMIN);
        view.mark_read(ALICE, MessageId::new(5));
        view.mark_read(ALICE, MessageId::new(2));

        let p = projection(&[msg(3, ALICE, None)]);
        assert_eq!(view.total_unread(&p), 0);
    }

    #[test]
    fn test_own_replies_are_not_unread() {
        let p = projection(&[msg(1, ADMIN, Some(BOB))]);
        let view = InboxView::new(ADMIN);
        let summary = &view.summaries(&p)[0];
        assert_eq!(summary.unread, 0);
        assert!(summary.last_from_me);
    }

    #[test]
    fn test_selection_of_vanished_conversation() {
        let mut view = InboxView::new(ADMIN);
        view.select(BOB);
        let p = projection(&[msg(1, ALICE, None)]);
        assert!(view.active(&p).is_none());
        view.mark_selected_read(&p);
        view.clear_selection();
        assert_eq!(view.selected(), None);
    }
}
