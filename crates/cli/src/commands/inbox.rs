//! Terminal chat client.
//!
//! Logs in through the API and shows what the web chat would: admins get the
//! conversation list (or one open conversation with `--with`), buyers get
//! their single thread with the shop. `--follow` keeps the polling feed
//! running and prints new messages as they arrive.

use chrono::{DateTime, Local, Utc};

use bazaar_client::sync::POLL_INTERVAL;
use bazaar_client::{ApiClient, ClientError, ConversationSummary, InboxView, MessageFeed, Snapshot};
use bazaar_core::conversation::{self, TimelineEntry, buyer_thread};
use bazaar_core::{Message, MessageId, User, UserId};

/// Parsed `bazaar inbox` arguments.
pub struct InboxOptions {
    pub url: String,
    pub username: String,
    pub password: String,
    pub with: Option<i32>,
    pub send: Option<String>,
    pub to: Option<i32>,
    pub follow: bool,
}

/// Run the inbox command.
///
/// # Errors
///
/// Returns `ClientError` if login, sending or the first fetch fails.
pub async fn run(options: InboxOptions) -> Result<(), ClientError> {
    let client = ApiClient::new(&options.url)?;
    let user = client.login(&options.username, &options.password).await?;
    tracing::info!(username = %user.username, admin = user.is_admin, "Logged in");

    let feed = MessageFeed::new(client);
    let open = options.with.map(UserId::new);

    if let Some(content) = options.send.as_deref() {
        let receiver = options.to.or(options.with).map(UserId::new);
        feed.send(receiver, content).await?;
    } else {
        feed.refresh().await?;
    }

    let mut screen = Screen::new(&user, open);
    print_lines(&screen.render(&feed.snapshot()));

    if !options.follow {
        return Ok(());
    }

    let _poller = feed.spawn(POLL_INTERVAL);
    let mut snapshots = feed.subscribe();
    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                print_lines(&screen.render(&snapshot));
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

/// What has been shown so far, so repeated renders only print what is new.
struct Screen {
    principal: UserId,
    is_admin: bool,
    view: InboxView,
    printed_up_to: Option<MessageId>,
}

impl Screen {
    fn new(user: &User, open: Option<UserId>) -> Self {
        let mut view = InboxView::new(user.id);
        if let Some(counterparty) = open {
            view.select(counterparty);
        }
        Self {
            principal: user.id,
            is_admin: user.is_admin,
            view,
            printed_up_to: None,
        }
    }

    fn render(&mut self, snapshot: &Snapshot) -> Vec<String> {
        if self.is_admin && self.view.selected().is_none() {
            return self.render_list(snapshot);
        }

        let thread = if self.is_admin {
            let projection = snapshot.projection(self.principal);
            self.view.mark_selected_read(&projection);
            self.view
                .active(&projection)
                .map(|c| c.messages().to_vec())
                .unwrap_or_default()
        } else {
            buyer_thread(&snapshot.messages, self.principal)
        };

        let lines = timeline_lines(&thread, self.principal, self.printed_up_to);
        if let Some(last) = thread.last() {
            self.printed_up_to = Some(last.id);
        }
        if lines.is_empty() && self.printed_up_to.is_none() {
            return vec!["No messages yet.".to_string()];
        }
        lines
    }

    fn render_list(&mut self, snapshot: &Snapshot) -> Vec<String> {
        let projection = snapshot.projection(self.principal);
        let newest = snapshot.messages.iter().map(|m| m.id).max();
        if newest.is_some() && newest == self.printed_up_to {
            return Vec::new();
        }
        self.printed_up_to = newest;

        if projection.is_empty() {
            return vec!["No conversations yet.".to_string()];
        }

        let mut lines = vec![format!(
            "== {} conversations, {} unread ==",
            projection.len(),
            self.view.total_unread(&projection)
        )];
        lines.extend(self.view.summaries(&projection).iter().map(summary_line));
        lines
    }
}

fn counterparty_label(counterparty: UserId) -> String {
    format!("user #{counterparty}")
}

fn summary_line(summary: &ConversationSummary) -> String {
    let prefix = if summary.last_from_me { "You: " } else { "" };
    let unread = if summary.unread > 0 {
        format!(" ({} new)", summary.unread)
    } else {
        String::new()
    };
    format!(
        "{:<16} {}  {}{}{}",
        counterparty_label(summary.counterparty),
        local_time(summary.last_message.created_at, "%H:%M"),
        prefix,
        summary.last_message.content,
        unread
    )
}

/// Render `thread` with time separators, skipping messages up to `after`.
fn timeline_lines(thread: &[Message], principal: UserId, after: Option<MessageId>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending_separator = None;

    for entry in conversation::timeline(thread) {
        match entry {
            TimelineEntry::Separator(at) => pending_separator = Some(at),
            TimelineEntry::Message(message) => {
                let separator = pending_separator.take();
                if after.is_some_and(|marker| message.id <= marker) {
                    continue;
                }
                if let Some(at) = separator {
                    lines.push(format!("-- {} --", local_time(at, "%d/%m %H:%M")));
                }
                lines.push(message_line(message, principal));
            }
        }
    }

    lines
}

fn message_line(message: &Message, principal: UserId) -> String {
    let author = if message.sender_id == principal {
        "you".to_string()
    } else {
        format!("#{}", message.sender_id)
    };
    format!("[{author}] {}", message.content)
}

fn local_time(at: DateTime<Utc>, format: &str) -> String {
    at.with_timezone(&Local).format(format).to_string()
}
