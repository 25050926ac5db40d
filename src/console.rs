//! Command transcript for a raw command console.
//!
//! Records the exchange the way a scrollback view shows it:
//!
//! ```text
//! <-- PING
//! --> PONG
//! (not sent) <-- status
//! * connection broken *
//! ```
//!
//! The transcript doubles as the [`UiSink`], so special messages land in
//! the same history as replies. Rendering is left to the caller, which can
//! subscribe to each appended line.
//!
//! A submitted command reserves its line before it is sent. Lines after an
//! unresolved reservation are held back, so a reply racing the send still
//! shows up below its command.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::client::Client;
use crate::sink::{SpecialMessage, UiSink};

// ============================================================================
// Transcript
// ============================================================================

/// Lines in display order; `None` marks a reserved slot.
#[derive(Debug, Default)]
struct History {
    entries: Vec<Option<String>>,
    published: usize,
}

/// Append-only command history.
#[derive(Debug, Default)]
pub struct Transcript {
    history: Mutex<History>,
    listener: Option<mpsc::UnboundedSender<String>>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transcript that also forwards each new line.
    #[must_use]
    pub fn with_listener(listener: mpsc::UnboundedSender<String>) -> Self {
        Self {
            history: Mutex::new(History::default()),
            listener: Some(listener),
        }
    }

    /// Returns a snapshot of all published lines so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let history = self.history.lock();
        history.entries[..history.published]
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Records a command that went out.
    pub fn sent(&self, command: &str) {
        self.append(format!("<-- {command}"));
    }

    /// Records a command that could not be sent.
    pub fn not_sent(&self, command: &str) {
        self.append(format!("(not sent) <-- {command}"));
    }

    /// Records a reply.
    pub fn reply(&self, payload: &str) {
        self.append(format!("--> {payload}"));
    }

    /// Records a special message.
    pub fn special(&self, message: &SpecialMessage) {
        self.append(format!("* {message} *"));
    }

    /// Sends `command` through `client` and records the exchange.
    ///
    /// The reply, when it arrives, is appended by the poller. Replies that
    /// fail (timeout, closed connection) are not recorded; closure already
    /// shows up as a special message.
    pub async fn submit(self: &Arc<Self>, client: &Client, command: &str) {
        let slot = self.reserve();

        let transcript = Arc::clone(self);
        let callback = Box::new(move |reply: crate::Result<String>| {
            if let Ok(payload) = reply {
                transcript.reply(&payload);
            }
        });

        let line = match client.send_hooked(command, callback).await {
            Ok(_) => format!("<-- {command}"),
            Err(_) => format!("(not sent) <-- {command}"),
        };
        self.fill(slot, line);
    }

    fn append(&self, line: String) {
        let mut history = self.history.lock();
        history.entries.push(Some(line));
        self.publish(&mut history);
    }

    /// Reserves a line to be filled in later.
    fn reserve(&self) -> usize {
        let mut history = self.history.lock();
        history.entries.push(None);
        history.entries.len() - 1
    }

    fn fill(&self, slot: usize, line: String) {
        let mut history = self.history.lock();
        if let Some(entry) = history.entries.get_mut(slot) {
            *entry = Some(line);
        }
        self.publish(&mut history);
    }

    /// Publishes lines up to the first unfilled reservation.
    fn publish(&self, history: &mut History) {
        while let Some(Some(line)) = history.entries.get(history.published) {
            if let Some(listener) = &self.listener {
                let _ = listener.send(line.clone());
            }
            history.published += 1;
        }
    }
}

impl UiSink for Transcript {
    fn on_special_message(&self, message: SpecialMessage) {
        self.special(&message);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    #[test]
    fn test_line_formats() {
        let transcript = Transcript::new();

        transcript.sent("PING");
        transcript.reply("PONG");
        transcript.not_sent("status");
        transcript.on_special_message(SpecialMessage::ConnectionBroken);

        assert_eq!(
            transcript.lines(),
            vec![
                "<-- PING",
                "--> PONG",
                "(not sent) <-- status",
                "* connection broken *",
            ]
        );
    }

    #[test]
    fn test_listener_receives_lines() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let transcript = Transcript::with_listener(tx);

        transcript.sent("PING");

        assert_eq!(rx.try_recv().ok().as_deref(), Some("<-- PING"));
    }

    #[test]
    fn test_reply_held_behind_reserved_command() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let transcript = Transcript::with_listener(tx);

        let slot = transcript.reserve();
        transcript.reply("PONG");

        assert!(transcript.lines().is_empty());
        assert!(rx.try_recv().is_err());

        transcript.fill(slot, "<-- PING".into());

        assert_eq!(transcript.lines(), vec!["<-- PING", "--> PONG"]);
        assert_eq!(rx.try_recv().ok().as_deref(), Some("<-- PING"));
        assert_eq!(rx.try_recv().ok().as_deref(), Some("--> PONG"));
    }

    #[tokio::test]
    async fn test_submit_records_reply_and_failure() {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().expect("local addr").port();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let transcript = Arc::new(Transcript::with_listener(tx));

        let (accepted, client) = tokio::join!(
            listener.accept(),
            Client::builder()
                .host("127.0.0.1")
                .port(port)
                .poll_interval(Duration::from_millis(20))
                .shared_sink(Arc::clone(&transcript) as Arc<dyn UiSink>)
                .connect()
        );
        let client = client.expect("connect");
        let (server, _) = accepted.expect("accept");
        let (reader, mut writer) = server.into_split();
        let mut lines = BufReader::new(reader).lines();

        transcript.submit(&client, "PING").await;
        assert_eq!(rx.recv().await.as_deref(), Some("<-- PING"));

        let line = lines.next_line().await.expect("read").expect("line");
        let (token, command) = line.split_once(": ").expect("framed");
        assert_eq!(command, "PING");
        writer
            .write_all(format!("{token}: PONG\n").as_bytes())
            .await
            .expect("write");
        assert_eq!(rx.recv().await.as_deref(), Some("--> PONG"));

        drop(writer);
        drop(lines);
        assert_eq!(rx.recv().await.as_deref(), Some("* connection broken *"));

        transcript.submit(&client, "status").await;
        assert_eq!(rx.recv().await.as_deref(), Some("(not sent) <-- status"));
    }
}
