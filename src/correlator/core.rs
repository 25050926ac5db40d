//! Request/reply correlation and the poll loop.
//!
//! # Poll Step
//!
//! Each tick:
//!
//! 1. Sweeps pending requests past their deadline.
//! 2. Reads from the transport unless a complete frame is already buffered.
//! 3. Drains every complete line, in wire order, and dispatches each one to
//!    its pending callback or, if unmatched, to the [`UiSink`].
//!
//! Peer closure is terminal: the sink hears `connection broken` once, every
//! pending callback receives [`Error::ConnectionClosed`], and the transport
//! is never read again.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::Token;
use crate::protocol::{Frame, TokenGenerator};
use crate::sink::{SpecialMessage, UiSink};
use crate::transport::{Received, Transport};

use super::reassembly::ReassemblyBuffer;
use super::registry::{PendingRegistry, ReplyCallback};

// ============================================================================
// Constants
// ============================================================================

/// Default interval between poll steps.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default bytes requested per read.
pub const DEFAULT_READ_CHUNK: usize = 4096;

/// Default time a hooked request waits for its reply.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(60);

/// Default cap on an unterminated frame.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024 * 1024;

// ============================================================================
// CorrelatorSettings
// ============================================================================

/// Tuning knobs for a [`Correlator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelatorSettings {
    /// Bytes requested from the transport per poll step.
    pub read_chunk: usize,
    /// Timeout applied by [`Correlator::hook`].
    pub reply_timeout: Duration,
    /// Largest unterminated frame kept before it is discarded.
    pub max_frame_len: usize,
}

impl Default for CorrelatorSettings {
    fn default() -> Self {
        Self {
            read_chunk: DEFAULT_READ_CHUNK,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

// ============================================================================
// PollOutcome
// ============================================================================

/// What a single poll step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing was available to read.
    Idle,
    /// Bytes arrived but no frame is complete yet.
    Partial,
    /// Complete frames were dispatched.
    Dispatched {
        /// Frames handed to a callback or the sink.
        frames: usize,
    },
    /// The connection is closed; polling is over.
    Closed,
}

// ============================================================================
// PendingReply
// ============================================================================

/// Future resolved by the poll step when the reply to a request arrives.
///
/// Dropping it does not unhook the request; the reply is then discarded
/// when it arrives.
#[derive(Debug)]
pub struct PendingReply {
    token: Token,
    rx: oneshot::Receiver<Result<String>>,
}

impl PendingReply {
    /// Token the request was sent under.
    #[inline]
    #[must_use]
    pub fn token(&self) -> &Token {
        &self.token
    }
}

impl Future for PendingReply {
    type Output = Result<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.map_err(Error::from).and_then(|reply| reply))
    }
}

// ============================================================================
// Correlator
// ============================================================================

/// State touched only by the poll step.
#[derive(Debug, Default)]
struct PollState {
    buffer: ReassemblyBuffer,
    closed: bool,
}

/// Correlates outgoing commands with incoming reply frames.
///
/// Owns the pending registry and the reassembly buffer. The transport is
/// injected; any number of tasks may send while one poller reads.
pub struct Correlator<T> {
    transport: T,
    tokens: TokenGenerator,
    registry: Mutex<PendingRegistry>,
    state: AsyncMutex<PollState>,
    broken: AtomicBool,
    sink: Arc<dyn UiSink>,
    settings: CorrelatorSettings,
}

impl<T: Transport> Correlator<T> {
    /// Creates a correlator with default settings and a salted token generator.
    pub fn new(transport: T, sink: Arc<dyn UiSink>) -> Self {
        Self::with_settings(
            transport,
            sink,
            TokenGenerator::new(),
            CorrelatorSettings::default(),
        )
    }

    /// Creates a correlator with explicit token generator and settings.
    pub fn with_settings(
        transport: T,
        sink: Arc<dyn UiSink>,
        tokens: TokenGenerator,
        settings: CorrelatorSettings,
    ) -> Self {
        Self {
            transport,
            tokens,
            registry: Mutex::new(PendingRegistry::new()),
            state: AsyncMutex::new(PollState::default()),
            broken: AtomicBool::new(false),
            sink,
            settings,
        }
    }

    /// Returns the underlying transport.
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the active settings.
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &CorrelatorSettings {
        &self.settings
    }

    /// Makes a fresh token for `command`.
    #[inline]
    #[must_use]
    pub fn make_token(&self, command: &str) -> Token {
        self.tokens.make_token(command)
    }

    // ========================================================================
    // Sending
    // ========================================================================

    /// Sends `command` and returns the token its reply will carry.
    ///
    /// Register interest with [`hook`](Self::hook) afterwards, or use
    /// [`send_hooked`](Self::send_hooked) or [`request`](Self::request),
    /// which hook before sending so a fast reply cannot beat the
    /// registration.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the poller already saw the peer close
    /// - [`Error::Connection`] if the write fails; nothing is registered
    pub async fn send_command(&self, command: &str) -> Result<Token> {
        let token = self.make_token(command);
        self.send_frame(&token, command).await?;
        Ok(token)
    }

    /// Sends `command` under an existing token.
    ///
    /// # Errors
    ///
    /// Same as [`send_command`](Self::send_command).
    pub async fn send_frame(&self, token: &Token, command: &str) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        self.transport
            .send_line(&Frame::encode(token, command))
            .await?;

        debug!(%token, "Command sent");
        Ok(())
    }

    /// Sends `command` and returns a future for its reply.
    ///
    /// Uses the default reply timeout.
    ///
    /// # Errors
    ///
    /// Same as [`send_command`](Self::send_command).
    pub async fn request(&self, command: &str) -> Result<PendingReply> {
        self.request_with_timeout(command, self.settings.reply_timeout)
            .await
    }

    /// Sends `command` and returns a future for its reply.
    ///
    /// The future resolves to [`Error::RequestTimeout`] if no reply arrives
    /// within `reply_timeout` (checked on each poll step).
    ///
    /// # Errors
    ///
    /// Same as [`send_command`](Self::send_command).
    pub async fn request_with_timeout(
        &self,
        command: &str,
        reply_timeout: Duration,
    ) -> Result<PendingReply> {
        let (tx, rx) = oneshot::channel();

        let token = self
            .send_hooked(
                command,
                reply_timeout,
                Box::new(move |reply| {
                    // Receiver dropped means the caller stopped waiting.
                    let _ = tx.send(reply);
                }),
            )
            .await?;

        Ok(PendingReply { token, rx })
    }

    /// Hooks `callback` under a fresh token, then sends `command`.
    ///
    /// Registering first means even an immediate reply finds its callback.
    /// If the send fails the callback is unhooked and dropped uninvoked.
    ///
    /// # Errors
    ///
    /// Same as [`send_command`](Self::send_command).
    pub async fn send_hooked(
        &self,
        command: &str,
        reply_timeout: Duration,
        callback: ReplyCallback,
    ) -> Result<Token> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let token = self.make_token(command);
        self.hook_with_timeout(token.clone(), reply_timeout, callback);

        if let Err(e) = self.send_frame(&token, command).await {
            let _ = self.unhook(token.as_str());
            return Err(e);
        }

        Ok(token)
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Registers `callback` for the reply to `token`.
    ///
    /// Replaces any callback already hooked under the same token. The entry
    /// expires after the default reply timeout.
    pub fn hook(&self, token: Token, callback: ReplyCallback) {
        self.hook_with_timeout(token, self.settings.reply_timeout, callback);
    }

    /// Registers `callback` for the reply to `token`, expiring after `timeout`.
    ///
    /// Once the connection is closed nothing is registered; `callback` is
    /// invoked right away with [`Error::ConnectionClosed`].
    pub fn hook_with_timeout(&self, token: Token, timeout: Duration, callback: ReplyCallback) {
        let mut registry = self.registry.lock();

        // Checked under the registry lock: `close` flips the flag under the
        // same lock before draining.
        if self.is_closed() {
            drop(registry);
            debug!(%token, "Hooked after close");
            callback(Err(Error::ConnectionClosed));
            return;
        }

        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        trace!(%token, timeout_ms, "Hooked");
        registry.insert(token, timeout, callback);
    }

    /// Removes the callback for `token` without invoking it.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if nothing is hooked under `token`.
    pub fn unhook(&self, token: &str) -> Result<ReplyCallback> {
        self.registry.lock().remove(token)
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Returns `true` if `token` is waiting for a reply.
    #[inline]
    #[must_use]
    pub fn is_pending(&self, token: &str) -> bool {
        self.registry.lock().contains(token)
    }

    /// Returns `true` once the peer has closed the connection.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.broken.load(Ordering::Acquire)
    }

    // ========================================================================
    // Polling
    // ========================================================================

    /// Runs one poll step.
    pub async fn poll(&self) -> PollOutcome {
        let mut state = self.state.lock().await;
        if state.closed {
            return PollOutcome::Closed;
        }

        self.sweep_expired();

        if !state.buffer.has_complete_frame() {
            match self.transport.try_receive(self.settings.read_chunk).await {
                Ok(Received::WouldBlock) => return PollOutcome::Idle,
                Ok(Received::Data(bytes)) => state.buffer.extend(&bytes),
                Ok(Received::Closed) => {
                    self.close(&mut state);
                    return PollOutcome::Closed;
                }
                Err(e) => {
                    warn!(error = %e, "Read failed");
                    self.close(&mut state);
                    return PollOutcome::Closed;
                }
            }
        }

        let lines = state.buffer.drain_lines();

        if state.buffer.len() > self.settings.max_frame_len {
            let len = state.buffer.discard();
            warn!(len, max = self.settings.max_frame_len, "Frame too long, discarded");
            self.sink
                .on_special_message(SpecialMessage::FrameTooLong { len });
        }

        // The poll state stays locked through dispatch so concurrent polls
        // cannot reorder frames. Callbacks only touch the registry lock.
        if lines.is_empty() {
            return PollOutcome::Partial;
        }

        let mut frames = 0;
        for line in lines {
            if line.is_empty() {
                trace!("Blank line ignored");
                continue;
            }
            self.dispatch(line);
            frames += 1;
        }

        PollOutcome::Dispatched { frames }
    }

    /// Spawns a task calling [`poll`](Self::poll) every `period`.
    ///
    /// The task ends when the connection closes.
    pub fn spawn_poller(self: Arc<Self>, period: Duration) -> JoinHandle<()>
    where
        T: 'static,
    {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if self.poll().await == PollOutcome::Closed {
                    break;
                }
            }

            debug!("Poller terminated");
        })
    }

    /// Hands one complete line to its callback or the sink.
    fn dispatch(&self, line: String) {
        let frame = Frame::parse(&line);
        let callback = self.registry.lock().take(frame.token.as_str());

        match callback {
            Some(callback) => {
                trace!(token = %frame.token, "Reply dispatched");
                callback(Ok(frame.payload));
            }
            None => {
                warn!(token = %frame.token, "Frame for unknown token");
                self.sink
                    .on_special_message(SpecialMessage::Unmatched { line });
            }
        }
    }

    /// Fails every request past its deadline.
    fn sweep_expired(&self) {
        let expired = self.registry.lock().expire(Instant::now());
        for (callback, err) in expired {
            debug!(error = %err, "Pending request expired");
            callback(Err(err));
        }
    }

    /// Enters the terminal state.
    fn close(&self, state: &mut PollState) {
        state.closed = true;
        let pending = {
            let mut registry = self.registry.lock();
            self.broken.store(true, Ordering::Release);
            registry.drain()
        };
        warn!("Connection broken");

        self.sink.on_special_message(SpecialMessage::ConnectionBroken);

        let count = pending.len();
        for callback in pending {
            callback(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on close");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    use async_trait::async_trait;

    /// Transport replaying scripted reads and recording sent lines.
    #[derive(Default)]
    struct ScriptedTransport {
        reads: Mutex<VecDeque<Received>>,
        sent: Mutex<Vec<String>>,
        read_calls: Mutex<usize>,
        fail_sends: AtomicBool,
    }

    impl ScriptedTransport {
        fn push_read(&self, bytes: &[u8]) {
            self.reads.lock().push_back(Received::Data(bytes.to_vec()));
        }

        fn push_close(&self) {
            self.reads.lock().push_back(Received::Closed);
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send_line(&self, text: &str) -> Result<()> {
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(Error::connection("broken pipe"));
            }
            self.sent.lock().push(text.to_owned());
            Ok(())
        }

        async fn try_receive(&self, _max_bytes: usize) -> Result<Received> {
            *self.read_calls.lock() += 1;
            Ok(self
                .reads
                .lock()
                .pop_front()
                .unwrap_or(Received::WouldBlock))
        }
    }

    type Seen = Arc<Mutex<Vec<String>>>;

    fn setup() -> (Correlator<ScriptedTransport>, Arc<Mutex<Vec<SpecialMessage>>>) {
        let specials = Arc::new(Mutex::new(Vec::new()));
        let specials_clone = Arc::clone(&specials);
        let sink: Arc<dyn UiSink> =
            Arc::new(move |message: SpecialMessage| specials_clone.lock().push(message));

        let correlator = Correlator::new(ScriptedTransport::default(), sink);
        (correlator, specials)
    }

    fn recorder(seen: &Seen) -> ReplyCallback {
        let seen = Arc::clone(seen);
        Box::new(move |reply| {
            let text = match reply {
                Ok(payload) => payload,
                Err(e) => format!("error: {e}"),
            };
            seen.lock().push(text);
        })
    }

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_POLL_INTERVAL.as_millis(), 100);
        assert_eq!(DEFAULT_READ_CHUNK, 4096);
        assert_eq!(DEFAULT_REPLY_TIMEOUT.as_secs(), 60);
    }

    #[tokio::test]
    async fn test_send_command_frames_with_token() {
        let (correlator, _) = setup();

        let token = correlator.send_command("PING").await.expect("send");

        let sent = correlator.transport().sent.lock().clone();
        assert_eq!(sent, vec![format!("{token}: PING")]);
        assert!(token.is_hex());
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_send_failure_registers_nothing() {
        let (correlator, _) = setup();
        correlator.transport().fail_sends.store(true, Ordering::SeqCst);

        let err = correlator.send_command("PING").await.expect_err("should fail");
        assert!(err.is_connection_error());

        let err = correlator.request("PING").await.expect_err("should fail");
        assert!(err.is_connection_error());
        assert_eq!(correlator.pending_count(), 0);
    }

    #[test]
    fn test_hook_then_unhook_returns_callback() {
        let (correlator, _) = setup();
        let seen = Seen::default();

        correlator.hook(Token::new("t1"), recorder(&seen));
        assert!(correlator.is_pending("t1"));

        let callback = correlator.unhook("t1").expect("hooked");
        assert!(!correlator.is_pending("t1"));

        callback(Ok("from unhook".into()));
        assert_eq!(*seen.lock(), vec!["from unhook"]);
    }

    #[test]
    fn test_unhook_unknown() {
        let (correlator, _) = setup();
        let err = correlator.unhook("nope").err().expect("should fail");
        assert!(err.is_not_found());
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_matching_frame_invokes_callback_once() {
        let (correlator, specials) = setup();
        let seen = Seen::default();

        correlator.hook(Token::new("t1"), recorder(&seen));
        correlator.transport().push_read(b"t1: hello: world\n");
        correlator.transport().push_read(b"t1: again\n");

        assert_eq!(
            correlator.poll().await,
            PollOutcome::Dispatched { frames: 1 }
        );
        assert!(!correlator.is_pending("t1"));

        // Second reply for the same token is now unmatched.
        correlator.poll().await;

        assert_eq!(*seen.lock(), vec!["hello: world"]);
        assert_eq!(
            *specials.lock(),
            vec![SpecialMessage::Unmatched {
                line: "t1: again".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_reassembly_across_reads() {
        let (correlator, _) = setup();
        let seen = Seen::default();

        correlator.hook(Token::new("abc"), recorder(&seen));
        correlator.transport().push_read(b"ab");
        correlator.transport().push_read(b"c: de");
        correlator.transport().push_read(b"f\n");

        assert_eq!(correlator.poll().await, PollOutcome::Partial);
        assert_eq!(correlator.poll().await, PollOutcome::Partial);
        assert_eq!(
            correlator.poll().await,
            PollOutcome::Dispatched { frames: 1 }
        );
        assert_eq!(*seen.lock(), vec!["def"]);
    }

    #[tokio::test]
    async fn test_unmatched_frame_forwarded() {
        let (correlator, specials) = setup();

        correlator.transport().push_read(b"garbage without separator\n");

        assert_eq!(
            correlator.poll().await,
            PollOutcome::Dispatched { frames: 1 }
        );
        assert_eq!(correlator.poll().await, PollOutcome::Idle);
        assert_eq!(
            *specials.lock(),
            vec![SpecialMessage::Unmatched {
                line: "garbage without separator".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_multiple_frames_in_one_read_in_order() {
        let (correlator, _) = setup();
        let order = Seen::default();

        for token in ["t1", "t2"] {
            let order = Arc::clone(&order);
            let name = token.to_string();
            correlator.hook(
                Token::new(token),
                Box::new(move |reply| {
                    let payload = reply.expect("reply");
                    order.lock().push(format!("{name}={payload}"));
                }),
            );
        }

        correlator.transport().push_read(b"t1: a\nt2: b\n");

        assert_eq!(
            correlator.poll().await,
            PollOutcome::Dispatched { frames: 2 }
        );
        assert_eq!(*order.lock(), vec!["t1=a", "t2=b"]);
        assert_eq!(correlator.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_lines_ignored() {
        let (correlator, specials) = setup();

        correlator.transport().push_read(b"\n\n");

        assert_eq!(
            correlator.poll().await,
            PollOutcome::Dispatched { frames: 0 }
        );
        assert!(specials.lock().is_empty());
    }

    #[tokio::test]
    async fn test_close_is_terminal() {
        let (correlator, specials) = setup();
        let seen = Seen::default();

        correlator.hook(Token::new("t1"), recorder(&seen));
        correlator.transport().push_close();

        assert_eq!(correlator.poll().await, PollOutcome::Closed);
        assert_eq!(correlator.poll().await, PollOutcome::Closed);
        assert_eq!(correlator.poll().await, PollOutcome::Closed);

        assert_eq!(*specials.lock(), vec![SpecialMessage::ConnectionBroken]);
        assert_eq!(*correlator.transport().read_calls.lock(), 1);
        assert_eq!(*seen.lock(), vec!["error: Connection closed"]);
        assert!(correlator.is_closed());

        let err = correlator.send_command("PING").await.expect_err("closed");
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_frame_too_long_discarded() {
        let specials = Arc::new(Mutex::new(Vec::new()));
        let specials_clone = Arc::clone(&specials);
        let sink: Arc<dyn UiSink> =
            Arc::new(move |message: SpecialMessage| specials_clone.lock().push(message));
        let settings = CorrelatorSettings {
            max_frame_len: 8,
            ..CorrelatorSettings::default()
        };
        let correlator = Correlator::with_settings(
            ScriptedTransport::default(),
            sink,
            TokenGenerator::unsalted(),
            settings,
        );

        let seen = Seen::default();
        correlator.hook(Token::new("t"), recorder(&seen));

        correlator.transport().push_read(b"0123456789");
        correlator.transport().push_read(b"abc");
        correlator.transport().push_read(b"def\nt: ok\n");

        assert_eq!(correlator.poll().await, PollOutcome::Partial);
        assert_eq!(correlator.poll().await, PollOutcome::Partial);
        assert_eq!(
            correlator.poll().await,
            PollOutcome::Dispatched { frames: 1 }
        );

        assert_eq!(
            *specials.lock(),
            vec![SpecialMessage::FrameTooLong { len: 10 }]
        );
        assert_eq!(*seen.lock(), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_hook_after_close_fails_immediately() {
        let (correlator, _) = setup();
        let seen = Seen::default();

        correlator.transport().push_close();
        assert_eq!(correlator.poll().await, PollOutcome::Closed);

        correlator.hook_with_timeout(Token::new("late"), Duration::from_millis(1), recorder(&seen));

        assert_eq!(correlator.pending_count(), 0);
        assert_eq!(*seen.lock(), vec!["error: Connection closed"]);

        let err = correlator
            .send_hooked("PING", DEFAULT_REPLY_TIMEOUT, recorder(&seen))
            .await
            .expect_err("closed");
        assert!(matches!(err, Error::ConnectionClosed));
        assert_eq!(correlator.pending_count(), 0);
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_hook_with_huge_timeout() {
        let (correlator, _) = setup();
        let seen = Seen::default();

        correlator.hook_with_timeout(Token::new("t"), Duration::MAX, recorder(&seen));

        assert!(correlator.is_pending("t"));
        assert!(seen.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_request_times_out() {
        let (correlator, _) = setup();
        let seen = Seen::default();

        correlator.hook_with_timeout(Token::new("slow"), Duration::from_millis(200), recorder(&seen));
        correlator.poll().await;
        assert!(correlator.is_pending("slow"));

        tokio::time::advance(Duration::from_millis(250)).await;
        correlator.poll().await;

        assert!(!correlator.is_pending("slow"));
        assert_eq!(
            *seen.lock(),
            vec!["error: Request slow timed out after 200ms"]
        );
    }

    #[tokio::test]
    async fn test_request_future_resolves() {
        let (correlator, _) = setup();

        let reply = correlator.request("PING").await.expect("send");
        let line = format!("{}: PONG\n", reply.token());
        correlator.transport().push_read(line.as_bytes());
        correlator.poll().await;

        assert_eq!(reply.await.expect("reply"), "PONG");
    }

    #[tokio::test]
    async fn test_request_future_fails_on_close() {
        let (correlator, _) = setup();

        let reply = correlator.request("PING").await.expect("send");
        correlator.transport().push_close();
        correlator.poll().await;

        assert!(matches!(reply.await, Err(Error::ConnectionClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_stops_on_close() {
        let (correlator, specials) = setup();
        let correlator = Arc::new(correlator);

        correlator.transport().push_read(b"x: y\n");
        correlator.transport().push_close();

        let handle = Arc::clone(&correlator).spawn_poller(DEFAULT_POLL_INTERVAL);
        handle.await.expect("poller should finish");

        assert_eq!(
            *specials.lock(),
            vec![
                SpecialMessage::Unmatched { line: "x: y".into() },
                SpecialMessage::ConnectionBroken,
            ]
        );
        assert_eq!(*correlator.transport().read_calls.lock(), 2);
    }
}
