//! Chat orchestration: send, stop, regenerate
//!
//! Drives the send pipeline from optimistic append through streaming
//! decode into the conversation tail, with cooperative cancellation and
//! cleanup that runs on every exit path. All chat-path errors are absorbed
//! here into tail replacements or notifications; none propagate to callers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::client::{ChatTransport, EventByteStream};
use super::sse::{StreamDecoder, StreamEvent};
use super::store::ConversationStore;
use crate::constants::notices;
use crate::notify::{Notice, Notifier};

/// Live state of one in-flight streamed reply
struct StreamSession {
    /// Slot ownership mark, minted at claim time
    generation: u64,
    cancel: CancellationToken,
    decoder: StreamDecoder,
    /// The assistant's growing reply, rewritten into the tail on each delta
    reply: String,
}

impl StreamSession {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            cancel: CancellationToken::new(),
            decoder: StreamDecoder::new(),
            reply: String::new(),
        }
    }
}

/// Orchestrates the conversation against the chat backend
///
/// Owns the loading flag and the single active-stream slot as instance
/// state. At most one stream is in flight: a `send` while one is active is
/// rejected, never queued.
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    store: ConversationStore,
    session_id: String,
    notifier: Arc<dyn Notifier>,
    loading: AtomicBool,
    /// Generation and cancel handle of the active stream; empty when idle
    active: Mutex<Option<(u64, CancellationToken)>>,
    /// Mints one generation per claimed stream
    generation: AtomicU64,
}

impl ChatSession {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        store: ConversationStore,
        session_id: impl Into<String>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            transport,
            store,
            session_id: session_id.into(),
            notifier,
            loading: AtomicBool::new(false),
            active: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// True from the moment a send is accepted until its cleanup ran
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// The shared conversation log
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Send a user message and stream the reply into the conversation tail
    ///
    /// No-op for whitespace-only messages and while another reply streams.
    /// Returns once the stream reached a terminal state (completed, failed,
    /// or cancelled); callers that must not block spawn this as a task.
    pub async fn send(&self, message: &str) {
        if message.trim().is_empty() {
            return;
        }

        let Some(session) = self.claim_slot() else {
            tracing::debug!("Send rejected, a reply is already streaming");
            return;
        };

        self.run_stream(message, session).await;
    }

    /// The send pipeline past the single-flight gate; `session` holds the slot
    async fn run_stream(&self, message: &str, session: StreamSession) {
        self.loading.store(true, Ordering::SeqCst);
        self.store.append_user_turn(message);
        tracing::info!(chars = message.len(), "Sending user message");

        let generation = session.generation;
        // Runs on every exit path out of the pipeline, including task drop.
        // Only the stream still owning the slot may clear it and the
        // loading flag; a drain outliving a stop leaves its successor alone.
        let _cleanup = scopeguard::guard((), |_| {
            let mut active = self.active.lock();
            if active.as_ref().is_some_and(|(owner, _)| *owner == generation) {
                active.take();
                self.loading.store(false, Ordering::SeqCst);
            }
        });

        let stream = tokio::select! {
            _ = session.cancel.cancelled() => {
                self.settle_stopped_tail(generation);
                tracing::info!("Send cancelled before the stream opened");
                return;
            }
            result = self.transport.open_stream(message, &self.session_id) => match result {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "Chat request failed");
                    if session.cancel.is_cancelled() {
                        self.settle_stopped_tail(generation);
                    } else {
                        self.store.update_tail(notices::CONNECT_FAILED, true);
                    }
                    return;
                }
            }
        };

        self.pump(stream, session).await;
    }

    /// Cancel the active stream and clear the loading flag
    ///
    /// No-op when nothing is streaming. The tail itself is untouched here:
    /// the pipeline task owns every tail write and replaces the tail with
    /// the stopped notice as its final update once it observes the
    /// cancellation. A stop that races natural completion leaves the
    /// completed reply in place.
    pub fn stop(&self) {
        let Some((_, cancel)) = self.active.lock().take() else {
            return;
        };
        cancel.cancel();
        self.loading.store(false, Ordering::SeqCst);
        tracing::info!("Reply stopped by user");
    }

    /// Discard the last turn and re-send its user message
    ///
    /// Notifies and leaves the log untouched when no user message exists
    /// yet. Rejected while a reply streams, like `send`.
    pub async fn regenerate(&self) {
        // Claiming before touching the log keeps a racing send from
        // slipping in between truncation and the re-send.
        let Some(session) = self.claim_slot() else {
            tracing::debug!("Regenerate rejected, a reply is already streaming");
            return;
        };

        let Some(text) = self.store.last_user_text() else {
            self.release_slot(session.generation);
            self.notifier
                .notify(Notice::error(notices::REGENERATE_NEEDS_MESSAGE));
            return;
        };

        tracing::info!("Regenerating last reply");
        self.store.truncate_last_turn();
        self.run_stream(&text, session).await;
    }

    /// Atomically occupy the single-flight slot
    fn claim_slot(&self) -> Option<StreamSession> {
        let mut active = self.active.lock();
        if active.is_some() {
            return None;
        }
        let session = StreamSession::new(self.generation.fetch_add(1, Ordering::Relaxed));
        *active = Some((session.generation, session.cancel.clone()));
        Some(session)
    }

    /// Empty the slot unless a newer stream already claimed it
    fn release_slot(&self, generation: u64) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|(owner, _)| *owner == generation) {
            active.take();
        }
    }

    /// Write the stopped notice unless a newer stream already owns the tail
    ///
    /// Called by a pipeline that observed its own cancellation. The slot
    /// lock is held across the write, so no concurrent claim can slide its
    /// fresh turn underneath the notice.
    fn settle_stopped_tail(&self, generation: u64) {
        let active = self.active.lock();
        let superseded = active
            .as_ref()
            .is_some_and(|(owner, _)| *owner != generation);
        if !superseded {
            self.store.update_tail(notices::REPLY_STOPPED, true);
        }
    }

    /// Read the byte stream to its end, folding decoded events into the tail
    ///
    /// Sole writer of the conversation tail while the stream lives; every
    /// cancellation exit writes the stopped notice as the final tail update.
    async fn pump(&self, mut stream: EventByteStream, mut session: StreamSession) {
        loop {
            tokio::select! {
                biased;

                _ = session.cancel.cancelled() => {
                    self.settle_stopped_tail(session.generation);
                    tracing::info!("Reply stream cancelled");
                    break;
                }
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        // A stop that raced this read wins the tail
                        if session.cancel.is_cancelled() {
                            self.settle_stopped_tail(session.generation);
                            break;
                        }
                        self.fold_chunk(&mut session, &bytes);
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Stream read failed");
                        if session.cancel.is_cancelled() {
                            self.settle_stopped_tail(session.generation);
                        }
                        // Otherwise the partial reply stays as-is
                        break;
                    }
                    None => {
                        // Completion and a simultaneous stop both keep the reply
                        tracing::info!(chars = session.reply.len(), "Reply stream completed");
                        break;
                    }
                }
            }
        }
        session.decoder.finish();
    }

    fn fold_chunk(&self, session: &mut StreamSession, bytes: &[u8]) {
        for event in session.decoder.feed(bytes) {
            match event {
                StreamEvent::TextDelta(delta) => {
                    session.reply.push_str(&delta);
                    self.store.update_tail(&session.reply, true);
                }
                StreamEvent::Error(detail) => {
                    // One notification per bad line; the stream keeps going
                    tracing::warn!(error = %detail, "Stream event could not be processed");
                    self.notifier.notify(Notice::error(notices::EVENT_FAILED));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use reqwest::StatusCode;
    use std::time::Duration;
    use tokio::sync::{mpsc, Notify};

    use crate::error::ChatError;

    struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                notices: Mutex::new(Vec::new()),
            })
        }

        fn texts(&self) -> Vec<String> {
            self.notices.lock().iter().map(|n| n.text.clone()).collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().push(notice);
        }
    }

    enum Script {
        /// Replay these frames, then end the stream
        Chunks { frames: Vec<Bytes>, then_fail: bool },
        /// Refuse the request with this status
        Refuse(StatusCode),
        /// Channel-fed stream that stays open until the sender drops
        Live,
        /// Hold the open until the gate fires, then end the stream at once
        GatedOpen(Arc<Notify>),
    }

    struct ScriptedTransport {
        script: Script,
        requests: Mutex<Vec<(String, String)>>,
        live_rx: Mutex<Vec<mpsc::UnboundedReceiver<Result<Bytes, ChatError>>>>,
    }

    impl ScriptedTransport {
        fn chunks(frames: Vec<Bytes>) -> Arc<Self> {
            Arc::new(Self {
                script: Script::Chunks {
                    frames,
                    then_fail: false,
                },
                requests: Mutex::new(Vec::new()),
                live_rx: Mutex::new(Vec::new()),
            })
        }

        fn chunks_then_fail(frames: Vec<Bytes>) -> Arc<Self> {
            Arc::new(Self {
                script: Script::Chunks {
                    frames,
                    then_fail: true,
                },
                requests: Mutex::new(Vec::new()),
                live_rx: Mutex::new(Vec::new()),
            })
        }

        fn refuse(status: StatusCode) -> Arc<Self> {
            Arc::new(Self {
                script: Script::Refuse(status),
                requests: Mutex::new(Vec::new()),
                live_rx: Mutex::new(Vec::new()),
            })
        }

        fn live() -> (Arc<Self>, mpsc::UnboundedSender<Result<Bytes, ChatError>>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let transport = Arc::new(Self {
                script: Script::Live,
                requests: Mutex::new(Vec::new()),
                live_rx: Mutex::new(vec![rx]),
            });
            (transport, tx)
        }

        fn live_pair() -> (
            Arc<Self>,
            mpsc::UnboundedSender<Result<Bytes, ChatError>>,
            mpsc::UnboundedSender<Result<Bytes, ChatError>>,
        ) {
            let (tx1, rx1) = mpsc::unbounded_channel();
            let (tx2, rx2) = mpsc::unbounded_channel();
            let transport = Arc::new(Self {
                script: Script::Live,
                requests: Mutex::new(Vec::new()),
                live_rx: Mutex::new(vec![rx1, rx2]),
            });
            (transport, tx1, tx2)
        }

        fn gated_open() -> (Arc<Self>, Arc<Notify>) {
            let gate = Arc::new(Notify::new());
            let transport = Arc::new(Self {
                script: Script::GatedOpen(gate.clone()),
                requests: Mutex::new(Vec::new()),
                live_rx: Mutex::new(Vec::new()),
            });
            (transport, gate)
        }

        fn requests(&self) -> Vec<(String, String)> {
            self.requests.lock().clone()
        }
    }

    fn read_error() -> ChatError {
        ChatError::Payload(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
    }

    #[async_trait::async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn open_stream(
            &self,
            message: &str,
            session_id: &str,
        ) -> Result<EventByteStream, ChatError> {
            self.requests
                .lock()
                .push((message.to_string(), session_id.to_string()));

            match &self.script {
                Script::Refuse(status) => Err(ChatError::Status(*status)),
                Script::Chunks { frames, then_fail } => {
                    let mut items: Vec<Result<Bytes, ChatError>> =
                        frames.iter().cloned().map(Ok).collect();
                    if *then_fail {
                        items.push(Err(read_error()));
                    }
                    Ok(futures::stream::iter(items).boxed())
                }
                Script::Live => {
                    let mut pending = self.live_rx.lock();
                    assert!(!pending.is_empty(), "live stream opened more times than scripted");
                    let rx = pending.remove(0);
                    drop(pending);
                    Ok(futures::stream::unfold(rx, |mut rx| async move {
                        rx.recv().await.map(|item| (item, rx))
                    })
                    .boxed())
                }
                Script::GatedOpen(gate) => {
                    gate.notified().await;
                    Ok(futures::stream::iter(Vec::<Result<Bytes, ChatError>>::new()).boxed())
                }
            }
        }
    }

    fn frame(text: &str) -> Bytes {
        Bytes::from(format!("data: {{\"textResponse\":\"{}\"}}\n", text))
    }

    fn make_session(
        transport: Arc<ScriptedTransport>,
    ) -> (Arc<ChatSession>, ConversationStore, Arc<RecordingNotifier>) {
        let store = ConversationStore::new();
        let notifier = RecordingNotifier::new();
        let session = Arc::new(ChatSession::new(
            transport,
            store.clone(),
            "oturum-1",
            notifier.clone(),
        ));
        (session, store, notifier)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_send_appends_exactly_one_turn() {
        let transport = ScriptedTransport::chunks(vec![frame("Selam")]);
        let (session, store, _) = make_session(transport.clone());

        session.send("merhaba").await;

        let log = store.messages();
        assert_eq!(log.len(), 2);
        assert!(log[0].is_user);
        assert_eq!(log[0].text, "merhaba");
        assert_eq!(log[1].text, "Selam");
        assert_eq!(log[1].responded, Some(true));
        assert!(!session.is_loading());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_send_keeps_message_untrimmed_in_log() {
        let transport = ScriptedTransport::chunks(vec![frame("ok")]);
        let (session, store, _) = make_session(transport.clone());

        session.send("  boşluklu  ").await;

        assert_eq!(store.messages()[0].text, "  boşluklu  ");
        assert_eq!(transport.requests()[0].0, "  boşluklu  ");
    }

    #[tokio::test]
    async fn test_send_whitespace_only_is_noop() {
        let transport = ScriptedTransport::chunks(vec![]);
        let (session, store, _) = make_session(transport.clone());

        session.send("   ").await;

        assert!(store.is_empty());
        assert!(!session.is_loading());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_placeholder_pending_until_first_delta() {
        let (transport, tx) = ScriptedTransport::live();
        let (session, store, _) = make_session(transport);

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.send("merhaba").await }
        });

        let seen = store.clone();
        wait_until(move || seen.len() == 2).await;
        let log = store.messages();
        assert!(log[1].is_pending());
        assert_eq!(log[1].text, "...");

        tx.send(Ok(frame("Selam"))).unwrap();
        drop(tx);
        task.await.unwrap();

        let log = store.messages();
        assert_eq!(log[1].text, "Selam");
        assert_eq!(log[1].responded, Some(true));
    }

    #[tokio::test]
    async fn test_connectivity_failure_replaces_placeholder() {
        let transport = ScriptedTransport::refuse(StatusCode::BAD_GATEWAY);
        let (session, store, notifier) = make_session(transport);

        session.send("merhaba").await;

        let log = store.messages();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].text, notices::CONNECT_FAILED);
        assert_eq!(log[1].responded, Some(true));
        assert!(!session.is_loading());
        assert!(notifier.texts().is_empty());
    }

    #[tokio::test]
    async fn test_deltas_accumulate_into_tail() {
        let transport = ScriptedTransport::chunks(vec![frame("Hi"), frame(" there")]);
        let (session, store, _) = make_session(transport);

        session.send("hello").await;

        let log = store.messages();
        assert_eq!(log[1].text, "Hi there");
        assert_eq!(log[1].responded, Some(true));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_frames_split_across_reads() {
        let transport = ScriptedTransport::chunks(vec![
            Bytes::from_static(b"data: {\"textRes"),
            Bytes::from_static(b"ponse\":\"Par\"}\ndata: {\"textResponse\":\"\\u00e7a\"}\n"),
        ]);
        let (session, store, _) = make_session(transport);

        session.send("merhaba").await;

        assert_eq!(store.messages()[1].text, "Parça");
    }

    #[tokio::test]
    async fn test_malformed_line_notifies_once_and_continues() {
        let transport = ScriptedTransport::chunks(vec![
            Bytes::from_static(b"data: bozuk satir\n"),
            frame("ok"),
        ]);
        let (session, store, notifier) = make_session(transport);

        session.send("merhaba").await;

        assert_eq!(notifier.texts(), vec![notices::EVENT_FAILED.to_string()]);
        assert_eq!(store.messages()[1].text, "ok");
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_upstream_error_event_keeps_stream_open() {
        let transport = ScriptedTransport::chunks(vec![
            frame("başla"),
            Bytes::from_static(b"data: {\"error\":\"kota doldu\"}\n"),
            frame(" devam"),
        ]);
        let (session, store, notifier) = make_session(transport);

        session.send("merhaba").await;

        assert_eq!(store.messages()[1].text, "başla devam");
        assert_eq!(store.messages()[1].responded, Some(true));
        assert_eq!(notifier.texts(), vec![notices::EVENT_FAILED.to_string()]);
    }

    #[tokio::test]
    async fn test_read_failure_keeps_partial_reply() {
        let transport = ScriptedTransport::chunks_then_fail(vec![frame("yarım")]);
        let (session, store, notifier) = make_session(transport);

        session.send("merhaba").await;

        let log = store.messages();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].text, "yarım");
        assert_eq!(log[1].responded, Some(true));
        assert!(!session.is_loading());
        // Logged only; nothing user-facing beyond the partial text
        assert!(notifier.texts().is_empty());
    }

    #[tokio::test]
    async fn test_stop_replaces_tail_and_clears_loading() {
        let (transport, tx) = ScriptedTransport::live();
        let (session, store, _) = make_session(transport);

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.send("merhaba").await }
        });

        tx.send(Ok(frame("kısmi cevap"))).unwrap();
        let seen = store.clone();
        wait_until(move || {
            seen.messages()
                .last()
                .is_some_and(|m| m.text == "kısmi cevap")
        })
        .await;

        session.stop();
        task.await.unwrap();

        let log = store.messages();
        assert_eq!(log[1].text, notices::REPLY_STOPPED);
        assert_eq!(log[1].responded, Some(true));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_stop_without_active_stream_is_noop() {
        let transport = ScriptedTransport::chunks(vec![frame("Selam")]);
        let (session, store, _) = make_session(transport);

        session.send("merhaba").await;
        let before = store.messages();

        session.stop();

        assert_eq!(store.messages(), before);
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_stop_notice_survives_queued_deltas() {
        let (transport, tx) = ScriptedTransport::live();
        let (session, store, _) = make_session(transport);

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.send("merhaba").await }
        });

        tx.send(Ok(frame("kısmi"))).unwrap();
        let seen = store.clone();
        wait_until(move || seen.messages().last().is_some_and(|m| m.text == "kısmi")).await;

        session.stop();
        // Deltas already on the wire when the stop landed
        let _ = tx.send(Ok(frame(" devam")));
        let _ = tx.send(Ok(frame(" daha")));
        drop(tx);
        task.await.unwrap();

        let log = store.messages();
        assert_eq!(log[1].text, notices::REPLY_STOPPED);
        assert_eq!(log[1].responded, Some(true));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_send_after_stop_keeps_new_stream_stoppable() {
        let (transport, tx1, tx2) = ScriptedTransport::live_pair();
        let (session, store, _) = make_session(transport);

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.send("birinci").await }
        });
        tx1.send(Ok(frame("ilk"))).unwrap();
        let seen = store.clone();
        wait_until(move || seen.messages().last().is_some_and(|m| m.text == "ilk")).await;

        // Stop and re-send back to back, before the first pipeline drained
        session.stop();
        let second = tokio::spawn({
            let session = session.clone();
            async move { session.send("ikinci").await }
        });

        tx2.send(Ok(frame("yeni"))).unwrap();
        let seen = store.clone();
        wait_until(move || seen.messages().last().is_some_and(|m| m.text == "yeni")).await;
        first.await.unwrap();
        // The drained first pipeline must not clear the second's loading flag
        assert!(session.is_loading());

        session.stop();
        let _ = tx2.send(Ok(frame(" fazla")));
        drop(tx2);
        second.await.unwrap();

        let log = store.messages();
        assert_eq!(log.len(), 4);
        assert_eq!(log[2].text, "ikinci");
        assert_eq!(log[3].text, notices::REPLY_STOPPED);
        assert_eq!(log[3].responded, Some(true));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_stop_while_connecting_spares_previous_turn() {
        let (transport, _gate) = ScriptedTransport::gated_open();
        let (session, store, _) = make_session(transport.clone());

        store.append_user_turn("eski soru");
        store.update_tail("eski cevap", true);

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.send("yeni soru").await }
        });

        let calls = transport.clone();
        wait_until(move || calls.requests().len() == 1).await;

        session.stop();
        task.await.unwrap();

        let log = store.messages();
        assert_eq!(log.len(), 4);
        assert_eq!(log[1].text, "eski cevap");
        assert_eq!(log[3].text, notices::REPLY_STOPPED);
        assert_eq!(log[3].responded, Some(true));
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_regenerate_without_user_turn_notifies() {
        let transport = ScriptedTransport::chunks(vec![]);
        let (session, store, notifier) = make_session(transport.clone());

        session.regenerate().await;

        assert!(store.is_empty());
        assert!(!session.is_loading());
        assert_eq!(
            notifier.texts(),
            vec![notices::REGENERATE_NEEDS_MESSAGE.to_string()]
        );
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_regenerate_resends_last_user_turn() {
        let transport = ScriptedTransport::chunks(vec![frame("cevap")]);
        let (session, store, _) = make_session(transport.clone());

        session.send("soru").await;
        session.regenerate().await;

        let log = store.messages();
        assert_eq!(log.len(), 2);
        assert!(log[0].is_user);
        assert_eq!(log[0].text, "soru");
        assert_eq!(log[1].text, "cevap");
        assert_eq!(log[1].responded, Some(true));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0, "soru");
        assert_eq!(requests[1].0, "soru");
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_second_send_rejected_while_streaming() {
        let (transport, tx) = ScriptedTransport::live();
        let (session, store, _) = make_session(transport.clone());

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.send("birinci").await }
        });

        let calls = transport.clone();
        wait_until(move || calls.requests().len() == 1).await;

        session.send("ikinci").await;

        assert_eq!(store.len(), 2);
        assert_eq!(store.messages()[0].text, "birinci");
        assert_eq!(transport.requests().len(), 1);

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_regenerate_rejected_while_streaming() {
        let (transport, tx) = ScriptedTransport::live();
        let (session, store, _) = make_session(transport.clone());

        let task = tokio::spawn({
            let session = session.clone();
            async move { session.send("soru").await }
        });

        let calls = transport.clone();
        wait_until(move || calls.requests().len() == 1).await;

        session.regenerate().await;

        // No truncation, no second request
        assert_eq!(store.len(), 2);
        assert_eq!(transport.requests().len(), 1);
        assert!(session.is_loading());

        drop(tx);
        task.await.unwrap();
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_session_id_flows_to_transport() {
        let transport = ScriptedTransport::chunks(vec![]);
        let (session, _, _) = make_session(transport.clone());

        session.send("merhaba").await;

        assert_eq!(transport.requests()[0].1, "oturum-1");
    }
}
