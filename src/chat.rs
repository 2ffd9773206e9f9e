//! Chat bridge: feeds user prompts to the assistant and folds its answers into a transcript
//!
//! [`ChatSession`] is the transcript plus the turn bookkeeping, with no I/O. Every
//! turn carries the session epoch it started in; [`ChatSession::abandon`] bumps the
//! epoch so a stream still in flight can no longer touch the transcript.
//! [`ChatBridge`] drives a session against a [`ChatTransport`].
//!
//! Failure policy: nothing already streamed is rolled back. A failed turn keeps any
//! partial answer as-is and appends a separate assistant message with
//! [`CHAT_ERROR_MESSAGE`]. A reply placeholder that never received text is removed
//! first, so the transcript holds no empty assistant messages.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use log::{debug, error, info};

use crate::error::ChatError;
use crate::models::{ChatMessage, GroundingSource};
use crate::prompts::{CHAT_ERROR_MESSAGE, EMPTY_ANSWER_MESSAGE, GREETING};

/// One increment of a streamed answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatDelta {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

/// A complete answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

pub type DeltaStream = BoxStream<'static, Result<ChatDelta, ChatError>>;

/// The generative-AI collaborator.
#[allow(async_fn_in_trait)]
pub trait ChatTransport {
    async fn generate(&self, prompt: &str) -> Result<ChatReply, ChatError>;

    async fn stream(&self, prompt: &str) -> Result<DeltaStream, ChatError>;
}

/// Handle for one request/answer exchange.
#[derive(Debug)]
pub struct Turn {
    epoch: u64,
    reply: Option<usize>,
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Failed(ChatError),
    /// The session moved on while the request was in flight.
    Abandoned,
    /// The turn never started.
    Rejected(ChatError),
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    input: String,
    busy: bool,
    epoch: u64,
    pending_reply: Option<usize>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            input: String::new(),
            busy: false,
            epoch: 0,
            pending_reply: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Text waiting in the input box
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    /// Appends an assistant notice outside of any turn.
    pub fn push_notice(&mut self, text: &str) {
        self.messages.push(ChatMessage::assistant(text));
    }

    /// Records the user's message and marks the session busy.
    pub fn begin_turn(&mut self, prompt: &str) -> Result<Turn, ChatError> {
        if prompt.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }
        if self.busy {
            return Err(ChatError::Busy);
        }
        self.messages.push(ChatMessage::user(prompt));
        self.busy = true;
        Ok(Turn {
            epoch: self.epoch,
            reply: None,
        })
    }

    pub fn is_current(&self, turn: &Turn) -> bool {
        self.busy && turn.epoch == self.epoch
    }

    /// Appends the empty assistant message a stream will fill.
    pub fn open_reply(&mut self, turn: &mut Turn) -> bool {
        if !self.is_current(turn) {
            return false;
        }
        if turn.reply.is_none() {
            self.messages.push(ChatMessage::assistant(""));
            let index = self.messages.len() - 1;
            turn.reply = Some(index);
            self.pending_reply = Some(index);
        }
        true
    }

    /// Folds a streamed delta into the open reply. False once the turn is stale.
    pub fn apply_delta(&mut self, turn: &Turn, delta: ChatDelta) -> bool {
        if !self.is_current(turn) {
            return false;
        }
        let Some(message) = turn.reply.and_then(|i| self.messages.get_mut(i)) else {
            return false;
        };
        message.content.push_str(&delta.text);
        message.merge_sources(delta.sources);
        true
    }

    /// Ends a streamed turn normally.
    pub fn finish_stream(&mut self, turn: &Turn) -> bool {
        if !self.is_current(turn) {
            return false;
        }
        if let Some(message) = turn.reply.and_then(|i| self.messages.get_mut(i)) {
            if message.content.is_empty() {
                message.content = EMPTY_ANSWER_MESSAGE.to_string();
            }
        }
        self.end_turn();
        true
    }

    /// Ends a single-shot turn with its answer.
    pub fn complete(&mut self, turn: &Turn, reply: ChatReply) -> bool {
        if !self.is_current(turn) {
            return false;
        }
        let text = if reply.text.is_empty() {
            EMPTY_ANSWER_MESSAGE.to_string()
        } else {
            reply.text
        };
        let mut message = ChatMessage::assistant(text);
        message.merge_sources(reply.sources);
        self.messages.push(message);
        self.end_turn();
        true
    }

    /// Ends a turn after a transport or API error.
    pub fn fail(&mut self, turn: &Turn) -> bool {
        if !self.is_current(turn) {
            return false;
        }
        self.drop_empty_pending_reply();
        self.messages.push(ChatMessage::assistant(CHAT_ERROR_MESSAGE));
        self.end_turn();
        true
    }

    /// Detaches any in-flight turn, e.g. when the chat panel closes.
    pub fn abandon(&mut self) {
        if !self.busy {
            return;
        }
        self.drop_empty_pending_reply();
        self.epoch += 1;
        self.end_turn();
    }

    fn drop_empty_pending_reply(&mut self) {
        if let Some(index) = self.pending_reply.take() {
            let empty = self
                .messages
                .get(index)
                .is_some_and(|m| m.content.is_empty() && m.sources.is_empty());
            if empty {
                self.messages.remove(index);
            }
        }
    }

    fn end_turn(&mut self) {
        self.busy = false;
        self.pending_reply = None;
    }
}

pub type SharedSession = Arc<Mutex<ChatSession>>;

pub(crate) fn lock_session(session: &SharedSession) -> MutexGuard<'_, ChatSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs turns of a shared [`ChatSession`] against a transport. Locks are never held
/// across an await.
pub struct ChatBridge<T: ChatTransport> {
    transport: T,
    session: SharedSession,
}

impl<T: ChatTransport> ChatBridge<T> {
    pub fn new(transport: T) -> Self {
        Self::with_session(transport, Arc::new(Mutex::new(ChatSession::new())))
    }

    pub fn with_session(transport: T, session: SharedSession) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> SharedSession {
        self.session.clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        lock_session(&self.session).messages().to_vec()
    }

    pub fn is_busy(&self) -> bool {
        lock_session(&self.session).is_busy()
    }

    pub fn abandon(&self) {
        lock_session(&self.session).abandon();
    }

    /// One request, one assistant message.
    pub async fn ask(&self, prompt: &str) -> TurnOutcome {
        let turn = match lock_session(&self.session).begin_turn(prompt) {
            Ok(turn) => turn,
            Err(e) => return TurnOutcome::Rejected(e),
        };
        info!("[ask] Sending prompt ({} chars)", prompt.len());

        let result = self.transport.generate(prompt).await;
        let mut session = lock_session(&self.session);
        match result {
            Ok(reply) => {
                if session.complete(&turn, reply) {
                    TurnOutcome::Completed
                } else {
                    TurnOutcome::Abandoned
                }
            }
            Err(e) => {
                error!("[ask] Request failed: {}", e);
                if session.fail(&turn) {
                    TurnOutcome::Failed(e)
                } else {
                    TurnOutcome::Abandoned
                }
            }
        }
    }

    /// Streams the answer into a single assistant message as deltas arrive.
    pub async fn ask_stream(&self, prompt: &str) -> TurnOutcome {
        self.ask_stream_with(prompt, |_| {}).await
    }

    /// Like [`ask_stream`](Self::ask_stream), handing each text increment to `on_text`
    /// once it is part of the transcript.
    pub async fn ask_stream_with<F>(&self, prompt: &str, mut on_text: F) -> TurnOutcome
    where
        F: FnMut(&str),
    {
        let mut turn = {
            let mut session = lock_session(&self.session);
            let mut turn = match session.begin_turn(prompt) {
                Ok(turn) => turn,
                Err(e) => return TurnOutcome::Rejected(e),
            };
            session.open_reply(&mut turn);
            turn
        };
        info!("[ask_stream] Streaming prompt ({} chars)", prompt.len());

        let mut stream = match self.transport.stream(prompt).await {
            Ok(stream) => stream,
            Err(e) => return self.fail_turn(&mut turn, e),
        };

        let mut chunks = 0usize;
        while let Some(item) = stream.next().await {
            match item {
                Ok(delta) => {
                    let text = delta.text.clone();
                    if !lock_session(&self.session).apply_delta(&turn, delta) {
                        debug!("[ask_stream] Turn abandoned after {} chunks", chunks);
                        return TurnOutcome::Abandoned;
                    }
                    if !text.is_empty() {
                        on_text(&text);
                    }
                    chunks += 1;
                }
                Err(e) => return self.fail_turn(&mut turn, e),
            }
        }

        if lock_session(&self.session).finish_stream(&turn) {
            debug!("[ask_stream] Completed after {} chunks", chunks);
            TurnOutcome::Completed
        } else {
            TurnOutcome::Abandoned
        }
    }

    /// Sends whatever is in the input box.
    pub async fn submit(&self, streaming: bool) -> TurnOutcome {
        let prompt = {
            let mut session = lock_session(&self.session);
            if session.is_busy() {
                return TurnOutcome::Rejected(ChatError::Busy);
            }
            session.take_input()
        };
        if streaming {
            self.ask_stream(&prompt).await
        } else {
            self.ask(&prompt).await
        }
    }

    fn fail_turn(&self, turn: &mut Turn, e: ChatError) -> TurnOutcome {
        error!("[ask_stream] Stream failed: {}", e);
        if lock_session(&self.session).fail(turn) {
            TurnOutcome::Failed(e)
        } else {
            TurnOutcome::Abandoned
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use futures_util::stream;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    fn source(n: u8) -> GroundingSource {
        GroundingSource {
            title: format!("Doc {}", n),
            uri: format!("https://docs.example/{}", n),
        }
    }

    fn delta(text: &str, sources: Vec<GroundingSource>) -> ChatDelta {
        ChatDelta {
            text: text.to_string(),
            sources,
        }
    }

    /// Replays a fixed answer or delta script.
    struct ScriptedTransport {
        reply: Result<ChatReply, ChatError>,
        deltas: Vec<Result<ChatDelta, ChatError>>,
    }

    impl ScriptedTransport {
        fn streaming(deltas: Vec<Result<ChatDelta, ChatError>>) -> Self {
            Self {
                reply: Err(ChatError::Transport("unused".into())),
                deltas,
            }
        }

        fn single(reply: Result<ChatReply, ChatError>) -> Self {
            Self {
                reply,
                deltas: Vec::new(),
            }
        }
    }

    impl ChatTransport for ScriptedTransport {
        async fn generate(&self, _prompt: &str) -> Result<ChatReply, ChatError> {
            self.reply.clone()
        }

        async fn stream(&self, _prompt: &str) -> Result<DeltaStream, ChatError> {
            Ok(stream::iter(self.deltas.clone()).boxed())
        }
    }

    /// Stream fed by the test through a channel.
    struct ChannelTransport {
        rx: Mutex<Option<mpsc::UnboundedReceiver<Result<ChatDelta, ChatError>>>>,
    }

    impl ChatTransport for ChannelTransport {
        async fn generate(&self, _prompt: &str) -> Result<ChatReply, ChatError> {
            Err(ChatError::Transport("unused".into()))
        }

        async fn stream(&self, _prompt: &str) -> Result<DeltaStream, ChatError> {
            let rx = self
                .rx
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| ChatError::Transport("already streaming".into()))?;
            Ok(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })
            .boxed())
        }
    }

    #[test]
    fn session_opens_with_greeting() {
        let session = ChatSession::new();
        assert_eq!(session.messages(), &[ChatMessage::assistant(GREETING)]);
        assert!(!session.is_busy());
    }

    #[test]
    fn deltas_concatenate_and_sources_union() {
        let mut session = ChatSession::new();
        let mut turn = session.begin_turn("What is a CCR?").unwrap();
        assert!(session.open_reply(&mut turn));
        session.apply_delta(&turn, delta("Cloud ", vec![source(1)]));
        session.apply_delta(&turn, delta("Core ", vec![source(2), source(1)]));
        session.apply_delta(&turn, delta("Router", vec![source(2), source(3)]));
        assert!(session.finish_stream(&turn));

        let reply = session.messages().last().unwrap();
        assert_eq!(reply.content, "Cloud Core Router");
        assert_eq!(reply.sources, vec![source(1), source(2), source(3)]);
        assert!(!session.is_busy());
    }

    #[test]
    fn second_turn_is_refused_while_busy() {
        let mut session = ChatSession::new();
        let _turn = session.begin_turn("one").unwrap();
        assert_eq!(session.begin_turn("two").unwrap_err(), ChatError::Busy);
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.begin_turn("  ").unwrap_err(), ChatError::EmptyInput);
    }

    #[test]
    fn stale_turn_cannot_touch_transcript() {
        let mut session = ChatSession::new();
        let mut turn = session.begin_turn("hello").unwrap();
        session.open_reply(&mut turn);
        session.apply_delta(&turn, delta("Hi", vec![]));
        session.abandon();

        assert!(!session.apply_delta(&turn, delta(" there", vec![])));
        assert!(!session.finish_stream(&turn));
        assert!(!session.fail(&turn));
        assert_eq!(session.messages().last().unwrap().content, "Hi");

        // A new turn works normally after abandoning.
        assert!(session.begin_turn("again").is_ok());
    }

    #[test]
    fn abandoning_before_any_text_drops_the_placeholder() {
        let mut session = ChatSession::new();
        let mut turn = session.begin_turn("hello").unwrap();
        session.open_reply(&mut turn);
        session.abandon();
        let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User]);
    }

    #[tokio::test]
    async fn single_shot_appends_one_answer() {
        let transport = ScriptedTransport::single(Ok(ChatReply {
            text: "Use BGP.".into(),
            sources: vec![source(1), source(1)],
        }));
        let bridge = ChatBridge::new(transport);
        assert_eq!(bridge.ask("Routing advice?").await, TurnOutcome::Completed);

        let messages = bridge.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], ChatMessage::user("Routing advice?"));
        assert_eq!(messages[2].content, "Use BGP.");
        assert_eq!(messages[2].sources, vec![source(1)]);
        assert!(!bridge.is_busy());
    }

    #[tokio::test]
    async fn single_shot_empty_answer_uses_placeholder_text() {
        let bridge = ChatBridge::new(ScriptedTransport::single(Ok(ChatReply::default())));
        bridge.ask("?").await;
        assert_eq!(bridge.messages().last().unwrap().content, EMPTY_ANSWER_MESSAGE);
    }

    #[tokio::test]
    async fn single_shot_failure_becomes_fixed_message() {
        let transport = ScriptedTransport::single(Err(ChatError::Api {
            status: 500,
            body: "boom".into(),
        }));
        let bridge = ChatBridge::new(transport);
        assert!(matches!(bridge.ask("hi").await, TurnOutcome::Failed(_)));

        let messages = bridge.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2], ChatMessage::assistant(CHAT_ERROR_MESSAGE));
        assert!(!bridge.is_busy());
    }

    #[tokio::test]
    async fn streamed_answer_fills_one_message() {
        let transport = ScriptedTransport::streaming(vec![
            Ok(delta("The hAP ", vec![source(1)])),
            Ok(delta("ax³ supports ", vec![])),
            Ok(delta("Wi-Fi 6.", vec![source(1), source(2)])),
        ]);
        let bridge = ChatBridge::new(transport);
        assert_eq!(bridge.ask_stream("hAP ax3?").await, TurnOutcome::Completed);

        let messages = bridge.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].content, "The hAP ax³ supports Wi-Fi 6.");
        assert_eq!(messages[2].sources, vec![source(1), source(2)]);
    }

    #[tokio::test]
    async fn mid_stream_failure_preserves_partial_and_appends_error() {
        let transport = ScriptedTransport::streaming(vec![
            Ok(delta("Hel", vec![])),
            Err(ChatError::Transport("connection reset".into())),
            Ok(delta("lo", vec![])),
        ]);
        let bridge = ChatBridge::new(transport);
        let outcome = bridge.ask_stream("hi").await;
        assert_eq!(
            outcome,
            TurnOutcome::Failed(ChatError::Transport("connection reset".into()))
        );

        let messages = bridge.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].content, "Hel");
        assert_eq!(messages[3], ChatMessage::assistant(CHAT_ERROR_MESSAGE));
        assert!(!bridge.is_busy());
    }

    #[tokio::test]
    async fn failure_before_any_text_leaves_only_the_error() {
        let transport =
            ScriptedTransport::streaming(vec![Err(ChatError::Decode("bad frame".into()))]);
        let bridge = ChatBridge::new(transport);
        bridge.ask_stream("hi").await;

        let messages = bridge.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2], ChatMessage::assistant(CHAT_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn abandoned_stream_stops_mutating() {
        let (tx, rx) = mpsc::unbounded_channel();
        let bridge = ChatBridge::new(ChannelTransport {
            rx: Mutex::new(Some(rx)),
        });

        let driver = async {
            tx.send(Ok(delta("Part", vec![]))).unwrap();
            while bridge.messages().last().map(|m| m.content.as_str()) != Some("Part") {
                tokio::task::yield_now().await;
            }
            bridge.abandon();
            tx.send(Ok(delta("ial", vec![]))).unwrap();
        };
        let (outcome, ()) = tokio::join!(bridge.ask_stream("hi"), driver);

        assert_eq!(outcome, TurnOutcome::Abandoned);
        assert_eq!(bridge.messages().last().unwrap().content, "Part");
        assert!(!bridge.is_busy());
    }

    #[tokio::test]
    async fn stream_callback_sees_each_increment_in_order() {
        let transport = ScriptedTransport::streaming(vec![
            Ok(delta("Cloud ", vec![])),
            Ok(delta("", vec![source(1)])),
            Ok(delta("Core", vec![])),
        ]);
        let bridge = ChatBridge::new(transport);
        let mut seen = Vec::new();
        let outcome = bridge
            .ask_stream_with("what is a CCR?", |text| seen.push(text.to_string()))
            .await;

        assert_eq!(outcome, TurnOutcome::Completed);
        assert_eq!(seen, vec!["Cloud ", "Core"]);
        assert_eq!(bridge.messages().last().unwrap().content, seen.concat());
    }

    #[tokio::test]
    async fn submit_sends_the_input_box() {
        let bridge = ChatBridge::new(ScriptedTransport::single(Ok(ChatReply {
            text: "ok".into(),
            sources: vec![],
        })));
        lock_session(&bridge.session()).set_input("from voice");
        assert_eq!(bridge.submit(false).await, TurnOutcome::Completed);
        let messages = bridge.messages();
        assert_eq!(messages[1], ChatMessage::user("from voice"));
        assert_eq!(lock_session(&bridge.session()).input(), "");

        assert_eq!(
            bridge.submit(true).await,
            TurnOutcome::Rejected(ChatError::EmptyInput)
        );
    }
}
