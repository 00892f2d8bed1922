//! One session's conversation loop.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error};

use ruralaid_match::Pipeline;

use crate::types::*;

/// Reply used when a turn fails unexpectedly.
pub const APOLOGY_MESSAGE: &str =
    "I'm sorry, something went wrong while looking that up. Please try again.";

/// Boxed reply future.
pub type ReplyFuture = Pin<Box<dyn Future<Output = String> + Send + 'static>>;

/// Produces the assistant's reply for a user message.
pub trait Responder: Send + Sync + 'static {
    fn respond(&self, query: String) -> ReplyFuture;
}

impl Responder for Pipeline {
    fn respond(&self, query: String) -> ReplyFuture {
        let pipeline = self.clone();
        Box::pin(async move { pipeline.answer(&query).await })
    }
}

/// Clears the in-flight flag when a turn ends, however it ends.
struct TurnGuard(Arc<AtomicBool>);

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Message log plus a single-turn-at-a-time gate.
pub struct Conversation {
    session_id: String,
    responder: Arc<dyn Responder>,
    messages: Arc<RwLock<Vec<ChatMessage>>>,
    in_flight: Arc<AtomicBool>,
}

impl Conversation {
    /// New conversation with a generated session id.
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self::with_session_id(uuid::Uuid::new_v4().to_string(), responder)
    }

    pub fn with_session_id(session_id: impl Into<String>, responder: Arc<dyn Responder>) -> Self {
        Self {
            session_id: session_id.into(),
            responder,
            messages: Arc::new(RwLock::new(Vec::new())),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether a turn is currently running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Snapshot of the message log.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.read().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    /// Run one turn: append the user message, compute the reply, append it.
    ///
    /// Returns [`TurnOutcome::Busy`] without touching the log if a previous
    /// turn has not finished. A failed turn is answered with
    /// [`APOLOGY_MESSAGE`] and leaves the conversation ready for the next one.
    ///
    /// The turn runs on its own task. Dropping the returned future does not
    /// cancel it: the session stays busy until the reply is appended.
    pub async fn submit(&self, text: &str, attachment: Option<Attachment>) -> TurnOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(session = %self.session_id, "turn rejected, previous turn in flight");
            return TurnOutcome::Busy;
        }
        let guard = TurnGuard(self.in_flight.clone());

        self.messages
            .write()
            .push(ChatMessage::user(text, attachment));

        let turn = tokio::spawn(run_turn(
            guard,
            self.session_id.clone(),
            self.responder.clone(),
            self.messages.clone(),
            text.to_string(),
        ));

        match turn.await {
            Ok(message) => TurnOutcome::Replied(message),
            Err(e) => {
                error!(session = %self.session_id, "Turn task failed: {}", e);
                TurnOutcome::Replied(ChatMessage::assistant(APOLOGY_MESSAGE))
            }
        }
    }

    /// Attach feedback to an assistant message. Returns false if no assistant
    /// message has that id.
    pub fn set_feedback(&self, message_id: &str, feedback: Feedback) -> bool {
        let mut messages = self.messages.write();
        match messages
            .iter_mut()
            .find(|m| m.id == message_id && m.role == Role::Assistant)
        {
            Some(message) => {
                message.feedback = Some(feedback);
                true
            }
            None => false,
        }
    }
}

/// Body of one turn. Owns the in-flight guard, so the gate stays closed
/// until the assistant message is in the log.
async fn run_turn(
    _guard: TurnGuard,
    session_id: String,
    responder: Arc<dyn Responder>,
    messages: Arc<RwLock<Vec<ChatMessage>>>,
    query: String,
) -> ChatMessage {
    let reply = match tokio::spawn(responder.respond(query)).await {
        Ok(reply) => reply,
        Err(e) => {
            error!(session = %session_id, "Turn failed: {}", e);
            APOLOGY_MESSAGE.to_string()
        }
    };

    let message = ChatMessage::assistant(reply);
    messages.write().push(message.clone());
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruralaid_match::{Vocabulary, OFF_TOPIC_MESSAGE};
    use ruralaid_store::{Program, SqliteCatalog};
    use tokio::sync::Notify;

    /// Replies only after being released.
    struct GatedResponder(Arc<Notify>);

    impl Responder for GatedResponder {
        fn respond(&self, query: String) -> ReplyFuture {
            let gate = self.0.clone();
            Box::pin(async move {
                gate.notified().await;
                format!("echo: {}", query)
            })
        }
    }

    /// Panics on the first call, echoes afterwards.
    struct FlakyResponder(AtomicBool);

    impl Responder for FlakyResponder {
        fn respond(&self, query: String) -> ReplyFuture {
            let fail = !self.0.swap(true, Ordering::SeqCst);
            Box::pin(async move {
                if fail {
                    panic!("boom");
                }
                format!("echo: {}", query)
            })
        }
    }

    fn pipeline_conversation() -> Conversation {
        let catalog = SqliteCatalog::open_in_memory().unwrap();
        catalog
            .add_program(&Program::new("Direct Home Loan", "Housing"))
            .unwrap();
        let pipeline = Pipeline::new(Vocabulary::default(), Arc::new(catalog));
        Conversation::new(Arc::new(pipeline))
    }

    #[tokio::test]
    async fn test_turn_appends_user_and_assistant() {
        let conversation = pipeline_conversation();

        let outcome = conversation.submit("Tell me about housing programs", None).await;
        let reply = match outcome {
            TurnOutcome::Replied(m) => m,
            TurnOutcome::Busy => panic!("conversation should be idle"),
        };
        assert!(reply.content.contains("• Direct Home Loan"));

        let messages = conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Tell me about housing programs");
        assert_eq!(messages[1], reply);
        assert!(!conversation.is_busy());
    }

    #[tokio::test]
    async fn test_off_topic_turn() {
        let conversation = pipeline_conversation();
        match conversation.submit("what's the weather today", None).await {
            TurnOutcome::Replied(m) => assert_eq!(m.content, OFF_TOPIC_MESSAGE),
            TurnOutcome::Busy => panic!("conversation should be idle"),
        }
    }

    #[tokio::test]
    async fn test_second_submit_rejected_while_busy() {
        let gate = Arc::new(Notify::new());
        let conversation = Arc::new(Conversation::new(Arc::new(GatedResponder(gate.clone()))));

        let first = {
            let conversation = conversation.clone();
            tokio::spawn(async move { conversation.submit("first", None).await })
        };

        while !conversation.is_busy() {
            tokio::task::yield_now().await;
        }

        assert_eq!(conversation.submit("second", None).await, TurnOutcome::Busy);
        assert_eq!(conversation.len(), 1);

        gate.notify_one();
        match first.await.unwrap() {
            TurnOutcome::Replied(m) => assert_eq!(m.content, "echo: first"),
            TurnOutcome::Busy => panic!("first turn should run"),
        }
        assert_eq!(conversation.len(), 2);
        assert!(!conversation.is_busy());
    }

    #[tokio::test]
    async fn test_dropped_caller_keeps_turn_running() {
        let gate = Arc::new(Notify::new());
        let conversation = Conversation::new(Arc::new(GatedResponder(gate.clone())));

        let dropped = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            conversation.submit("rural loans", None),
        )
        .await;
        assert!(dropped.is_err());

        assert!(conversation.is_busy());
        assert_eq!(conversation.submit("second", None).await, TurnOutcome::Busy);
        assert_eq!(conversation.len(), 1);

        gate.notify_one();
        while conversation.is_busy() {
            tokio::task::yield_now().await;
        }

        let messages = conversation.messages();
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(messages[1].content, "echo: rural loans");
    }

    #[tokio::test]
    async fn test_failed_turn_apologizes_and_recovers() {
        let conversation = Conversation::new(Arc::new(FlakyResponder(AtomicBool::new(false))));

        match conversation.submit("rural loans", None).await {
            TurnOutcome::Replied(m) => assert_eq!(m.content, APOLOGY_MESSAGE),
            TurnOutcome::Busy => panic!("conversation should be idle"),
        }
        assert!(!conversation.is_busy());

        match conversation.submit("rural loans", None).await {
            TurnOutcome::Replied(m) => assert_eq!(m.content, "echo: rural loans"),
            TurnOutcome::Busy => panic!("conversation should be idle"),
        }
        assert_eq!(conversation.len(), 4);
    }

    #[tokio::test]
    async fn test_feedback_only_on_assistant_messages() {
        let conversation = pipeline_conversation();
        conversation.submit("housing", None).await;
        let messages = conversation.messages();

        assert!(!conversation.set_feedback(&messages[0].id, Feedback::Positive));
        assert!(conversation.set_feedback(&messages[1].id, Feedback::Negative));
        assert!(!conversation.set_feedback("no-such-id", Feedback::Positive));

        let messages = conversation.messages();
        assert_eq!(messages[0].feedback, None);
        assert_eq!(messages[1].feedback, Some(Feedback::Negative));
    }

    #[tokio::test]
    async fn test_attachment_metadata_is_kept() {
        let conversation = pipeline_conversation();
        let attachment = Attachment {
            name: "plan.docx".into(),
            size: 10,
            mime_type: None,
        };
        conversation
            .submit("business plan review", Some(attachment.clone()))
            .await;
        assert_eq!(conversation.messages()[0].attachment, Some(attachment));
    }
}
