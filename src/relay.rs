//! One HTTP request in, one completion call out.

use crate::agent::CompletionServiceFactory;
use crate::error::RelayError;
use crate::models::chat::{ Continuation, RelayRequest, RelayResponse };
use log::{ debug, error, warn };

/// Both identifiers present and non-empty continue a conversation; anything
/// less starts a new one.
pub fn resolve_continuation(request: &RelayRequest) -> Option<Continuation> {
    let has_conversation = !request.conversation_id.is_empty();
    let has_parent = !request.parent_message_id.is_empty();
    match (has_conversation, has_parent) {
        (true, true) =>
            Some(Continuation {
                conversation_id: request.conversation_id.clone(),
                parent_message_id: request.parent_message_id.clone(),
            }),
        (false, false) => None,
        _ => {
            warn!(
                "Partial continuation (conversationId={:?}, parentMessageId={:?}) discarded, starting a new conversation",
                request.conversation_id,
                request.parent_message_id
            );
            None
        }
    }
}

pub async fn relay(
    factory: &dyn CompletionServiceFactory,
    request: RelayRequest,
    empty_message_reply: &str
) -> Result<RelayResponse, RelayError> {
    if request.message.is_empty() {
        return Ok(RelayResponse::prompt(empty_message_reply));
    }

    let continuation = resolve_continuation(&request);
    debug!(
        "Relaying message ({} chars), mode={}",
        request.message.chars().count(),
        if continuation.is_some() { "continue" } else { "new" }
    );

    let service = factory.connect().await.map_err(|e| {
        error!("Failed to set up completion service: {}", e);
        e
    })?;
    let reply = service.send_message(&request.message, continuation).await.map_err(|e| {
        error!("Completion request failed: {}", e);
        e
    })?;

    Ok(RelayResponse::reply(reply.text, reply.conversation_id, reply.id))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::agent::CompletionService;
    use crate::models::chat::CompletionReply;
    use async_trait::async_trait;
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use std::sync::{ Arc, Mutex };

    /// Records every call and replies with fixed identifiers.
    #[derive(Default)]
    pub(crate) struct RecordingService {
        pub calls: Mutex<Vec<(String, Option<Continuation>)>>,
        pub fail: bool,
    }

    #[async_trait]
    impl CompletionService for RecordingService {
        async fn send_message(
            &self,
            text: &str,
            continuation: Option<Continuation>
        ) -> Result<CompletionReply, RelayError> {
            self.calls.lock().unwrap().push((text.to_string(), continuation.clone()));
            if self.fail {
                return Err(RelayError::Completion("upstream exploded".into()));
            }
            Ok(CompletionReply {
                text: format!("echo: {}", text),
                id: "m-next".into(),
                conversation_id: continuation.map(|c| c.conversation_id).unwrap_or_else(|| "c-new".into()),
            })
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingFactory {
        pub service: Arc<RecordingService>,
        pub connects: AtomicUsize,
    }

    impl RecordingFactory {
        pub fn failing() -> Self {
            Self {
                service: Arc::new(RecordingService { fail: true, ..Default::default() }),
                connects: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> Vec<(String, Option<Continuation>)> {
            self.service.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionServiceFactory for RecordingFactory {
        async fn connect(&self) -> Result<Arc<dyn CompletionService>, RelayError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(self.service.clone())
        }
    }

    fn request(message: &str, conversation_id: &str, parent_message_id: &str) -> RelayRequest {
        RelayRequest {
            message: message.into(),
            conversation_id: conversation_id.into(),
            parent_message_id: parent_message_id.into(),
        }
    }

    #[tokio::test]
    async fn empty_message_never_reaches_the_service() {
        let factory = RecordingFactory::default();
        for (c, p) in [("", ""), ("c1", ""), ("", "m1"), ("c1", "m1")] {
            let resp = relay(&factory, request("", c, p), "Please type something").await.unwrap();
            assert_eq!(resp, RelayResponse::prompt("Please type something"));
        }
        assert_eq!(factory.connects.load(Ordering::SeqCst), 0);
        assert!(factory.calls().is_empty());
    }

    #[tokio::test]
    async fn whitespace_message_is_relayed() {
        let factory = RecordingFactory::default();
        relay(&factory, request("  ", "", ""), "prompt").await.unwrap();
        assert_eq!(factory.calls(), vec![("  ".to_string(), None)]);
    }

    #[tokio::test]
    async fn both_identifiers_continue_the_conversation() {
        let factory = RecordingFactory::default();
        let resp = relay(&factory, request("again", "c1", "m1"), "prompt").await.unwrap();

        assert_eq!(factory.calls(), vec![(
            "again".to_string(),
            Some(Continuation { conversation_id: "c1".into(), parent_message_id: "m1".into() }),
        )]);
        assert_eq!(resp, RelayResponse::reply("echo: again".into(), "c1".into(), "m-next".into()));
    }

    #[tokio::test]
    async fn partial_identifiers_start_a_new_conversation() {
        let factory = RecordingFactory::default();
        relay(&factory, request("a", "c1", ""), "prompt").await.unwrap();
        relay(&factory, request("b", "", "m1"), "prompt").await.unwrap();
        relay(&factory, request("c", "", ""), "prompt").await.unwrap();

        let calls = factory.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(_, continuation)| continuation.is_none()));
    }

    #[tokio::test]
    async fn every_call_connects_afresh() {
        let factory = RecordingFactory::default();
        relay(&factory, request("a", "", ""), "prompt").await.unwrap();
        relay(&factory, request("b", "", ""), "prompt").await.unwrap();
        assert_eq!(factory.connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn service_errors_propagate() {
        let factory = RecordingFactory::failing();
        let err = relay(&factory, request("a", "", ""), "prompt").await.unwrap_err();
        assert_eq!(err.code(), "completion_failed");
    }
}
