use async_trait::async_trait;
use crate::history::MessageStore;
use crate::models::message::StoredMessage;
use std::collections::HashMap;
use std::error::Error;
use std::time::{ Duration, Instant };
use tokio::sync::RwLock;

struct Entry {
    message: StoredMessage,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Expired entries read as missing and are dropped on the next `put`.
#[derive(Default)]
pub struct MemoryMessageStore {
    messages: RwLock<HashMap<String, Entry>>,
    ttl: Option<Duration>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero `ttl` keeps messages forever.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            messages: RwLock::default(),
            ttl: Some(ttl).filter(|t| !t.is_zero()),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn get(
        &self,
        message_id: &str
    ) -> Result<Option<StoredMessage>, Box<dyn Error + Send + Sync>> {
        let now = Instant::now();
        Ok(
            self.messages
                .read().await
                .get(message_id)
                .filter(|entry| entry.is_live(now))
                .map(|entry| entry.message.clone())
        )
    }

    async fn put(
        &self,
        message: &StoredMessage
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let now = Instant::now();
        let mut messages = self.messages.write().await;
        messages.retain(|_, entry| entry.is_live(now));
        messages.insert(message.id.clone(), Entry {
            message: message.clone(),
            expires_at: self.ttl.map(|ttl| now + ttl),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Role;

    #[tokio::test]
    async fn put_overwrites_by_id() {
        let store = MemoryMessageStore::new();
        let mut msg = StoredMessage {
            id: "m1".into(),
            role: Role::Assistant,
            text: "first".into(),
            conversation_id: "c1".into(),
            parent_message_id: Some("u1".into()),
            timestamp: 0,
        };
        store.put(&msg).await.unwrap();
        msg.text = "second".into();
        store.put(&msg).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("m1").await.unwrap().unwrap().text, "second");
        assert!(store.get("missing").await.unwrap().is_none());
    }

    fn message(id: &str) -> StoredMessage {
        StoredMessage {
            id: id.into(),
            role: Role::User,
            text: "hello".into(),
            conversation_id: "c1".into(),
            parent_message_id: None,
            timestamp: 0,
        }
    }

    #[tokio::test]
    async fn expired_messages_read_as_missing_and_are_pruned() {
        let store = MemoryMessageStore::with_ttl(Duration::from_millis(50));
        store.put(&message("m1")).await.unwrap();
        assert!(store.get("m1").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(store.get("m1").await.unwrap().is_none());

        store.put(&message("m2")).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert!(store.get("m2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn zero_ttl_keeps_messages() {
        let store = MemoryMessageStore::with_ttl(Duration::ZERO);
        store.put(&message("m1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.get("m1").await.unwrap().is_some());
    }
}
