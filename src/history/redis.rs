use async_trait::async_trait;
use crate::history::{ message_key, MessageStore };
use crate::models::message::StoredMessage;
use std::error::Error;
use log::error;
use redis::{ Client, AsyncCommands };
use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;

pub struct RedisMessageStore {
    conn: Mutex<MultiplexedConnection>,
    namespace: String,
    ttl: u64,
}

impl RedisMessageStore {
    pub async fn connect(
        url: &str,
        namespace: &str,
        ttl: u64
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let client = Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            conn: Mutex::new(conn),
            namespace: namespace.to_string(),
            ttl,
        })
    }
}

/// Undecodable records are logged and read as missing, ending the chain.
fn decode_message(key: &str, json: &str) -> Option<StoredMessage> {
    match serde_json::from_str::<StoredMessage>(json) {
        Ok(msg) => Some(msg),
        Err(e) => {
            error!("Error parsing stored message {}: {}", key, e);
            None
        }
    }
}

#[async_trait]
impl MessageStore for RedisMessageStore {
    async fn get(
        &self,
        message_id: &str
    ) -> Result<Option<StoredMessage>, Box<dyn Error + Send + Sync>> {
        let key = message_key(&self.namespace, message_id);
        let raw: Option<String> = self.conn.lock().await.get(&key).await?;

        Ok(raw.and_then(|json| decode_message(&key, &json)))
    }

    async fn put(
        &self,
        message: &StoredMessage
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let key = message_key(&self.namespace, &message.id);
        let json = serde_json::to_string(message)?;
        let mut guard = self.conn.lock().await;
        if self.ttl > 0 {
            guard.set_ex::<_, _, ()>(&key, json, self.ttl).await?;
        } else {
            guard.set::<_, _, ()>(&key, json).await?;
        }
        Ok(())
    }
}
