mod memory;
mod redis;

pub use self::memory::MemoryMessageStore;
pub use self::redis::RedisMessageStore;

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use crate::cli::Args;
use crate::models::message::StoredMessage;

/// Key-value store holding the links of every message chain.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn get(
        &self,
        message_id: &str
    ) -> Result<Option<StoredMessage>, Box<dyn Error + Send + Sync>>;

    async fn put(
        &self,
        message: &StoredMessage
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Where message chains live. `open` is called once per relay request.
#[derive(Clone)]
pub enum StoreBackend {
    Redis {
        url: String,
        namespace: String,
        ttl: u64,
    },
    Memory(Arc<MemoryMessageStore>),
}

impl StoreBackend {
    pub fn from_args(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        match args.history_type.to_lowercase().as_str() {
            "redis" =>
                Ok(StoreBackend::Redis {
                    url: args.redis_url.clone(),
                    namespace: args.history_namespace.clone(),
                    ttl: args.history_ttl,
                }),
            "memory" => {
                let ttl = Duration::from_secs(args.history_ttl);
                Ok(StoreBackend::Memory(Arc::new(MemoryMessageStore::with_ttl(ttl))))
            }
            _ =>
                Err(
                    Box::new(
                        std::io::Error::new(
                            std::io::ErrorKind::InvalidInput,
                            format!("Unsupported history store type: {}", args.history_type)
                        )
                    )
                ),
        }
    }

    pub async fn open(&self) -> Result<Arc<dyn MessageStore>, Box<dyn Error + Send + Sync>> {
        match self {
            StoreBackend::Redis { url, namespace, ttl } => {
                let store = RedisMessageStore::connect(url, namespace, *ttl).await?;
                Ok(Arc::new(store))
            }
            StoreBackend::Memory(store) => Ok(store.clone()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            StoreBackend::Redis { namespace, ttl, .. } =>
                format!("redis (namespace '{}', ttl {}s)", namespace, ttl),
            StoreBackend::Memory(store) =>
                match store.ttl() {
                    Some(ttl) => format!("memory (ttl {}s)", ttl.as_secs()),
                    None => "memory".to_string(),
                },
        }
    }
}

pub fn initialize_store_backend(
    args: &Args
) -> Result<StoreBackend, Box<dyn Error + Send + Sync>> {
    let backend = StoreBackend::from_args(args)?;
    info!("Message chains will be stored in: {}", backend.describe());
    Ok(backend)
}

/// Key under which a message is stored, `<namespace>:<id>`.
pub fn message_key(namespace: &str, message_id: &str) -> String {
    format!("{}:{}", namespace, message_id)
}
