//! Redis publisher forwarding domain events to the notification service

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use crate::{
    error::{AppError, AppResult},
    models::event::EventEnvelope,
};

use super::events::EventPublisher;

#[derive(Clone)]
pub struct RedisPublisher {
    connection: ConnectionManager,
    channel: String,
}

impl RedisPublisher {
    /// Connect and check the server answers before accepting events
    pub async fn connect(url: &str, channel: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut connection = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut connection)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self {
            connection,
            channel: channel.to_string(),
        })
    }
}

#[async_trait]
impl EventPublisher for RedisPublisher {
    async fn publish(&self, event: &EventEnvelope) -> AppResult<()> {
        let payload = serde_json::to_string(event)
            .map_err(|e| AppError::Internal(format!("Failed to encode event: {}", e)))?;

        let mut connection = self.connection.clone();
        connection
            .publish::<_, _, ()>(&self.channel, payload)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to publish event to Redis: {}", e)))?;

        Ok(())
    }
}
