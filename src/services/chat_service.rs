use crate::error::Result;
use sea_orm::{entity::*, DatabaseConnection};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

pub struct ChatService {
    db: DatabaseConnection,
}

impl ChatService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Deliver a settled tip's message into the conversation, flagged
    /// with the tipped amount.
    #[instrument(skip(self, body))]
    pub async fn append_tip_message(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        body: &str,
        tip_amount: i64,
    ) -> Result<entity::chat_messages::Model> {
        let message = entity::chat_messages::ActiveModel {
            id: Set(Uuid::new_v4()),
            sender_id: Set(sender_id),
            recipient_id: Set(recipient_id),
            body: Set(body.to_string()),
            is_tip: Set(true),
            tip_amount: Set(Some(tip_amount)),
            sent_at: Set(OffsetDateTime::now_utc()),
        };

        let model = message.insert(&self.db).await?;

        info!(
            "Appended tip message from {} to {} (amount {})",
            sender_id, recipient_id, tip_amount
        );

        Ok(model)
    }
}
