use super::HttpLibraryApi;
use crate::domain::{Message, MessageId, NewMessage, UnreadCount, UserId};
use crate::ports::{MessageApi, Result};
use async_trait::async_trait;

#[async_trait]
impl MessageApi for HttpLibraryApi {
    async fn user_messages(&self, user_id: UserId) -> Result<Vec<Message>> {
        self.get(&format!("/messages/user/{user_id}")).await
    }

    async fn send_message(&self, message: NewMessage) -> Result<Message> {
        self.post("/messages/send", &message).await
    }

    async fn mark_read(&self, message_id: MessageId) -> Result<Message> {
        self.post_empty(&format!("/messages/read/{message_id}")).await
    }

    async fn unread_messages(&self, user_id: UserId) -> Result<Vec<Message>> {
        self.get(&format!("/messages/unread/{user_id}")).await
    }

    async fn unread_count(&self, user_id: UserId) -> Result<u64> {
        let count: UnreadCount = self
            .get(&format!("/messages/unread/count/{user_id}"))
            .await?;
        Ok(count.unread_count)
    }
}
