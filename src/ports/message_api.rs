use crate::domain::{Message, MessageId, NewMessage, UserId};
use async_trait::async_trait;

use super::Result;

/// メッセージAPIポート（/messages）
#[async_trait]
pub trait MessageApi: Send + Sync {
    /// 利用者が送信または受信したメッセージ
    async fn user_messages(&self, user_id: UserId) -> Result<Vec<Message>>;

    /// メッセージを送る（未読で作成される）
    async fn send_message(&self, message: NewMessage) -> Result<Message>;

    /// 既読にする（冪等）
    async fn mark_read(&self, message_id: MessageId) -> Result<Message>;

    /// 利用者宛ての未読メッセージ
    async fn unread_messages(&self, user_id: UserId) -> Result<Vec<Message>>;

    /// 利用者宛ての未読件数
    async fn unread_count(&self, user_id: UserId) -> Result<u64>;
}
