use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::timestamp;
use super::{MessageId, UserId, ValidationError};

/// メッセージ
///
/// 既読フラグの false → true 遷移のみ許される。削除・編集はない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub read: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// 既読にする（冪等）
    pub fn mark_read(self) -> Self {
        Self { read: true, ..self }
    }

    /// `viewer` 宛ての未読か
    pub fn is_unread_for(&self, viewer: UserId) -> bool {
        self.receiver_id == viewer && !self.read
    }

    /// 2者間の会話に属するか（方向は問わない）
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }

    pub fn involves(&self, user_id: UserId) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }
}

/// 送信メッセージ（POST /messages/send のボディ）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
}

impl NewMessage {
    /// 空白のみの本文は送信しない
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.content.trim().is_empty() {
            return Err(ValidationError::Required("content"));
        }
        Ok(())
    }
}

/// 未読件数（GET /messages/unread/count/{id} の応答）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub unread_count: u64,
}

/// 2者間の会話を作成日時の昇順で取り出す
pub fn conversation(messages: &[Message], a: UserId, b: UserId) -> Vec<Message> {
    let mut thread: Vec<Message> = messages
        .iter()
        .filter(|m| m.is_between(a, b))
        .cloned()
        .collect();
    thread.sort_by_key(|m| (m.created_at, m.id));
    thread
}

/// `viewer` 宛ての未読件数
pub fn unread_count(messages: &[Message], viewer: UserId) -> usize {
    messages.iter().filter(|m| m.is_unread_for(viewer)).count()
}

/// `partner` から `viewer` 宛ての未読件数
pub fn unread_from(messages: &[Message], viewer: UserId, partner: UserId) -> usize {
    messages
        .iter()
        .filter(|m| m.is_unread_for(viewer) && m.sender_id == partner)
        .count()
}
