use crate::domain::{self, Message, NewMessage, User, UserId};
use futures::future::join_all;
use std::collections::HashMap;
use tracing::{info, warn};

use super::deps::ServiceDependencies;
use super::errors::{LibraryError, Result};

/// 受信箱を開く
///
/// 閲覧者宛ての未読メッセージをすべて既読にする（閲覧の副作用）。
/// 既読化のリクエストは並行に発行し、サーバーの応答でローカルのメッセージを置き換える。
/// 既読化に失敗したメッセージは未読のまま残す。
pub async fn open_inbox(deps: &ServiceDependencies, viewer: UserId) -> Result<Vec<Message>> {
    let (messages, _) = open_inbox_counting_unread(deps, viewer).await?;
    Ok(messages)
}

/// 受信箱を開き、既読にする前の送信者ごとの未読件数もあわせて返す
pub async fn open_inbox_counting_unread(
    deps: &ServiceDependencies,
    viewer: UserId,
) -> Result<(Vec<Message>, HashMap<UserId, usize>)> {
    let messages = deps.messages.user_messages(viewer).await?;
    let mut unread: HashMap<UserId, usize> = HashMap::new();
    for message in messages.iter().filter(|m| m.is_unread_for(viewer)) {
        *unread.entry(message.sender_id).or_default() += 1;
    }
    let messages = mark_read_where(deps, messages, |m| m.is_unread_for(viewer)).await;
    Ok((messages, unread))
}

/// 2者間の会話を開く
///
/// 相手から閲覧者宛ての未読メッセージを既読にし、作成日時の昇順で返す。
pub async fn open_conversation(
    deps: &ServiceDependencies,
    viewer: UserId,
    partner: UserId,
) -> Result<Vec<Message>> {
    let messages = deps.messages.user_messages(viewer).await?;
    let messages = mark_read_where(deps, messages, |m| {
        m.is_unread_for(viewer) && m.sender_id == partner
    })
    .await;
    Ok(domain::conversation(&messages, viewer, partner))
}

async fn mark_read_where(
    deps: &ServiceDependencies,
    messages: Vec<Message>,
    pred: impl Fn(&Message) -> bool,
) -> Vec<Message> {
    let pending: Vec<_> = messages
        .iter()
        .filter(|m| pred(m))
        .map(|m| deps.messages.mark_read(m.id))
        .collect();
    if pending.is_empty() {
        return messages;
    }

    let mut updated: Vec<Message> = Vec::new();
    for result in join_all(pending).await {
        match result {
            Ok(message) => updated.push(message),
            Err(e) => warn!(error = %e, "failed to mark message as read"),
        }
    }

    messages
        .into_iter()
        .map(|m| match updated.iter().find(|u| u.id == m.id) {
            Some(u) => u.clone(),
            None => m,
        })
        .collect()
}

/// メッセージを送る
///
/// 空白のみの本文はリクエストせずに拒否する。
pub async fn send_message(
    deps: &ServiceDependencies,
    sender: UserId,
    receiver: UserId,
    content: &str,
) -> Result<Message> {
    let message = NewMessage {
        sender_id: sender,
        receiver_id: receiver,
        content: content.trim().to_string(),
    };
    message.validate()?;

    let sent = deps.messages.send_message(message).await?;
    info!(message_id = %sent.id, %sender, %receiver, "message sent");
    Ok(sent)
}

/// 閲覧者宛ての未読件数
pub async fn unread_count(deps: &ServiceDependencies, viewer: UserId) -> Result<u64> {
    Ok(deps.messages.unread_count(viewer).await?)
}

/// 一般利用者の問い合わせ先となる管理者（最初に見つかった管理者）
pub async fn find_administrator(deps: &ServiceDependencies) -> Result<User> {
    deps.users
        .list_users()
        .await?
        .into_iter()
        .find(User::is_admin)
        .ok_or(LibraryError::NoAdministrator)
}

/// 管理者のチャット一覧の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    pub user: User,
    /// この利用者から管理者宛ての未読件数
    pub unread: usize,
}

/// 管理者のチャット一覧
///
/// 一般利用者のみを対象とし、ユーザー名・メールアドレスで絞り込む。
pub fn chat_list(users: &[User], messages: &[Message], viewer: UserId, query: &str) -> Vec<ChatSummary> {
    let query = query.trim();
    users
        .iter()
        .filter(|u| !u.is_admin())
        .filter(|u| query.is_empty() || u.matches(query))
        .map(|u| ChatSummary {
            user: u.clone(),
            unread: domain::unread_from(messages, viewer, u.id),
        })
        .collect()
}
