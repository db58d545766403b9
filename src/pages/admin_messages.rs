use crate::application::messaging::{self, ChatSummary};
use crate::application::{LibraryError, Result, ServiceDependencies, SessionContext};
use crate::domain::{self, Message, User, UserId, ValidationError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::lifecycle::{InFlight, PageScope, lock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminMessagesState {
    pub viewer: Option<UserId>,
    pub users: Vec<User>,
    /// 管理者が関わる全メッセージ
    pub messages: Vec<Message>,
    pub query: String,
    pub current_chat: Option<UserId>,
    /// 読み込み時点で未読だった件数（送信者ごと、チャットを開くまで保持）
    pub unread_on_load: HashMap<UserId, usize>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for AdminMessagesState {
    fn default() -> Self {
        Self {
            viewer: None,
            users: Vec::new(),
            messages: Vec::new(),
            query: String::new(),
            current_chat: None,
            unread_on_load: HashMap::new(),
            loading: true,
            error: None,
        }
    }
}

impl AdminMessagesState {
    /// チャット一覧（一般利用者、検索語で絞り込み）
    ///
    /// 受信箱を開くと既読になるため、未読件数は読み込み時点の件数を優先する。
    pub fn chats(&self) -> Vec<ChatSummary> {
        let Some(viewer) = self.viewer else {
            return Vec::new();
        };
        messaging::chat_list(&self.users, &self.messages, viewer, &self.query)
            .into_iter()
            .map(|mut chat| {
                if let Some(&count) = self.unread_on_load.get(&chat.user.id) {
                    chat.unread = chat.unread.max(count);
                }
                chat
            })
            .collect()
    }

    /// 選択中の会話（作成日時の昇順）
    pub fn conversation(&self) -> Vec<Message> {
        match (self.viewer, self.current_chat) {
            (Some(viewer), Some(partner)) => domain::conversation(&self.messages, viewer, partner),
            _ => Vec::new(),
        }
    }
}

/// 管理者のメッセージページ
pub struct AdminMessagesPage {
    deps: ServiceDependencies,
    session: Arc<SessionContext>,
    scope: PageScope,
    state: Mutex<AdminMessagesState>,
    sending: InFlight<UserId>,
}

impl AdminMessagesPage {
    pub fn new(deps: ServiceDependencies, session: Arc<SessionContext>) -> Self {
        Self {
            deps,
            session,
            scope: PageScope::new(),
            state: Mutex::new(AdminMessagesState::default()),
            sending: InFlight::new(),
        }
    }

    pub fn scope(&self) -> &PageScope {
        &self.scope
    }

    pub fn state(&self) -> AdminMessagesState {
        lock(&self.state).clone()
    }

    /// 利用者一覧と受信箱を読み込む（管理者宛ての未読は既読になる）
    pub async fn load(&self) -> Result<()> {
        let admin = self.session.require_admin()?;
        let result = async {
            let users = self.deps.users.list_users().await?;
            let (messages, unread) = messaging::open_inbox_counting_unread(&self.deps, admin.id).await?;
            Ok::<_, LibraryError>((users, messages, unread))
        }
        .await;
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        state.loading = false;
        state.viewer = Some(admin.id);
        match result {
            Ok((users, messages, unread)) => {
                state.users = users;
                state.messages = messages;
                state.unread_on_load = unread;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn set_query(&self, query: &str) {
        lock(&self.state).query = query.to_string();
    }

    /// チャットを選ぶ
    ///
    /// 相手から管理者宛ての未読を既読にし、応答でローカルのメッセージを置き換える。
    pub async fn select_chat(&self, partner: UserId) -> Result<()> {
        let admin = self.session.require_admin()?;
        lock(&self.state).current_chat = Some(partner);

        let thread = messaging::open_conversation(&self.deps, admin.id, partner).await?;
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        state.unread_on_load.remove(&partner);
        for message in thread {
            match state.messages.iter().position(|m| m.id == message.id) {
                Some(index) => state.messages[index] = message,
                None => state.messages.push(message),
            }
        }
        Ok(())
    }

    /// 選択中の利用者へ送信する
    pub async fn send(&self, content: &str) -> Result<Message> {
        let admin = self.session.require_admin()?;
        let partner = lock(&self.state)
            .current_chat
            .ok_or(ValidationError::Required("recipient"))?;
        let _guard = self.sending.begin(partner)?;

        let sent = messaging::send_message(&self.deps, admin.id, partner, content).await?;
        self.scope.ensure_mounted()?;

        lock(&self.state).messages.push(sent.clone());
        Ok(sent)
    }
}
