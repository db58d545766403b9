use crate::application::{LibraryError, Result, ServiceDependencies, SessionContext, messaging};
use crate::domain::{Message, User};
use std::sync::{Arc, Mutex};

use super::lifecycle::{InFlight, PageScope, lock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessagesState {
    /// 問い合わせ先の管理者
    pub admin: Option<User>,
    /// 作成日時の昇順
    pub messages: Vec<Message>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for UserMessagesState {
    fn default() -> Self {
        Self {
            admin: None,
            messages: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

/// 利用者のメッセージページ（管理者との会話）
///
/// 開いた時点で自分宛ての未読メッセージはすべて既読になる。
pub struct UserMessagesPage {
    deps: ServiceDependencies,
    session: Arc<SessionContext>,
    scope: PageScope,
    state: Mutex<UserMessagesState>,
    sending: InFlight<&'static str>,
}

impl UserMessagesPage {
    pub fn new(deps: ServiceDependencies, session: Arc<SessionContext>) -> Self {
        Self {
            deps,
            session,
            scope: PageScope::new(),
            state: Mutex::new(UserMessagesState::default()),
            sending: InFlight::new(),
        }
    }

    pub fn scope(&self) -> &PageScope {
        &self.scope
    }

    pub fn state(&self) -> UserMessagesState {
        lock(&self.state).clone()
    }

    pub fn is_sending(&self) -> bool {
        self.sending.is_pending(&"send")
    }

    pub async fn load(&self) -> Result<()> {
        let user = self.session.current_user()?;
        let result = async {
            let admin = messaging::find_administrator(&self.deps).await?;
            let messages = messaging::open_inbox(&self.deps, user.id).await?;
            Ok::<_, LibraryError>((admin, messages))
        }
        .await;
        self.scope.ensure_mounted()?;

        let mut state = lock(&self.state);
        state.loading = false;
        match result {
            Ok((admin, mut messages)) => {
                messages.sort_by_key(|m| (m.created_at, m.id));
                state.admin = Some(admin);
                state.messages = messages;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// 管理者へ送信し、応答のメッセージを末尾に加える
    pub async fn send(&self, content: &str) -> Result<Message> {
        let _guard = self.sending.begin("send")?;
        let user = self.session.current_user()?;
        let admin = lock(&self.state)
            .admin
            .clone()
            .ok_or(LibraryError::NoAdministrator)?;

        let sent = messaging::send_message(&self.deps, user.id, admin.id, content).await?;
        self.scope.ensure_mounted()?;

        lock(&self.state).messages.push(sent.clone());
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::InMemoryLibrary;
    use crate::domain::{Credentials, NewMessage, UserId};
    use chrono::Utc;

    #[tokio::test]
    async fn test_open_marks_read_and_send_appends() {
        // Arrange
        let library = Arc::new(InMemoryLibrary::with_sample_data());
        let deps = ServiceDependencies::from_backend(library.clone());
        let reply = library.insert_message(
            NewMessage {
                sender_id: UserId::new(2),
                receiver_id: UserId::new(1),
                content: "Your book is ready".to_string(),
            },
            Utc::now(),
        );
        let session = Arc::new(SessionContext::new(deps.auth.clone()));
        session
            .login(Credentials {
                email: "user1@example.com".to_string(),
                password: "password".to_string(),
            })
            .await
            .unwrap();
        let page = UserMessagesPage::new(deps, session);

        // Act
        page.load().await.unwrap();
        page.send("Thanks!").await.unwrap();

        // Assert
        let state = page.state();
        assert_eq!(state.admin.unwrap().username, "admin1");
        assert_eq!(state.messages.len(), 2);
        assert!(state.messages[0].read);
        assert_eq!(state.messages[1].content, "Thanks!");
        assert!(!state.messages[1].read);
        assert!(library.message_snapshot(reply.id).unwrap().read);
        assert!(!page.is_sending());
    }
}
