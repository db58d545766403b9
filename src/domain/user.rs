use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::timestamp;
use super::{UserId, ValidationError};

/// 利用者の役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// 利用者
///
/// 役割はログイン時に確定し、クライアントが変更することはない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// ユーザー名またはメールアドレスの部分一致（大文字小文字を区別しない）
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.username.to_lowercase().contains(&query) || self.email.to_lowercase().contains(&query)
    }
}

/// 利用者の部分更新（PUT /users/{id} のボディ）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// ログイン資格情報
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::Required("email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::Required("password"));
        }
        Ok(())
    }
}

/// 新規登録
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

impl Registration {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::Required("username"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::Required("email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::Required("password"));
        }
        Ok(())
    }
}

/// 認証結果（POST /login, POST /register の応答）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "2",
            "username": "admin1",
            "email": "admin1@example.com",
            "role": "admin",
            "createdAt": "2024-01-01T00:00:00"
        }))
        .unwrap();
        assert!(user.is_admin());
        assert_eq!(user.id, UserId::new(2));
    }

    #[test]
    fn test_user_matches_username_or_email() {
        let user = User {
            id: UserId::new(1),
            username: "user1".to_string(),
            email: "Reader@Example.com".to_string(),
            role: Role::User,
            created_at: None,
        };
        assert!(user.matches("USER"));
        assert!(user.matches("reader@"));
        assert!(!user.matches("admin"));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials {
            email: "user1@example.com".to_string(),
            password: "secret".to_string(),
        };
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
