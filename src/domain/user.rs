use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repository::{StorageError, UserRepository};

// ============================================================================
// User Account Records
// ============================================================================
//
// Authentication and session handling live outside this crate; here a user
// is an identity that carts, orders, and reviews hang off.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("user {0} not found")]
    NotFound(i64),

    #[error("email {0} is already registered")]
    EmailDuplicate(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Register a new account. Emails are unique across users.
    pub async fn register(&self, new_user: NewUser) -> Result<User, UserError> {
        if self.users.exists_by_email(&new_user.email).await? {
            return Err(UserError::EmailDuplicate(new_user.email));
        }

        let user = self.users.insert(new_user).await?;
        tracing::info!(user_id = user.id, "user registered");
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<User, UserError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }
}
