use async_trait::async_trait;

use super::domain::{AdminUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for admin account persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<(AdminUser, Credentials)>, AuthError>;
    async fn create_admin(&self, username: &str, credentials: Credentials) -> Result<AdminUser, AuthError>;
    async fn count_admins(&self) -> Result<usize, AuthError>;
}
