use serde::{Deserialize, Serialize};

use crate::storage::record::RecordId;

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Admin account without its secret
#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: RecordId,
    pub username: String,
}

/// Stored credentials (hashed)
#[derive(Debug, Clone)]
pub struct Credentials {
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub admin: AdminUser,
    pub token: String,
}

/// JWT claims carried by admin tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: String,
    pub iat: usize,
    pub exp: usize,
}
