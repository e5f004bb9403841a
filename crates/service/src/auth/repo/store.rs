use std::sync::Arc;

use serde_json::{json, Value};

use crate::auth::domain::{AdminUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;
use crate::storage::record::{Record, RecordId, Table};
use crate::storage::store::RecordStore;

/// `AuthRepository` over the `admins` table of any `RecordStore`.
pub struct StoreAuthRepository {
    pub store: Arc<dyn RecordStore>,
}

impl StoreAuthRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self { Self { store } }
}

fn str_field<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

fn to_admin(record: &Record) -> Option<(AdminUser, Credentials)> {
    let id = RecordId::of(record)?;
    let username = str_field(record, "username")?.to_string();
    let credentials = Credentials {
        password_hash: str_field(record, "password_hash")?.to_string(),
        password_algorithm: str_field(record, "password_algorithm").unwrap_or("argon2").to_string(),
    };
    Some((AdminUser { id, username }, credentials))
}

#[async_trait::async_trait]
impl AuthRepository for StoreAuthRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<(AdminUser, Credentials)>, AuthError> {
        let rows = self.store.read(Table::Admins).await;
        Ok(rows
            .iter()
            .filter(|r| str_field(r, "username") == Some(username))
            .find_map(to_admin))
    }

    async fn create_admin(&self, username: &str, credentials: Credentials) -> Result<AdminUser, AuthError> {
        let mut record = Record::new();
        record.insert("username".into(), json!(username));
        record.insert("password_hash".into(), json!(credentials.password_hash));
        record.insert("password_algorithm".into(), json!(credentials.password_algorithm));
        let stored = self
            .store
            .insert(Table::Admins, &record)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        to_admin(&stored)
            .map(|(admin, _)| admin)
            .ok_or_else(|| AuthError::Repository("stored admin is missing fields".into()))
    }

    async fn count_admins(&self) -> Result<usize, AuthError> {
        Ok(self.store.read(Table::Admins).await.len())
    }
}
