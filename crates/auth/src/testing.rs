//! In-memory collaborators for the auth tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use peeth_core::auth::{self, OtpSender};
use peeth_core::error::{ServiceError, ServiceResult};
use peeth_core::storage::{
    apply_actions, BatchWriteOp, Filter, Page, QueryOptions, Record, RecordKey, RepositoryError,
    Result, Storage, UpdateOptions,
};
use peeth_core::users::{Role, User, UserRepository};

/// Keyed operations only; queries return nothing.
#[derive(Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<RecordKey, Record>>,
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>> {
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, mut record: Record) -> Result<Record> {
        record.stamp(Utc::now());
        self.records
            .lock()
            .unwrap()
            .insert(record.key(), record.clone());
        Ok(record)
    }

    async fn delete(&self, key: &RecordKey) -> Result<()> {
        self.records.lock().unwrap().remove(key);
        Ok(())
    }

    async fn query(&self, _entity_type: &str, _options: QueryOptions) -> Result<Page> {
        Ok(Page::default())
    }

    async fn scan(&self, _entity_type: &str, _filter: Option<Filter>) -> Result<Vec<Record>> {
        Ok(Vec::new())
    }

    async fn update(&self, entity_type: &str, options: UpdateOptions) -> Result<Record> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get(&options.key)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                entity_type: peeth_core::keys::entity_label(entity_type),
                id: options.key.to_string(),
            })?;

        let mut document = record.into_document()?;
        apply_actions(&mut document, &options.update.into_actions()?)?;
        let updated = Record::from_document(document)?;
        records.insert(options.key, updated.clone());
        Ok(updated)
    }

    async fn batch_get(&self, keys: &[RecordKey]) -> Result<Vec<Record>> {
        let records = self.records.lock().unwrap();
        Ok(keys.iter().filter_map(|key| records.get(key).cloned()).collect())
    }

    async fn batch_write(&self, _ops: Vec<BatchWriteOp>) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUsers {
    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn set_role(&self, id: Uuid, role: Role) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.role = role;
        }
    }

    pub fn remove(&self, id: Uuid) {
        self.users.lock().unwrap().remove(&id);
    }
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn get_user(&self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn create_user(&self, user: User) -> ServiceResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|existing| existing.email == user.email) {
            return Err(ServiceError::Duplicate {
                field: "email",
                value: user.email,
            });
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn touch_login(&self, id: Uuid) -> ServiceResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| ServiceError::not_found("USER", id))?;
        user.last_login_at = Some(Utc::now());
        Ok(user.clone())
    }
}

/// Keeps every code it is asked to send.
#[derive(Default)]
pub struct CapturingSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingSender {
    pub fn last_code(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl OtpSender for CapturingSender {
    async fn send_code(&self, email: &str, code: &str) -> auth::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}
