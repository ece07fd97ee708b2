use crate::domain::errors::RepositoryError;
use crate::domain::user::User;
use ahash::AHashMap;
use compact_str::CompactString;
use fnv::FnvHashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

/// Storage of [User] records.
///
/// `create` fails with [RepositoryError::PasswordTooShort] before it checks the username,
/// matching the order SQL constraints are evaluated in.
pub trait UserRepository: Send + Sync + 'static {
    fn get_by_id(&self, id: i32) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    fn create(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn count(&self) -> impl Future<Output = Result<usize, RepositoryError>> + Send;

    fn delete_all(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

#[derive(Debug, Default)]
struct UserTable {
    last_id: i32,
    rows: FnvHashMap<i32, User>,
    by_username: AHashMap<CompactString, i32>,
}

/// Process-local [UserRepository]. Ids keep growing after `delete_all`, like an
/// autoincrement column.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    table: Mutex<UserTable>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, op: &'static str) -> Result<MutexGuard<'_, UserTable>, RepositoryError> {
        self.table
            .lock()
            .map_err(|_| RepositoryError::unknown(op, "user table lock poisoned"))
    }
}

impl UserRepository for InMemoryUserRepository {
    async fn get_by_id(&self, id: i32) -> Result<User, RepositoryError> {
        self.table("get_by_id")?
            .rows
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn create(&self, username: &str, password: &str) -> Result<(), RepositoryError> {
        if !User::is_valid_password(password) {
            return Err(RepositoryError::PasswordTooShort);
        }

        let mut table = self.table("create")?;
        if table.by_username.contains_key(username) {
            return Err(RepositoryError::UsernameTaken);
        }

        table.last_id += 1;
        let id = table.last_id;
        table.by_username.insert(username.into(), id);
        table.rows.insert(id, User::new(id, username, password));
        Ok(())
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.table("count")?.rows.len())
    }

    async fn delete_all(&self) -> Result<(), RepositoryError> {
        let mut table = self.table("delete_all")?;
        table.rows.clear();
        table.by_username.clear();
        Ok(())
    }
}
