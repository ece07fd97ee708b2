use crate::application::repositories::UserRepository;
use crate::domain::errors::RepositoryError;
use crate::domain::user::{User, MIN_PASSWORD_LEN};
use crate::AnyResult;
use deadpool_postgres::{Config, Object, Pool, PoolConfig, Runtime, Status};
use eyre::WrapErr;
use tokio_postgres::error::SqlState;
use tokio_postgres::NoTls;

pub mod adapters;
pub mod server_impl;

const CREATE_USER: &str = "INSERT INTO users (username, password) VALUES ($1, $2)";
const GET_USER_BY_ID: &str = "SELECT id, username, password FROM users WHERE id = $1";
const COUNT_USERS: &str = "SELECT COUNT(*) FROM users";
const DELETE_USERS: &str = "DELETE FROM users";

fn schema() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS users (\
            id SERIAL PRIMARY KEY, \
            username TEXT NOT NULL UNIQUE, \
            password TEXT NOT NULL CHECK (char_length(password) >= {MIN_PASSWORD_LEN})\
        )"
    )
}

/// [UserRepository] over a PostgreSQL pool. Constraint violations raised by the
/// `users` table are translated into the matching [RepositoryError].
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: Pool,
}

impl std::fmt::Debug for PostgresUserRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresUserRepository")
            .field("status", &self.pool.status())
            .finish()
    }
}

impl PostgresUserRepository {
    /// Builds the pool and makes sure the `users` table exists.
    pub async fn connect(url: &str, pool_size: usize) -> AnyResult<Self> {
        let mut config = Config::new();
        config.url = Some(url.to_string());
        config.pool = Some(PoolConfig::new(pool_size));

        let pool = config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .wrap_err("invalid database configuration")?;

        let repository = Self { pool };
        repository.migrate().await?;
        Ok(repository)
    }

    async fn migrate(&self) -> AnyResult<()> {
        let client = self.pool.get().await.wrap_err("database unreachable")?;
        client
            .batch_execute(&schema())
            .await
            .wrap_err("could not create users table")?;
        tracing::info!("users table ready");
        Ok(())
    }

    /// Round-trips a trivial query and reports pool occupancy.
    /// Connections are closed when the last clone of the pool is dropped.
    pub async fn health(&self) -> Result<Status, RepositoryError> {
        let client = self.client("health").await?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(unknown("health"))?;
        Ok(self.pool.status())
    }

    async fn client(&self, op: &'static str) -> Result<Object, RepositoryError> {
        self.pool.get().await.map_err(|err| {
            tracing::error!(op, error = %err, "could not get a database connection");
            RepositoryError::unknown(op, err)
        })
    }
}

fn unknown(op: &'static str) -> impl FnOnce(tokio_postgres::Error) -> RepositoryError {
    move |err| {
        tracing::error!(op, error = %err, "query failed");
        RepositoryError::unknown(op, err)
    }
}

fn create_error(err: tokio_postgres::Error) -> RepositoryError {
    match err.code() {
        Some(code) if *code == SqlState::UNIQUE_VIOLATION => RepositoryError::UsernameTaken,
        Some(code) if *code == SqlState::CHECK_VIOLATION => RepositoryError::PasswordTooShort,
        _ => unknown("create")(err),
    }
}

impl UserRepository for PostgresUserRepository {
    async fn get_by_id(&self, id: i32) -> Result<User, RepositoryError> {
        let client = self.client("get_by_id").await?;
        let statement = client
            .prepare_cached(GET_USER_BY_ID)
            .await
            .map_err(unknown("get_by_id"))?;

        let row = client
            .query_opt(&statement, &[&id])
            .await
            .map_err(unknown("get_by_id"))?
            .ok_or(RepositoryError::NotFound)?;

        User::try_from(&row).map_err(unknown("get_by_id"))
    }

    async fn create(&self, username: &str, password: &str) -> Result<(), RepositoryError> {
        let client = self.client("create").await?;
        let statement = client
            .prepare_cached(CREATE_USER)
            .await
            .map_err(unknown("create"))?;

        client
            .execute(&statement, &[&username, &password])
            .await
            .map_err(create_error)?;
        Ok(())
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        let client = self.client("count").await?;
        let row = client
            .query_one(COUNT_USERS, &[])
            .await
            .map_err(unknown("count"))?;
        let count: i64 = row.try_get(0).map_err(unknown("count"))?;
        usize::try_from(count).map_err(|err| RepositoryError::unknown("count", err))
    }

    async fn delete_all(&self) -> Result<(), RepositoryError> {
        let client = self.client("delete_all").await?;
        client
            .execute(DELETE_USERS, &[])
            .await
            .map_err(unknown("delete_all"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_enforces_password_length() {
        let schema = schema();
        assert!(schema.contains("username TEXT NOT NULL UNIQUE"));
        assert!(schema.contains("CHECK (char_length(password) >= 6)"));
    }

    /// Needs a disposable database in `DB_URL`; skipped otherwise.
    #[tokio::test]
    async fn postgres_round_trip() {
        let Ok(url) = std::env::var("DB_URL") else {
            return;
        };
        let users = PostgresUserRepository::connect(&url, 2).await.unwrap();
        users.delete_all().await.unwrap();

        let status = users.health().await.unwrap();
        assert_eq!(status.max_size, 2);

        assert_eq!(users.create("daniel", "123456").await, Ok(()));
        assert_eq!(
            users.create("daniel", "654321").await,
            Err(RepositoryError::UsernameTaken)
        );
        assert_eq!(
            users.create("karl", "12345").await,
            Err(RepositoryError::PasswordTooShort)
        );
        assert_eq!(users.count().await, Ok(1));

        let id: i32 = users
            .client("test")
            .await
            .unwrap()
            .query_one("SELECT id FROM users WHERE username = $1", &[&"daniel"])
            .await
            .unwrap()
            .get(0);
        let user = users.get_by_id(id).await.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.username, "daniel");
        assert_eq!(user.password, "123456");
        assert_eq!(users.get_by_id(i32::MAX).await, Err(RepositoryError::NotFound));

        users.delete_all().await.unwrap();
        assert_eq!(users.count().await, Ok(0));
    }

    #[tokio::test]
    async fn connect_rejects_invalid_url() {
        let res = PostgresUserRepository::connect("not a url at all", 1).await;
        assert!(res.is_err());
    }
}
