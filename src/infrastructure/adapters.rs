use crate::domain::user::User;
use tokio_postgres::Row;

impl TryFrom<&Row> for User {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get::<_, &str>("username")?.into(),
            password: row.try_get::<_, &str>("password")?.into(),
        })
    }
}
