use crate::domain::user::User;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Body of `POST /users/create`.
#[derive(Debug, Deserialize)]
pub struct CreateUserDTO<'a> {
    #[serde(borrow)]
    pub username: Cow<'a, str>,
    #[serde(borrow)]
    pub password: Cow<'a, str>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UserDTO {
    pub id: i32,
    pub username: CompactString,
    pub password: CompactString,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            username: value.username,
            password: value.password,
        }
    }
}
