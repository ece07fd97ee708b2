use compact_str::CompactString;

/// Shortest password storage accepts, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Assigned by storage.
    pub id: i32,
    pub username: CompactString,
    pub password: CompactString,
}

impl User {
    pub fn new(
        id: i32,
        username: impl Into<CompactString>,
        password: impl Into<CompactString>,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_valid_password(password: &str) -> bool {
        password.chars().count() >= MIN_PASSWORD_LEN
    }
}
