//! Caller identity resolved by the authentication gate.

use serde::Serialize;

/// Account role. Admins see and manage every link; everyone else only their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    /// Maps a stored role name. Unknown roles get member rights.
    pub fn from_db(value: &str) -> Self {
        if value.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Member
        }
    }
}

/// The authenticated account behind a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl CallerIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Owner filter for link queries: `None` for admins (no filter).
    pub fn owner_scope(&self) -> Option<i64> {
        if self.is_admin() {
            None
        } else {
            Some(self.user_id)
        }
    }
}
