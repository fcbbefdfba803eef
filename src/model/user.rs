use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use super::role::Role;

/// Full credential-store row. Never serialized: it carries the hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub profile_picture_url: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Public fields of a user as listed in the admin console.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 2,
    "username": "alice",
    "full_name": "Alice A",
    "role": "employee",
    "profile_picture_url": null,
    "created_at": "2024-01-01T09:00:00"
}))]
pub struct UserPublic {
    pub id: u64,
    pub username: String,
    pub full_name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub profile_picture_url: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

/// Identity returned to the client after login.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserView {
    pub id: u64,
    pub username: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub role: Role,
    pub profile_picture_url: Option<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            profile_picture_url: user.profile_picture_url.clone(),
        }
    }
}
